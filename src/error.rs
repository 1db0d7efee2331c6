//! Common error types used throughout the crate.

use std::fmt;

/// Result type used across the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Error type covering failures across dictionary operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A positional operation referenced an index at or past the end.
    OutOfBounds {
        /// The offending position.
        pos: usize,
        /// The number of values stored.
        len: usize,
    },
    /// An argument violated preconditions.
    InvalidArgument(String),
}

impl Error {
    /// Creates an [`Error::OutOfBounds`] for position `pos` in a dictionary
    /// holding `len` values.
    pub fn out_of_bounds(pos: usize, len: usize) -> Self {
        Self::OutOfBounds { pos, len }
    }

    /// Creates an [`Error::InvalidArgument`] with the provided message.
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::OutOfBounds { pos, len } => {
                write!(f, "pos must be less than self.len()={len}, but got {pos}.")
            }
            Error::InvalidArgument(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for Error {}
