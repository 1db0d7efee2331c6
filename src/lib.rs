//! # Directly addressable numeric dictionary
//!
//! `dacdict` stores a sequence of booleans, integers, floats, or datetimes
//! in the byte-oriented *Directly Addressable Codes* (DACs) layout of
//! Brisaboa, Ladra, and Navarro: each value is sliced into its significant
//! bytes across up to eight parallel levels, a flag bit per stored byte
//! records whether the value continues into the next level, and a
//! block-sampled rank index over the flags makes any position reachable in
//! constant time per byte.
//!
//! Unlike most succinct structures, the dictionary is *mutable*: values can
//! be appended at any time, and [`Dict::update_at`] / [`Dict::remove_at`]
//! edit the levels, flags, and rank samples together so that direct access
//! keeps working without a rebuild.
//!
//! ## Design policy
//!
//! - **Keep the three structures coupled:** levels, flags, and rank samples
//!   are never allowed to drift apart; every mutator restores the coupling
//!   before returning.
//! - **Ensure safety:** byte slicing is done with shifts, not pointer
//!   aliasing, and the crate contains no `unsafe` code.
//! - **Stay single-threaded:** there is no internal synchronization;
//!   exclusive mutation is the caller's responsibility, as with any `&mut`
//!   API.
//!
//! ## Examples
//!
//! ```
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use dacdict::Dict;
//!
//! let mut dict = Dict::with_capacity(4);
//! dict.push_u64(5);
//! dict.push_i32(-70000);
//! dict.push_f64(0.5);
//! dict.close();
//!
//! assert_eq!(dict.get_u64(0)?, 5);
//! assert_eq!(dict.get_i32(1)?, -70000);
//! assert_eq!(dict.get_f64(2)?, 0.5);
//! # Ok(())
//! # }
//! ```
//!
//! ## Limitation
//!
//! This library is designed to run on 64-bit machines.
#![deny(missing_docs)]

#[cfg(not(target_pointer_width = "64"))]
compile_error!("`target_pointer_width` must be 64");

pub mod bit_vector;
pub mod dict;
pub mod error;
pub mod rank;
pub mod utils;

pub use dict::{Dict, Iter};
pub use error::{Error, Result};
