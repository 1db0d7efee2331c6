//! Mutable numeric dictionary using Directly Addressable Codes (DACs) in a
//! simple bytewise scheme.

use chrono::{DateTime, Utc};
use num_traits::ToPrimitive;

use crate::bit_vector::BitVector;
use crate::error::{Error, Result};
use crate::rank::RankIndex;
use crate::utils::{byte_len, unzigzag, zigzag};

/// Number of bits assigned to each level.
const LEVEL_WIDTH: usize = 8;
/// Maximum possible number of levels for a [`u64`] value.
const MAX_LEVELS: usize = (u64::BITS as usize + LEVEL_WIDTH - 1) / LEVEL_WIDTH;

/// Mutable numeric dictionary storing booleans, integers, floats, and
/// datetimes in compressed form while retaining direct access to any
/// position.
///
/// Every value is held as a 64-bit code sliced into up to eight byte levels:
/// level $`j`$ stores the $`j`$-th significant byte of every code that is
/// long enough, a flag bit per entry records whether the code continues into
/// level $`j+1`$, and a block-sampled rank index over the flags maps an
/// entry to the position of its next byte in constant time.
///
/// Writers append values and leave the dictionary *open*; [`Dict::close`]
/// rebuilds the rank indices, after which positional reads cost
/// $`O(\ell)`$ for an $`\ell`$-byte value. [`Dict::update_at`] and
/// [`Dict::remove_at`] maintain the rank indices incrementally, so they can
/// be interleaved with reads without re-closing.
///
/// # Examples
///
/// ```
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use dacdict::Dict;
///
/// let mut dict = Dict::new();
/// assert_eq!(dict.push_u64(5), 0);
/// assert_eq!(dict.push_u64(100000), 1);
/// assert_eq!(dict.push_u64(334), 2);
/// dict.close();
///
/// assert_eq!(dict.len(), 3);
/// assert_eq!(dict.get_u64(0)?, 5);
/// assert_eq!(dict.get_u64(1)?, 100000);
/// assert_eq!(dict.get_u64(2)?, 334);
///
/// dict.update_at(1, 7)?;
/// assert_eq!(dict.get_u64(1)?, 7);
/// dict.remove_at(0)?;
/// assert_eq!(dict.get_u64(0)?, 7);
/// # Ok(())
/// # }
/// ```
///
/// # References
///
/// - N. R. Brisaboa, S. Ladra, and G. Navarro, "DACs: Bringing direct access
///   to variable-length codes." Information Processing & Management, 49(1),
///   392-404, 2013.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Dict {
    levels: [Vec<u8>; MAX_LEVELS],
    flags: [BitVector; MAX_LEVELS - 1],
    ranks: [RankIndex; MAX_LEVELS - 1],
    closed: bool,
}

impl Dict {
    /// Creates an empty dictionary.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty dictionary with room for `n` values in the first
    /// level. The capacity is only a hint; the dictionary grows as needed.
    pub fn with_capacity(n: usize) -> Self {
        let mut dict = Self::default();
        dict.levels[0] = Vec::with_capacity(n);
        dict.flags[0] = BitVector::with_capacity(n);
        dict
    }

    /// Builds a closed dictionary from a slice of integers in one step.
    ///
    /// # Errors
    ///
    /// An error is returned if `vals` contains an integer that cannot be
    /// cast to [`u64`].
    ///
    /// # Examples
    ///
    /// ```
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// use dacdict::Dict;
    ///
    /// let dict = Dict::from_slice(&[5, 0, 100000, 334])?;
    /// assert_eq!(dict.len(), 4);
    /// assert_eq!(dict.get_u64(2)?, 100000);
    /// # Ok(())
    /// # }
    /// ```
    pub fn from_slice<T>(vals: &[T]) -> Result<Self>
    where
        T: ToPrimitive,
    {
        let mut buf = Vec::with_capacity(vals.len());
        for v in vals {
            buf.push(v.to_u64().ok_or_else(|| {
                Error::invalid_argument("vals must consist only of values castable into u64.")
            })?);
        }
        let mut dict = Self::with_capacity(buf.len());
        dict.extend_u64s(&buf);
        dict.close();
        Ok(dict)
    }

    /// Returns the number of values stored.
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.levels[0].len()
    }

    /// Checks if the dictionary is empty.
    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns whether the rank indices reflect the current contents.
    ///
    /// Appending values opens the dictionary; [`Dict::close`] closes it.
    /// [`Dict::update_at`] and [`Dict::remove_at`] keep it closed.
    #[inline(always)]
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Rebuilds the rank indices so that positional reads become available.
    ///
    /// Idempotent; closing an already closed dictionary is a no-op.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        for l in 0..MAX_LEVELS - 1 {
            self.ranks[l] = RankIndex::build(&self.flags[l]);
        }
        self.closed = true;
    }

    /// Removes all values without releasing the allocated capacity.
    pub fn reset(&mut self) {
        for level in &mut self.levels {
            level.clear();
        }
        for flag in &mut self.flags {
            flag.clear();
        }
        for rank in &mut self.ranks {
            rank.clear();
        }
        self.closed = false;
    }

    // ------------------------------------------------------------------
    // Scalar writers.
    // ------------------------------------------------------------------

    /// Appends a value and returns its position.
    pub fn push_u64(&mut self, x: u64) -> usize {
        let n = byte_len(x);
        self.push_byte(0, x as u8);
        let mut x = x;
        for l in 1..n {
            let k = self.levels[l - 1].len() - 1;
            self.flags[l - 1].set_bit(k);
            x >>= LEVEL_WIDTH;
            self.push_byte(l, x as u8);
        }
        self.closed = false;
        self.levels[0].len() - 1
    }

    /// Appends a boolean (stored as the byte 0 or 1) and returns its
    /// position.
    pub fn push_bool(&mut self, x: bool) -> usize {
        self.push_u64(u64::from(x))
    }

    /// Appends a [`u8`] and returns its position.
    pub fn push_u8(&mut self, x: u8) -> usize {
        self.push_u64(u64::from(x))
    }

    /// Appends a [`u16`] and returns its position.
    pub fn push_u16(&mut self, x: u16) -> usize {
        self.push_u64(u64::from(x))
    }

    /// Appends a [`u32`] and returns its position.
    pub fn push_u32(&mut self, x: u32) -> usize {
        self.push_u64(u64::from(x))
    }

    /// Appends an [`i8`] (zigzag-encoded) and returns its position.
    pub fn push_i8(&mut self, x: i8) -> usize {
        self.push_i64(i64::from(x))
    }

    /// Appends an [`i16`] (zigzag-encoded) and returns its position.
    pub fn push_i16(&mut self, x: i16) -> usize {
        self.push_i64(i64::from(x))
    }

    /// Appends an [`i32`] (zigzag-encoded) and returns its position.
    pub fn push_i32(&mut self, x: i32) -> usize {
        self.push_i64(i64::from(x))
    }

    /// Appends an [`i64`] (zigzag-encoded) and returns its position.
    pub fn push_i64(&mut self, x: i64) -> usize {
        self.push_u64(zigzag(x))
    }

    /// Appends an [`f32`] and returns its position.
    ///
    /// The IEEE-754 bit pattern is stored byte-reversed so that the
    /// sign and exponent land in the first level and an all-zero mantissa
    /// tail occupies the truncatable upper levels.
    pub fn push_f32(&mut self, x: f32) -> usize {
        self.push_u64(u64::from(x.to_bits().swap_bytes()))
    }

    /// Appends an [`f64`], byte-reversed like [`Dict::push_f32`], and
    /// returns its position.
    pub fn push_f64(&mut self, x: f64) -> usize {
        self.push_u64(x.to_bits().swap_bytes())
    }

    /// Appends a datetime, stored as zigzag-encoded nanoseconds since the
    /// Unix epoch, and returns its position. The timezone is not stored.
    ///
    /// # Errors
    ///
    /// An error is returned if `t` is not representable as [`i64`]
    /// nanoseconds (roughly outside the years 1677..=2262).
    pub fn push_datetime(&mut self, t: DateTime<Utc>) -> Result<usize> {
        let ns = t.timestamp_nanos_opt().ok_or_else(|| {
            Error::invalid_argument(
                "datetime must be representable as i64 nanoseconds since the Unix epoch.",
            )
        })?;
        Ok(self.push_i64(ns))
    }

    // ------------------------------------------------------------------
    // Bulk writers.
    // ------------------------------------------------------------------

    /// Appends every value of `vals`.
    ///
    /// The positions assigned are `prev_len..prev_len + vals.len()`. The
    /// first-level flag bitmap grows once up front instead of once per
    /// element.
    pub fn extend_u64s(&mut self, vals: &[u64]) {
        self.extend_encoded(vals.iter().copied());
    }

    /// Appends every boolean of `vals`.
    pub fn extend_bools(&mut self, vals: &[bool]) {
        self.flags[0].push_zeros(vals.len());
        self.levels[0].extend(vals.iter().map(|&b| u8::from(b)));
        self.closed = false;
    }

    /// Appends every [`u8`] of `vals`.
    pub fn extend_u8s(&mut self, vals: &[u8]) {
        self.flags[0].push_zeros(vals.len());
        self.levels[0].extend_from_slice(vals);
        self.closed = false;
    }

    /// Appends every [`u16`] of `vals`.
    pub fn extend_u16s(&mut self, vals: &[u16]) {
        self.extend_encoded(vals.iter().map(|&v| u64::from(v)));
    }

    /// Appends every [`u32`] of `vals`.
    pub fn extend_u32s(&mut self, vals: &[u32]) {
        self.extend_encoded(vals.iter().map(|&v| u64::from(v)));
    }

    /// Appends every [`i8`] of `vals`, zigzag-encoded.
    pub fn extend_i8s(&mut self, vals: &[i8]) {
        self.extend_encoded(vals.iter().map(|&v| zigzag(i64::from(v))));
    }

    /// Appends every [`i16`] of `vals`, zigzag-encoded.
    pub fn extend_i16s(&mut self, vals: &[i16]) {
        self.extend_encoded(vals.iter().map(|&v| zigzag(i64::from(v))));
    }

    /// Appends every [`i32`] of `vals`, zigzag-encoded.
    pub fn extend_i32s(&mut self, vals: &[i32]) {
        self.extend_encoded(vals.iter().map(|&v| zigzag(i64::from(v))));
    }

    /// Appends every [`i64`] of `vals`, zigzag-encoded.
    pub fn extend_i64s(&mut self, vals: &[i64]) {
        self.extend_encoded(vals.iter().map(|&v| zigzag(v)));
    }

    /// Appends every [`f32`] of `vals`, byte-reversed like
    /// [`Dict::push_f32`].
    pub fn extend_f32s(&mut self, vals: &[f32]) {
        self.extend_encoded(vals.iter().map(|&v| u64::from(v.to_bits().swap_bytes())));
    }

    /// Appends every [`f64`] of `vals`, byte-reversed like
    /// [`Dict::push_f64`].
    pub fn extend_f64s(&mut self, vals: &[f64]) {
        self.extend_encoded(vals.iter().map(|&v| v.to_bits().swap_bytes()));
    }

    /// Appends every datetime of `vals`.
    ///
    /// # Errors
    ///
    /// An error is returned if any datetime is not representable as [`i64`]
    /// nanoseconds since the Unix epoch; the dictionary is left untouched in
    /// that case.
    pub fn extend_datetimes(&mut self, vals: &[DateTime<Utc>]) -> Result<()> {
        let mut encoded = Vec::with_capacity(vals.len());
        for t in vals {
            encoded.push(zigzag(t.timestamp_nanos_opt().ok_or_else(|| {
                Error::invalid_argument(
                    "datetime must be representable as i64 nanoseconds since the Unix epoch.",
                )
            })?));
        }
        self.extend_encoded(encoded.into_iter());
        Ok(())
    }

    // ------------------------------------------------------------------
    // Scalar readers.
    // ------------------------------------------------------------------

    /// Returns the value at position `pos`.
    ///
    /// Requires a closed dictionary.
    ///
    /// # Errors
    ///
    /// [`Error::OutOfBounds`] if `pos >= self.len()`.
    ///
    /// # Complexity
    ///
    /// $`O(\ell)`$ where $`\ell`$ is the byte length of the stored value;
    /// each step costs one sampled-rank lookup of at most eight word
    /// popcounts.
    pub fn get_u64(&self, pos: usize) -> Result<u64> {
        if self.len() <= pos {
            return Err(Error::out_of_bounds(pos, self.len()));
        }
        debug_assert!(self.closed, "direct access requires close()");
        let mut x = u64::from(self.levels[0][pos]);
        let mut pos = pos;
        let mut l = 0;
        while l < MAX_LEVELS - 1 && self.flags[l].bit(pos) {
            pos = self.ranks[l].rank1(&self.flags[l], pos);
            l += 1;
            x |= u64::from(self.levels[l][pos]) << (l * LEVEL_WIDTH);
        }
        Ok(x)
    }

    /// Returns the boolean at position `pos`.
    pub fn get_bool(&self, pos: usize) -> Result<bool> {
        if self.len() <= pos {
            return Err(Error::out_of_bounds(pos, self.len()));
        }
        Ok(self.levels[0][pos] != 0)
    }

    /// Returns the value at position `pos` truncated to [`u8`].
    pub fn get_u8(&self, pos: usize) -> Result<u8> {
        Ok(self.get_u64(pos)? as u8)
    }

    /// Returns the value at position `pos` truncated to [`u16`].
    pub fn get_u16(&self, pos: usize) -> Result<u16> {
        Ok(self.get_u64(pos)? as u16)
    }

    /// Returns the value at position `pos` truncated to [`u32`].
    pub fn get_u32(&self, pos: usize) -> Result<u32> {
        Ok(self.get_u64(pos)? as u32)
    }

    /// Returns the zigzag-decoded value at position `pos` as [`i8`].
    pub fn get_i8(&self, pos: usize) -> Result<i8> {
        Ok(unzigzag(self.get_u64(pos)?) as i8)
    }

    /// Returns the zigzag-decoded value at position `pos` as [`i16`].
    pub fn get_i16(&self, pos: usize) -> Result<i16> {
        Ok(unzigzag(self.get_u64(pos)?) as i16)
    }

    /// Returns the zigzag-decoded value at position `pos` as [`i32`].
    pub fn get_i32(&self, pos: usize) -> Result<i32> {
        Ok(unzigzag(self.get_u64(pos)?) as i32)
    }

    /// Returns the zigzag-decoded value at position `pos` as [`i64`].
    pub fn get_i64(&self, pos: usize) -> Result<i64> {
        Ok(unzigzag(self.get_u64(pos)?))
    }

    /// Returns the [`f32`] at position `pos`.
    pub fn get_f32(&self, pos: usize) -> Result<f32> {
        Ok(f32::from_bits((self.get_u64(pos)? as u32).swap_bytes()))
    }

    /// Returns the [`f64`] at position `pos`.
    pub fn get_f64(&self, pos: usize) -> Result<f64> {
        Ok(f64::from_bits(self.get_u64(pos)?.swap_bytes()))
    }

    /// Returns the datetime at position `pos` with nanosecond precision, in
    /// UTC.
    pub fn get_datetime(&self, pos: usize) -> Result<DateTime<Utc>> {
        Ok(DateTime::from_timestamp_nanos(self.get_i64(pos)?))
    }

    // ------------------------------------------------------------------
    // Bulk readers.
    // ------------------------------------------------------------------

    /// Clears `out` and fills it with all stored values in order, reusing
    /// its allocation.
    ///
    /// The sequential walk advances one cursor per level instead of issuing
    /// rank lookups, so it works on open dictionaries too.
    pub fn read_into(&self, out: &mut Vec<u64>) {
        out.clear();
        out.reserve(self.len());
        self.for_each_value(|_, x| out.push(x));
    }

    /// Returns all stored values in order.
    pub fn to_u64_vec(&self) -> Vec<u64> {
        self.map_values(|x| x)
    }

    /// Returns all stored values as booleans.
    pub fn to_bool_vec(&self) -> Vec<bool> {
        self.map_values(|x| x != 0)
    }

    /// Returns all stored values truncated to [`u8`].
    pub fn to_u8_vec(&self) -> Vec<u8> {
        self.map_values(|x| x as u8)
    }

    /// Returns all stored values truncated to [`u16`].
    pub fn to_u16_vec(&self) -> Vec<u16> {
        self.map_values(|x| x as u16)
    }

    /// Returns all stored values truncated to [`u32`].
    pub fn to_u32_vec(&self) -> Vec<u32> {
        self.map_values(|x| x as u32)
    }

    /// Returns all stored values zigzag-decoded to [`i8`].
    pub fn to_i8_vec(&self) -> Vec<i8> {
        self.map_values(|x| unzigzag(x) as i8)
    }

    /// Returns all stored values zigzag-decoded to [`i16`].
    pub fn to_i16_vec(&self) -> Vec<i16> {
        self.map_values(|x| unzigzag(x) as i16)
    }

    /// Returns all stored values zigzag-decoded to [`i32`].
    pub fn to_i32_vec(&self) -> Vec<i32> {
        self.map_values(|x| unzigzag(x) as i32)
    }

    /// Returns all stored values zigzag-decoded to [`i64`].
    pub fn to_i64_vec(&self) -> Vec<i64> {
        self.map_values(unzigzag)
    }

    /// Returns all stored values as [`f32`].
    pub fn to_f32_vec(&self) -> Vec<f32> {
        self.map_values(|x| f32::from_bits((x as u32).swap_bytes()))
    }

    /// Returns all stored values as [`f64`].
    pub fn to_f64_vec(&self) -> Vec<f64> {
        self.map_values(|x| f64::from_bits(x.swap_bytes()))
    }

    /// Returns all stored values as UTC datetimes.
    pub fn to_datetime_vec(&self) -> Vec<DateTime<Utc>> {
        self.map_values(|x| DateTime::from_timestamp_nanos(unzigzag(x)))
    }

    // ------------------------------------------------------------------
    // Iteration.
    // ------------------------------------------------------------------

    /// Creates an iterator over `(position, value)` pairs.
    ///
    /// # Examples
    ///
    /// ```
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// use dacdict::Dict;
    ///
    /// let dict = Dict::from_slice(&[5, 999, 334])?;
    /// let mut it = dict.iter();
    ///
    /// assert_eq!(it.next(), Some((0, 5)));
    /// assert_eq!(it.next(), Some((1, 999)));
    /// assert_eq!(it.next(), Some((2, 334)));
    /// assert_eq!(it.next(), None);
    /// # Ok(())
    /// # }
    /// ```
    pub const fn iter(&self) -> Iter<'_> {
        Iter {
            dict: self,
            cursors: [0; MAX_LEVELS - 1],
            pos: 0,
        }
    }

    // ------------------------------------------------------------------
    // Mutation.
    // ------------------------------------------------------------------

    /// Overwrites the value at position `pos` with `x`, in place.
    ///
    /// When the new value has the same byte length as the old one, only the
    /// stored bytes change. A shorter value clears the last surviving
    /// continuation flag and shift-removes the orphaned upper bytes; a
    /// longer one sets the flag and shift-inserts the new bytes. The rank
    /// indices are maintained incrementally, so the dictionary stays closed.
    ///
    /// Requires a closed dictionary.
    ///
    /// # Errors
    ///
    /// [`Error::OutOfBounds`] if `pos >= self.len()`.
    pub fn update_at(&mut self, pos: usize, x: u64) -> Result<()> {
        if self.len() <= pos {
            return Err(Error::out_of_bounds(pos, self.len()));
        }
        debug_assert!(self.closed, "update_at requires close()");

        let (chain, old_n) = self.byte_positions(pos);
        let new_n = byte_len(x);

        for l in 0..old_n.min(new_n) {
            self.levels[l][chain[l]] = (x >> (l * LEVEL_WIDTH)) as u8;
        }

        if new_n < old_n {
            self.flags[new_n - 1].clear_bit(chain[new_n - 1]);
            self.ranks[new_n - 1].decrement_after(chain[new_n - 1]);
            // Dismantle the orphaned tail from the top down.
            for l in (new_n..old_n).rev() {
                self.levels[l].remove(chain[l]);
                if l < MAX_LEVELS - 1 {
                    let removed = self.flags[l].remove_bit(chain[l]);
                    self.ranks[l].note_removed(&self.flags[l], chain[l], removed);
                }
            }
        } else if new_n > old_n {
            self.flags[old_n - 1].set_bit(chain[old_n - 1]);
            self.ranks[old_n - 1].increment_after(chain[old_n - 1]);
            let mut k = self.ranks[old_n - 1].rank1(&self.flags[old_n - 1], chain[old_n - 1]);
            for l in old_n..new_n {
                self.levels[l].insert(k, (x >> (l * LEVEL_WIDTH)) as u8);
                if l < MAX_LEVELS - 1 {
                    let cont = l + 1 < new_n;
                    self.flags[l].insert_bit(k, cont);
                    self.ranks[l].note_inserted(&self.flags[l], k, cont);
                    if cont {
                        k = self.ranks[l].rank1(&self.flags[l], k);
                    }
                }
            }
        }
        Ok(())
    }

    /// Removes the value at position `pos`, shifting all later positions
    /// down by one.
    ///
    /// The rank indices are maintained incrementally, so the dictionary
    /// stays closed.
    ///
    /// Requires a closed dictionary.
    ///
    /// # Errors
    ///
    /// [`Error::OutOfBounds`] if `pos >= self.len()`.
    pub fn remove_at(&mut self, pos: usize) -> Result<()> {
        if self.len() <= pos {
            return Err(Error::out_of_bounds(pos, self.len()));
        }
        debug_assert!(self.closed, "remove_at requires close()");

        let (chain, n) = self.byte_positions(pos);
        for l in (0..n).rev() {
            self.levels[l].remove(chain[l]);
            if l < MAX_LEVELS - 1 {
                let removed = self.flags[l].remove_bit(chain[l]);
                self.ranks[l].note_removed(&self.flags[l], chain[l], removed);
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Search.
    // ------------------------------------------------------------------

    /// Returns the first position holding `x`, or [`None`] if absent.
    ///
    /// Requires a closed dictionary.
    ///
    /// # Complexity
    ///
    /// $`O(n)`$; candidate positions whose first byte matches are verified
    /// by walking their levels.
    pub fn scan(&self, x: u64) -> Option<usize> {
        debug_assert!(self.closed, "scan requires close()");
        let n = byte_len(x);
        let first = x as u8;
        'positions: for k in 0..self.len() {
            if self.levels[0][k] != first {
                continue;
            }
            let mut pos = k;
            let mut l = 0;
            while l < MAX_LEVELS - 1 && self.flags[l].bit(pos) {
                pos = self.ranks[l].rank1(&self.flags[l], pos);
                l += 1;
                if l >= n || self.levels[l][pos] != (x >> (l * LEVEL_WIDTH)) as u8 {
                    continue 'positions;
                }
            }
            if l + 1 == n {
                return Some(k);
            }
        }
        None
    }

    /// Returns `(first, count)` for the run of values equal to `x`, or
    /// [`None`] if absent. The dictionary content must be sorted in
    /// ascending order of the stored codes; this precondition is not
    /// verified, and the result is unspecified when it does not hold.
    ///
    /// Requires a closed dictionary.
    ///
    /// # Complexity
    ///
    /// One byte-wise binary search per level of `x`, i.e.
    /// $`O(\ell \lg n)`$.
    ///
    /// # Examples
    ///
    /// ```
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// use dacdict::Dict;
    ///
    /// let dict = Dict::from_slice(&[3, 7, 7, 300, 300, 300, 70000])?;
    /// assert_eq!(dict.search(7), Some((1, 2)));
    /// assert_eq!(dict.search(300), Some((3, 3)));
    /// assert_eq!(dict.search(8), None);
    /// # Ok(())
    /// # }
    /// ```
    pub fn search(&self, x: u64) -> Option<(usize, usize)> {
        debug_assert!(self.closed, "search requires close()");
        let n = byte_len(x);
        let top = n - 1;

        // On sorted content byte lengths are monotone, so the entries that
        // stop at the top level form its leading run.
        let stop = if top < MAX_LEVELS - 1 {
            self.levels[top].len() - self.ranks[top].num_ones()
        } else {
            self.levels[top].len()
        };
        let byte = (x >> (top * LEVEL_WIDTH)) as u8;
        let slice = &self.levels[top][..stop];
        let mut lo = slice.partition_point(|&b| b < byte);
        let mut hi = slice.partition_point(|&b| b <= byte);
        if lo == hi {
            return None;
        }

        // Translate the interval down level by level: entries of level l+1
        // map onto the continuing suffix of level l, offset by its count of
        // non-continuing entries, then narrow by that level's byte of x.
        for l in (0..top).rev() {
            let zeros = self.levels[l].len() - self.ranks[l].num_ones();
            lo += zeros;
            hi += zeros;
            let byte = (x >> (l * LEVEL_WIDTH)) as u8;
            let sub = &self.levels[l][lo..hi];
            let a = sub.partition_point(|&b| b < byte);
            let b = sub.partition_point(|&b| b <= byte);
            if a == b {
                return None;
            }
            hi = lo + b;
            lo += a;
        }
        Some((lo, hi - lo))
    }

    // ------------------------------------------------------------------
    // Internals.
    // ------------------------------------------------------------------

    /// Appends a raw byte to level `l`, keeping its flag bitmap the same
    /// length.
    #[inline(always)]
    fn push_byte(&mut self, l: usize, byte: u8) {
        self.levels[l].push(byte);
        if l < MAX_LEVELS - 1 {
            self.flags[l].push_bit(false);
        }
    }

    /// Appends pre-encoded codes, growing the first-level bitmap once up
    /// front so the per-element growth check disappears.
    fn extend_encoded<I>(&mut self, vals: I)
    where
        I: ExactSizeIterator<Item = u64>,
    {
        self.levels[0].reserve(vals.len());
        self.flags[0].push_zeros(vals.len());
        for v in vals {
            let n = byte_len(v);
            self.levels[0].push(v as u8);
            let mut x = v;
            for l in 1..n {
                let k = self.levels[l - 1].len() - 1;
                self.flags[l - 1].set_bit(k);
                x >>= LEVEL_WIDTH;
                self.push_byte(l, x as u8);
            }
        }
        self.closed = false;
    }

    /// Maps the value at `pos` to its per-level byte positions. Returns the
    /// position chain and the number of levels occupied.
    fn byte_positions(&self, pos: usize) -> ([usize; MAX_LEVELS], usize) {
        let mut chain = [0; MAX_LEVELS];
        chain[0] = pos;
        let mut n = 1;
        while n < MAX_LEVELS && self.flags[n - 1].bit(chain[n - 1]) {
            chain[n] = self.ranks[n - 1].rank1(&self.flags[n - 1], chain[n - 1]);
            n += 1;
        }
        (chain, n)
    }

    /// Walks all values in order with one amortized cursor per level,
    /// calling `f(position, value)` for each.
    fn for_each_value(&self, mut f: impl FnMut(usize, u64)) {
        let mut cursors = [0usize; MAX_LEVELS - 1];
        for i in 0..self.len() {
            let mut x = u64::from(self.levels[0][i]);
            let mut pos = i;
            let mut l = 0;
            while l < MAX_LEVELS - 1 && self.flags[l].bit(pos) {
                pos = cursors[l];
                cursors[l] += 1;
                l += 1;
                x |= u64::from(self.levels[l][pos]) << (l * LEVEL_WIDTH);
            }
            f(i, x);
        }
    }

    fn map_values<T>(&self, mut f: impl FnMut(u64) -> T) -> Vec<T> {
        let mut out = Vec::with_capacity(self.len());
        self.for_each_value(|_, x| out.push(f(x)));
        out
    }
}

impl std::fmt::Debug for Dict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dict")
            .field("vals", &self.to_u64_vec())
            .field("len", &self.len())
            .field("closed", &self.closed)
            .finish()
    }
}

/// Iterator over `(position, value)` pairs, created by [`Dict::iter()`].
///
/// Sequential decoding advances one cursor per level instead of issuing
/// rank lookups; [`Iter::value`] performs a random access and re-seats the
/// cursors so iteration resumes right after the accessed position.
pub struct Iter<'a> {
    dict: &'a Dict,
    cursors: [usize; MAX_LEVELS - 1],
    pos: usize,
}

impl Iter<'_> {
    /// Returns the value at position `pos` and re-seats the iterator so the
    /// next call to [`Iterator::next`] yields position `pos + 1`.
    ///
    /// Requires a closed dictionary.
    ///
    /// # Errors
    ///
    /// [`Error::OutOfBounds`] if `pos >= self.len()`; the iterator state is
    /// unchanged in that case.
    pub fn value(&mut self, pos: usize) -> Result<u64> {
        let x = self.dict.get_u64(pos)?;
        let mut c = pos + 1;
        for l in 0..MAX_LEVELS - 1 {
            c = self.dict.ranks[l].rank1(&self.dict.flags[l], c);
            self.cursors[l] = c;
        }
        self.pos = pos + 1;
        Ok(x)
    }

    /// Rewinds the iterator to position 0.
    pub fn reset(&mut self) {
        self.cursors = [0; MAX_LEVELS - 1];
        self.pos = 0;
    }
}

impl Iterator for Iter<'_> {
    type Item = (usize, u64);

    fn next(&mut self) -> Option<Self::Item> {
        if self.pos >= self.dict.len() {
            return None;
        }
        let k = self.pos;
        let mut x = u64::from(self.dict.levels[0][k]);
        let mut pos = k;
        let mut l = 0;
        while l < MAX_LEVELS - 1 && self.dict.flags[l].bit(pos) {
            pos = self.cursors[l];
            self.cursors[l] += 1;
            l += 1;
            x |= u64::from(self.dict.levels[l][pos]) << (l * LEVEL_WIDTH);
        }
        self.pos += 1;
        Some((k, x))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.dict.len() - self.pos.min(self.dict.len());
        (left, Some(left))
    }
}
