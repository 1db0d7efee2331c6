//! Block-sampled rank index over a [`BitVector`].
//!
//! The index stores one prefix popcount per 512-bit block (8 words), so a
//! lookup costs at most eight word popcounts on top of one sample read. The
//! samples can be rebuilt wholesale or maintained incrementally when a
//! single bit is overwritten, shift-inserted, or shift-removed.

use crate::bit_vector::{BitVector, WORD_LEN};

/// Number of words per sampling block.
const BLOCK_WORDS: usize = 8;
/// Number of bits per sampling block.
const BLOCK_BITS: usize = BLOCK_WORDS * WORD_LEN;

/// Returns the number of samples covering `num_words` words: one leading
/// zero, one per full block, and one for the partial trailing group.
#[inline(always)]
fn sample_len(num_words: usize) -> usize {
    num_words.div_ceil(BLOCK_WORDS) + 1
}

/// Prefix popcounts of a bit vector, sampled every 512 bits.
///
/// Sample `b` equals the number of set bits strictly before bit `512·b`; the
/// final sample always covers the whole vector, so it doubles as the total
/// popcount.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RankIndex {
    samples: Vec<usize>,
}

impl RankIndex {
    /// Builds the index for `bv` from scratch.
    pub fn build(bv: &BitVector) -> Self {
        let words = bv.words();
        let mut samples = Vec::with_capacity(sample_len(words.len()));
        samples.push(0);
        let mut acc = 0;
        for (i, &w) in words.iter().enumerate() {
            acc += w.count_ones() as usize;
            if (i + 1) % BLOCK_WORDS == 0 {
                samples.push(acc);
            }
        }
        if words.len() % BLOCK_WORDS != 0 {
            samples.push(acc);
        }
        Self { samples }
    }

    /// Returns the number of set bits in `bv` strictly before `pos`.
    ///
    /// The index must have been built for the current contents of `bv`.
    ///
    /// # Panics
    ///
    /// May panic if `pos > bv.len()` or the index is stale.
    #[inline]
    pub fn rank1(&self, bv: &BitVector, pos: usize) -> usize {
        debug_assert!(pos <= bv.len());
        let words = bv.words();
        let block = pos / BLOCK_BITS;
        let mut r = self.samples[block];
        let end = pos / WORD_LEN;
        for &w in &words[block * BLOCK_WORDS..end] {
            r += w.count_ones() as usize;
        }
        let rem = pos % WORD_LEN;
        if rem != 0 {
            r += (words[end] & ((1u64 << rem) - 1)).count_ones() as usize;
        }
        r
    }

    /// Returns the total number of set bits covered by the index.
    #[inline(always)]
    pub fn num_ones(&self) -> usize {
        self.samples.last().copied().unwrap_or(0)
    }

    /// Accounts for the bit at `pos` having been set (0 → 1) in place.
    pub fn increment_after(&mut self, pos: usize) {
        for s in self.samples.iter_mut().skip(pos / BLOCK_BITS + 1) {
            *s += 1;
        }
    }

    /// Accounts for the bit at `pos` having been cleared (1 → 0) in place.
    pub fn decrement_after(&mut self, pos: usize) {
        for s in self.samples.iter_mut().skip(pos / BLOCK_BITS + 1) {
            *s -= 1;
        }
    }

    /// Accounts for `bit` having been shift-inserted at `pos`. Must be
    /// called after the edit, with `bv` in its new state.
    ///
    /// Every sample whose boundary lies past `pos` gains the inserted bit
    /// and loses the bit that the shift carried across its boundary.
    pub fn note_inserted(&mut self, bv: &BitVector, pos: usize, bit: bool) {
        let total = self.num_ones() + usize::from(bit);
        for b in pos / BLOCK_BITS + 1..self.samples.len() {
            let boundary = b * BLOCK_BITS;
            // The bit now at the boundary crossed out of this prefix.
            let crossed = boundary < bv.len() && bv.bit(boundary);
            self.samples[b] += usize::from(bit);
            self.samples[b] -= usize::from(crossed);
        }
        while self.samples.len() < sample_len(bv.num_words()) {
            self.samples.push(total);
        }
    }

    /// Accounts for `bit` having been shift-removed from `pos`. Must be
    /// called after the edit, with `bv` in its new state.
    pub fn note_removed(&mut self, bv: &BitVector, pos: usize, bit: bool) {
        for b in pos / BLOCK_BITS + 1..self.samples.len() {
            let boundary = b * BLOCK_BITS;
            // The bit now just below the boundary crossed into this prefix.
            let crossed = boundary - 1 < bv.len() && bv.bit(boundary - 1);
            self.samples[b] += usize::from(crossed);
            self.samples[b] -= usize::from(bit);
        }
        self.samples.truncate(sample_len(bv.num_words()));
    }

    /// Drops all samples, keeping the allocated capacity.
    pub fn clear(&mut self) {
        self.samples.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaChaRng;

    fn assert_consistent(index: &RankIndex, bv: &BitVector) {
        let mut acc = 0;
        for pos in 0..=bv.len() {
            assert_eq!(index.rank1(bv, pos), acc, "pos {pos}");
            if pos < bv.len() && bv.bit(pos) {
                acc += 1;
            }
        }
        assert_eq!(index.num_ones(), bv.count_ones());
        assert_eq!(index.samples.len(), sample_len(bv.num_words()));
    }

    fn random_vector(len: usize, density: f64, seed: u64) -> BitVector {
        let mut rng = ChaChaRng::seed_from_u64(seed);
        let mut bv = BitVector::new();
        for _ in 0..len {
            bv.push_bit(rng.gen_bool(density));
        }
        bv
    }

    #[test]
    fn build_empty() {
        let bv = BitVector::new();
        let index = RankIndex::build(&bv);
        assert_eq!(index.rank1(&bv, 0), 0);
        assert_eq!(index.num_ones(), 0);
    }

    #[test]
    fn build_matches_naive() {
        for len in [1, 63, 64, 65, 511, 512, 513, 1500] {
            let bv = random_vector(len, 0.5, len as u64);
            assert_consistent(&RankIndex::build(&bv), &bv);
        }
    }

    #[test]
    fn set_and_clear_updates() {
        let mut bv = random_vector(1300, 0.3, 7);
        let mut index = RankIndex::build(&bv);
        for pos in [0, 511, 512, 700, 1299] {
            if bv.bit(pos) {
                bv.clear_bit(pos);
                index.decrement_after(pos);
            } else {
                bv.set_bit(pos);
                index.increment_after(pos);
            }
            assert_consistent(&index, &bv);
        }
    }

    #[test]
    fn insert_updates() {
        let mut rng = ChaChaRng::seed_from_u64(99);
        let mut bv = random_vector(1000, 0.5, 3);
        let mut index = RankIndex::build(&bv);
        for _ in 0..80 {
            let pos = rng.gen_range(0..=bv.len());
            let bit = rng.gen_bool(0.5);
            bv.insert_bit(pos, bit);
            index.note_inserted(&bv, pos, bit);
            assert_consistent(&index, &bv);
        }
    }

    #[test]
    fn remove_updates() {
        let mut rng = ChaChaRng::seed_from_u64(100);
        let mut bv = random_vector(1100, 0.5, 4);
        let mut index = RankIndex::build(&bv);
        while !bv.is_empty() {
            let pos = rng.gen_range(0..bv.len());
            let bit = bv.remove_bit(pos);
            index.note_removed(&bv, pos, bit);
            assert_consistent(&index, &bv);
        }
    }

    #[test]
    fn insert_grows_sample_vector() {
        let mut bv = random_vector(512, 1.0, 0);
        let mut index = RankIndex::build(&bv);
        assert_eq!(index.samples.len(), 2);
        bv.insert_bit(0, true);
        index.note_inserted(&bv, 0, true);
        assert_eq!(index.samples.len(), 3);
        assert_consistent(&index, &bv);
    }
}
