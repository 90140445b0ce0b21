use crate::bit_array::{BitArray, WORD_BITS};
use crate::constant_time::{ct_eq_u64, ct_shl_u64};
use crate::errors::{FilterError, Result};
use crate::hashing::{base_hashes, location, HashResult};
use core::hint::black_box;
use std::f64::consts::LN_2;
use tracing::debug;

/// Returns (`bit_count`, `hash_count`) for a filter expected to hold `element_count` elements
/// with a false positive rate of at most `error_rate`.
pub fn estimate_parameters(element_count: u64, error_rate: f64) -> Result<(u64, u32)> {
    if element_count == 0 || !(error_rate > 0.0 && error_rate < 1.0) {
        return Err(FilterError::InvalidEstimate {
            n: element_count,
            p: error_rate,
        });
    }

    let n = element_count as f64;
    let m = (-n * error_rate.ln() / (LN_2 * LN_2)).ceil();
    // Too many bits to count in a u64
    if m >= u64::MAX as f64 {
        return Err(FilterError::InvalidEstimate {
            n: element_count,
            p: error_rate,
        });
    }
    let k = (LN_2 * m / n).ceil();

    Ok((m as u64, k as u32))
}

/// Mask of the bits in word `word_index` claimed by the `hash_count` positions of `hashes`.
///
/// Every round is evaluated for every word: whether a position lands in this
/// word only decides whether a 1 or a 0 is shifted into the mask, and the
/// shift amount goes through [`ct_shl_u64`].
#[inline]
pub fn word_mask(hashes: &HashResult, hash_count: u32, bit_count: u64, word_index: u64) -> u64 {
    let mut mask = 0u64;
    for round in 0..hash_count {
        let position = location(hashes, round, bit_count);
        let hit = ct_eq_u64(position / WORD_BITS, word_index);
        mask |= ct_shl_u64(hit, position % WORD_BITS);
    }
    mask
}

/// Constant-time membership test over an arbitrary sequence of filter words.
///
/// Reads every word exactly once, in order, and accumulates the claimed bits
/// that are unset. The accumulator is only inspected after the full pass.
pub fn constant_time_contains<'a, W>(
    words: W,
    hashes: &HashResult,
    hash_count: u32,
    bit_count: u64,
) -> bool
where
    W: IntoIterator<Item = &'a u64>,
{
    let mut missing = 0u64;
    for (index, word) in words.into_iter().enumerate() {
        missing |= !*word & word_mask(hashes, hash_count, bit_count, index as u64);
    }
    ct_eq_u64(black_box(missing), 0) == 1
}

/// Bloom filter over byte strings with `m` bits and `k` hash rounds.
///
/// [`BloomFilter::constant_time_test`] is the only operation whose running
/// time is independent of the element and the outcome. In particular
/// [`BloomFilter::add`] and [`BloomFilter::test`] leak information about the
/// data through timing.
#[derive(PartialEq, Debug, Clone)]
pub struct BloomFilter {
    k: u32,
    bits: BitArray,
}

impl BloomFilter {
    /// Both `m` and `k` are raised to at least 1.
    pub fn new(m: u64, k: u32) -> Self {
        let m = m.max(1);
        let k = k.max(1);
        debug!(m, k, "creating bloom filter");

        BloomFilter {
            k,
            bits: BitArray::new(m),
        }
    }

    pub fn with_estimates(element_count: u64, error_rate: f64) -> Result<Self> {
        let (m, k) = estimate_parameters(element_count, error_rate)?;
        debug!(element_count, error_rate, m, k, "estimated bloom filter parameters");
        Ok(BloomFilter::new(m, k))
    }

    pub(crate) fn from_parts(k: u32, bits: BitArray) -> Self {
        BloomFilter { k, bits }
    }

    /// Number of bits, `m`.
    pub fn cap(&self) -> u64 {
        self.bits.len()
    }

    pub fn k(&self) -> u32 {
        self.k
    }

    pub fn bit_array(&self) -> &BitArray {
        &self.bits
    }

    pub fn add(&mut self, data: &[u8]) -> &mut Self {
        let hashes = base_hashes(data);
        let m = self.cap();
        for round in 0..self.k {
            self.bits.set(location(&hashes, round, m));
        }
        self
    }

    /// Variable-time membership test. Returns on the first unset bit.
    pub fn test(&self, data: &[u8]) -> bool {
        let hashes = base_hashes(data);

        for round in 0..self.k {
            if !self.bits.get(location(&hashes, round, self.cap())) {
                return false;
            }
        }

        true
    }

    /// Adds `data` and returns whether it was possibly present before.
    pub fn test_and_add(&mut self, data: &[u8]) -> bool {
        let present = self.test(data);
        self.add(data);
        present
    }

    /// Returns true if `data` is possibly in the filter, false if it is definitely not.
    ///
    /// Runs without leaking information about `data` or the result through
    /// timing: the whole bit array is scanned and every hash round is
    /// evaluated against every word, using only branchless primitives. The
    /// cost is `O(words * k)` instead of `O(k)`.
    ///
    /// The hash backend and the position reduction are not themselves
    /// audited, so a residual leak through them is possible.
    pub fn constant_time_test(&self, data: &[u8]) -> bool {
        let hashes = base_hashes(data);
        constant_time_contains(self.bits.words(), &hashes, self.k, self.cap())
    }

    pub fn clear(&mut self) -> &mut Self {
        self.bits.clear();
        self
    }

    /// Unions `other` into this filter. Both must have the same `m` and `k`.
    pub fn merge(&mut self, other: &BloomFilter) -> Result<()> {
        if self.cap() != other.cap() {
            return Err(FilterError::MismatchedCapacity {
                left: self.cap(),
                right: other.cap(),
            });
        }
        if self.k != other.k {
            return Err(FilterError::MismatchedHashCount {
                left: self.k,
                right: other.k,
            });
        }

        self.bits.union_with(&other.bits);
        debug!(m = self.cap(), k = self.k, "merged bloom filters");
        Ok(())
    }

    /// Estimated number of distinct elements added, from the fraction of set bits.
    pub fn approximated_size(&self) -> u64 {
        let m = self.cap() as f64;
        let x = self.bits.count_ones() as f64;
        let estimate = -(m / self.k as f64) * (1.0 - x / m).ln();
        // A full filter gives ln(0); report the largest representable size
        if estimate.is_finite() {
            estimate.round() as u64
        } else {
            u64::MAX
        }
    }

    /// Theoretical false positive rate after `element_count` insertions.
    pub fn false_positive_rate(&self, element_count: u64) -> f64 {
        let k = self.k as f64;
        (1.0 - (-k * element_count as f64 / self.cap() as f64).exp()).powf(k)
    }
}
