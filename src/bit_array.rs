use crate::errors::{FilterError, Result};

pub const WORD_BITS: u64 = 64;

/// Number of `u64` words needed to hold `len` bits.
pub fn word_count(len: u64) -> u64 {
    len / WORD_BITS + (len % WORD_BITS != 0) as u64
}

/// Fixed-length bit array backed by 64-bit words.
///
/// Bit `i` lives in word `i / 64` at offset `i % 64`. Bits past `len` in the
/// last word are always zero.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct BitArray {
    len: u64,
    words: Vec<u64>,
}

impl BitArray {
    /// Panics like `Vec` allocation does when `len` bits cannot be addressed.
    pub fn new(len: u64) -> Self {
        let count = usize::try_from(word_count(len)).unwrap_or(usize::MAX);
        BitArray {
            len,
            words: vec![0; count],
        }
    }

    pub fn from_words(len: u64, words: Vec<u64>) -> Result<Self> {
        if words.len() as u64 != word_count(len) {
            return Err(FilterError::InvalidLayout(format!(
                "{} bits need {} words, got {}",
                len,
                word_count(len),
                words.len()
            )));
        }

        let tail = len % WORD_BITS;
        if tail != 0 {
            if let Some(last) = words.last() {
                if last >> tail != 0 {
                    return Err(FilterError::InvalidLayout(format!(
                        "bits set past position {}",
                        len
                    )));
                }
            }
        }

        Ok(BitArray { len, words })
    }

    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn words(&self) -> &[u64] {
        &self.words
    }

    pub fn set(&mut self, index: u64) {
        assert!(index < self.len, "bit {} out of range {}", index, self.len);
        self.words[(index / WORD_BITS) as usize] |= 1u64 << (index % WORD_BITS);
    }

    pub fn get(&self, index: u64) -> bool {
        assert!(index < self.len, "bit {} out of range {}", index, self.len);
        self.words[(index / WORD_BITS) as usize] & (1u64 << (index % WORD_BITS)) != 0
    }

    pub fn count_ones(&self) -> u64 {
        self.words.iter().map(|word| word.count_ones() as u64).sum()
    }

    pub fn clear(&mut self) {
        self.words.iter_mut().for_each(|word| *word = 0);
    }

    /// In-place union. Both arrays must have the same length.
    pub fn union_with(&mut self, other: &BitArray) {
        assert_eq!(self.len, other.len);

        for (word, other_word) in self.words.iter_mut().zip(&other.words) {
            *word |= other_word;
        }
    }
}
