//! Flat binary encoding of a [`BloomFilter`]: `m`, `k`, then every word, each
//! as an 8-byte big-endian `u64`.

use crate::bit_array::{word_count, BitArray};
use crate::bloom_filters::BloomFilter;
use crate::errors::{FilterError, Result};
use byteorder::{BigEndian, ByteOrder};
use tracing::{debug, warn};

const FIELD_BYTES: usize = 8;
const HEADER_BYTES: usize = 2 * FIELD_BYTES;

/// Total encoded size for a filter of `m` bits, if it fits in memory at all.
fn encoded_len(m: u64) -> Option<usize> {
    usize::try_from(word_count(m))
        .ok()?
        .checked_mul(FIELD_BYTES)?
        .checked_add(HEADER_BYTES)
}

impl BloomFilter {
    pub fn to_bytes(&self) -> Vec<u8> {
        let words = self.bit_array().words();
        let mut out = vec![0u8; HEADER_BYTES + words.len() * FIELD_BYTES];

        let values = [self.cap(), self.k() as u64]
            .into_iter()
            .chain(words.iter().copied());
        for (field, value) in out.chunks_exact_mut(FIELD_BYTES).zip(values) {
            BigEndian::write_u64(field, value);
        }

        out
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<BloomFilter> {
        if bytes.len() < HEADER_BYTES {
            return Err(FilterError::Truncated {
                expected: HEADER_BYTES,
                actual: bytes.len(),
            });
        }

        let m = BigEndian::read_u64(&bytes[..FIELD_BYTES]);
        let k = BigEndian::read_u64(&bytes[FIELD_BYTES..HEADER_BYTES]);
        if m == 0 || k == 0 || k > u32::MAX as u64 {
            warn!(m, k, "rejecting encoded bloom filter");
            return Err(FilterError::InvalidLayout(format!(
                "unusable parameters m = {}, k = {}",
                m, k
            )));
        }

        let expected = match encoded_len(m) {
            Some(expected) => expected,
            None => {
                warn!(m, "encoded bit count cannot be addressed");
                return Err(FilterError::InvalidLayout(format!(
                    "{} bits do not fit in memory",
                    m
                )));
            }
        };
        if bytes.len() != expected {
            warn!(m, expected, actual = bytes.len(), "encoded word count mismatch");
            return Err(FilterError::Truncated {
                expected,
                actual: bytes.len(),
            });
        }

        let words = bytes[HEADER_BYTES..]
            .chunks_exact(FIELD_BYTES)
            .map(BigEndian::read_u64)
            .collect();
        let bits = BitArray::from_words(m, words)?;

        debug!(m, k, "decoded bloom filter");
        Ok(BloomFilter::from_parts(k as u32, bits))
    }
}
