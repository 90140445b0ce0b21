//! Bloom filter whose membership test does not leak the tested element, or the
//! answer, through timing.
//!
//! ```
//! use ct_bloom::BloomFilter;
//!
//! let mut filter = BloomFilter::new(1000, 4);
//! filter.add(b"Bess");
//!
//! assert!(filter.constant_time_test(b"Bess"));
//! assert!(!filter.constant_time_test(b"Emma"));
//! ```

pub mod bit_array;
pub mod bloom_filters;
pub mod constant_time;
pub mod encoding;
pub mod errors;
pub mod hashing;

pub use bit_array::BitArray;
pub use bloom_filters::{constant_time_contains, estimate_parameters, word_mask, BloomFilter};
pub use errors::{FilterError, Result};
pub use hashing::{base_hashes, location, locations, HashResult};
