//! Hash expansion: element bytes to a four-word hash result, and a hash
//! result plus a round index to a bit position.
//!
//! The backend is chosen at compile time with exactly one of the `xxh3`,
//! `shake128` or `blake3` features. None of the backends is audited for
//! constant-time behavior, and neither is the `% m` reduction in [`location`].

#[cfg(all(feature = "xxh3", feature = "shake128"))]
compile_error!("Please choose one hash function to use: xxh3 or shake128.");
#[cfg(all(feature = "xxh3", feature = "blake3"))]
compile_error!("Please choose one hash function to use: xxh3 or blake3.");
#[cfg(all(feature = "shake128", feature = "blake3"))]
compile_error!("Please choose one hash function to use: shake128 or blake3.");
#[cfg(not(any(feature = "xxh3", feature = "shake128", feature = "blake3")))]
compile_error!("Please enable one hash function: xxh3, shake128 or blake3.");

/// Fixed-size digest derived once per element.
pub type HashResult = [u64; 4];

#[cfg(feature = "xxh3")]
use xxh3::hash64_with_seed;
#[cfg(feature = "xxh3")]
pub fn base_hashes(data: &[u8]) -> HashResult {
    [
        hash64_with_seed(data, 0),
        hash64_with_seed(data, 1),
        hash64_with_seed(data, 2),
        hash64_with_seed(data, 3),
    ]
}

#[cfg(feature = "shake128")]
use sha3::{
    digest::{ExtendableOutput, Update, XofReader},
    Shake128,
};
#[cfg(feature = "shake128")]
pub fn base_hashes(data: &[u8]) -> HashResult {
    let mut hasher = Shake128::default();
    hasher.update(data);
    let mut reader = hasher.finalize_xof();
    let mut res = [0u8; 32];
    reader.read(&mut res);

    words_from_digest(&res)
}

#[cfg(feature = "blake3")]
pub fn base_hashes(data: &[u8]) -> HashResult {
    let mut hasher = blake3::Hasher::new();
    hasher.update(data);
    let mut reader = hasher.finalize_xof();
    let mut res = [0u8; 32];
    reader.fill(&mut res);

    words_from_digest(&res)
}

#[cfg(any(feature = "shake128", feature = "blake3"))]
fn words_from_digest(digest: &[u8; 32]) -> HashResult {
    let mut words = [0u64; 4];
    for (word, chunk) in words.iter_mut().zip(digest.chunks_exact(8)) {
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(chunk);
        *word = u64::from_le_bytes(bytes);
    }
    words
}

/// Unreduced position for `round`, using enhanced double hashing over the
/// four words of `hashes`.
#[inline]
pub fn raw_location(hashes: &HashResult, round: u32) -> u64 {
    let r = round as u64;
    let base = hashes[(r % 2) as usize];
    let step = hashes[(2 + ((r + r % 2) % 4) / 2) as usize];
    base.wrapping_add(r.wrapping_mul(step))
}

/// Bit position in `0..m` for `round`. `m` must be nonzero.
#[inline]
pub fn location(hashes: &HashResult, round: u32, m: u64) -> u64 {
    raw_location(hashes, round) % m
}

/// All `k` bit positions of `data` in a filter of `m` bits.
pub fn locations(data: &[u8], k: u32, m: u64) -> Vec<u64> {
    let hashes = base_hashes(data);
    (0..k).map(|round| location(&hashes, round, m)).collect()
}
