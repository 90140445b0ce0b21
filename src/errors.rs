use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum FilterError {
    /// `n` was zero, `p` was outside the open interval (0, 1), or the
    /// resulting bit count does not fit in a `u64`.
    #[error("cannot estimate parameters for n = {n}, p = {p}")]
    InvalidEstimate { n: u64, p: f64 },

    /// Merging filters with different bit counts.
    #[error("bit counts do not match: {left} != {right}")]
    MismatchedCapacity { left: u64, right: u64 },

    /// Merging filters with different hash counts.
    #[error("hash counts do not match: {left} != {right}")]
    MismatchedHashCount { left: u32, right: u32 },

    /// Encoded input shorter or longer than its header announces.
    #[error("truncated input: expected {expected} bytes, got {actual}")]
    Truncated { expected: usize, actual: usize },

    /// Encoded header or words that cannot describe a filter.
    #[error("invalid layout: {0}")]
    InvalidLayout(String),
}

pub type Result<T> = std::result::Result<T, FilterError>;
