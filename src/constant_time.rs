//! Branchless primitives used by the constant-time membership test.
//!
//! Every function performs the same sequence of operations for all operand
//! values. Results that encode a condition are always exactly 0 or 1, and
//! functions taking such a condition require it to be 0 or 1.
//!
//! All arithmetic is on `u64` with explicit wrapping, the equality trick
//! relies on `0u64.wrapping_sub(1)` being all-ones.

use core::hint::black_box;

/// Partial shift amounts applied by [`ct_shl_u64`], largest first.
const SHIFT_STEPS: [u64; 6] = [32, 16, 8, 4, 2, 1];

/// Returns 1 if x == y, 0 otherwise (constant-time)
#[inline]
pub fn ct_eq_u64(x: u64, y: u64) -> u64 {
    let diff = black_box(x ^ y);
    // Top bit is set only when diff == 0, because 0 - 1 wraps to all-ones
    let is_zero = !diff & diff.wrapping_sub(1);
    (is_zero >> 63) & 1
}

/// Branchless select: returns x if cond is 1, y if cond is 0
/// cond must be 0 or 1
#[inline]
pub fn ct_select_u64(cond: u64, x: u64, y: u64) -> u64 {
    debug_assert!(cond <= 1, "ct_select_u64: cond must be 0 or 1");

    // cond = 0 -> mask = u64::MAX, cond = 1 -> mask = 0
    let mask = black_box(cond).wrapping_sub(1);
    (!mask & x) | (mask & y)
}

/// Returns 1 if a <= b, 0 otherwise (constant-time)
#[inline]
pub fn ct_le_u64(a: u64, b: u64) -> u64 {
    // Borrow bit of b - a, set exactly when b < a
    let borrow = ((!b) & a) | (((!b) ^ a) & b.wrapping_sub(a));
    1 ^ (borrow >> 63)
}

/// Returns `x << amount` for `amount` in `0..64`.
///
/// The shift is assembled from the fixed steps 32, 16, 8, 4, 2 and 1. All six
/// steps are evaluated on every call and each one is kept or discarded with
/// [`ct_select_u64`], so the instruction stream does not depend on `amount`.
/// This matters on cores without a barrel shifter, where a variable shift
/// count can show up in the latency.
///
/// `amount` must be below 64; larger values produce an unspecified result.
#[inline]
pub fn ct_shl_u64(x: u64, amount: u64) -> u64 {
    debug_assert!(amount < 64, "ct_shl_u64: amount must be below 64");

    let mut x = x;
    let mut remaining = amount;
    for &step in SHIFT_STEPS.iter() {
        let apply = ct_le_u64(step, remaining);
        x = ct_select_u64(apply, x << step, x);
        remaining = remaining.wrapping_sub(step & apply.wrapping_neg());
    }
    x
}
