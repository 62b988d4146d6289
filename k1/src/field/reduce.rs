//! Reduction of 512-bit products modulo `2^256 - c`
//!
//! Writing a product as `hi * 2^256 + lo`, the identity `2^256 = c (mod m)`
//! gives `hi * 2^256 + lo = lo + hi * c (mod m)`. One fold shrinks the high
//! half by roughly `256 - bits(c)` bits, so it is repeated until the high half
//! vanishes. What is left is below `2^256 < 2m` and needs at most one
//! subtraction of m, but the loop form is kept so the result is canonical for
//! any input.

use crate::bigint::{U256, U512};
use std::cmp::Ordering;

/// Reduces `wide` modulo `modulus = 2^256 - fold`
///
/// `fold` must be below 2^255 so every fold strictly shrinks the value.
pub fn reduce_wide(wide: &U512, modulus: &U256, fold: &U256) -> U256 {
    let (mut lo, mut hi) = wide.split();

    while !hi.is_zero() {
        let (sum, _) = hi.mul_wide(fold).add_with_carry(&lo.widen());
        (lo, hi) = sum.split();
    }

    while lo.compare(modulus) != Ordering::Less {
        lo = lo.sub_with_borrow(modulus).0;
    }

    lo
}
