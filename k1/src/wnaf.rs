//! Windowed non-adjacent form scalar multiplication
//!
//! A scalar is recoded into signed odd digits in [-15, 15] such that any
//! nonzero digit is followed by at least four zeros. The eight positive odd
//! multiples P, 3P, ..., 15P are precomputed; a negative digit adds the
//! negated table entry, which costs one field negation.
//!
//! Evaluating the recoding from the top digit down takes one doubling per
//! digit and, on average, one addition per six digits.

use crate::bigint::{U256, U320};
use crate::field::Scalar;
use crate::point::JacobianPoint;

/// Number of precomputed odd multiples
pub const TABLE_SIZE: usize = 8;

/// Window width of the recoding (digits fit in WINDOW bits with sign)
pub const WINDOW: u32 = 5;

/// Upper bound on the recoding length of a 256-bit scalar
pub const MAX_DIGITS: usize = 257;

/// Signed-digit recoding of a scalar, least significant digit first
#[derive(Clone, Debug)]
pub struct Wnaf {
    digits: [i8; MAX_DIGITS],
    len: usize,
}

impl Wnaf {
    /// Recodes `k`
    ///
    /// Scans from the least significant bit. On an odd remainder the low
    /// WINDOW bits are taken as a signed digit in (-16, 16), subtracted out,
    /// and the remainder shifted right by one bit per step.
    pub fn new(k: &U256) -> Self {
        let mut digits = [0i8; MAX_DIGITS];
        let mut rest: U320 = k.resize();
        let mut len = 0;

        while !rest.is_zero() && len < MAX_DIGITS {
            if rest.is_odd() {
                let window = (rest.limbs()[0] & ((1 << WINDOW) - 1)) as i8;
                let digit = if window >= 16 { window - 32 } else { window };
                rest = if digit > 0 {
                    rest.sub_small(digit as u64).0
                } else {
                    rest.add_small(digit.unsigned_abs() as u64).0
                };
                digits[len] = digit;
            }
            rest = rest.shr1();
            len += 1;
        }

        Self { digits, len }
    }

    /// Digits, least significant first
    pub fn digits(&self) -> &[i8] {
        &self.digits[..self.len]
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// The odd multiples 1P, 3P, ..., 15P of a point
#[derive(Clone, Debug)]
pub struct OddMultiples {
    points: [JacobianPoint; TABLE_SIZE],
}

impl OddMultiples {
    /// Builds the table with one doubling and seven additions
    pub fn new(p: &JacobianPoint) -> Self {
        let two_p = p.double();
        let mut points = [*p; TABLE_SIZE];
        for i in 1..TABLE_SIZE {
            points[i] = points[i - 1].add(&two_p);
        }
        Self { points }
    }

    /// Point for an odd digit `d`, negated when `d < 0`
    #[inline]
    pub fn select(&self, digit: i8) -> JacobianPoint {
        let idx = (digit.unsigned_abs() as usize - 1) / 2;
        if digit < 0 {
            self.points[idx].neg()
        } else {
            self.points[idx]
        }
    }

    /// The tabulated point itself (1P)
    pub fn base(&self) -> &JacobianPoint {
        &self.points[0]
    }
}

/// Evaluates k * P from a prepared table
pub fn scalar_mul_with_table(k: &Scalar, table: &OddMultiples) -> JacobianPoint {
    let naf = Wnaf::new(k.value());
    let mut acc = JacobianPoint::infinity();

    for &digit in naf.digits().iter().rev() {
        acc = acc.double();
        if digit != 0 {
            acc = acc.add(&table.select(digit));
        }
    }

    acc
}

/// Computes k * P
pub fn scalar_mul(k: &Scalar, p: &JacobianPoint) -> JacobianPoint {
    if k.is_zero() || p.is_infinity() {
        return JacobianPoint::infinity();
    }
    scalar_mul_with_table(k, &OddMultiples::new(p))
}
