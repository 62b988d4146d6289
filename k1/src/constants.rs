//! secp256k1 domain parameters
//!
//! Raw values are plain `const` limb arrays (least significant limb first).
//! `CurveConstants` bundles them with the generator and its precomputed
//! odd-multiples table; it is built once on first use and only ever handed
//! out by shared reference.

use crate::bigint::U256;
use crate::field::FieldElement;
use crate::point::{AffinePoint, JacobianPoint};
use crate::wnaf::OddMultiples;
use once_cell::sync::Lazy;

/// p = 2^256 - 2^32 - 977
pub const P: U256 = U256::from_limbs([
    0xFFFFFFFEFFFFFC2F,
    0xFFFFFFFFFFFFFFFF,
    0xFFFFFFFFFFFFFFFF,
    0xFFFFFFFFFFFFFFFF,
]);

/// 2^256 - p
pub const P_FOLD: U256 = U256::from_limbs([0x00000001000003D1, 0, 0, 0]);

pub const P_MINUS_2: U256 = U256::from_limbs([
    0xFFFFFFFEFFFFFC2D,
    0xFFFFFFFFFFFFFFFF,
    0xFFFFFFFFFFFFFFFF,
    0xFFFFFFFFFFFFFFFF,
]);

/// (p + 1) / 4, the square-root exponent
pub const P_PLUS_1_DIV_4: U256 = U256::from_limbs([
    0xFFFFFFFFBFFFFF0C,
    0xFFFFFFFFFFFFFFFF,
    0xFFFFFFFFFFFFFFFF,
    0x3FFFFFFFFFFFFFFF,
]);

/// Group order n
pub const N: U256 = U256::from_limbs([
    0xBFD25E8CD0364141,
    0xBAAEDCE6AF48A03B,
    0xFFFFFFFFFFFFFFFE,
    0xFFFFFFFFFFFFFFFF,
]);

/// 2^256 - n
pub const N_FOLD: U256 = U256::from_limbs([0x402DA1732FC9BEBF, 0x4551231950B75FC4, 0x1, 0]);

pub const N_MINUS_2: U256 = U256::from_limbs([
    0xBFD25E8CD036413F,
    0xBAAEDCE6AF48A03B,
    0xFFFFFFFFFFFFFFFE,
    0xFFFFFFFFFFFFFFFF,
]);

pub const GX: U256 = U256::from_limbs([
    0x59F2815B16F81798,
    0x029BFCDB2DCE28D9,
    0x55A06295CE870B07,
    0x79BE667EF9DCBBAC,
]);

pub const GY: U256 = U256::from_limbs([
    0x9C47D08FFB10D4B8,
    0xFD17B448A6855419,
    0x5DA4FBFC0E1108A8,
    0x483ADA7726A3C465,
]);

/// Curve coefficient b in y^2 = x^3 + b
pub const B: u64 = 7;

/// Process-wide, read-only curve parameters
///
/// Every verification lane receives `&CurveConstants`; nothing in it is
/// mutated after construction.
#[derive(Debug)]
pub struct CurveConstants {
    pub p: U256,
    pub n: U256,
    pub generator: AffinePoint,
    /// 1G, 3G, ..., 15G for the fixed-base half of verification
    pub generator_table: OddMultiples,
}

static CURVE: Lazy<CurveConstants> = Lazy::new(CurveConstants::build);

impl CurveConstants {
    /// Returns the shared instance, building it on first call
    pub fn get() -> &'static CurveConstants {
        &CURVE
    }

    fn build() -> Self {
        let generator = AffinePoint {
            x: FieldElement::from_u256_reduced(GX),
            y: FieldElement::from_u256_reduced(GY),
        };
        let generator_table = OddMultiples::new(&JacobianPoint::from_affine(&generator));
        log::debug!("secp256k1 constants initialised");

        Self {
            p: P,
            n: N,
            generator,
            generator_table,
        }
    }
}
