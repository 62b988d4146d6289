//! Public-key recovery from an x-only key

use crate::constants;
use crate::field::FieldElement;
use crate::point::AffinePoint;

/// Reconstructs the even-y curve point with the given x-coordinate
///
/// Solves y^2 = x^3 + 7. Returns `None` when the right-hand side is a
/// quadratic non-residue, i.e. no point with this x exists. Of the two
/// roots y and p - y, the even one is chosen.
pub fn lift_x(x: &FieldElement) -> Option<AffinePoint> {
    let rhs = x.square() * *x + FieldElement::from_u64(constants::B);
    let y = rhs.sqrt()?;
    let y = if y.is_odd() { -y } else { y };
    Some(AffinePoint { x: *x, y })
}

/// Decodes a 32-byte big-endian x-only key and lifts it
///
/// Encodings of x >= p are rejected rather than reduced.
pub fn lift_x_bytes(bytes: &[u8; 32]) -> Option<AffinePoint> {
    let x = FieldElement::from_canonical_be_bytes(bytes)?;
    lift_x(&x)
}
