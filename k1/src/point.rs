//! secp256k1 points in Jacobian coordinates
//!
//! A Jacobian triple (X, Y, Z) stands for the affine point (X/Z^2, Y/Z^3).
//! Z = 0 encodes the point at infinity. Keeping intermediate results in
//! this form avoids one field inversion per group operation; the single
//! inversion happens in `to_affine`.

use crate::constants;
use crate::field::FieldElement;

/// A point in affine coordinates
///
/// The point at infinity has no affine form; by convention it converts to
/// (0, 0), which is not on the curve, so callers check `is_infinity` first.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AffinePoint {
    pub x: FieldElement,
    pub y: FieldElement,
}

impl AffinePoint {
    /// Checks y^2 = x^3 + 7
    pub fn is_on_curve(&self) -> bool {
        let rhs = self.x.square() * self.x + FieldElement::from_u64(constants::B);
        self.y.square() == rhs
    }
}

/// A point in Jacobian coordinates
#[derive(Clone, Copy, Debug)]
pub struct JacobianPoint {
    pub x: FieldElement,
    pub y: FieldElement,
    pub z: FieldElement,
}

impl JacobianPoint {
    pub const fn infinity() -> Self {
        Self {
            x: FieldElement::one(),
            y: FieldElement::one(),
            z: FieldElement::zero(),
        }
    }

    #[inline]
    pub fn is_infinity(&self) -> bool {
        self.z.is_zero()
    }

    /// Lifts (x, y) to (x, y, 1)
    pub fn from_affine(p: &AffinePoint) -> Self {
        Self {
            x: p.x,
            y: p.y,
            z: FieldElement::one(),
        }
    }

    /// Projects back to affine coordinates with one inversion
    pub fn to_affine(&self) -> AffinePoint {
        let z_inv = match self.z.invert() {
            Some(inv) => inv,
            None => {
                return AffinePoint {
                    x: FieldElement::zero(),
                    y: FieldElement::zero(),
                }
            }
        };
        let z_inv2 = z_inv.square();
        AffinePoint {
            x: self.x * z_inv2,
            y: self.y * z_inv2 * z_inv,
        }
    }

    /// Point doubling for a curve with a = 0
    ///
    /// ```text
    /// A = Y^2, B = 4XA, C = 8A^2, D = 3X^2
    /// X' = D^2 - 2B, Y' = D(B - X') - C, Z' = 2YZ
    /// ```
    pub fn double(&self) -> Self {
        if self.is_infinity() {
            return *self;
        }

        let a = self.y.square();
        let b = (self.x * a).mul_small(4);
        let c = a.square().mul_small(8);
        let d = self.x.square().mul_small(3);
        let e = d.square();
        let f = e - b.double();

        Self {
            x: f,
            y: d * (b - f) - c,
            z: (self.y * self.z).double(),
        }
    }

    /// General point addition
    ///
    /// Falls back to `double` when both inputs are the same point and
    /// returns infinity when they are inverses of each other.
    pub fn add(&self, other: &Self) -> Self {
        if self.is_infinity() {
            return *other;
        }
        if other.is_infinity() {
            return *self;
        }

        let z1z1 = self.z.square();
        let z2z2 = other.z.square();
        let u1 = self.x * z2z2;
        let u2 = other.x * z1z1;
        let s1 = self.y * z2z2 * other.z;
        let s2 = other.y * z1z1 * self.z;

        if u1 == u2 {
            return if s1 == s2 {
                self.double()
            } else {
                Self::infinity()
            };
        }

        let h = u2 - u1;
        let r = s2 - s1;
        let h2 = h.square();
        let h3 = h2 * h;
        let u1h2 = u1 * h2;

        let x3 = r.square() - h3 - u1h2.double();
        let y3 = r * (u1h2 - x3) - s1 * h3;
        let z3 = self.z * other.z * h;

        Self {
            x: x3,
            y: y3,
            z: z3,
        }
    }

    pub fn neg(&self) -> Self {
        Self {
            x: self.x,
            y: -self.y,
            z: self.z,
        }
    }

    /// Projective equality: compares X1*Z2^2 with X2*Z1^2 and Y1*Z2^3 with Y2*Z1^3
    pub fn eq_projective(&self, other: &Self) -> bool {
        match (self.is_infinity(), other.is_infinity()) {
            (true, true) => return true,
            (false, false) => {}
            _ => return false,
        }
        let z1z1 = self.z.square();
        let z2z2 = other.z.square();
        self.x * z2z2 == other.x * z1z1
            && self.y * z2z2 * other.z == other.y * z1z1 * self.z
    }
}

impl PartialEq for JacobianPoint {
    fn eq(&self, other: &Self) -> bool {
        self.eq_projective(other)
    }
}

impl Eq for JacobianPoint {}
