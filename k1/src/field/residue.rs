//! Residues modulo a compile-time secp256k1 modulus
//!
//! `Residue<C>` stores a 256-bit value that is always fully reduced into
//! `[0, m)`. Every operation returns a reduced value; unreduced 512-bit
//! products exist only inside `mul` and `square`.

use super::config::{ModulusConfig, Secp256k1N, Secp256k1P};
use super::reduce::reduce_wide;
use crate::bigint::U256;
use crate::constants;
use std::cmp::Ordering;
use std::fmt;
use std::marker::PhantomData;
use std::ops::{Add, Mul, Neg, Sub};

/// An integer modulo `C::MODULUS`
///
/// # Type Parameters
/// - `C`: modulus configuration (see `ModulusConfig`)
///
/// # Compile-time Safety
/// `FieldElement` and `Scalar` are distinct instantiations, so adding a
/// scalar to a coordinate is a type error rather than a silent wrong result.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Residue<C: ModulusConfig> {
    value: U256,
    _config: PhantomData<C>,
}

/// Element of the secp256k1 base field (mod p)
pub type FieldElement = Residue<Secp256k1P>;

/// Element of the secp256k1 scalar field (mod n)
pub type Scalar = Residue<Secp256k1N>;

impl<C: ModulusConfig> Residue<C> {
    #[inline]
    const fn from_reduced(value: U256) -> Self {
        Self {
            value,
            _config: PhantomData,
        }
    }

    pub const fn zero() -> Self {
        Self::from_reduced(U256::zero())
    }

    pub const fn one() -> Self {
        Self::from_reduced(U256::one())
    }

    /// Creates a residue from a small integer (must be below the modulus,
    /// which every u64 is)
    pub const fn from_u64(val: u64) -> Self {
        Self::from_reduced(U256::from_u64(val))
    }

    /// Accepts `value` only if it is already canonical (`< m`)
    pub fn from_canonical(value: U256) -> Option<Self> {
        if value.compare(&C::MODULUS) == Ordering::Less {
            Some(Self::from_reduced(value))
        } else {
            None
        }
    }

    /// Reduces an arbitrary 256-bit value modulo m
    ///
    /// Since `2^256 < 2m` for both moduli, one conditional subtraction
    /// suffices.
    pub fn from_u256_reduced(value: U256) -> Self {
        if value.compare(&C::MODULUS) == Ordering::Less {
            Self::from_reduced(value)
        } else {
            Self::from_reduced(value.sub_with_borrow(&C::MODULUS).0)
        }
    }

    /// Decodes 32 big-endian bytes, reducing modulo m
    pub fn from_be_bytes_reduced(bytes: &[u8; 32]) -> Self {
        Self::from_u256_reduced(U256::from_be_bytes(bytes))
    }

    /// Decodes 32 big-endian bytes, rejecting values `>= m`
    pub fn from_canonical_be_bytes(bytes: &[u8; 32]) -> Option<Self> {
        Self::from_canonical(U256::from_be_bytes(bytes))
    }

    pub fn to_be_bytes(&self) -> [u8; 32] {
        self.value.to_be_bytes()
    }

    /// The canonical integer representative in `[0, m)`
    #[inline]
    pub fn value(&self) -> &U256 {
        &self.value
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.value.is_zero()
    }

    #[inline]
    pub fn is_odd(&self) -> bool {
        self.value.is_odd()
    }

    /// Orders by canonical representative
    pub fn compare(&self, other: &Self) -> Ordering {
        self.value.compare(&other.value)
    }

    pub fn double(&self) -> Self {
        *self + *self
    }

    pub fn square(&self) -> Self {
        let wide = self.value.square_wide();
        Self::from_reduced(reduce_wide(&wide, &C::MODULUS, &C::FOLD))
    }

    /// Multiplies by a small constant
    pub fn mul_small(&self, k: u64) -> Self {
        *self * Self::from_u64(k)
    }

    /// Raises to a fixed 256-bit exponent
    ///
    /// Left-to-right binary exponentiation over all 256 exponent bits: one
    /// squaring per bit, one multiplication per set bit.
    pub fn pow(&self, exponent: &U256) -> Self {
        let mut acc = Self::one();
        for i in (0..U256::BITS).rev() {
            acc = acc.square();
            if exponent.bit(i) {
                acc = acc * *self;
            }
        }
        acc
    }

    /// Multiplicative inverse via Fermat's little theorem, `a^(m-2)`
    ///
    /// Zero has no inverse; `None` is returned instead of a meaningless value.
    pub fn invert(&self) -> Option<Self> {
        if self.is_zero() {
            return None;
        }
        Some(self.pow(&C::INVERSE_EXPONENT))
    }
}

impl FieldElement {
    /// Square root for p = 3 (mod 4)
    ///
    /// The candidate `a^((p+1)/4)` is squared and compared against `a`; a
    /// mismatch means `a` is a quadratic non-residue and `None` is returned.
    pub fn sqrt(&self) -> Option<Self> {
        let candidate = self.pow(&constants::P_PLUS_1_DIV_4);
        if candidate.square() == *self {
            Some(candidate)
        } else {
            None
        }
    }
}

impl<C: ModulusConfig> Default for Residue<C> {
    fn default() -> Self {
        Self::zero()
    }
}

// Addition with a single conditional correction; both operands are < m
impl<C: ModulusConfig> Add for Residue<C> {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        let (sum, carry) = self.value.add_with_carry(&other.value);
        if carry || sum.compare(&C::MODULUS) != Ordering::Less {
            Self::from_reduced(sum.sub_with_borrow(&C::MODULUS).0)
        } else {
            Self::from_reduced(sum)
        }
    }
}

// Subtraction adds m back on underflow
impl<C: ModulusConfig> Sub for Residue<C> {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        let (diff, borrow) = self.value.sub_with_borrow(&other.value);
        if borrow {
            Self::from_reduced(diff.add_with_carry(&C::MODULUS).0)
        } else {
            Self::from_reduced(diff)
        }
    }
}

impl<C: ModulusConfig> Mul for Residue<C> {
    type Output = Self;

    fn mul(self, other: Self) -> Self {
        let wide = self.value.mul_wide(&other.value);
        Self::from_reduced(reduce_wide(&wide, &C::MODULUS, &C::FOLD))
    }
}

// -a = m - a, with -0 = 0
impl<C: ModulusConfig> Neg for Residue<C> {
    type Output = Self;

    fn neg(self) -> Self {
        if self.is_zero() {
            self
        } else {
            Self::from_reduced(C::MODULUS.sub_with_borrow(&self.value).0)
        }
    }
}

impl<C: ModulusConfig> fmt::Debug for Residue<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(0x{})", C::NAME, self.value.to_hex())
    }
}

impl<C: ModulusConfig> fmt::Display for Residue<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_bigint::BigUint;
    use rand::Rng;

    fn big<C: ModulusConfig>(x: &Residue<C>) -> BigUint {
        BigUint::from_bytes_be(&x.to_be_bytes())
    }

    fn modulus<C: ModulusConfig>() -> BigUint {
        BigUint::from_bytes_be(&C::MODULUS.to_be_bytes())
    }

    fn random<C: ModulusConfig>(rng: &mut impl Rng) -> Residue<C> {
        Residue::from_be_bytes_reduced(&rng.random())
    }

    fn check_against_reference<C: ModulusConfig>() {
        let mut rng = rand::rng();
        let m = modulus::<C>();
        for _ in 0..200 {
            let a = random::<C>(&mut rng);
            let b = random::<C>(&mut rng);
            assert_eq!(big(&(a + b)), (big(&a) + big(&b)) % &m);
            assert_eq!(big(&(a - b)), (&m + big(&a) - big(&b)) % &m);
            assert_eq!(big(&(a * b)), (big(&a) * big(&b)) % &m);
            assert_eq!(a.square(), a * a);
            assert_eq!(big(&(-a)), (&m - big(&a)) % &m);
        }
    }

    #[test]
    fn test_field_ops_match_reference() {
        check_against_reference::<Secp256k1P>();
    }

    #[test]
    fn test_scalar_ops_match_reference() {
        check_against_reference::<Secp256k1N>();
    }

    #[test]
    fn test_extreme_operands() {
        let p_minus_1 = FieldElement::from_canonical(constants::P.sub_small(1).0).unwrap();
        assert_eq!(p_minus_1 * p_minus_1, FieldElement::one());
        assert_eq!(p_minus_1 + FieldElement::one(), FieldElement::zero());
        assert_eq!(FieldElement::zero() - FieldElement::one(), p_minus_1);

        let n_minus_1 = Scalar::from_canonical(constants::N.sub_small(1).0).unwrap();
        assert_eq!(n_minus_1.square(), Scalar::one());
        assert_eq!(n_minus_1 + n_minus_1, n_minus_1 - Scalar::one());
    }

    #[test]
    fn test_canonical_decoding() {
        assert!(FieldElement::from_canonical(constants::P).is_none());
        assert!(Scalar::from_canonical(constants::N).is_none());
        assert_eq!(
            FieldElement::from_u256_reduced(constants::P.add_small(5).0),
            FieldElement::from_u64(5)
        );
        let all_ones = [0xffu8; 32];
        let reduced = Scalar::from_be_bytes_reduced(&all_ones);
        assert_eq!(
            big(&reduced),
            BigUint::from_bytes_be(&all_ones) % modulus::<Secp256k1N>()
        );
    }

    #[test]
    fn test_inverse_round_trip() {
        let mut rng = rand::rng();
        for _ in 0..50 {
            let a = random::<Secp256k1P>(&mut rng);
            if let Some(inv) = a.invert() {
                assert_eq!(a * inv, FieldElement::one());
            }
            let s = random::<Secp256k1N>(&mut rng);
            if let Some(inv) = s.invert() {
                assert_eq!(s * inv, Scalar::one());
            }
        }
        assert_eq!(FieldElement::one().invert(), Some(FieldElement::one()));
        assert!(FieldElement::zero().invert().is_none());
        assert!(Scalar::zero().invert().is_none());
    }

    #[test]
    fn test_inverse_matches_reference() {
        let mut rng = rand::rng();
        let m = modulus::<Secp256k1P>();
        let a = random::<Secp256k1P>(&mut rng);
        let expected = big(&a).modpow(&(&m - BigUint::from(2u32)), &m);
        assert_eq!(big(&a.invert().unwrap()), expected);
    }

    #[test]
    fn test_sqrt_of_squares() {
        let mut rng = rand::rng();
        for _ in 0..50 {
            let a = random::<Secp256k1P>(&mut rng);
            let sq = a.square();
            let root = sq.sqrt().expect("square must have a root");
            assert_eq!(root.square(), sq);
            assert!(root == a || root == -a);
        }
        assert_eq!(FieldElement::zero().sqrt(), Some(FieldElement::zero()));
    }

    #[test]
    fn test_sqrt_rejects_non_residues() {
        // -1 is a non-residue because p = 3 (mod 4)
        assert!((-FieldElement::one()).sqrt().is_none());
        assert!(FieldElement::from_u64(3).sqrt().is_none());

        // a non-residue times a nonzero square is a non-residue
        let mut rng = rand::rng();
        for _ in 0..20 {
            let a = random::<Secp256k1P>(&mut rng);
            if a.is_zero() {
                continue;
            }
            assert!((-(a.square())).sqrt().is_none());
        }
    }

    #[test]
    fn test_pow_small_exponent() {
        let two = FieldElement::from_u64(2);
        assert_eq!(two.pow(&U256::from_u64(10)), FieldElement::from_u64(1024));
        assert_eq!(two.pow(&U256::zero()), FieldElement::one());
    }
}
