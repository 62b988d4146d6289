//! Fixed-width unsigned integers with compile-time sizing
//!
//! `BigInt<N>` holds N 64-bit limbs in little-endian limb order (limbs[0] is
//! least significant). Only the sizes the curve arithmetic needs are given
//! names:
//! - `U256` (4 limbs) for field elements, scalars and exponents
//! - `U320` (5 limbs) as headroom for signed-digit recoding
//! - `U512` (8 limbs) for unreduced products
//!
//! Byte conversion is big-endian, matching the wire encoding of hashes,
//! signatures and public keys.

use std::cmp::Ordering;
use std::fmt;

/// An unsigned integer with N 64-bit limbs (N * 64 bits total)
///
/// # Examples
/// ```
/// use k1::bigint::U256;
/// let a = U256::from_u64(42);
/// let (sum, carry) = a.add_with_carry(&U256::from_u64(100));
/// assert_eq!(sum, U256::from_u64(142));
/// assert!(!carry);
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct BigInt<const N: usize> {
    limbs: [u64; N],
}

/// 256-bit integer (4 limbs)
pub type U256 = BigInt<4>;
/// 320-bit integer (5 limbs)
pub type U320 = BigInt<5>;
/// 512-bit integer (8 limbs)
pub type U512 = BigInt<8>;

impl<const N: usize> BigInt<N> {
    /// Number of bits this BigInt can represent
    pub const BITS: usize = N * 64;

    #[inline]
    pub const fn zero() -> Self {
        Self { limbs: [0; N] }
    }

    #[inline]
    pub const fn one() -> Self {
        Self::from_u64(1)
    }

    #[inline]
    pub const fn from_u64(val: u64) -> Self {
        let mut limbs = [0; N];
        limbs[0] = val;
        Self { limbs }
    }

    /// Creates a BigInt from limbs in little-endian order
    ///
    /// Usable in `const` items, which is how the curve constants are declared.
    #[inline]
    pub const fn from_limbs(limbs: [u64; N]) -> Self {
        Self { limbs }
    }

    /// Gets a reference to the internal limbs array (least significant first)
    #[inline]
    pub const fn limbs(&self) -> &[u64; N] {
        &self.limbs
    }

    /// Creates a BigInt from big-endian bytes
    ///
    /// Bytes beyond the N * 8 least significant ones are ignored.
    ///
    /// # Arguments
    /// * `bytes` - Byte slice in big-endian order (most significant byte first)
    pub fn from_be_bytes(bytes: &[u8]) -> Self {
        let mut limbs = [0u64; N];

        for (i, &byte) in bytes.iter().rev().enumerate() {
            let limb_idx = i / 8;
            if limb_idx < N {
                limbs[limb_idx] |= (byte as u64) << ((i % 8) * 8);
            }
        }

        Self { limbs }
    }

    /// Writes the value as big-endian bytes into `out`
    ///
    /// `out` must be exactly N * 8 bytes long.
    pub fn write_be_bytes(&self, out: &mut [u8]) {
        debug_assert_eq!(out.len(), N * 8);
        for (chunk, limb) in out.chunks_exact_mut(8).zip(self.limbs.iter().rev()) {
            chunk.copy_from_slice(&limb.to_be_bytes());
        }
    }

    /// Parses a big-endian hexadecimal string (no "0x" prefix)
    ///
    /// Returns `None` on an invalid digit or when the value does not fit.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim();
        let digits = hex.trim_start_matches('0');
        if digits.len() > N * 16 {
            return None;
        }

        let mut limbs = [0u64; N];
        for (i, ch) in digits.chars().rev().enumerate() {
            let nibble = ch.to_digit(16)? as u64;
            limbs[i / 16] |= nibble << ((i % 16) * 4);
        }

        Some(Self { limbs })
    }

    /// Converts to a lowercase hexadecimal string of exactly N * 16 digits
    pub fn to_hex(&self) -> String {
        self.limbs
            .iter()
            .rev()
            .map(|limb| format!("{:016x}", limb))
            .collect()
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.limbs.iter().all(|&limb| limb == 0)
    }

    #[inline]
    pub fn is_odd(&self) -> bool {
        self.limbs[0] & 1 == 1
    }

    /// Get a specific bit (0-indexed from least significant)
    #[inline]
    pub fn bit(&self, idx: usize) -> bool {
        if idx >= Self::BITS {
            return false;
        }
        (self.limbs[idx / 64] >> (idx % 64)) & 1 == 1
    }

    /// Returns the bit length (position of highest set bit + 1), 0 for zero
    pub fn bit_length(&self) -> usize {
        for i in (0..N).rev() {
            if self.limbs[i] != 0 {
                return (i + 1) * 64 - self.limbs[i].leading_zeros() as usize;
            }
        }
        0
    }

    /// Compares from the most significant limb down
    pub fn compare(&self, other: &Self) -> Ordering {
        for i in (0..N).rev() {
            match self.limbs[i].cmp(&other.limbs[i]) {
                Ordering::Equal => continue,
                ord => return ord,
            }
        }
        Ordering::Equal
    }

    /// Addition with carry detection
    ///
    /// Returns (result mod 2^(N*64), carry out of the top limb)
    pub fn add_with_carry(&self, other: &Self) -> (Self, bool) {
        let mut result = Self::zero();
        let mut carry = false;

        for i in 0..N {
            let (sum1, overflow1) = self.limbs[i].overflowing_add(other.limbs[i]);
            let (sum2, overflow2) = sum1.overflowing_add(carry as u64);
            result.limbs[i] = sum2;
            carry = overflow1 || overflow2;
        }

        (result, carry)
    }

    /// Subtraction with borrow detection
    ///
    /// Returns (result mod 2^(N*64), borrow out of the top limb)
    pub fn sub_with_borrow(&self, other: &Self) -> (Self, bool) {
        let mut result = Self::zero();
        let mut borrow = false;

        for i in 0..N {
            let (diff1, underflow1) = self.limbs[i].overflowing_sub(other.limbs[i]);
            let (diff2, underflow2) = diff1.overflowing_sub(borrow as u64);
            result.limbs[i] = diff2;
            borrow = underflow1 || underflow2;
        }

        (result, borrow)
    }

    /// Adds a single-limb value, returning the carry out
    pub fn add_small(&self, val: u64) -> (Self, bool) {
        self.add_with_carry(&Self::from_u64(val))
    }

    /// Subtracts a single-limb value, returning the borrow out
    pub fn sub_small(&self, val: u64) -> (Self, bool) {
        self.sub_with_borrow(&Self::from_u64(val))
    }

    /// Logical right shift by one bit
    pub fn shr1(&self) -> Self {
        let mut result = Self::zero();
        for i in 0..N {
            result.limbs[i] = self.limbs[i] >> 1;
            if i + 1 < N {
                result.limbs[i] |= self.limbs[i + 1] << 63;
            }
        }
        result
    }

    /// Zero-extends into a wider integer
    ///
    /// `M` must be at least `N`; extra limbs are zero.
    pub fn resize<const M: usize>(&self) -> BigInt<M> {
        debug_assert!(M >= N);
        let mut limbs = [0u64; M];
        limbs[..N].copy_from_slice(&self.limbs);
        BigInt { limbs }
    }
}

impl U256 {
    /// Big-endian encoding, 32 bytes
    pub fn to_be_bytes(&self) -> [u8; 32] {
        let mut out = [0u8; 32];
        self.write_be_bytes(&mut out);
        out
    }

    /// Full 512-bit product
    ///
    /// Schoolbook multiplication: 16 limb products, each 64x64 -> 128 bits,
    /// accumulated row by row with the carry pushed into the next limb.
    pub fn mul_wide(&self, other: &Self) -> U512 {
        let a = &self.limbs;
        let b = &other.limbs;
        let mut r = [0u64; 8];

        for i in 0..4 {
            let mut carry = 0u128;
            for j in 0..4 {
                let t = (a[i] as u128) * (b[j] as u128) + (r[i + j] as u128) + carry;
                r[i + j] = t as u64;
                carry = t >> 64;
            }
            r[i + 4] = carry as u64;
        }

        BigInt::from_limbs(r)
    }

    /// Full 512-bit square using 10 limb products instead of 16
    ///
    /// Off-diagonal products are accumulated once, doubled, then the
    /// diagonal squares are added. Bit-identical to `mul_wide(self, self)`.
    pub fn square_wide(&self) -> U512 {
        let a = &self.limbs;
        let mut r = [0u64; 8];

        for i in 0..4 {
            let mut carry = 0u128;
            for j in (i + 1)..4 {
                let t = (a[i] as u128) * (a[j] as u128) + (r[i + j] as u128) + carry;
                r[i + j] = t as u64;
                carry = t >> 64;
            }
            r[i + 4] = carry as u64;
        }

        // Cross terms sum to less than 2^511, so the doubling cannot overflow.
        let mut top = 0u64;
        for limb in r.iter_mut() {
            let next = *limb >> 63;
            *limb = (*limb << 1) | top;
            top = next;
        }

        let mut carry = 0u128;
        for i in 0..4 {
            let sq = (a[i] as u128) * (a[i] as u128);
            let lo = (r[2 * i] as u128) + (sq as u64 as u128) + carry;
            r[2 * i] = lo as u64;
            let hi = (r[2 * i + 1] as u128) + (sq >> 64) + (lo >> 64);
            r[2 * i + 1] = hi as u64;
            carry = hi >> 64;
        }

        BigInt::from_limbs(r)
    }

    /// Zero-extends to 512 bits
    #[inline]
    pub fn widen(&self) -> U512 {
        self.resize::<8>()
    }
}

impl U512 {
    /// Splits into (low 256 bits, high 256 bits)
    pub fn split(&self) -> (U256, U256) {
        let l = &self.limbs;
        (
            BigInt::from_limbs([l[0], l[1], l[2], l[3]]),
            BigInt::from_limbs([l[4], l[5], l[6], l[7]]),
        )
    }
}

impl<const N: usize> PartialOrd for BigInt<N> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<const N: usize> Ord for BigInt<N> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.compare(other)
    }
}

impl<const N: usize> Default for BigInt<N> {
    fn default() -> Self {
        Self::zero()
    }
}

impl<const N: usize> fmt::Debug for BigInt<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BigInt<{}>(0x{})", N, self.to_hex())
    }
}

impl<const N: usize> fmt::Display for BigInt<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", self.to_hex())
    }
}
