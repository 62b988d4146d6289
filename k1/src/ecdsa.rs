//! ECDSA verification over secp256k1
//!
//! `verify` runs one request through the fixed sequence of checks below;
//! the first failing check ends the pipeline with a `Rejection`.
//!
//! 1. decode r, s, the message hash and the x-only key
//! 2. r and s must be nonzero
//! 3. r and s must be below n
//! 4. lift the key to its even-y point
//! 5. s^-1 mod n
//! 6. u1 = h * s^-1, u2 = r * s^-1 (mod n)
//! 7. R = u1 * G + u2 * Q
//! 8. R must not be the point at infinity
//! 9. accept iff R.x mod n == r
//!
//! Each request is a pure function of its inputs and the shared
//! `CurveConstants`, so requests can be evaluated on any lane in any order.

use crate::bigint::U256;
use crate::constants::CurveConstants;
use crate::field::{FieldElement, Scalar};
use crate::point::JacobianPoint;
use crate::recovery;
use crate::wnaf::{scalar_mul, scalar_mul_with_table};
use std::cmp::Ordering;
use std::fmt;

/// Size of a message hash in bytes
pub const HASH_SIZE: usize = 32;
/// Size of a compact r || s signature in bytes
pub const SIGNATURE_SIZE: usize = 64;
/// Size of an x-only public key in bytes
pub const PUBKEY_SIZE: usize = 32;

/// Why a request was rejected
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Rejection {
    /// r = 0 or s = 0
    ZeroComponent,
    /// r >= n or s >= n
    ComponentOutOfRange,
    /// public-key x-coordinate >= p
    PubkeyOutOfRange,
    /// x^3 + 7 has no square root for the public-key x-coordinate
    PubkeyNotOnCurve,
    /// u1 * G + u2 * Q is the point at infinity
    PointAtInfinity,
    /// R.x mod n differs from r
    Mismatch,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            Rejection::ZeroComponent => "signature component is zero",
            Rejection::ComponentOutOfRange => "signature component is not below the group order",
            Rejection::PubkeyOutOfRange => "public key is not below the field prime",
            Rejection::PubkeyNotOnCurve => "public key x-coordinate has no curve point",
            Rejection::PointAtInfinity => "verification point is at infinity",
            Rejection::Mismatch => "signature does not match",
        };
        f.write_str(msg)
    }
}

impl std::error::Error for Rejection {}

/// A validated (r, s) pair, both in [1, n - 1]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Signature {
    pub r: Scalar,
    pub s: Scalar,
}

impl Signature {
    /// Parses a compact 64-byte big-endian r || s encoding
    ///
    /// Range checks happen on the raw integers, before any reduction, so an
    /// encoding of r + n is rejected rather than aliased to r.
    pub fn from_compact(bytes: &[u8; SIGNATURE_SIZE]) -> Result<Self, Rejection> {
        let r = U256::from_be_bytes(&bytes[..32]);
        let s = U256::from_be_bytes(&bytes[32..]);

        if r.is_zero() || s.is_zero() {
            return Err(Rejection::ZeroComponent);
        }

        match (Scalar::from_canonical(r), Scalar::from_canonical(s)) {
            (Some(r), Some(s)) => Ok(Self { r, s }),
            _ => Err(Rejection::ComponentOutOfRange),
        }
    }

    pub fn to_compact(&self) -> [u8; SIGNATURE_SIZE] {
        let mut out = [0u8; SIGNATURE_SIZE];
        out[..32].copy_from_slice(&self.r.to_be_bytes());
        out[32..].copy_from_slice(&self.s.to_be_bytes());
        out
    }
}

/// One item of a batch, in wire encoding
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VerificationRequest {
    pub message_hash: [u8; HASH_SIZE],
    pub signature: [u8; SIGNATURE_SIZE],
    pub pubkey_x: [u8; PUBKEY_SIZE],
}

impl VerificationRequest {
    pub fn new(
        message_hash: [u8; HASH_SIZE],
        signature: [u8; SIGNATURE_SIZE],
        pubkey_x: [u8; PUBKEY_SIZE],
    ) -> Self {
        Self {
            message_hash,
            signature,
            pubkey_x,
        }
    }

    /// Builds a request from slices of the exact sizes
    ///
    /// Returns `None` if any slice has the wrong length.
    pub fn from_slices(hash: &[u8], signature: &[u8], pubkey_x: &[u8]) -> Option<Self> {
        Some(Self {
            message_hash: hash.try_into().ok()?,
            signature: signature.try_into().ok()?,
            pubkey_x: pubkey_x.try_into().ok()?,
        })
    }
}

/// Runs the full verification pipeline for one request
pub fn verify(curve: &CurveConstants, request: &VerificationRequest) -> Result<(), Rejection> {
    let sig = Signature::from_compact(&request.signature)?;
    let h = Scalar::from_be_bytes_reduced(&request.message_hash);

    let x = FieldElement::from_canonical_be_bytes(&request.pubkey_x)
        .ok_or(Rejection::PubkeyOutOfRange)?;
    let q = recovery::lift_x(&x).ok_or(Rejection::PubkeyNotOnCurve)?;

    // s is nonzero here, so the inverse exists
    let s_inv = sig.s.invert().ok_or(Rejection::ZeroComponent)?;
    let u1 = h * s_inv;
    let u2 = sig.r * s_inv;

    let r_point = scalar_mul_with_table(&u1, &curve.generator_table)
        .add(&scalar_mul(&u2, &JacobianPoint::from_affine(&q)));
    if r_point.is_infinity() {
        return Err(Rejection::PointAtInfinity);
    }

    // R.x < p < 2n, so one conditional subtraction reduces it mod n
    let rx = *r_point.to_affine().x.value();
    let rx = if rx.compare(&curve.n) != Ordering::Less {
        rx.sub_with_borrow(&curve.n).0
    } else {
        rx
    };

    if rx == *sig.r.value() {
        Ok(())
    } else {
        Err(Rejection::Mismatch)
    }
}

/// Verifies one request against the shared constants, logging the reason
/// for a rejection at trace level
pub fn verify_request(curve: &CurveConstants, request: &VerificationRequest) -> bool {
    match verify(curve, request) {
        Ok(()) => true,
        Err(reason) => {
            log::trace!("signature rejected: {}", reason);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::N;
    use k256::ecdsa::signature::hazmat::PrehashSigner;
    use k256::ecdsa::{Signature as RefSignature, SigningKey};
    use k256::elliptic_curve::sec1::ToEncodedPoint;
    use rand::Rng;
    use sha2::{Digest, Sha256};

    fn curve() -> &'static CurveConstants {
        CurveConstants::get()
    }

    /// Signs a random hash with a random key whose public point has even y
    fn signed_request(rng: &mut impl Rng) -> VerificationRequest {
        loop {
            let Ok(key) = SigningKey::from_slice(&rng.random::<[u8; 32]>()) else {
                continue;
            };
            let point = key.verifying_key().as_affine().to_encoded_point(true);
            if point.as_bytes()[0] != 0x02 {
                continue;
            }
            let hash: [u8; 32] = rng.random();
            let sig: RefSignature = key.sign_prehash(&hash).expect("signing failed");

            let mut pubkey_x = [0u8; 32];
            pubkey_x.copy_from_slice(&point.as_bytes()[1..33]);
            let mut signature = [0u8; 64];
            signature.copy_from_slice(&sig.to_bytes());
            return VerificationRequest::new(hash, signature, pubkey_x);
        }
    }

    fn satoshi_vector() -> VerificationRequest {
        let hash: [u8; 32] = Sha256::digest(b"Satoshi Nakamoto").into();
        let sig = hex::decode(
            "934b1ea10a4b3c1757e2b0c017d0b6143ce3c9a7e6a4a49860d7a6ab210ee3d8\
             2442ce9d2b916064108014783e923ec36b49743e2ffa1c4496f01a512aafd9e5",
        )
        .unwrap();
        // private key 1, so the public key is G (even y)
        let pubkey_x = crate::constants::GX.to_be_bytes();
        VerificationRequest::from_slices(&hash, &sig, &pubkey_x).unwrap()
    }

    #[test]
    fn test_published_vector_accepts() {
        assert_eq!(verify(curve(), &satoshi_vector()), Ok(()));
    }

    #[test]
    fn test_published_vector_byte_corruption_rejects() {
        let base = satoshi_vector();
        for i in 0..SIGNATURE_SIZE {
            let mut req = base;
            req.signature[i] ^= 0x01;
            assert!(!verify_request(curve(), &req), "byte {} corrupted", i);
        }
    }

    #[test]
    fn test_random_signatures_accept() {
        let mut rng = rand::rng();
        for _ in 0..16 {
            let req = signed_request(&mut rng);
            assert_eq!(verify(curve(), &req), Ok(()));
        }
    }

    #[test]
    fn test_single_bit_flips_reject() {
        let mut rng = rand::rng();
        let req = signed_request(&mut rng);
        for _ in 0..24 {
            let bit = rng.random_range(0..256);
            let mut bad = req;
            bad.message_hash[bit / 8] ^= 1 << (bit % 8);
            assert!(!verify_request(curve(), &bad));

            let bit = rng.random_range(0..512);
            let mut bad = req;
            bad.signature[bit / 8] ^= 1 << (bit % 8);
            assert!(!verify_request(curve(), &bad));
        }
    }

    #[test]
    fn test_zero_components_reject() {
        let mut req = satoshi_vector();
        req.signature[..32].fill(0);
        assert_eq!(verify(curve(), &req), Err(Rejection::ZeroComponent));

        let mut req = satoshi_vector();
        req.signature[32..].fill(0);
        assert_eq!(verify(curve(), &req), Err(Rejection::ZeroComponent));
    }

    #[test]
    fn test_out_of_range_components_reject() {
        let n = N.to_be_bytes();
        let max = [0xffu8; 32];
        for value in [n, max] {
            let mut req = satoshi_vector();
            req.signature[..32].copy_from_slice(&value);
            assert_eq!(verify(curve(), &req), Err(Rejection::ComponentOutOfRange));

            let mut req = satoshi_vector();
            req.signature[32..].copy_from_slice(&value);
            assert_eq!(verify(curve(), &req), Err(Rejection::ComponentOutOfRange));
        }
    }

    #[test]
    fn test_r_plus_n_alias_rejects() {
        let req = satoshi_vector();
        let r = U256::from_be_bytes(&req.signature[..32]);
        let (aliased, overflow) = r.add_with_carry(&N);
        if !overflow {
            let mut bad = req;
            bad.signature[..32].copy_from_slice(&aliased.to_be_bytes());
            assert_eq!(verify(curve(), &bad), Err(Rejection::ComponentOutOfRange));
        }
    }

    #[test]
    fn test_high_s_form_accepts() {
        let mut rng = rand::rng();
        for req in [satoshi_vector(), signed_request(&mut rng)] {
            let sig = Signature::from_compact(&req.signature).unwrap();
            let flipped = Signature { r: sig.r, s: -sig.s };
            let mut malleated = req;
            malleated.signature = flipped.to_compact();
            assert_eq!(verify(curve(), &malleated), Ok(()));
        }
    }

    #[test]
    fn test_invalid_pubkeys_reject() {
        let mut req = satoshi_vector();
        req.pubkey_x = [0xff; 32];
        assert_eq!(verify(curve(), &req), Err(Rejection::PubkeyOutOfRange));

        let mut req = satoshi_vector();
        req.pubkey_x = U256::from_u64(5).to_be_bytes();
        assert_eq!(verify(curve(), &req), Err(Rejection::PubkeyNotOnCurve));
    }

    #[test]
    fn test_wrong_key_rejects() {
        let mut rng = rand::rng();
        let a = signed_request(&mut rng);
        let b = signed_request(&mut rng);
        let mut crossed = a;
        crossed.pubkey_x = b.pubkey_x;
        assert_eq!(verify(curve(), &crossed), Err(Rejection::Mismatch));
    }

    #[test]
    fn test_hash_above_order_is_reduced() {
        // signing h and h + n must give the same verdict since h is taken mod n
        let mut rng = rand::rng();
        let key = loop {
            if let Ok(key) = SigningKey::from_slice(&rng.random::<[u8; 32]>()) {
                let point = key.verifying_key().as_affine().to_encoded_point(true);
                if point.as_bytes()[0] == 0x02 {
                    break key;
                }
            }
        };
        let small = U256::from_u64(42);
        let big = small.add_with_carry(&N).0;
        let sig: RefSignature = key.sign_prehash(&small.to_be_bytes()).unwrap();
        let point = key.verifying_key().as_affine().to_encoded_point(true);

        let req = VerificationRequest::from_slices(
            &big.to_be_bytes(),
            &sig.to_bytes(),
            &point.as_bytes()[1..33],
        )
        .unwrap();
        assert_eq!(verify(curve(), &req), Ok(()));
    }
}
