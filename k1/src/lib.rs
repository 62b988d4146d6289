//! secp256k1 Arithmetic Library (k1)
//!
//! Fixed-width 256-bit arithmetic over the secp256k1 prime and group order,
//! Jacobian point arithmetic, windowed-NAF scalar multiplication and the
//! ECDSA verification pipeline used by the batch lanes.
//!
//! ```
//! use k1::{verify_request, CurveConstants, VerificationRequest};
//!
//! let request = VerificationRequest::new([0u8; 32], [0u8; 64], [0u8; 32]);
//! assert!(!verify_request(CurveConstants::get(), &request));
//! ```

/// Fixed-width big integers (256-bit values, 512-bit products)
pub mod bigint;
/// Curve parameters and the shared `CurveConstants`
pub mod constants;
/// ECDSA signature parsing and verification
pub mod ecdsa;
/// Residues modulo p and n
pub mod field;
/// Jacobian and affine points
pub mod point;
/// Even-y point recovery from x-only keys
pub mod recovery;
/// Windowed-NAF scalar multiplication
pub mod wnaf;

pub use bigint::{U256, U512};
pub use constants::CurveConstants;
pub use ecdsa::{
    verify, verify_request, Rejection, Signature, VerificationRequest, HASH_SIZE, PUBKEY_SIZE,
    SIGNATURE_SIZE,
};
pub use field::{FieldElement, Scalar};
pub use point::{AffinePoint, JacobianPoint};
