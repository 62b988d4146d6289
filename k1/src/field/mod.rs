//! Modular arithmetic over the two secp256k1 moduli
//!
//! - `FieldElement`: residues modulo the curve prime p, used for point
//!   coordinates
//! - `Scalar`: residues modulo the group order n, used for signature
//!   components and multipliers
//!
//! Both are `Residue<C>` with a different `ModulusConfig`, reduced after
//! every operation by folding (see `reduce`).

pub mod config;
pub mod reduce;
pub mod residue;

pub use config::{ModulusConfig, Secp256k1N, Secp256k1P};
pub use residue::{FieldElement, Residue, Scalar};
