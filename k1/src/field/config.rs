//! Modulus configuration trait
//!
//! Defines the `ModulusConfig` trait used to fix a residue's modulus at
//! compile time. Field elements (mod p) and scalars (mod n) share a storage
//! layout but carry different configurations, so the type system refuses
//! to mix them.

use crate::bigint::U256;
use crate::constants;

/// Compile-time parameters of a modulus of the form `m = 2^256 - c`
///
/// Both secp256k1 moduli have this shape, which lets a 512-bit product be
/// reduced by folding its high half back in multiplied by `c` instead of
/// running a general division.
pub trait ModulusConfig: 'static + Copy + Eq + std::fmt::Debug + Send + Sync {
    /// The modulus m
    const MODULUS: U256;

    /// The fold constant c = 2^256 - m
    const FOLD: U256;

    /// m - 2, the Fermat inversion exponent
    const INVERSE_EXPONENT: U256;

    /// Short name used in Debug output
    const NAME: &'static str;
}

/// The secp256k1 base field prime p = 2^256 - 2^32 - 977
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Secp256k1P;

impl ModulusConfig for Secp256k1P {
    const MODULUS: U256 = constants::P;
    const FOLD: U256 = constants::P_FOLD;
    const INVERSE_EXPONENT: U256 = constants::P_MINUS_2;
    const NAME: &'static str = "Fp";
}

/// The secp256k1 group order n
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Secp256k1N;

impl ModulusConfig for Secp256k1N {
    const MODULUS: U256 = constants::N;
    const FOLD: U256 = constants::N_FOLD;
    const INVERSE_EXPONENT: U256 = constants::N_MINUS_2;
    const NAME: &'static str = "Fn";
}
