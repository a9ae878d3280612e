//! SHADE FHE capability
//!
//! Encrypted 32-bit amounts and the homomorphic operations the confidential
//! ledgers and pool are built from.
//!
//! # Key Features:
//! - Client inputs sealed to the network key and imported as ciphertexts
//! - Homomorphic add, subtract, multiply, compare and select
//! - Reencryption of a ciphertext to a caller-held X25519 key
//! - Bounded arithmetic, division and square root built from select
//!
//! # Architecture:
//! - `FheBackend`: the primitive capability (simulated or TFHE-rs)
//! - `FheBackendExt`: derived operations, available on every backend
//! - `EncryptedInput` / `ReencryptionKeypair`: the client side

pub mod backend;
pub mod ciphertext;
pub mod errors;
pub mod sealed;
pub mod simulated;
#[cfg(feature = "tfhe")]
mod tfhe_impl;

pub use backend::{FheBackend, FheBackendExt, AMOUNT_BITS};
pub use ciphertext::{Ciphertext, EncryptedBool};
pub use errors::{FheError, FheResult};
pub use sealed::{EncryptedInput, NetworkPublicKey, ReencryptionKeypair, ReencryptionPublicKey, SealedValue};
pub use simulated::{SimulatedBackend, SimulatedKeys};
#[cfg(feature = "tfhe")]
pub use tfhe_impl::TfheBackend;

/// Largest plaintext an encrypted amount may hold
pub const MAX_AMOUNT: u64 = u32::MAX as u64;

/// FHE Configuration
#[derive(Clone, Debug)]
pub struct FheConfig {
    /// Security parameter (bits)
    pub security_bits: u32,
}

impl Default for FheConfig {
    fn default() -> Self {
        Self { security_bits: 128 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = FheConfig::default();
        assert_eq!(config.security_bits, 128);
    }

    #[test]
    fn test_amount_range_is_32_bits() {
        assert_eq!(MAX_AMOUNT, (1u64 << AMOUNT_BITS) - 1);
    }
}
