//! TFHE-rs backend
//!
//! Real homomorphic evaluation over `FheUint64`. The backend plays both the
//! evaluator role (server key) and the key-management role (client key, used
//! only inside `reencrypt`). TFHE-rs keeps its server key in thread-local
//! state, so every entry point installs it before evaluating.

use rand::rngs::OsRng;
use tfhe::prelude::*;
use tfhe::{generate_keys, ClientKey, ConfigBuilder, FheBool, FheUint64, ServerKey};
use tracing::{debug, info};
use x25519_dalek::{PublicKey as X25519PublicKey, StaticSecret};

use crate::backend::FheBackend;
use crate::ciphertext::{Ciphertext, EncryptedBool};
use crate::sealed::{self, EncryptedInput, NetworkPublicKey, ReencryptionPublicKey, SealedValue};
use crate::{FheConfig, FheError, FheResult};

/// Backend evaluating on TFHE-rs ciphertexts
pub struct TfheBackend {
    client_key: ClientKey,
    server_key: ServerKey,
    network_secret: StaticSecret,
    network_public: NetworkPublicKey,
}

impl TfheBackend {
    /// Generate fresh keys
    ///
    /// WARNING: key generation is slow (~10-30 seconds)
    pub fn generate(config: &FheConfig) -> FheResult<Self> {
        let tfhe_config = if config.security_bits >= 128 {
            ConfigBuilder::default().build()
        } else {
            ConfigBuilder::default_with_small_encryption().build()
        };
        let (client_key, server_key) = generate_keys(tfhe_config);
        info!(security_bits = config.security_bits, "generated TFHE keys");

        let network_secret = StaticSecret::random_from_rng(OsRng);
        let network_public = NetworkPublicKey(X25519PublicKey::from(&network_secret).to_bytes());
        Ok(Self { client_key, server_key, network_secret, network_public })
    }

    fn install(&self) {
        tfhe::set_server_key(self.server_key.clone());
    }

    fn uint(&self, ct: &Ciphertext) -> FheResult<FheUint64> {
        bincode::deserialize(ct.data()).map_err(|e| FheError::InvalidCiphertext(e.to_string()))
    }

    fn boolean(&self, b: &EncryptedBool) -> FheResult<FheBool> {
        bincode::deserialize(b.data()).map_err(|e| FheError::InvalidCiphertext(e.to_string()))
    }

    fn wrap_uint(&self, value: &FheUint64, op_count: u32) -> FheResult<Ciphertext> {
        let data = bincode::serialize(value).map_err(|e| FheError::SerializationError(e.to_string()))?;
        Ok(Ciphertext::with_ops(data, op_count))
    }

    fn wrap_bool(&self, value: &FheBool) -> FheResult<EncryptedBool> {
        let data = bincode::serialize(value).map_err(|e| FheError::SerializationError(e.to_string()))?;
        Ok(EncryptedBool::new(data))
    }

    fn binary(
        &self,
        a: &Ciphertext,
        b: &Ciphertext,
        cost: u32,
        op: impl FnOnce(&FheUint64, &FheUint64) -> FheUint64,
    ) -> FheResult<Ciphertext> {
        self.install();
        let result = op(&self.uint(a)?, &self.uint(b)?);
        self.wrap_uint(&result, a.op_count().max(b.op_count()).saturating_add(cost))
    }
}

impl FheBackend for TfheBackend {
    fn network_public_key(&self) -> NetworkPublicKey {
        self.network_public
    }

    fn import_input(&self, input: &EncryptedInput) -> FheResult<Ciphertext> {
        let value = input.open(&self.network_secret)?;
        let encrypted = FheUint64::try_encrypt(value as u64, &self.client_key)
            .map_err(|e| FheError::EncryptionFailed(e.to_string()))?;
        debug!("imported client input into TFHE domain");
        self.wrap_uint(&encrypted, 0)
    }

    fn trivial(&self, value: u64) -> FheResult<Ciphertext> {
        let encrypted = FheUint64::try_encrypt(value, &self.client_key)
            .map_err(|e| FheError::EncryptionFailed(e.to_string()))?;
        self.wrap_uint(&encrypted, 0)
    }

    fn add(&self, a: &Ciphertext, b: &Ciphertext) -> FheResult<Ciphertext> {
        self.binary(a, b, 1, |x, y| x + y)
    }

    fn sub(&self, a: &Ciphertext, b: &Ciphertext) -> FheResult<Ciphertext> {
        self.binary(a, b, 1, |x, y| x - y)
    }

    fn mul(&self, a: &Ciphertext, b: &Ciphertext) -> FheResult<Ciphertext> {
        self.binary(a, b, 5, |x, y| x * y)
    }

    fn ge(&self, a: &Ciphertext, b: &Ciphertext) -> FheResult<EncryptedBool> {
        self.install();
        let result = self.uint(a)?.ge(&self.uint(b)?);
        self.wrap_bool(&result)
    }

    fn and(&self, a: &EncryptedBool, b: &EncryptedBool) -> FheResult<EncryptedBool> {
        self.install();
        let result = &self.boolean(a)? & &self.boolean(b)?;
        self.wrap_bool(&result)
    }

    fn not(&self, a: &EncryptedBool) -> FheResult<EncryptedBool> {
        self.install();
        let result = !&self.boolean(a)?;
        self.wrap_bool(&result)
    }

    fn select(&self, cond: &EncryptedBool, a: &Ciphertext, b: &Ciphertext) -> FheResult<Ciphertext> {
        self.install();
        let result = self.boolean(cond)?.if_then_else(&self.uint(a)?, &self.uint(b)?);
        self.wrap_uint(&result, a.op_count().max(b.op_count()).saturating_add(5))
    }

    fn reencrypt(&self, ct: &Ciphertext, recipient: &ReencryptionPublicKey) -> FheResult<SealedValue> {
        let value: u64 = self.uint(ct)?.decrypt(&self.client_key);
        sealed::seal_for(value, recipient)
    }
}

impl std::fmt::Debug for TfheBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TfheBackend")
            .field("network_public", &self.network_public)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sealed::ReencryptionKeypair;
    use crate::FheBackendExt;

    #[test]
    #[ignore = "TFHE key generation takes tens of seconds"]
    fn test_tfhe_checked_sub_and_reencrypt() {
        let backend = TfheBackend::generate(&FheConfig::default()).unwrap();
        let keypair = ReencryptionKeypair::generate();

        let a = backend.trivial(100).unwrap();
        let b = backend.trivial(30).unwrap();
        let (diff, _) = backend.checked_sub(&a, &b).unwrap();
        let sealed = backend.reencrypt(&diff, &keypair.public_key()).unwrap();
        assert_eq!(keypair.open(&sealed).unwrap(), 70);

        let (unchanged, _) = backend.checked_sub(&b, &a).unwrap();
        let sealed = backend.reencrypt(&unchanged, &keypair.public_key()).unwrap();
        assert_eq!(keypair.open(&sealed).unwrap(), 30);
    }
}
