//! Simulated coprocessor backend
//!
//! Stands in for an FHE coprocessor in tests, benches and local deployments.
//! Ciphertexts are ChaCha20-Poly1305 encryptions under a backend-held data key
//! with a fresh nonce per value, so equal plaintexts never produce equal
//! ciphertexts. Every homomorphic call opens its operands inside the backend,
//! computes, and seals the result again; plaintext never leaves this module
//! except through `reencrypt`.
//!
//! The value type is bound into the AEAD associated data, so an encrypted
//! boolean cannot be passed off as an amount or the other way round.

use chacha20poly1305::{
    aead::{Aead, KeyInit, Payload},
    ChaCha20Poly1305, Key, Nonce,
};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use tracing::trace;
use x25519_dalek::{PublicKey as X25519PublicKey, StaticSecret};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::backend::FheBackend;
use crate::ciphertext::{Ciphertext, EncryptedBool};
use crate::sealed::{self, EncryptedInput, NetworkPublicKey, ReencryptionPublicKey, SealedValue};
use crate::{FheError, FheResult};

const NONCE_SIZE: usize = 12;
const TAG_UINT: &[u8] = b"shade-sim/u64";
const TAG_BOOL: &[u8] = b"shade-sim/bool";

/// Exportable key material of a simulated backend
#[derive(Clone, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct SimulatedKeys {
    /// Symmetric key protecting ciphertext payloads
    pub data_key: [u8; 32],
    /// X25519 secret clients seal inputs to
    pub network_secret: [u8; 32],
}

impl SimulatedKeys {
    /// Fresh random keys
    pub fn generate() -> Self {
        let mut data_key = [0u8; 32];
        let mut network_secret = [0u8; 32];
        OsRng.fill_bytes(&mut data_key);
        OsRng.fill_bytes(&mut network_secret);
        Self { data_key, network_secret }
    }
}

impl std::fmt::Debug for SimulatedKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimulatedKeys").finish_non_exhaustive()
    }
}

/// Trusted coprocessor simulation
pub struct SimulatedBackend {
    keys: SimulatedKeys,
    cipher: ChaCha20Poly1305,
    network_secret: StaticSecret,
    network_public: NetworkPublicKey,
}

impl SimulatedBackend {
    /// Backend with freshly generated keys
    pub fn generate() -> Self {
        Self::from_keys(SimulatedKeys::generate())
    }

    /// Restore a backend from exported keys
    pub fn from_keys(keys: SimulatedKeys) -> Self {
        let cipher = ChaCha20Poly1305::new(Key::from_slice(&keys.data_key));
        let network_secret = StaticSecret::from(keys.network_secret);
        let network_public = NetworkPublicKey(X25519PublicKey::from(&network_secret).to_bytes());
        Self { keys, cipher, network_secret, network_public }
    }

    /// Key material for persistence
    pub fn export_keys(&self) -> SimulatedKeys {
        self.keys.clone()
    }

    fn seal(&self, value: u64, tag: &[u8]) -> FheResult<Vec<u8>> {
        let mut nonce = [0u8; NONCE_SIZE];
        OsRng.fill_bytes(&mut nonce);
        let sealed = self
            .cipher
            .encrypt(Nonce::from_slice(&nonce), Payload { msg: &value.to_le_bytes(), aad: tag })
            .map_err(|_| FheError::EncryptionFailed("simulated seal failed".into()))?;

        let mut data = Vec::with_capacity(NONCE_SIZE + sealed.len());
        data.extend_from_slice(&nonce);
        data.extend_from_slice(&sealed);
        Ok(data)
    }

    fn open(&self, data: &[u8], tag: &[u8]) -> FheResult<u64> {
        if data.len() <= NONCE_SIZE {
            return Err(FheError::InvalidCiphertext("payload too short".into()));
        }
        let (nonce, body) = data.split_at(NONCE_SIZE);
        let plain = self
            .cipher
            .decrypt(Nonce::from_slice(nonce), Payload { msg: body, aad: tag })
            .map(Zeroizing::new)
            .map_err(|_| FheError::InvalidCiphertext("not produced by this backend".into()))?;
        let raw: [u8; 8] = plain
            .as_slice()
            .try_into()
            .map_err(|_| FheError::InvalidCiphertext("bad payload width".into()))?;
        Ok(u64::from_le_bytes(raw))
    }

    fn open_uint(&self, ct: &Ciphertext) -> FheResult<u64> {
        self.open(ct.data(), TAG_UINT)
    }

    fn open_bool(&self, b: &EncryptedBool) -> FheResult<bool> {
        match self.open(b.data(), TAG_BOOL)? {
            0 => Ok(false),
            1 => Ok(true),
            _ => Err(FheError::InvalidCiphertext("boolean out of range".into())),
        }
    }

    fn uint(&self, value: u64, op_count: u32) -> FheResult<Ciphertext> {
        Ok(Ciphertext::with_ops(self.seal(value, TAG_UINT)?, op_count))
    }

    fn boolean(&self, value: bool) -> FheResult<EncryptedBool> {
        Ok(EncryptedBool::new(self.seal(value as u64, TAG_BOOL)?))
    }

    /// Plaintext of a ciphertext, bypassing authorization. Test use only.
    #[cfg(test)]
    pub(crate) fn decrypt_for_test(&self, ct: &Ciphertext) -> FheResult<u64> {
        self.open_uint(ct)
    }
}

impl std::fmt::Debug for SimulatedBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimulatedBackend")
            .field("network_public", &self.network_public)
            .finish()
    }
}

fn next_ops(a: &Ciphertext, b: &Ciphertext, cost: u32) -> u32 {
    a.op_count().max(b.op_count()).saturating_add(cost)
}

impl FheBackend for SimulatedBackend {
    fn network_public_key(&self) -> NetworkPublicKey {
        self.network_public
    }

    fn import_input(&self, input: &EncryptedInput) -> FheResult<Ciphertext> {
        let value = input.open(&self.network_secret)?;
        let ct = self.uint(value as u64, 0)?;
        trace!(fingerprint = %ct.fingerprint(), "imported client input");
        Ok(ct)
    }

    fn trivial(&self, value: u64) -> FheResult<Ciphertext> {
        self.uint(value, 0)
    }

    fn add(&self, a: &Ciphertext, b: &Ciphertext) -> FheResult<Ciphertext> {
        let sum = self.open_uint(a)?.wrapping_add(self.open_uint(b)?);
        self.uint(sum, next_ops(a, b, 1))
    }

    fn sub(&self, a: &Ciphertext, b: &Ciphertext) -> FheResult<Ciphertext> {
        let diff = self.open_uint(a)?.wrapping_sub(self.open_uint(b)?);
        self.uint(diff, next_ops(a, b, 1))
    }

    fn mul(&self, a: &Ciphertext, b: &Ciphertext) -> FheResult<Ciphertext> {
        let product = self.open_uint(a)?.wrapping_mul(self.open_uint(b)?);
        self.uint(product, next_ops(a, b, 5))
    }

    fn ge(&self, a: &Ciphertext, b: &Ciphertext) -> FheResult<EncryptedBool> {
        self.boolean(self.open_uint(a)? >= self.open_uint(b)?)
    }

    fn and(&self, a: &EncryptedBool, b: &EncryptedBool) -> FheResult<EncryptedBool> {
        self.boolean(self.open_bool(a)? && self.open_bool(b)?)
    }

    fn not(&self, a: &EncryptedBool) -> FheResult<EncryptedBool> {
        self.boolean(!self.open_bool(a)?)
    }

    fn select(&self, cond: &EncryptedBool, a: &Ciphertext, b: &Ciphertext) -> FheResult<Ciphertext> {
        let chosen = if self.open_bool(cond)? {
            self.open_uint(a)?
        } else {
            self.open_uint(b)?
        };
        self.uint(chosen, next_ops(a, b, 5))
    }

    fn reencrypt(&self, ct: &Ciphertext, recipient: &ReencryptionPublicKey) -> FheResult<SealedValue> {
        sealed::seal_for(self.open_uint(ct)?, recipient)
    }
}
