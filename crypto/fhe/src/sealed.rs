//! Client-side sealing: encrypted inputs and reencrypted outputs
//!
//! Both directions use the same construction: an ephemeral X25519 key agreement
//! with the recipient, a BLAKE3-derived symmetric key, and ChaCha20-Poly1305.
//!
//! - Inputs are sealed by a client to the network public key; only the backend
//!   can import them into its ciphertext domain.
//! - Reencrypted outputs are sealed by the backend to a caller's reencryption
//!   public key; only the holder of the matching secret can open them.

use chacha20poly1305::{
    aead::{Aead, KeyInit, Payload},
    ChaCha20Poly1305, Key, Nonce,
};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use x25519_dalek::{EphemeralSecret, PublicKey as X25519PublicKey, StaticSecret};
use zeroize::Zeroizing;

use crate::{FheError, FheResult};

/// Nonce size for ChaCha20-Poly1305
const NONCE_SIZE: usize = 12;

/// Key derivation context for client inputs
const INPUT_CONTEXT: &str = "shade 2024-06 encrypted input v1";

/// Key derivation context for reencrypted outputs
const REENCRYPT_CONTEXT: &str = "shade 2024-06 reencryption v1";

/// Public key clients encrypt their inputs to
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NetworkPublicKey(pub [u8; 32]);

impl std::fmt::Debug for NetworkPublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "NetworkPublicKey({})", hex::encode(&self.0[..8]))
    }
}

/// Public half of a caller's reencryption keypair
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReencryptionPublicKey(pub [u8; 32]);

impl ReencryptionPublicKey {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl std::fmt::Debug for ReencryptionPublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ReencryptionPublicKey({})", hex::encode(&self.0[..8]))
    }
}

/// A value sealed to one X25519 recipient
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SealedValue {
    /// Sender's ephemeral public key
    pub ephemeral_pk: [u8; 32],
    /// ChaCha20-Poly1305 nonce
    pub nonce: [u8; NONCE_SIZE],
    /// Encrypted payload with tag
    pub ciphertext: Vec<u8>,
}

impl std::fmt::Debug for SealedValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SealedValue")
            .field("ephemeral_pk", &hex::encode(&self.ephemeral_pk[..8]))
            .field("size", &self.ciphertext.len())
            .finish()
    }
}

fn derive_key(context: &str, shared: &[u8; 32], ephemeral: &[u8; 32], recipient: &[u8; 32]) -> Zeroizing<[u8; 32]> {
    let mut material = Zeroizing::new([0u8; 96]);
    material[..32].copy_from_slice(shared);
    material[32..64].copy_from_slice(ephemeral);
    material[64..].copy_from_slice(recipient);
    Zeroizing::new(blake3::derive_key(context, material.as_ref()))
}

fn seal(context: &str, plaintext: &[u8], recipient: &[u8; 32]) -> FheResult<SealedValue> {
    let ephemeral = EphemeralSecret::random_from_rng(OsRng);
    let ephemeral_pk = X25519PublicKey::from(&ephemeral).to_bytes();
    let shared = ephemeral.diffie_hellman(&X25519PublicKey::from(*recipient));
    let key = derive_key(context, shared.as_bytes(), &ephemeral_pk, recipient);

    let mut nonce = [0u8; NONCE_SIZE];
    OsRng.fill_bytes(&mut nonce);

    let cipher = ChaCha20Poly1305::new(Key::from_slice(key.as_ref()));
    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce), Payload { msg: plaintext, aad: &ephemeral_pk })
        .map_err(|_| FheError::EncryptionFailed("sealing failed".into()))?;

    Ok(SealedValue { ephemeral_pk, nonce, ciphertext })
}

fn open(context: &str, secret: &StaticSecret, sealed: &SealedValue) -> FheResult<Zeroizing<Vec<u8>>> {
    let recipient = X25519PublicKey::from(secret).to_bytes();
    let shared = secret.diffie_hellman(&X25519PublicKey::from(sealed.ephemeral_pk));
    let key = derive_key(context, shared.as_bytes(), &sealed.ephemeral_pk, &recipient);

    let cipher = ChaCha20Poly1305::new(Key::from_slice(key.as_ref()));
    cipher
        .decrypt(
            Nonce::from_slice(&sealed.nonce),
            Payload { msg: &sealed.ciphertext, aad: &sealed.ephemeral_pk },
        )
        .map(Zeroizing::new)
        .map_err(|_| FheError::DecryptionFailed("sealed value rejected".into()))
}

/// Plaintext amount encrypted by a client for the network
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedInput(SealedValue);

impl EncryptedInput {
    /// Encrypt a 32-bit amount to the network public key
    pub fn encrypt(value: u32, network_key: &NetworkPublicKey) -> FheResult<Self> {
        seal(INPUT_CONTEXT, &value.to_le_bytes(), &network_key.0).map(Self)
    }

    /// Open with the network secret. Backend use only.
    pub(crate) fn open(&self, network_secret: &StaticSecret) -> FheResult<u32> {
        let bytes = open(INPUT_CONTEXT, network_secret, &self.0)
            .map_err(|e| FheError::InvalidInput(e.to_string()))?;
        let raw: [u8; 4] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| FheError::InvalidInput("input must encode 32 bits".into()))?;
        Ok(u32::from_le_bytes(raw))
    }
}

/// Seal a plaintext to a reencryption public key. Backend use only.
pub(crate) fn seal_for(value: u64, recipient: &ReencryptionPublicKey) -> FheResult<SealedValue> {
    seal(REENCRYPT_CONTEXT, &value.to_le_bytes(), &recipient.0)
}

/// Caller-held keypair whose public half is bound into reencryption grants
pub struct ReencryptionKeypair {
    secret: StaticSecret,
    public: ReencryptionPublicKey,
}

impl ReencryptionKeypair {
    /// Generate a fresh keypair
    pub fn generate() -> Self {
        Self::from_secret(StaticSecret::random_from_rng(OsRng))
    }

    /// Restore from 32 secret bytes
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self::from_secret(StaticSecret::from(bytes))
    }

    fn from_secret(secret: StaticSecret) -> Self {
        let public = ReencryptionPublicKey(X25519PublicKey::from(&secret).to_bytes());
        Self { secret, public }
    }

    pub fn public_key(&self) -> ReencryptionPublicKey {
        self.public
    }

    /// Open a value reencrypted to this keypair
    pub fn open(&self, sealed: &SealedValue) -> FheResult<u64> {
        let bytes = open(REENCRYPT_CONTEXT, &self.secret, sealed)?;
        let raw: [u8; 8] = bytes
            .as_slice()
            .try_into()
            .map_err(|_| FheError::DecryptionFailed("reencrypted value must encode 64 bits".into()))?;
        Ok(u64::from_le_bytes(raw))
    }
}

impl std::fmt::Debug for ReencryptionKeypair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReencryptionKeypair")
            .field("public", &self.public)
            .finish()
    }
}
