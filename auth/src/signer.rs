//! Local Ed25519 signers
//!
//! Key custody is the wallet's job; this is the minimal signer used by tests
//! and the development CLI to produce reencryption request signatures.

use ed25519_dalek::{Signer, SigningKey};
use rand::rngs::OsRng;
use shade_fhe::ReencryptionPublicKey;

use crate::address::Account;
use crate::typed_data::{Domain, Reencrypt};

/// Ed25519 signature over a reencryption request digest
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Signature(pub [u8; 64]);

impl std::fmt::Debug for Signature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Signature({}..)", hex::encode(&self.0[..8]))
    }
}

/// In-process signing key
pub struct LocalSigner {
    signing_key: SigningKey,
}

impl LocalSigner {
    /// Generate a random signer
    pub fn generate() -> Self {
        Self { signing_key: SigningKey::generate(&mut OsRng) }
    }

    /// Deterministic development signer (e.g. "alice", "bob")
    pub fn from_label(label: &str) -> Self {
        let seed = blake3::derive_key("shade development signer v1", label.as_bytes());
        Self { signing_key: SigningKey::from_bytes(&seed) }
    }

    pub fn account(&self) -> Account {
        Account(self.signing_key.verifying_key().to_bytes())
    }

    /// Sign a request binding `public_key` to the instance of `domain`
    pub fn sign_reencrypt(&self, domain: &Domain, public_key: &ReencryptionPublicKey) -> Signature {
        let digest = Reencrypt { public_key: *public_key }.signing_digest(domain);
        Signature(self.signing_key.sign(&digest).to_bytes())
    }
}

impl std::fmt::Debug for LocalSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalSigner")
            .field("account", &self.account())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labelled_signers_are_stable_and_distinct() {
        assert_eq!(LocalSigner::from_label("alice").account(), LocalSigner::from_label("alice").account());
        assert_ne!(LocalSigner::from_label("alice").account(), LocalSigner::from_label("bob").account());
    }

    #[test]
    fn test_generated_signers_differ() {
        assert_ne!(LocalSigner::generate().account(), LocalSigner::generate().account());
    }
}
