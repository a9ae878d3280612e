//! Instance registry, reencryption grants and authorized decryption

use std::collections::BTreeMap;

use ed25519_dalek::{Signature as Ed25519Signature, Verifier, VerifyingKey};
use serde::{Deserialize, Serialize};
use shade_fhe::{Ciphertext, FheBackend, ReencryptionPublicKey, SealedValue};
use tracing::{debug, warn};

use crate::address::{Account, InstanceId};
use crate::errors::{AuthError, AuthResult};
use crate::signer::Signature;
use crate::typed_data::{Domain, Reencrypt};

/// Capability to reencrypt ciphertexts of one instance to one key
///
/// Only `Authorizer::request_grant` constructs grants. A grant may be used
/// for several reads in the same session but never outside its instance.
#[derive(Clone, Debug)]
pub struct ReencryptionGrant {
    instance: InstanceId,
    account: Account,
    public_key: ReencryptionPublicKey,
    signature: Signature,
}

impl ReencryptionGrant {
    pub fn instance(&self) -> InstanceId {
        self.instance
    }

    pub fn account(&self) -> Account {
        self.account
    }

    pub fn public_key(&self) -> &ReencryptionPublicKey {
        &self.public_key
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }
}

/// Ciphertext tagged with the instance that holds it
///
/// The scope is what `decrypt_with_grant` checks, so it is only trustworthy
/// when built by the instance that owns the slot. Engine read paths never
/// accept a scope from their caller: they rebuild it from their own state,
/// keyed by the grant.
#[derive(Clone, Debug)]
pub struct ScopedCiphertext {
    instance: InstanceId,
    /// `Some` restricts decryption to that account's grants
    owner: Option<Account>,
    ciphertext: Ciphertext,
}

impl ScopedCiphertext {
    /// Value any authorized signer of `instance` may decrypt
    pub fn public(instance: InstanceId, ciphertext: Ciphertext) -> Self {
        Self { instance, owner: None, ciphertext }
    }

    /// Value only `owner` may decrypt
    pub fn owned(instance: InstanceId, owner: Account, ciphertext: Ciphertext) -> Self {
        Self { instance, owner: Some(owner), ciphertext }
    }

    pub fn instance(&self) -> InstanceId {
        self.instance
    }

    pub fn owner(&self) -> Option<Account> {
        self.owner
    }

    pub fn ciphertext(&self) -> &Ciphertext {
        &self.ciphertext
    }

    pub fn into_ciphertext(self) -> Ciphertext {
        self.ciphertext
    }
}

/// Registered instance metadata
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct InstanceInfo {
    pub name: String,
    pub domain: Domain,
}

/// Registry of deployed instances and grant issuer
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Authorizer {
    chain_id: u64,
    instances: BTreeMap<InstanceId, InstanceInfo>,
}

impl Authorizer {
    pub fn new(chain_id: u64) -> Self {
        Self { chain_id, instances: BTreeMap::new() }
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    /// Register a deployed instance under the standard domain
    pub fn register(&mut self, instance: InstanceId, name: &str) -> AuthResult<()> {
        if self.instances.contains_key(&instance) {
            return Err(AuthError::DuplicateInstance(instance));
        }
        let domain = Domain::for_instance(self.chain_id, instance);
        self.instances.insert(instance, InstanceInfo { name: name.to_string(), domain });
        debug!(%instance, name, "registered instance");
        Ok(())
    }

    pub fn instance(&self, instance: &InstanceId) -> AuthResult<&InstanceInfo> {
        self.instances
            .get(instance)
            .ok_or(AuthError::UnknownInstance(*instance))
    }

    /// Domain a signer must use for `instance`
    pub fn domain(&self, instance: &InstanceId) -> AuthResult<&Domain> {
        self.instance(instance).map(|info| &info.domain)
    }

    /// Verify a signed reencryption request and issue a grant
    pub fn request_grant(
        &self,
        instance: InstanceId,
        account: Account,
        public_key: ReencryptionPublicKey,
        signature: Signature,
    ) -> AuthResult<ReencryptionGrant> {
        let domain = self.domain(&instance)?;
        let digest = Reencrypt { public_key }.signing_digest(domain);

        let verifying_key =
            VerifyingKey::from_bytes(account.as_bytes()).map_err(|e| AuthError::MalformedKey(e.to_string()))?;
        let ed_signature = Ed25519Signature::from_bytes(&signature.0);
        if verifying_key.verify(&digest, &ed_signature).is_err() {
            warn!(%instance, %account, "rejected reencryption request");
            return Err(AuthError::InvalidSignature);
        }

        debug!(%instance, %account, "issued reencryption grant");
        Ok(ReencryptionGrant { instance, account, public_key, signature })
    }

    /// Reencrypt `value` to the grant's key if the grant covers it
    ///
    /// `value` must come from the instance's own state; the check is only as
    /// good as its scope.
    pub fn decrypt_with_grant(
        &self,
        backend: &dyn FheBackend,
        value: &ScopedCiphertext,
        grant: &ReencryptionGrant,
    ) -> AuthResult<SealedValue> {
        self.instance(&grant.instance)?;
        if grant.instance != value.instance {
            return Err(AuthError::GrantMismatch(format!(
                "grant for {} used on ciphertext of {}",
                grant.instance, value.instance
            )));
        }
        if let Some(owner) = value.owner {
            if owner != grant.account {
                return Err(AuthError::GrantMismatch(format!(
                    "ciphertext owned by {} requested by {}",
                    owner, grant.account
                )));
            }
        }
        Ok(backend.reencrypt(&value.ciphertext, &grant.public_key)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signer::LocalSigner;
    use shade_fhe::{EncryptedInput, ReencryptionKeypair, SimulatedBackend};

    const CHAIN_ID: u64 = 9000;

    struct Fixture {
        authorizer: Authorizer,
        token_a: InstanceId,
        pool: InstanceId,
        alice: LocalSigner,
        keypair: ReencryptionKeypair,
    }

    fn fixture() -> Fixture {
        let deployer = LocalSigner::from_label("deployer").account();
        let token_a = InstanceId::derive(&deployer, "tokenA");
        let pool = InstanceId::derive(&deployer, "CFMM");
        let mut authorizer = Authorizer::new(CHAIN_ID);
        authorizer.register(token_a, "tokenA").unwrap();
        authorizer.register(pool, "CFMM").unwrap();
        Fixture {
            authorizer,
            token_a,
            pool,
            alice: LocalSigner::from_label("alice"),
            keypair: ReencryptionKeypair::generate(),
        }
    }

    fn grant_for(f: &Fixture, instance: InstanceId) -> AuthResult<ReencryptionGrant> {
        let domain = f.authorizer.domain(&instance)?.clone();
        let signature = f.alice.sign_reencrypt(&domain, &f.keypair.public_key());
        f.authorizer
            .request_grant(instance, f.alice.account(), f.keypair.public_key(), signature)
    }

    #[test]
    fn test_grant_issued_for_valid_signature() {
        let f = fixture();
        let grant = grant_for(&f, f.pool).unwrap();
        assert_eq!(grant.instance(), f.pool);
        assert_eq!(grant.account(), f.alice.account());
    }

    #[test]
    fn test_signature_for_token_cannot_be_replayed_on_pool() {
        let f = fixture();
        let token_domain = f.authorizer.domain(&f.token_a).unwrap().clone();
        let signature = f.alice.sign_reencrypt(&token_domain, &f.keypair.public_key());

        let result = f
            .authorizer
            .request_grant(f.pool, f.alice.account(), f.keypair.public_key(), signature);
        assert_eq!(result.unwrap_err(), AuthError::InvalidSignature);
    }

    #[test]
    fn test_signature_by_other_account_rejected() {
        let f = fixture();
        let domain = f.authorizer.domain(&f.pool).unwrap().clone();
        let signature = LocalSigner::from_label("mallory").sign_reencrypt(&domain, &f.keypair.public_key());

        let result = f
            .authorizer
            .request_grant(f.pool, f.alice.account(), f.keypair.public_key(), signature);
        assert_eq!(result.unwrap_err(), AuthError::InvalidSignature);
    }

    #[test]
    fn test_unknown_instance() {
        let f = fixture();
        let stranger = InstanceId([0x42; 32]);
        let result = f.authorizer.request_grant(
            stranger,
            f.alice.account(),
            f.keypair.public_key(),
            Signature([0u8; 64]),
        );
        assert_eq!(result.unwrap_err(), AuthError::UnknownInstance(stranger));
    }

    #[test]
    fn test_duplicate_registration() {
        let mut f = fixture();
        assert_eq!(
            f.authorizer.register(f.pool, "again").unwrap_err(),
            AuthError::DuplicateInstance(f.pool)
        );
    }

    #[test]
    fn test_decrypt_roundtrip_and_instance_mismatch() {
        let f = fixture();
        let backend = SimulatedBackend::generate();
        let input = EncryptedInput::encrypt(20_000, &backend.network_public_key()).unwrap();
        let ct = backend.import_input(&input).unwrap();
        let scoped = ScopedCiphertext::public(f.pool, ct);

        let pool_grant = grant_for(&f, f.pool).unwrap();
        let sealed = f.authorizer.decrypt_with_grant(&backend, &scoped, &pool_grant).unwrap();
        assert_eq!(f.keypair.open(&sealed).unwrap(), 20_000);

        let token_grant = grant_for(&f, f.token_a).unwrap();
        let result = f.authorizer.decrypt_with_grant(&backend, &scoped, &token_grant);
        assert!(matches!(result, Err(AuthError::GrantMismatch(_))));
    }

    #[test]
    fn test_owned_ciphertext_requires_owner_grant() {
        let f = fixture();
        let backend = SimulatedBackend::generate();
        let bob = LocalSigner::from_label("bob").account();
        let scoped = ScopedCiphertext::owned(f.token_a, bob, backend.trivial(5).unwrap());

        let grant = grant_for(&f, f.token_a).unwrap();
        let result = f.authorizer.decrypt_with_grant(&backend, &scoped, &grant);
        assert!(matches!(result, Err(AuthError::GrantMismatch(_))));
    }
}
