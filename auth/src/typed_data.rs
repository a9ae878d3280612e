//! Typed, domain-separated reencryption requests
//!
//! Mirrors EIP-712 structured data hashing with SHA-256:
//!
//! ```text
//! digest        = SHA256(0x19 ‖ 0x01 ‖ domainSeparator ‖ structHash)
//! domainSep     = SHA256(typeHash(Domain) ‖ SHA256(name) ‖ SHA256(version) ‖ chainId ‖ verifyingContract)
//! structHash    = SHA256(typeHash(Reencrypt) ‖ publicKey)
//! ```
//!
//! The verifying contract is the instance the grant is requested for, so a
//! signature produced for one ledger never verifies against another ledger
//! or the pool.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use shade_fhe::ReencryptionPublicKey;

use crate::address::InstanceId;

/// Domain name shown to signers
pub const DOMAIN_NAME: &str = "Authorization token";

/// Domain version
pub const DOMAIN_VERSION: &str = "1";

const DOMAIN_TYPE: &str =
    "EIP712Domain(string name,string version,uint256 chainId,address verifyingContract)";

const REENCRYPT_TYPE: &str = "Reencrypt(bytes32 publicKey)";

fn sha256(parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part);
    }
    hasher.finalize().into()
}

/// Signing domain of one instance
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Domain {
    pub name: String,
    pub version: String,
    pub chain_id: u64,
    pub verifying_contract: InstanceId,
}

impl Domain {
    /// Standard authorization domain for `instance`
    pub fn for_instance(chain_id: u64, instance: InstanceId) -> Self {
        Self {
            name: DOMAIN_NAME.to_string(),
            version: DOMAIN_VERSION.to_string(),
            chain_id,
            verifying_contract: instance,
        }
    }

    pub fn separator(&self) -> [u8; 32] {
        let mut chain_id = [0u8; 32];
        chain_id[24..].copy_from_slice(&self.chain_id.to_be_bytes());
        sha256(&[
            &sha256(&[DOMAIN_TYPE.as_bytes()]),
            &sha256(&[self.name.as_bytes()]),
            &sha256(&[self.version.as_bytes()]),
            &chain_id,
            self.verifying_contract.as_bytes(),
        ])
    }
}

/// The message an account signs to bind a reencryption key to an instance
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Reencrypt {
    pub public_key: ReencryptionPublicKey,
}

impl Reencrypt {
    pub fn struct_hash(&self) -> [u8; 32] {
        sha256(&[&sha256(&[REENCRYPT_TYPE.as_bytes()]), self.public_key.as_bytes()])
    }

    /// Digest signed by the account
    pub fn signing_digest(&self, domain: &Domain) -> [u8; 32] {
        sha256(&[&[0x19, 0x01], &domain.separator(), &self.struct_hash()])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(byte: u8) -> ReencryptionPublicKey {
        ReencryptionPublicKey([byte; 32])
    }

    #[test]
    fn test_digest_binds_instance() {
        let message = Reencrypt { public_key: key(1) };
        let token_a = Domain::for_instance(9000, InstanceId([0xaa; 32]));
        let pool = Domain::for_instance(9000, InstanceId([0xcc; 32]));
        assert_ne!(message.signing_digest(&token_a), message.signing_digest(&pool));
    }

    #[test]
    fn test_digest_binds_chain_and_key() {
        let domain = Domain::for_instance(9000, InstanceId([0xaa; 32]));
        let other_chain = Domain::for_instance(9001, InstanceId([0xaa; 32]));
        let a = Reencrypt { public_key: key(1) };
        let b = Reencrypt { public_key: key(2) };

        assert_ne!(a.signing_digest(&domain), a.signing_digest(&other_chain));
        assert_ne!(a.signing_digest(&domain), b.signing_digest(&domain));
        assert_eq!(a.signing_digest(&domain), a.signing_digest(&domain.clone()));
    }
}
