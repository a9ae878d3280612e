//! Account and instance identifiers
//!
//! Both are 32-byte addresses rendered as lowercase hex. An account is the
//! Ed25519 verifying key of its signer; an instance is derived from its
//! deployer and a label, the way contract addresses are.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

mod hex32 {
    use super::*;

    pub fn serialize<S: Serializer>(bytes: &[u8; 32], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<[u8; 32], D::Error> {
        let s = String::deserialize(deserializer)?;
        let raw = hex::decode(s.trim_start_matches("0x")).map_err(serde::de::Error::custom)?;
        raw.try_into()
            .map_err(|_| serde::de::Error::custom("address must be 32 bytes"))
    }
}

/// External identity: the Ed25519 verifying key of a signer
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Account(#[serde(with = "hex32")] pub [u8; 32]);

impl Account {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl std::fmt::Display for Account {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl std::fmt::Debug for Account {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Account(0x{})", hex::encode(&self.0[..6]))
    }
}

/// Address of a deployed ledger or pool
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct InstanceId(#[serde(with = "hex32")] pub [u8; 32]);

impl InstanceId {
    /// Deterministic instance address from its deployer and a label
    pub fn derive(deployer: &Account, label: &str) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(b"shade-instance-v1");
        hasher.update(&deployer.0);
        hasher.update(label.as_bytes());
        Self(*hasher.finalize().as_bytes())
    }

    /// The instance as a holder of balances on other instances
    pub fn as_account(&self) -> Account {
        Account(self.0)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl std::fmt::Display for InstanceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl std::fmt::Debug for InstanceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "InstanceId(0x{})", hex::encode(&self.0[..6]))
    }
}
