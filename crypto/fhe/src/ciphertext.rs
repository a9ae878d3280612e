//! Opaque ciphertext types
//!
//! `Ciphertext` carries an encrypted unsigned integer held in a 64-bit slot,
//! `EncryptedBool` the result of an encrypted comparison. Both are plain byte
//! containers: only the backend that produced them can interpret the payload.

use serde::{Deserialize, Serialize};

/// Encrypted unsigned integer
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ciphertext {
    /// Backend-specific payload
    data: Vec<u8>,
    /// Operation count (noise proxy)
    op_count: u32,
}

impl Ciphertext {
    /// Wrap a backend payload
    pub fn new(data: Vec<u8>) -> Self {
        Self { data, op_count: 0 }
    }

    /// Wrap a backend payload produced by `op_count` homomorphic operations
    pub fn with_ops(data: Vec<u8>, op_count: u32) -> Self {
        Self { data, op_count }
    }

    /// Raw payload
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Operations applied since fresh encryption
    pub fn op_count(&self) -> u32 {
        self.op_count
    }

    /// Stable fingerprint of the payload, safe to log
    pub fn fingerprint(&self) -> String {
        hex::encode(&blake3::hash(&self.data).as_bytes()[..8])
    }
}

impl std::fmt::Debug for Ciphertext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ciphertext")
            .field("size", &self.data.len())
            .field("ops", &self.op_count)
            .finish()
    }
}

/// Encrypted boolean for comparison results
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedBool {
    data: Vec<u8>,
}

impl EncryptedBool {
    /// Wrap a backend payload
    pub fn new(data: Vec<u8>) -> Self {
        Self { data }
    }

    /// Raw payload
    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

impl std::fmt::Debug for EncryptedBool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncryptedBool")
            .field("size", &self.data.len())
            .finish()
    }
}
