//! Authorization error types

use shade_fhe::FheError;
use thiserror::Error;

use crate::address::InstanceId;

/// Authorization failures. These are the only errors surfaced to callers
/// before any encrypted state is touched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Signature does not verify for the claimed account
    #[error("Invalid signature")]
    InvalidSignature,

    /// Grant used against a ciphertext it does not cover
    #[error("Grant mismatch: {0}")]
    GrantMismatch(String),

    /// Instance identifier was never registered
    #[error("Unknown instance: {0}")]
    UnknownInstance(InstanceId),

    /// Instance identifier already registered
    #[error("Instance already registered: {0}")]
    DuplicateInstance(InstanceId),

    /// Account bytes are not a valid Ed25519 verifying key
    #[error("Malformed account key: {0}")]
    MalformedKey(String),

    /// Reencryption failed inside the backend
    #[error("FHE operation failed: {0}")]
    Fhe(#[from] FheError),
}

/// Result type for authorization operations
pub type AuthResult<T> = Result<T, AuthError>;
