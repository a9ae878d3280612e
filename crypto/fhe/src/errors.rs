//! FHE Error types

use thiserror::Error;

/// Errors that can occur during FHE operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FheError {
    /// Encryption failed
    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    /// Decryption failed
    #[error("Decryption failed: {0}")]
    DecryptionFailed(String),

    /// Ciphertext was produced by another key or is malformed
    #[error("Invalid ciphertext: {0}")]
    InvalidCiphertext(String),

    /// Client input could not be imported into the ciphertext domain
    #[error("Invalid encrypted input: {0}")]
    InvalidInput(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

/// Result type for FHE operations
pub type FheResult<T> = Result<T, FheError>;
