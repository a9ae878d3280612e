//! CFMM error types
//!
//! There is no insufficient-funds, insufficient-shares or slippage variant:
//! those conditions are evaluated under encryption and resolve to zero-amount
//! effects. Only authorization, wiring and backend failures abort.

use shade_auth::{AuthError, InstanceId};
use shade_fhe::FheError;
use shade_token::LedgerError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CfmmError {
    #[error("Authorization failed: {0}")]
    Auth(#[from] AuthError),

    #[error("Ledger operation failed: {0}")]
    Ledger(#[from] LedgerError),

    #[error("FHE operation failed: {0}")]
    Fhe(#[from] FheError),

    /// Ledger is not one of this pool's two assets
    #[error("Unknown ledger: {0}")]
    UnknownLedger(InstanceId),

    #[error("Snapshot error: {0}")]
    Snapshot(String),
}

/// Result type for CFMM operations
pub type CfmmResult<T> = Result<T, CfmmError>;
