//! Ledger error types
//!
//! Insufficient balance or allowance is deliberately absent: those cases are
//! absorbed into zero-amount transfers and never observable from the call.

use shade_auth::{Account, AuthError};
use shade_fhe::FheError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// Only the contract owner may mint
    #[error("Caller {0} is not the ledger owner")]
    NotOwner(Account),

    /// Plaintext mint would push total supply past the amount range
    #[error("Supply overflow: supply {supply}, requested {requested}")]
    SupplyOverflow { supply: u64, requested: u64 },

    #[error("Authorization failed: {0}")]
    Auth(#[from] AuthError),

    #[error("FHE operation failed: {0}")]
    Fhe(#[from] FheError),
}

/// Result type for ledger operations
pub type LedgerResult<T> = Result<T, LedgerError>;
