//! SHADE Confidential Token Ledger
//!
//! One instance per asset. Mirrors a standard fungible token (mint, approve,
//! transfer, transferFrom) except that every amount is a ciphertext and a
//! transfer that is not covered by balance or allowance moves zero instead of
//! failing.

pub mod errors;
pub mod ledger;

pub use errors::{LedgerError, LedgerResult};
pub use ledger::ConfidentialLedger;
