//! SHADE: Confidential Constant-Product Market Maker
//!
//! This is the root crate that re-exports all SHADE components for integration
//! testing and provides unified access to the protocol primitives.
//!
//! ## Architecture Overview
//!
//! Two confidential token ledgers and one pool share an encrypted-integer
//! backend. Balances, allowances, reserves and shares are ciphertexts; the
//! only way to read one is a reencryption grant issued against a signed,
//! domain-separated request for exactly one instance.
//!
//! - **Encrypted amounts**: 32-bit values in 64-bit homomorphic slots
//! - **No-op on insufficiency**: short balances, allowances and share
//!   balances move zero instead of reverting
//! - **Per-instance grants**: a signature for one ledger never decrypts
//!   the pool or the other ledger
//!
//! ## Crate Organization
//!
//! - `shade-fhe`: encrypted-integer capability and client encryption
//! - `shade-auth`: typed-data signatures, instance registry, grants
//! - `shade-token`: confidential fungible-token ledger
//! - `shade-cfmm`: confidential pool and the market sequencer

pub use shade_auth as auth;
pub use shade_cfmm as cfmm;
pub use shade_fhe as fhe;
pub use shade_token as token;

/// SHADE protocol version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Deployment defaults
pub mod config {
    /// Largest amount any ledger, reserve or share balance can hold
    pub const MAX_AMOUNT: u64 = shade_fhe::MAX_AMOUNT;

    /// Chain id used by local deployments
    pub const LOCAL_CHAIN_ID: u64 = 9000;

    /// Development signer labels
    pub const DEV_SIGNERS: [&str; 4] = ["alice", "bob", "carol", "dave"];
}

/// Prelude module for convenient imports
pub mod prelude {
    pub use shade_auth::{Account, Authorizer, InstanceId, LocalSigner, ReencryptionGrant, ScopedCiphertext};
    pub use shade_cfmm::{CfmmError, CfmmResult, Market, MarketConfig, MarketState, PoolStatus, SharedMarket, SwapDirection};
    pub use shade_fhe::{EncryptedInput, FheBackend, FheBackendExt, ReencryptionKeypair, SealedValue, SimulatedBackend};
    pub use shade_token::ConfidentialLedger;
}
