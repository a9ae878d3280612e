//! SHADE Confidential CFMM
//!
//! A constant-product market maker whose reserves, share supply and
//! per-provider shares are ciphertexts.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                         Market                           │
//! │   sequencer · checkpoint rollback · snapshots            │
//! ├──────────────────────────────────────────────────────────┤
//! │  ┌────────────┐   ┌────────────────┐   ┌────────────┐    │
//! │  │  Ledger A  │◄──┤ ConfidentialPool├──►│  Ledger B  │    │
//! │  └────────────┘   └────────────────┘   └────────────┘    │
//! │            Authorizer (grants per instance)              │
//! ├──────────────────────────────────────────────────────────┤
//! │                 FheBackend (encrypted ops)               │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! Insufficient balances, allowances, shares and missed slippage bounds
//! never abort; they resolve under encryption to zero-amount effects.

pub mod errors;
pub mod liquidity;
pub mod market;
pub mod pool;
pub mod swap;

#[cfg(test)]
mod testing;

pub use errors::{CfmmError, CfmmResult};
pub use market::{Market, MarketConfig, MarketState, SharedMarket, TokenConfig};
pub use pool::{ConfidentialPool, PairLedgers, PoolStatus};
pub use swap::SwapDirection;
