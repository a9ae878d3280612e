//! Confidential pool state
//!
//! Holds encrypted reserves, the encrypted share supply and per-provider
//! encrypted share balances. Liquidity and swap transitions live in
//! `liquidity.rs` and `swap.rs`; this module owns the state and its reads.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use shade_auth::{Account, InstanceId, ScopedCiphertext};
use shade_fhe::{Ciphertext, FheBackend, FheBackendExt};
use shade_token::ConfidentialLedger;
use tracing::debug;

use crate::errors::{CfmmError, CfmmResult};

/// Lifecycle of a pool, as revealed by decrypting `get_status`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PoolStatus {
    /// No shares have ever been minted
    Uninitialized,
    /// At least one deposit minted shares
    Active,
}

impl PoolStatus {
    /// Interpret a decrypted status flag
    pub fn from_flag(flag: u64) -> Self {
        if flag == 0 {
            PoolStatus::Uninitialized
        } else {
            PoolStatus::Active
        }
    }
}

/// The two ledgers a pool trades, borrowed for one transaction
pub struct PairLedgers<'a> {
    pub a: &'a mut ConfidentialLedger,
    pub b: &'a mut ConfidentialLedger,
}

/// Encrypted constant-product pool
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ConfidentialPool {
    pub(crate) id: InstanceId,
    pub(crate) name: String,
    pub(crate) token_a: InstanceId,
    pub(crate) token_b: InstanceId,
    pub(crate) reserve_a: Ciphertext,
    pub(crate) reserve_b: Ciphertext,
    pub(crate) total_shares: Ciphertext,
    pub(crate) shares: BTreeMap<Account, Ciphertext>,
    /// Encrypted 0/1; set once shares are first minted and never cleared
    pub(crate) activated: Ciphertext,
}

impl ConfidentialPool {
    /// Empty pool over `token_a` / `token_b`
    pub fn new(
        backend: &dyn FheBackend,
        id: InstanceId,
        name: &str,
        token_a: InstanceId,
        token_b: InstanceId,
    ) -> CfmmResult<Self> {
        let zero = backend.zero()?;
        Ok(Self {
            id,
            name: name.to_string(),
            token_a,
            token_b,
            reserve_a: zero.clone(),
            reserve_b: zero.clone(),
            total_shares: zero.clone(),
            shares: BTreeMap::new(),
            activated: zero,
        })
    }

    pub fn id(&self) -> InstanceId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The pool as a holder on the token ledgers
    pub fn account(&self) -> Account {
        self.id.as_account()
    }

    pub fn token_a(&self) -> InstanceId {
        self.token_a
    }

    pub fn token_b(&self) -> InstanceId {
        self.token_b
    }

    /// Accounts that have held shares at some point
    pub fn providers(&self) -> impl Iterator<Item = &Account> {
        self.shares.keys()
    }

    pub(crate) fn check_ledgers(&self, ledgers: &PairLedgers<'_>) -> CfmmResult<()> {
        if ledgers.a.id() != self.token_a {
            return Err(CfmmError::UnknownLedger(ledgers.a.id()));
        }
        if ledgers.b.id() != self.token_b {
            return Err(CfmmError::UnknownLedger(ledgers.b.id()));
        }
        Ok(())
    }

    pub(crate) fn shares_ct(&self, backend: &dyn FheBackend, account: &Account) -> CfmmResult<Ciphertext> {
        match self.shares.get(account) {
            Some(ct) => Ok(ct.clone()),
            None => Ok(backend.zero()?),
        }
    }

    pub fn get_reserve_a(&self) -> ScopedCiphertext {
        ScopedCiphertext::public(self.id, self.reserve_a.clone())
    }

    pub fn get_reserve_b(&self) -> ScopedCiphertext {
        ScopedCiphertext::public(self.id, self.reserve_b.clone())
    }

    /// Encrypted `reserve_a * reserve_b`
    pub fn get_constant_product(&self, backend: &dyn FheBackend) -> CfmmResult<ScopedCiphertext> {
        let product = backend.mul(&self.reserve_a, &self.reserve_b)?;
        debug!(pool = %self.name, ops = product.op_count(), "computed constant product");
        Ok(ScopedCiphertext::public(self.id, product))
    }

    pub fn get_total_shares(&self) -> ScopedCiphertext {
        ScopedCiphertext::public(self.id, self.total_shares.clone())
    }

    /// Encrypted share balance, decryptable only by `account`
    pub fn get_shares(&self, backend: &dyn FheBackend, account: &Account) -> CfmmResult<ScopedCiphertext> {
        Ok(ScopedCiphertext::owned(self.id, *account, self.shares_ct(backend, account)?))
    }

    /// Encrypted status flag; decrypt and pass to `PoolStatus::from_flag`
    pub fn get_status(&self) -> ScopedCiphertext {
        ScopedCiphertext::public(self.id, self.activated.clone())
    }
}
