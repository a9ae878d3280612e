//! Liquidity provision and withdrawal
//!
//! Share minting:
//! - empty pool (no shares outstanding): `isqrt(gotA * gotB)`
//! - otherwise: `min(gotA * T / reserveA, gotB * T / reserveB)`
//!
//! Both branches are evaluated and the result picked with an encrypted
//! select on `T == 0`. Deposits are the amounts actually received from the
//! ledgers, so a leg that the caller could not fund contributes zero.

use shade_auth::Account;
use shade_fhe::{Ciphertext, FheBackend, FheBackendExt};
use tracing::{debug, info};

use crate::errors::CfmmResult;
use crate::pool::{ConfidentialPool, PairLedgers};

impl ConfidentialPool {
    /// Deposit both assets and mint shares to the caller
    ///
    /// Pulls each amount with `transfer_from` against the caller's allowance
    /// to the pool. Returns the encrypted number of shares minted.
    pub fn add_liquidity(
        &mut self,
        backend: &dyn FheBackend,
        ledgers: PairLedgers<'_>,
        caller: &Account,
        amount_a: &Ciphertext,
        amount_b: &Ciphertext,
    ) -> CfmmResult<Ciphertext> {
        self.check_ledgers(&ledgers)?;
        let pool = self.account();

        let got_a = ledgers.a.transfer_from_ciphertext(backend, &pool, caller, &pool, amount_a)?;
        let got_b = ledgers.b.transfer_from_ciphertext(backend, &pool, caller, &pool, amount_b)?;

        let bootstrap = backend.is_zero(&self.total_shares)?;
        let initial = backend.isqrt(&backend.mul(&got_a, &got_b)?)?;
        let from_a = backend.div(&backend.mul(&got_a, &self.total_shares)?, &self.reserve_a)?;
        let from_b = backend.div(&backend.mul(&got_b, &self.total_shares)?, &self.reserve_b)?;
        let proportional = backend.min(&from_a, &from_b)?;
        let minted = backend.select(&bootstrap, &initial, &proportional)?;

        // Reject policy: a reserve that would overflow keeps its old value and
        // the deposit mints nothing. Supply is capped at MAX_AMOUNT and the
        // pool's ledger balance backs both reserves, so this cannot fire while
        // that cap holds.
        let (reserve_a, fits_a) = backend.checked_add(&self.reserve_a, &got_a)?;
        let (reserve_b, fits_b) = backend.checked_add(&self.reserve_b, &got_b)?;
        let reserves_fit = backend.and(&fits_a, &fits_b)?;
        let minted = backend.amount_if(&reserves_fit, &minted)?;

        // Same policy for the share supply
        let (total, fits) = backend.checked_add(&self.total_shares, &minted)?;
        let minted = backend.amount_if(&fits, &minted)?;
        let held = backend.add(&self.shares_ct(backend, caller)?, &minted)?;

        let nothing_minted = backend.is_zero(&minted)?;
        let activated = backend.select(&nothing_minted, &self.activated, &backend.trivial(1)?)?;
        debug!(pool = %self.name, ops = total.op_count(), "computed liquidity deposit");

        self.reserve_a = reserve_a;
        self.reserve_b = reserve_b;
        self.total_shares = total;
        self.shares.insert(*caller, held);
        self.activated = activated;

        info!(pool = %self.name, provider = %caller, "add_liquidity");
        Ok(minted)
    }

    /// Burn up to `shares` of the caller's shares and pay out the backing
    ///
    /// A request larger than the caller's balance burns nothing. Returns the
    /// encrypted amounts of A and B paid out.
    pub fn remove_liquidity(
        &mut self,
        backend: &dyn FheBackend,
        ledgers: PairLedgers<'_>,
        caller: &Account,
        shares: &Ciphertext,
    ) -> CfmmResult<(Ciphertext, Ciphertext)> {
        self.check_ledgers(&ledgers)?;
        let pool = self.account();

        let held = self.shares_ct(backend, caller)?;
        let covered = backend.ge(&held, shares)?;
        let burn = backend.amount_if(&covered, shares)?;

        let out_a = backend.div(&backend.mul(&burn, &self.reserve_a)?, &self.total_shares)?;
        let out_b = backend.div(&backend.mul(&burn, &self.reserve_b)?, &self.total_shares)?;

        let held = backend.sub(&held, &burn)?;
        let total = backend.sub(&self.total_shares, &burn)?;
        let reserve_a = backend.sub(&self.reserve_a, &out_a)?;
        let reserve_b = backend.sub(&self.reserve_b, &out_b)?;
        debug!(pool = %self.name, ops = total.op_count(), "computed liquidity withdrawal");

        // The pool's ledger balance always covers its reserves
        ledgers.a.transfer_ciphertext(backend, &pool, caller, &out_a)?;
        ledgers.b.transfer_ciphertext(backend, &pool, caller, &out_b)?;

        self.shares.insert(*caller, held);
        self.total_shares = total;
        self.reserve_a = reserve_a;
        self.reserve_b = reserve_b;

        info!(pool = %self.name, provider = %caller, "remove_liquidity");
        Ok((out_a, out_b))
    }
}
