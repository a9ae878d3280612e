//! Fee-free constant-product swaps
//!
//! `out = reserveOut * got / (reserveIn + got)`, floored, so
//! `(reserveIn + got) * (reserveOut - out) >= reserveIn * reserveOut`.
//! The slippage bound is checked under encryption; when it fails (or the
//! trade would pay out nothing) the pulled input is refunded instead of
//! reverting.

use serde::{Deserialize, Serialize};
use shade_auth::Account;
use shade_fhe::{Ciphertext, FheBackend, FheBackendExt};
use tracing::{debug, info};

use crate::errors::CfmmResult;
use crate::pool::{ConfidentialPool, PairLedgers};

/// Direction of a swap
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SwapDirection {
    /// Sell token A for token B
    AtoB,
    /// Sell token B for token A
    BtoA,
}

impl std::str::FromStr for SwapDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "a-to-b" | "atob" | "ab" => Ok(SwapDirection::AtoB),
            "b-to-a" | "btoa" | "ba" => Ok(SwapDirection::BtoA),
            other => Err(format!("unknown swap direction '{other}', expected a-to-b or b-to-a")),
        }
    }
}

impl ConfidentialPool {
    /// Sell `amount_in` of one asset for at least `min_out` of the other
    ///
    /// Returns the encrypted amount paid out, zero when the input could not
    /// be pulled or the slippage bound was not met.
    pub fn swap(
        &mut self,
        backend: &dyn FheBackend,
        ledgers: PairLedgers<'_>,
        caller: &Account,
        direction: SwapDirection,
        amount_in: &Ciphertext,
        min_out: &Ciphertext,
    ) -> CfmmResult<Ciphertext> {
        self.check_ledgers(&ledgers)?;
        let pool = self.account();

        let (ledger_in, ledger_out, reserve_in, reserve_out) = match direction {
            SwapDirection::AtoB => (ledgers.a, ledgers.b, &self.reserve_a, &self.reserve_b),
            SwapDirection::BtoA => (ledgers.b, ledgers.a, &self.reserve_b, &self.reserve_a),
        };

        let got = ledger_in.transfer_from_ciphertext(backend, &pool, caller, &pool, amount_in)?;
        let quoted = backend.div(&backend.mul(&got, reserve_out)?, &backend.add(reserve_in, &got)?)?;

        let acceptable = backend.ge(&quoted, min_out)?;
        let nonzero = backend.not(&backend.is_zero(&quoted)?)?;
        let filled = backend.and(&acceptable, &nonzero)?;

        let paid = backend.amount_if(&filled, &quoted)?;
        let kept = backend.amount_if(&filled, &got)?;
        let refund = backend.sub(&got, &kept)?;

        let new_in = backend.add(reserve_in, &kept)?;
        let new_out = backend.sub(reserve_out, &paid)?;
        debug!(pool = %self.name, ?direction, ops = new_out.op_count(), "computed swap");

        ledger_out.transfer_ciphertext(backend, &pool, caller, &paid)?;
        ledger_in.transfer_ciphertext(backend, &pool, caller, &refund)?;

        match direction {
            SwapDirection::AtoB => {
                self.reserve_a = new_in;
                self.reserve_b = new_out;
            }
            SwapDirection::BtoA => {
                self.reserve_b = new_in;
                self.reserve_a = new_out;
            }
        }

        info!(pool = %self.name, trader = %caller, ?direction, "swap");
        Ok(paid)
    }
}
