//! Market execution environment
//!
//! Owns the backend handle, the instance registry, both ledgers and the pool,
//! and runs every state mutation as one serialized transaction. A transaction
//! works on live state but keeps a checkpoint; if any step fails the whole
//! market is restored to it, so no caller ever sees a half-applied effect.
//!
//! Every mutation takes `caller`, the authenticated sender of the
//! transaction. The market does not check it: whoever drives a `Market`
//! (the sequencer) must have authenticated the sender already. Handing a
//! `Market` to untrusted code lets it act as any account, the pool included.
//!
//! Reads come in two forms. `get_*`, `balance_of` and `allowance` return
//! scoped ciphertexts, which are public data. `reveal_*` reencrypt a value
//! to a grant's key; the slot is chosen from the grant, so a grant can only
//! open values of its own instance and, for owned values, its own account.
//! The backend handle stays private for the same reason.

use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use shade_auth::{Account, Authorizer, Domain, InstanceId, ReencryptionGrant, ScopedCiphertext, Signature};
use shade_fhe::{EncryptedInput, FheBackend, NetworkPublicKey, ReencryptionPublicKey, SealedValue};
use shade_token::ConfidentialLedger;
use tracing::{info, warn};

use crate::errors::{CfmmError, CfmmResult};
use crate::pool::{ConfidentialPool, PairLedgers};
use crate::swap::SwapDirection;

/// Name and symbol of one asset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenConfig {
    pub name: String,
    pub symbol: String,
}

/// Deployment parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketConfig {
    /// Chain id bound into every signing domain
    pub chain_id: u64,
    pub token_a: TokenConfig,
    pub token_b: TokenConfig,
    pub pool_name: String,
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            chain_id: 9000,
            token_a: TokenConfig { name: "Token A".into(), symbol: "TKA".into() },
            token_b: TokenConfig { name: "Token B".into(), symbol: "TKB".into() },
            pool_name: "CFMM".into(),
        }
    }
}

/// Everything a market persists
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MarketState {
    pub authorizer: Authorizer,
    pub token_a: ConfidentialLedger,
    pub token_b: ConfidentialLedger,
    pub pool: ConfidentialPool,
}

impl MarketState {
    pub fn to_json(&self) -> CfmmResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| CfmmError::Snapshot(e.to_string()))
    }

    pub fn from_json(json: &str) -> CfmmResult<Self> {
        serde_json::from_str(json).map_err(|e| CfmmError::Snapshot(e.to_string()))
    }
}

/// Two ledgers, one pool, one sequencer
pub struct Market {
    backend: Arc<dyn FheBackend>,
    state: MarketState,
}

impl Market {
    /// Deploy both ledgers and the pool, owned by `deployer`
    pub fn deploy(backend: Arc<dyn FheBackend>, config: &MarketConfig, deployer: Account) -> CfmmResult<Self> {
        let id_a = InstanceId::derive(&deployer, "tokenA");
        let id_b = InstanceId::derive(&deployer, "tokenB");
        let id_pool = InstanceId::derive(&deployer, &config.pool_name);

        let mut authorizer = Authorizer::new(config.chain_id);
        authorizer.register(id_a, &config.token_a.name)?;
        authorizer.register(id_b, &config.token_b.name)?;
        authorizer.register(id_pool, &config.pool_name)?;

        let token_a = ConfidentialLedger::new(id_a, &config.token_a.name, &config.token_a.symbol, deployer);
        let token_b = ConfidentialLedger::new(id_b, &config.token_b.name, &config.token_b.symbol, deployer);
        let pool = ConfidentialPool::new(backend.as_ref(), id_pool, &config.pool_name, id_a, id_b)?;

        info!(pool = %id_pool, token_a = %id_a, token_b = %id_b, "deployed market");
        Ok(Self { backend, state: MarketState { authorizer, token_a, token_b, pool } })
    }

    /// Resume from a snapshot taken under the same backend keys
    pub fn from_state(backend: Arc<dyn FheBackend>, state: MarketState) -> Self {
        Self { backend, state }
    }

    pub fn snapshot(&self) -> MarketState {
        self.state.clone()
    }

    pub fn network_public_key(&self) -> NetworkPublicKey {
        self.backend.network_public_key()
    }

    pub fn token_a_id(&self) -> InstanceId {
        self.state.token_a.id()
    }

    pub fn token_b_id(&self) -> InstanceId {
        self.state.token_b.id()
    }

    pub fn pool_id(&self) -> InstanceId {
        self.state.pool.id()
    }

    /// The pool's account; approve it as spender before depositing
    pub fn pool_account(&self) -> Account {
        self.state.pool.account()
    }

    pub fn ledger(&self, token: InstanceId) -> CfmmResult<&ConfidentialLedger> {
        if token == self.state.token_a.id() {
            Ok(&self.state.token_a)
        } else if token == self.state.token_b.id() {
            Ok(&self.state.token_b)
        } else {
            Err(CfmmError::UnknownLedger(token))
        }
    }

    pub fn pool(&self) -> &ConfidentialPool {
        &self.state.pool
    }

    fn transact<T>(
        &mut self,
        label: &str,
        apply: impl FnOnce(&dyn FheBackend, &mut MarketState) -> CfmmResult<T>,
    ) -> CfmmResult<T> {
        let checkpoint = self.state.clone();
        match apply(self.backend.as_ref(), &mut self.state) {
            Ok(value) => Ok(value),
            Err(e) => {
                warn!(tx = label, error = %e, "transaction rolled back");
                self.state = checkpoint;
                Err(e)
            }
        }
    }

    fn ledger_mut(state: &mut MarketState, token: InstanceId) -> CfmmResult<&mut ConfidentialLedger> {
        if token == state.token_a.id() {
            Ok(&mut state.token_a)
        } else if token == state.token_b.id() {
            Ok(&mut state.token_b)
        } else {
            Err(CfmmError::UnknownLedger(token))
        }
    }

    // Ledger transactions

    pub fn mint(&mut self, caller: &Account, token: InstanceId, amount: u64) -> CfmmResult<()> {
        self.transact("mint", |backend, state| {
            Ok(Self::ledger_mut(state, token)?.mint(backend, caller, amount)?)
        })
    }

    pub fn approve(
        &mut self,
        caller: &Account,
        token: InstanceId,
        spender: &Account,
        amount: &EncryptedInput,
    ) -> CfmmResult<()> {
        self.transact("approve", |backend, state| {
            Ok(Self::ledger_mut(state, token)?.approve(backend, caller, spender, amount)?)
        })
    }

    pub fn transfer(
        &mut self,
        caller: &Account,
        token: InstanceId,
        to: &Account,
        amount: &EncryptedInput,
    ) -> CfmmResult<()> {
        self.transact("transfer", |backend, state| {
            Ok(Self::ledger_mut(state, token)?.transfer(backend, caller, to, amount)?)
        })
    }

    pub fn transfer_from(
        &mut self,
        caller: &Account,
        token: InstanceId,
        owner: &Account,
        recipient: &Account,
        amount: &EncryptedInput,
    ) -> CfmmResult<()> {
        self.transact("transfer_from", |backend, state| {
            Ok(Self::ledger_mut(state, token)?.transfer_from(backend, caller, owner, recipient, amount)?)
        })
    }

    // Pool transactions

    pub fn add_liquidity(
        &mut self,
        caller: &Account,
        amount_a: &EncryptedInput,
        amount_b: &EncryptedInput,
    ) -> CfmmResult<()> {
        self.transact("add_liquidity", |backend, state| {
            let amount_a = backend.import_input(amount_a)?;
            let amount_b = backend.import_input(amount_b)?;
            let ledgers = PairLedgers { a: &mut state.token_a, b: &mut state.token_b };
            state.pool.add_liquidity(backend, ledgers, caller, &amount_a, &amount_b)?;
            Ok(())
        })
    }

    pub fn remove_liquidity(&mut self, caller: &Account, shares: &EncryptedInput) -> CfmmResult<()> {
        self.transact("remove_liquidity", |backend, state| {
            let shares = backend.import_input(shares)?;
            let ledgers = PairLedgers { a: &mut state.token_a, b: &mut state.token_b };
            state.pool.remove_liquidity(backend, ledgers, caller, &shares)?;
            Ok(())
        })
    }

    pub fn swap(
        &mut self,
        caller: &Account,
        direction: SwapDirection,
        amount_in: &EncryptedInput,
        min_out: &EncryptedInput,
    ) -> CfmmResult<()> {
        self.transact("swap", |backend, state| {
            let amount_in = backend.import_input(amount_in)?;
            let min_out = backend.import_input(min_out)?;
            let ledgers = PairLedgers { a: &mut state.token_a, b: &mut state.token_b };
            state.pool.swap(backend, ledgers, caller, direction, &amount_in, &min_out)?;
            Ok(())
        })
    }

    // Reads

    pub fn get_reserve_a(&self) -> ScopedCiphertext {
        self.state.pool.get_reserve_a()
    }

    pub fn get_reserve_b(&self) -> ScopedCiphertext {
        self.state.pool.get_reserve_b()
    }

    pub fn get_constant_product(&self) -> CfmmResult<ScopedCiphertext> {
        self.state.pool.get_constant_product(self.backend.as_ref())
    }

    pub fn get_total_shares(&self) -> ScopedCiphertext {
        self.state.pool.get_total_shares()
    }

    pub fn get_shares(&self, account: &Account) -> CfmmResult<ScopedCiphertext> {
        self.state.pool.get_shares(self.backend.as_ref(), account)
    }

    pub fn get_status(&self) -> ScopedCiphertext {
        self.state.pool.get_status()
    }

    pub fn balance_of(&self, token: InstanceId, account: &Account) -> CfmmResult<ScopedCiphertext> {
        Ok(self.ledger(token)?.balance_of(self.backend.as_ref(), account)?)
    }

    pub fn allowance(&self, token: InstanceId, owner: &Account, spender: &Account) -> CfmmResult<ScopedCiphertext> {
        Ok(self.ledger(token)?.allowance(self.backend.as_ref(), owner, spender)?)
    }

    // Authorization

    /// Signing domain for `instance`
    pub fn domain(&self, instance: &InstanceId) -> CfmmResult<Domain> {
        Ok(self.state.authorizer.domain(instance)?.clone())
    }

    pub fn request_grant(
        &self,
        instance: InstanceId,
        account: Account,
        public_key: ReencryptionPublicKey,
        signature: Signature,
    ) -> CfmmResult<ReencryptionGrant> {
        Ok(self.state.authorizer.request_grant(instance, account, public_key, signature)?)
    }

    fn reveal(&self, value: ScopedCiphertext, grant: &ReencryptionGrant) -> CfmmResult<SealedValue> {
        Ok(self.state.authorizer.decrypt_with_grant(self.backend.as_ref(), &value, grant)?)
    }

    // Authorized reads. Each one picks its slot from market state and the
    // grant, never from a caller-supplied ciphertext.

    pub fn reveal_reserve_a(&self, grant: &ReencryptionGrant) -> CfmmResult<SealedValue> {
        self.reveal(self.get_reserve_a(), grant)
    }

    pub fn reveal_reserve_b(&self, grant: &ReencryptionGrant) -> CfmmResult<SealedValue> {
        self.reveal(self.get_reserve_b(), grant)
    }

    pub fn reveal_constant_product(&self, grant: &ReencryptionGrant) -> CfmmResult<SealedValue> {
        self.reveal(self.get_constant_product()?, grant)
    }

    pub fn reveal_total_shares(&self, grant: &ReencryptionGrant) -> CfmmResult<SealedValue> {
        self.reveal(self.get_total_shares(), grant)
    }

    pub fn reveal_status(&self, grant: &ReencryptionGrant) -> CfmmResult<SealedValue> {
        self.reveal(self.get_status(), grant)
    }

    /// The grant holder's pool shares
    pub fn reveal_shares(&self, grant: &ReencryptionGrant) -> CfmmResult<SealedValue> {
        self.reveal(self.get_shares(&grant.account())?, grant)
    }

    /// The grant holder's balance on `token`
    pub fn reveal_balance(&self, token: InstanceId, grant: &ReencryptionGrant) -> CfmmResult<SealedValue> {
        Ok(self.ledger(token)?.reveal_balance(self.backend.as_ref(), &self.state.authorizer, grant)?)
    }

    /// The grant holder's allowance to `spender` on `token`
    pub fn reveal_allowance(
        &self,
        token: InstanceId,
        spender: &Account,
        grant: &ReencryptionGrant,
    ) -> CfmmResult<SealedValue> {
        let ledger = self.ledger(token)?;
        Ok(ledger.reveal_allowance(self.backend.as_ref(), &self.state.authorizer, grant, spender)?)
    }
}

/// Market behind a lock; submitters are served one transaction at a time
#[derive(Clone)]
pub struct SharedMarket {
    inner: Arc<Mutex<Market>>,
}

impl SharedMarket {
    pub fn new(market: Market) -> Self {
        Self { inner: Arc::new(Mutex::new(market)) }
    }

    /// Run `f` with exclusive access
    pub fn execute<T>(&self, f: impl FnOnce(&mut Market) -> T) -> T {
        let mut market = self.inner.lock();
        f(&mut market)
    }

    pub fn read<T>(&self, f: impl FnOnce(&Market) -> T) -> T {
        let market = self.inner.lock();
        f(&market)
    }
}
