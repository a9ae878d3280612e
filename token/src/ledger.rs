//! Confidential token ledger
//!
//! A fungible-token contract whose balances and allowances are ciphertexts.
//! The ledger cannot see amounts, so it cannot refuse a transfer that is not
//! covered: it computes an encrypted "covered" flag and moves either the
//! requested amount or zero. The call itself always succeeds.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use shade_auth::{Account, Authorizer, InstanceId, ReencryptionGrant, ScopedCiphertext};
use shade_fhe::{Ciphertext, EncryptedBool, EncryptedInput, FheBackend, FheBackendExt, SealedValue, MAX_AMOUNT};
use tracing::{debug, info};

use crate::errors::{LedgerError, LedgerResult};

/// Balances after a transfer, computed but not yet written
struct Settlement {
    from: Account,
    to: Account,
    moved: Ciphertext,
    /// New `(from, to)` balances; `None` for a self-transfer
    balances: Option<(Ciphertext, Ciphertext)>,
}

/// Encrypted balances and allowances of one asset
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ConfidentialLedger {
    id: InstanceId,
    name: String,
    symbol: String,
    owner: Account,
    total_supply: u64,
    balances: BTreeMap<Account, Ciphertext>,
    /// owner -> spender -> allowance
    allowances: BTreeMap<Account, BTreeMap<Account, Ciphertext>>,
}

impl ConfidentialLedger {
    /// Empty ledger owned by `owner`
    pub fn new(id: InstanceId, name: &str, symbol: &str, owner: Account) -> Self {
        Self {
            id,
            name: name.to_string(),
            symbol: symbol.to_string(),
            owner,
            total_supply: 0,
            balances: BTreeMap::new(),
            allowances: BTreeMap::new(),
        }
    }

    pub fn id(&self) -> InstanceId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn owner(&self) -> Account {
        self.owner
    }

    /// Public total supply; only `mint` changes it
    pub fn total_supply(&self) -> u64 {
        self.total_supply
    }

    /// Accounts with a stored balance entry
    pub fn holders(&self) -> impl Iterator<Item = &Account> {
        self.balances.keys()
    }

    fn balance_ct(&self, backend: &dyn FheBackend, account: &Account) -> LedgerResult<Ciphertext> {
        match self.balances.get(account) {
            Some(ct) => Ok(ct.clone()),
            None => Ok(backend.zero()?),
        }
    }

    fn allowance_ct(&self, backend: &dyn FheBackend, owner: &Account, spender: &Account) -> LedgerResult<Ciphertext> {
        match self.allowances.get(owner).and_then(|m| m.get(spender)) {
            Some(ct) => Ok(ct.clone()),
            None => Ok(backend.zero()?),
        }
    }

    /// Mint a public amount to the owner
    pub fn mint(&mut self, backend: &dyn FheBackend, caller: &Account, amount: u64) -> LedgerResult<()> {
        if *caller != self.owner {
            return Err(LedgerError::NotOwner(*caller));
        }
        let supply = self
            .total_supply
            .checked_add(amount)
            .filter(|s| *s <= MAX_AMOUNT)
            .ok_or(LedgerError::SupplyOverflow { supply: self.total_supply, requested: amount })?;

        let balance = backend.add(&self.balance_ct(backend, caller)?, &backend.trivial(amount)?)?;
        self.balances.insert(*caller, balance);
        self.total_supply = supply;
        info!(token = %self.symbol, amount, supply, "minted");
        Ok(())
    }

    /// Set `allowance[caller][spender]` to a client-encrypted amount
    pub fn approve(
        &mut self,
        backend: &dyn FheBackend,
        caller: &Account,
        spender: &Account,
        amount: &EncryptedInput,
    ) -> LedgerResult<()> {
        let amount = backend.import_input(amount)?;
        self.approve_ciphertext(caller, spender, amount);
        Ok(())
    }

    /// Overwrite an allowance with an existing ciphertext
    pub fn approve_ciphertext(&mut self, caller: &Account, spender: &Account, amount: Ciphertext) {
        self.allowances.entry(*caller).or_default().insert(*spender, amount);
        info!(token = %self.symbol, owner = %caller, %spender, "approved");
    }

    /// Move a client-encrypted amount from the caller to `to`
    pub fn transfer(
        &mut self,
        backend: &dyn FheBackend,
        caller: &Account,
        to: &Account,
        amount: &EncryptedInput,
    ) -> LedgerResult<()> {
        let amount = backend.import_input(amount)?;
        self.transfer_ciphertext(backend, caller, to, &amount)?;
        Ok(())
    }

    /// Move `amount` from the caller to `to`, or nothing if the balance is short
    ///
    /// Returns the encrypted amount actually moved.
    pub fn transfer_ciphertext(
        &mut self,
        backend: &dyn FheBackend,
        caller: &Account,
        to: &Account,
        amount: &Ciphertext,
    ) -> LedgerResult<Ciphertext> {
        let settlement = self.settle(backend, caller, to, amount, None)?;
        let moved = self.commit(settlement);
        info!(token = %self.symbol, from = %caller, %to, "transfer");
        Ok(moved)
    }

    /// Spend the caller's allowance to move a client-encrypted amount
    pub fn transfer_from(
        &mut self,
        backend: &dyn FheBackend,
        caller: &Account,
        owner: &Account,
        recipient: &Account,
        amount: &EncryptedInput,
    ) -> LedgerResult<()> {
        let amount = backend.import_input(amount)?;
        self.transfer_from_ciphertext(backend, caller, owner, recipient, &amount)?;
        Ok(())
    }

    /// Move `amount` from `owner` to `recipient` against the caller's allowance
    ///
    /// Moves nothing unless both the allowance and the balance cover the
    /// amount. Returns the encrypted amount actually moved.
    pub fn transfer_from_ciphertext(
        &mut self,
        backend: &dyn FheBackend,
        caller: &Account,
        owner: &Account,
        recipient: &Account,
        amount: &Ciphertext,
    ) -> LedgerResult<Ciphertext> {
        let allowance = self.allowance_ct(backend, owner, caller)?;
        let allowed = backend.ge(&allowance, amount)?;
        let settlement = self.settle(backend, owner, recipient, amount, Some(allowed))?;
        let remaining = backend.sub(&allowance, &settlement.moved)?;

        self.allowances.entry(*owner).or_default().insert(*caller, remaining);
        let moved = self.commit(settlement);
        info!(token = %self.symbol, spender = %caller, %owner, %recipient, "transfer_from");
        Ok(moved)
    }

    fn settle(
        &self,
        backend: &dyn FheBackend,
        from: &Account,
        to: &Account,
        amount: &Ciphertext,
        precondition: Option<EncryptedBool>,
    ) -> LedgerResult<Settlement> {
        let from_balance = self.balance_ct(backend, from)?;
        let mut covered = backend.ge(&from_balance, amount)?;
        if let Some(extra) = precondition {
            covered = backend.and(&covered, &extra)?;
        }

        if from == to {
            let moved = backend.amount_if(&covered, amount)?;
            return Ok(Settlement { from: *from, to: *to, moved, balances: None });
        }

        let to_balance = self.balance_ct(backend, to)?;
        let headroom = backend.sub(&backend.trivial(MAX_AMOUNT)?, &to_balance)?;
        covered = backend.and(&covered, &backend.ge(&headroom, amount)?)?;

        let moved = backend.amount_if(&covered, amount)?;
        let new_from = backend.sub(&from_balance, &moved)?;
        let new_to = backend.add(&to_balance, &moved)?;
        debug!(token = %self.symbol, ops = new_to.op_count(), balance = %new_to.fingerprint(), "settled transfer");
        Ok(Settlement { from: *from, to: *to, moved, balances: Some((new_from, new_to)) })
    }

    fn commit(&mut self, settlement: Settlement) -> Ciphertext {
        if let Some((from_balance, to_balance)) = settlement.balances {
            self.balances.insert(settlement.from, from_balance);
            self.balances.insert(settlement.to, to_balance);
        }
        settlement.moved
    }

    /// Encrypted balance, decryptable only by `account`
    pub fn balance_of(&self, backend: &dyn FheBackend, account: &Account) -> LedgerResult<ScopedCiphertext> {
        Ok(ScopedCiphertext::owned(self.id, *account, self.balance_ct(backend, account)?))
    }

    /// Encrypted allowance, decryptable only by its owner
    pub fn allowance(
        &self,
        backend: &dyn FheBackend,
        owner: &Account,
        spender: &Account,
    ) -> LedgerResult<ScopedCiphertext> {
        Ok(ScopedCiphertext::owned(self.id, *owner, self.allowance_ct(backend, owner, spender)?))
    }

    /// The grant holder's balance, reencrypted to the grant's key
    pub fn reveal_balance(
        &self,
        backend: &dyn FheBackend,
        authorizer: &Authorizer,
        grant: &ReencryptionGrant,
    ) -> LedgerResult<SealedValue> {
        let balance = self.balance_of(backend, &grant.account())?;
        Ok(authorizer.decrypt_with_grant(backend, &balance, grant)?)
    }

    /// The grant holder's allowance to `spender`, reencrypted to the grant's key
    pub fn reveal_allowance(
        &self,
        backend: &dyn FheBackend,
        authorizer: &Authorizer,
        grant: &ReencryptionGrant,
        spender: &Account,
    ) -> LedgerResult<SealedValue> {
        let allowance = self.allowance(backend, &grant.account(), spender)?;
        Ok(authorizer.decrypt_with_grant(backend, &allowance, grant)?)
    }
}
