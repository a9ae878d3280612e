//! Shared market fixture for the integration and property tests

#![allow(dead_code)]

use std::sync::Arc;

use shade::prelude::*;

pub struct Fixture {
    pub market: Market,
    pub deployer: LocalSigner,
    pub alice: LocalSigner,
    pub bob: LocalSigner,
    pub carol: LocalSigner,
    pub keypair: ReencryptionKeypair,
}

impl Fixture {
    pub fn deploy() -> Self {
        let deployer = LocalSigner::from_label("deployer");
        let backend: Arc<dyn FheBackend> = Arc::new(SimulatedBackend::generate());
        let market = Market::deploy(backend, &MarketConfig::default(), deployer.account()).unwrap();
        Self {
            market,
            deployer,
            alice: LocalSigner::from_label("alice"),
            bob: LocalSigner::from_label("bob"),
            carol: LocalSigner::from_label("carol"),
            keypair: ReencryptionKeypair::generate(),
        }
    }

    pub fn enc(&self, value: u32) -> EncryptedInput {
        EncryptedInput::encrypt(value, &self.market.network_public_key()).unwrap()
    }

    /// Mint to the deployer and hand `a` / `b` to `who`
    pub fn fund(&mut self, who: &Account, a: u32, b: u32) {
        let deployer = self.deployer.account();
        for (token, amount) in [(self.market.token_a_id(), a), (self.market.token_b_id(), b)] {
            self.market.mint(&deployer, token, amount as u64).unwrap();
            let input = self.enc(amount);
            self.market.transfer(&deployer, token, who, &input).unwrap();
        }
    }

    /// Let the pool pull up to `a` / `b` from `who`
    pub fn approve_pool(&mut self, who: &Account, a: u32, b: u32) {
        let pool = self.market.pool_account();
        for (token, amount) in [(self.market.token_a_id(), a), (self.market.token_b_id(), b)] {
            let input = self.enc(amount);
            self.market.approve(who, token, &pool, &input).unwrap();
        }
    }

    pub fn add_liquidity(&mut self, who: &Account, a: u32, b: u32) {
        let (a, b) = (self.enc(a), self.enc(b));
        self.market.add_liquidity(who, &a, &b).unwrap();
    }

    pub fn remove_liquidity(&mut self, who: &Account, shares: u32) {
        let shares = self.enc(shares);
        self.market.remove_liquidity(who, &shares).unwrap();
    }

    pub fn swap(&mut self, who: &Account, direction: SwapDirection, amount: u32, min_out: u32) {
        let (amount, min_out) = (self.enc(amount), self.enc(min_out));
        self.market.swap(who, direction, &amount, &min_out).unwrap();
    }

    pub fn grant(&self, who: &LocalSigner, instance: InstanceId) -> ReencryptionGrant {
        let domain = self.market.domain(&instance).unwrap();
        let signature = who.sign_reencrypt(&domain, &self.keypair.public_key());
        self.market
            .request_grant(instance, who.account(), self.keypair.public_key(), signature)
            .unwrap()
    }

    pub fn open(&self, sealed: CfmmResult<SealedValue>) -> u64 {
        self.keypair.open(&sealed.unwrap()).unwrap()
    }

    /// Run a read under `who`'s grant on `instance`
    pub fn read(
        &self,
        who: &LocalSigner,
        instance: InstanceId,
        read: impl FnOnce(&Market, &ReencryptionGrant) -> CfmmResult<SealedValue>,
    ) -> u64 {
        let grant = self.grant(who, instance);
        self.open(read(&self.market, &grant))
    }

    pub fn reserves(&self) -> (u64, u64) {
        let pool = self.market.pool_id();
        (
            self.read(&self.deployer, pool, |m, g| m.reveal_reserve_a(g)),
            self.read(&self.deployer, pool, |m, g| m.reveal_reserve_b(g)),
        )
    }

    pub fn constant_product(&self) -> u64 {
        self.read(&self.deployer, self.market.pool_id(), |m, g| m.reveal_constant_product(g))
    }

    pub fn total_shares(&self) -> u64 {
        self.read(&self.deployer, self.market.pool_id(), |m, g| m.reveal_total_shares(g))
    }

    pub fn status(&self, who: &LocalSigner) -> PoolStatus {
        PoolStatus::from_flag(self.read(who, self.market.pool_id(), |m, g| m.reveal_status(g)))
    }

    pub fn shares(&self, who: &LocalSigner) -> u64 {
        self.read(who, self.market.pool_id(), |m, g| m.reveal_shares(g))
    }

    pub fn balances(&self, who: &LocalSigner) -> (u64, u64) {
        let (a, b) = (self.market.token_a_id(), self.market.token_b_id());
        (
            self.read(who, a, |m, g| m.reveal_balance(a, g)),
            self.read(who, b, |m, g| m.reveal_balance(b, g)),
        )
    }

    pub fn allowance(&self, who: &LocalSigner, token: InstanceId, spender: &Account) -> u64 {
        self.read(who, token, |m, g| m.reveal_allowance(token, spender, g))
    }

    pub fn signers(&self) -> [&LocalSigner; 3] {
        [&self.alice, &self.bob, &self.carol]
    }
}
