//! Pool fixture shared by the unit tests

use shade_auth::{Account, InstanceId, LocalSigner};
use shade_fhe::{Ciphertext, EncryptedInput, FheBackend, ReencryptionKeypair, SimulatedBackend, MAX_AMOUNT};
use shade_token::ConfidentialLedger;

use crate::pool::{ConfidentialPool, PairLedgers};
use crate::swap::SwapDirection;

pub(crate) struct Harness {
    pub backend: SimulatedBackend,
    pub keypair: ReencryptionKeypair,
    pub token_a: ConfidentialLedger,
    pub token_b: ConfidentialLedger,
    pub pool: ConfidentialPool,
    pub deployer: Account,
    pub alice: Account,
    pub bob: Account,
}

impl Harness {
    pub fn new() -> Self {
        let backend = SimulatedBackend::generate();
        let deployer = LocalSigner::from_label("deployer").account();
        let id_a = InstanceId::derive(&deployer, "tokenA");
        let id_b = InstanceId::derive(&deployer, "tokenB");
        let id_pool = InstanceId::derive(&deployer, "CFMM");
        let pool = ConfidentialPool::new(&backend, id_pool, "CFMM", id_a, id_b).unwrap();
        Self {
            token_a: ConfidentialLedger::new(id_a, "Token A", "TKA", deployer),
            token_b: ConfidentialLedger::new(id_b, "Token B", "TKB", deployer),
            pool,
            keypair: ReencryptionKeypair::generate(),
            deployer,
            alice: LocalSigner::from_label("alice").account(),
            bob: LocalSigner::from_label("bob").account(),
            backend,
        }
    }

    /// Client-encrypted amount, imported into the backend
    pub fn input(&self, value: u32) -> Ciphertext {
        let sealed = EncryptedInput::encrypt(value, &self.backend.network_public_key()).unwrap();
        self.backend.import_input(&sealed).unwrap()
    }

    pub fn reveal(&self, ct: &Ciphertext) -> u64 {
        let sealed = self.backend.reencrypt(ct, &self.keypair.public_key()).unwrap();
        self.keypair.open(&sealed).unwrap()
    }

    /// Mint to `who` and give the pool an unlimited allowance on both legs
    pub fn fund(&mut self, who: Account, a: u64, b: u64) {
        let pool = self.pool.account();
        for (ledger, amount) in [(&mut self.token_a, a), (&mut self.token_b, b)] {
            ledger.mint(&self.backend, &self.deployer, amount).unwrap();
            let amount = self.backend.trivial(amount).unwrap();
            ledger.transfer_ciphertext(&self.backend, &self.deployer, &who, &amount).unwrap();
            ledger.approve_ciphertext(&who, &pool, self.backend.trivial(MAX_AMOUNT).unwrap());
        }
    }

    pub fn add(&mut self, who: Account, a: u32, b: u32) -> u64 {
        let (a, b) = (self.input(a), self.input(b));
        let ledgers = PairLedgers { a: &mut self.token_a, b: &mut self.token_b };
        let minted = self.pool.add_liquidity(&self.backend, ledgers, &who, &a, &b).unwrap();
        self.reveal(&minted)
    }

    pub fn remove(&mut self, who: Account, shares: u32) -> (u64, u64) {
        let shares = self.input(shares);
        let ledgers = PairLedgers { a: &mut self.token_a, b: &mut self.token_b };
        let (out_a, out_b) = self.pool.remove_liquidity(&self.backend, ledgers, &who, &shares).unwrap();
        (self.reveal(&out_a), self.reveal(&out_b))
    }

    pub fn swap(&mut self, who: Account, direction: SwapDirection, amount: u32, min_out: u32) -> u64 {
        let (amount, min_out) = (self.input(amount), self.input(min_out));
        let ledgers = PairLedgers { a: &mut self.token_a, b: &mut self.token_b };
        let out = self.pool.swap(&self.backend, ledgers, &who, direction, &amount, &min_out).unwrap();
        self.reveal(&out)
    }

    pub fn reserves(&self) -> (u64, u64) {
        (self.reveal(&self.pool.reserve_a), self.reveal(&self.pool.reserve_b))
    }

    pub fn shares(&self, who: Account) -> u64 {
        self.reveal(self.pool.get_shares(&self.backend, &who).unwrap().ciphertext())
    }

    pub fn total_shares(&self) -> u64 {
        self.reveal(&self.pool.total_shares)
    }

    pub fn providers_total(&self) -> u64 {
        self.pool.providers().map(|p| self.shares(*p)).sum()
    }

    pub fn balances(&self, who: Account) -> (u64, u64) {
        let a = self.token_a.balance_of(&self.backend, &who).unwrap();
        let b = self.token_b.balance_of(&self.backend, &who).unwrap();
        (self.reveal(a.ciphertext()), self.reveal(b.ciphertext()))
    }
}
