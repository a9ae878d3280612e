//! Persisted local deployment
//!
//! The whole market, plus the simulated backend's keys, lives in one JSON
//! file under the data directory. Every command loads it, runs one
//! transaction against it and writes it back. The key material is stored in
//! the clear: this is a development harness, not a wallet.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use shade_auth::{Account, InstanceId, LocalSigner, ReencryptionGrant};
use shade_cfmm::{CfmmResult, Market, MarketConfig, MarketState};
use shade_fhe::{EncryptedInput, FheBackend, ReencryptionKeypair, SealedValue, SimulatedBackend, SimulatedKeys};
use tracing::debug;

use crate::config::ShadeConfig;

const STATE_FILE: &str = "market.json";

#[derive(Serialize, Deserialize)]
struct Deployment {
    config: MarketConfig,
    keys: SimulatedKeys,
    state: MarketState,
}

pub fn state_path(data_dir: &Path) -> PathBuf {
    data_dir.join(STATE_FILE)
}

/// A loaded market and the signers allowed to drive it
pub struct Session {
    pub market: Market,
    pub config: ShadeConfig,
    market_config: MarketConfig,
    keys: SimulatedKeys,
    path: PathBuf,
}

impl Session {
    /// Deploy a fresh market and fund every configured signer
    pub fn deploy(config: ShadeConfig, data_dir: &Path) -> anyhow::Result<Self> {
        let backend = SimulatedBackend::generate();
        let keys = backend.export_keys();
        let backend: Arc<dyn FheBackend> = Arc::new(backend);

        let market_config = config.market_config();
        let deployer = LocalSigner::from_label(&config.accounts.deployer).account();
        let mut market = Market::deploy(backend, &market_config, deployer)?;

        let per_signer = config.accounts.initial_mint;
        let total = per_signer * config.accounts.signers.len() as u64;
        let amount = u32::try_from(per_signer).context("initial mint exceeds 32 bits")?;
        for token in [market.token_a_id(), market.token_b_id()] {
            market.mint(&deployer, token, total)?;
            for label in &config.accounts.signers {
                let to = LocalSigner::from_label(label).account();
                let input = EncryptedInput::encrypt(amount, &market.network_public_key())?;
                market.transfer(&deployer, token, &to, &input)?;
            }
        }

        Ok(Self { market, config, market_config, keys, path: state_path(data_dir) })
    }

    /// Load the deployment saved in `data_dir`
    pub async fn open(config: ShadeConfig, data_dir: &Path) -> anyhow::Result<Self> {
        let path = state_path(data_dir);
        let content = tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("no deployment at {}; run `shade init` first", path.display()))?;
        let deployment: Deployment = serde_json::from_str(&content)?;
        debug!(path = %path.display(), "loaded deployment");

        let backend: Arc<dyn FheBackend> = Arc::new(SimulatedBackend::from_keys(deployment.keys.clone()));
        Ok(Self {
            market: Market::from_state(backend, deployment.state),
            config,
            market_config: deployment.config,
            keys: deployment.keys,
            path,
        })
    }

    pub async fn save(&self) -> anyhow::Result<()> {
        let deployment = Deployment {
            config: self.market_config.clone(),
            keys: self.keys.clone(),
            state: self.market.snapshot(),
        };
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&self.path, serde_json::to_vec_pretty(&deployment)?).await?;
        debug!(path = %self.path.display(), "saved deployment");
        Ok(())
    }

    pub fn market_config(&self) -> &MarketConfig {
        &self.market_config
    }

    /// Development signer for a configured account label
    pub fn signer(&self, label: &str) -> anyhow::Result<LocalSigner> {
        let known = label == self.config.accounts.deployer || self.config.accounts.signers.iter().any(|s| s == label);
        if !known {
            anyhow::bail!(
                "Unknown account '{}'. Specify one of [{}]",
                label,
                self.config.accounts.signers.join(", ")
            );
        }
        Ok(LocalSigner::from_label(label))
    }

    /// Client-side encryption of an amount
    pub fn encrypt(&self, value: u32) -> anyhow::Result<EncryptedInput> {
        Ok(EncryptedInput::encrypt(value, &self.market.network_public_key())?)
    }

    /// Run one authorized read under a fresh grant of `signer` on `instance`
    pub fn reveal(
        &self,
        signer: &LocalSigner,
        instance: InstanceId,
        read: impl FnOnce(&Market, &ReencryptionGrant) -> CfmmResult<SealedValue>,
    ) -> anyhow::Result<u64> {
        let keypair = ReencryptionKeypair::generate();
        let domain = self.market.domain(&instance)?;
        let signature = signer.sign_reencrypt(&domain, &keypair.public_key());
        let grant = self
            .market
            .request_grant(instance, signer.account(), keypair.public_key(), signature)?;
        let sealed = read(&self.market, &grant)?;
        Ok(keypair.open(&sealed)?)
    }

    pub fn account(&self, label: &str) -> anyhow::Result<Account> {
        Ok(self.signer(label)?.account())
    }
}
