//! Init Command - Deploy a local market

use std::path::{Path, PathBuf};

use clap::Args;
use tracing::info;

use crate::config::ShadeConfig;
use crate::session::{state_path, Session};

/// Deploy both ledgers and the pool, funding the development signers
#[derive(Args)]
pub struct InitCommand {
    /// Force overwrite an existing deployment
    #[arg(short, long)]
    force: bool,
}

impl InitCommand {
    pub async fn execute(self, config: ShadeConfig, config_path: &Path, data_dir: PathBuf) -> anyhow::Result<()> {
        if state_path(&data_dir).exists() && !self.force {
            anyhow::bail!(
                "Market already deployed at {}. Use --force to overwrite.",
                data_dir.display()
            );
        }

        info!("Deploying SHADE market");
        info!("Data directory: {}", data_dir.display());

        if !config_path.exists() {
            config.save(config_path)?;
            info!("Configuration saved to {}", config_path.display());
        }

        let session = Session::deploy(config, &data_dir)?;
        session.save().await?;

        let market = &session.market;
        let names = session.market_config();
        println!("{} deployed to:  {}", names.token_a.symbol, market.token_a_id());
        println!("{} deployed to:  {}", names.token_b.symbol, market.token_b_id());
        println!("{} deployed to: {}", names.pool_name, market.pool_id());
        println!();
        println!(
            "Funded {} with {} of each token",
            session.config.accounts.signers.join(", "),
            session.config.accounts.initial_mint
        );
        println!();
        println!("To add liquidity:");
        println!("  shade add-liquidity --reservea 100 --reserveb 200 --account alice");

        Ok(())
    }
}
