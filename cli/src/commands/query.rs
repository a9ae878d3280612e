//! Query Commands - Authorized reads

use std::path::PathBuf;

use clap::Args;
use shade_cfmm::PoolStatus;

use crate::commands::liquidity::print_pool;
use crate::config::ShadeConfig;
use crate::session::Session;

/// Show reserves, constant product, share supply and pool status
#[derive(Args)]
pub struct ReservesCommand {
    /// Which development account requests the pool grant
    #[arg(long)]
    account: String,
}

impl ReservesCommand {
    pub async fn execute(self, config: ShadeConfig, data_dir: PathBuf) -> anyhow::Result<()> {
        let session = Session::open(config, &data_dir).await?;
        let signer = session.signer(&self.account)?;
        let pool = session.market.pool_id();

        println!("Pool: {}", session.market_config().pool_name);
        print_pool(&session, &signer, "now")?;
        println!("Total shares : {}", session.reveal(&signer, pool, |m, g| m.reveal_total_shares(g))?);
        let status = PoolStatus::from_flag(session.reveal(&signer, pool, |m, g| m.reveal_status(g))?);
        println!("Status : {:?}", status);
        Ok(())
    }
}

/// Show an account's token balances and pool shares
#[derive(Args)]
pub struct BalanceCommand {
    /// Which development account
    #[arg(long)]
    account: String,
}

impl BalanceCommand {
    pub async fn execute(self, config: ShadeConfig, data_dir: PathBuf) -> anyhow::Result<()> {
        let session = Session::open(config, &data_dir).await?;
        let signer = session.signer(&self.account)?;
        let account = session.account(&self.account)?;
        let (token_a, token_b) = (session.market.token_a_id(), session.market.token_b_id());
        let names = session.market_config();

        println!("Account {} ({})", self.account, account);
        let balance_a = session.reveal(&signer, token_a, |m, g| m.reveal_balance(token_a, g))?;
        let balance_b = session.reveal(&signer, token_b, |m, g| m.reveal_balance(token_b, g))?;
        println!("{} : {}", names.token_a.symbol, balance_a);
        println!("{} : {}", names.token_b.symbol, balance_b);
        let shares = session.reveal(&signer, session.market.pool_id(), |m, g| m.reveal_shares(g))?;
        println!("Shares : {}", shares);
        Ok(())
    }
}
