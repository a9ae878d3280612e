//! Liquidity Commands - Deposit into and withdraw from the pool

use std::path::PathBuf;

use clap::Args;
use shade_auth::LocalSigner;
use tracing::info;

use crate::config::ShadeConfig;
use crate::session::Session;

/// Approve and deposit both assets
#[derive(Args)]
pub struct AddLiquidityCommand {
    /// Amount of token A to add
    #[arg(long)]
    reservea: u32,

    /// Amount of token B to add
    #[arg(long)]
    reserveb: u32,

    /// Which development account signs
    #[arg(long)]
    account: String,
}

impl AddLiquidityCommand {
    pub async fn execute(self, config: ShadeConfig, data_dir: PathBuf) -> anyhow::Result<()> {
        let mut session = Session::open(config, &data_dir).await?;
        let signer = session.signer(&self.account)?;
        let caller = signer.account();
        let pool = session.market.pool_account();

        print_pool(&session, &signer, "before")?;

        let (token_a, token_b) = (session.market.token_a_id(), session.market.token_b_id());
        let allowance_a = session.encrypt(self.reservea)?;
        let allowance_b = session.encrypt(self.reserveb)?;
        session.market.approve(&caller, token_a, &pool, &allowance_a)?;
        session.market.approve(&caller, token_b, &pool, &allowance_b)?;

        let amount_a = session.encrypt(self.reservea)?;
        let amount_b = session.encrypt(self.reserveb)?;
        session.market.add_liquidity(&caller, &amount_a, &amount_b)?;
        session.save().await?;
        info!(account = %self.account, "liquidity submitted");

        print_pool(&session, &signer, "after")?;
        let shares = session.reveal(&signer, session.market.pool_id(), |m, g| m.reveal_shares(g))?;
        println!("Shares held : {}", shares);
        Ok(())
    }
}

/// Burn shares for a proportional slice of both reserves
#[derive(Args)]
pub struct RemoveLiquidityCommand {
    /// Number of shares to burn
    #[arg(long)]
    shares: u32,

    /// Which development account signs
    #[arg(long)]
    account: String,
}

impl RemoveLiquidityCommand {
    pub async fn execute(self, config: ShadeConfig, data_dir: PathBuf) -> anyhow::Result<()> {
        let mut session = Session::open(config, &data_dir).await?;
        let signer = session.signer(&self.account)?;
        let caller = signer.account();

        print_pool(&session, &signer, "before")?;

        let shares = session.encrypt(self.shares)?;
        session.market.remove_liquidity(&caller, &shares)?;
        session.save().await?;
        info!(account = %self.account, "withdrawal submitted");

        print_pool(&session, &signer, "after")?;
        let held = session.reveal(&signer, session.market.pool_id(), |m, g| m.reveal_shares(g))?;
        println!("Shares held : {}", held);
        Ok(())
    }
}

/// Reserves and constant product, decrypted through the signer's pool grant
pub fn print_pool(session: &Session, signer: &LocalSigner, when: &str) -> anyhow::Result<()> {
    let pool = session.market.pool_id();
    println!("Reserve A {} : {}", when, session.reveal(signer, pool, |m, g| m.reveal_reserve_a(g))?);
    println!("Reserve B {} : {}", when, session.reveal(signer, pool, |m, g| m.reveal_reserve_b(g))?);
    println!(
        "Constant Product {} : {}",
        when,
        session.reveal(signer, pool, |m, g| m.reveal_constant_product(g))?
    );
    Ok(())
}
