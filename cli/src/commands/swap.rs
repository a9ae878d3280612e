//! Swap Command - Trade one asset for the other

use std::path::PathBuf;

use clap::Args;
use shade_cfmm::SwapDirection;
use tracing::info;

use crate::commands::liquidity::print_pool;
use crate::config::ShadeConfig;
use crate::session::Session;

/// Sell one asset into the pool
#[derive(Args)]
pub struct SwapCommand {
    /// a-to-b or b-to-a
    #[arg(long)]
    direction: SwapDirection,

    /// Amount sold
    #[arg(long)]
    amount: u32,

    /// Minimum amount received; the input is refunded below this
    #[arg(long, default_value_t = 0)]
    min_out: u32,

    /// Which development account signs
    #[arg(long)]
    account: String,
}

impl SwapCommand {
    pub async fn execute(self, config: ShadeConfig, data_dir: PathBuf) -> anyhow::Result<()> {
        let mut session = Session::open(config, &data_dir).await?;
        let signer = session.signer(&self.account)?;
        let caller = signer.account();
        let pool = session.market.pool_account();
        let (token_a, token_b) = (session.market.token_a_id(), session.market.token_b_id());
        let token_in = match self.direction {
            SwapDirection::AtoB => token_a,
            SwapDirection::BtoA => token_b,
        };

        print_pool(&session, &signer, "before")?;

        let allowance = session.encrypt(self.amount)?;
        session.market.approve(&caller, token_in, &pool, &allowance)?;
        let amount_in = session.encrypt(self.amount)?;
        let min_out = session.encrypt(self.min_out)?;
        session.market.swap(&caller, self.direction, &amount_in, &min_out)?;
        session.save().await?;
        info!(account = %self.account, direction = ?self.direction, "swap submitted");

        print_pool(&session, &signer, "after")?;
        let balance_a = session.reveal(&signer, token_a, |m, g| m.reveal_balance(token_a, g))?;
        let balance_b = session.reveal(&signer, token_b, |m, g| m.reveal_balance(token_b, g))?;
        println!("Balance A : {}", balance_a);
        println!("Balance B : {}", balance_b);
        Ok(())
    }
}
