//! SHADE CLI
//!
//! Local deployment and liquidity tasks for the confidential market.
//!
//! # Usage
//!
//! ```bash
//! # Deploy both ledgers and the pool, funding alice, bob, carol and dave
//! shade init
//!
//! # Deposit into the pool and print reserves before and after
//! shade add-liquidity --reservea 100 --reserveb 200 --account alice
//!
//! # Trade and inspect
//! shade swap --direction a-to-b --amount 10 --min-out 1 --account bob
//! shade reserves --account bob
//! ```

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod config;
mod logging;
mod session;

use commands::{
    AddLiquidityCommand, BalanceCommand, InitCommand, RemoveLiquidityCommand, ReservesCommand, SwapCommand,
};
use config::{default_config_path, default_data_dir, ShadeConfig};

/// SHADE confidential market
#[derive(Parser)]
#[command(name = "shade")]
#[command(author = "SHADE Team")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Confidential constant-product market maker", long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Data directory
    #[arg(short, long, global = true, env = "SHADE_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error); overrides the config file
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Output logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Deploy a local market
    Init(InitCommand),

    /// Approve and deposit both assets
    AddLiquidity(AddLiquidityCommand),

    /// Burn shares for a slice of the reserves
    RemoveLiquidity(RemoveLiquidityCommand),

    /// Trade one asset for the other
    Swap(SwapCommand),

    /// Show pool reserves and constant product
    Reserves(ReservesCommand),

    /// Show an account's balances and shares
    Balance(BalanceCommand),

    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let data_dir = cli.data_dir.unwrap_or_else(default_data_dir);
    let config_path = cli.config.unwrap_or_else(|| default_config_path(&data_dir));
    let config = ShadeConfig::load_or_default(&config_path)?;

    let level = cli.log_level.unwrap_or_else(|| config.logging.level.clone());
    let json = cli.json_logs || config.logging.format == "json";
    logging::init(&level, json)?;

    match cli.command {
        Commands::Init(cmd) => cmd.execute(config, &config_path, data_dir).await,
        Commands::AddLiquidity(cmd) => cmd.execute(config, data_dir).await,
        Commands::RemoveLiquidity(cmd) => cmd.execute(config, data_dir).await,
        Commands::Swap(cmd) => cmd.execute(config, data_dir).await,
        Commands::Reserves(cmd) => cmd.execute(config, data_dir).await,
        Commands::Balance(cmd) => cmd.execute(config, data_dir).await,
        Commands::Version => {
            println!("shade {}", env!("CARGO_PKG_VERSION"));
            println!("Reencryption domain: {} v{}", shade_auth::DOMAIN_NAME, shade_auth::DOMAIN_VERSION);
            println!("Amount width: {} bits", shade_fhe::AMOUNT_BITS);
            Ok(())
        }
    }
}
