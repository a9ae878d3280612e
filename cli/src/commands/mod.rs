//! CLI Commands

mod init;
mod liquidity;
mod query;
mod swap;

pub use init::InitCommand;
pub use liquidity::{AddLiquidityCommand, RemoveLiquidityCommand};
pub use query::{BalanceCommand, ReservesCommand};
pub use swap::SwapCommand;
