pub mod calculator;
pub mod config;
pub mod coordinator;
pub mod dashboard;
pub mod error;
pub mod execution;
pub mod lifecycle;
pub mod market_data;
pub mod state;
pub mod telemetry;
pub mod wallet;

#[cfg(test)]
pub(crate) mod testing;

pub use calculator::CalculatorState;
pub use config::Config;
pub use coordinator::ChainCoordinator;
pub use dashboard::{Dashboard, DashboardSnapshot};
pub use error::WalletError;
pub use market_data::poller::PriceFeed;
pub use market_data::price_table::PriceTable;
pub use market_data::types::Token;
pub use state::chain::Chain;
