pub mod adapter;
pub mod rpc;
pub mod session;

pub use adapter::{AdapterState, WalletAdapter, WatchOnlyAdapter};
pub use rpc::{BalanceClient, RpcBalanceClient, SolanaCluster};
pub use session::SolanaWalletSession;
