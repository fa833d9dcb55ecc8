pub mod connector;
pub mod networks;
pub mod provider;

pub use connector::EvmWalletConnector;
pub use provider::{InjectedProvider, ProviderEvent, ProviderRpcError};
