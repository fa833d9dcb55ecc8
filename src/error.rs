use thiserror::Error;

use crate::wallet::evm::provider::{ProviderRpcError, UNRECOGNIZED_CHAIN, USER_REJECTED_REQUEST};

/// Errors surfaced by wallet operations.
///
/// Only these reach the UI layer. Best-effort paths (price polling, network
/// switching) swallow their failures and report a skipped outcome instead.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WalletError {
    #[error("no injected Ethereum provider found; install a browser wallet")]
    NoProvider,

    #[error("request rejected in wallet")]
    UserRejected,

    #[error("chain not registered in wallet: {0}")]
    UnrecognizedChain(String),

    #[error("provider error {code}: {message}")]
    Provider { code: i64, message: String },

    #[error("wallet adapter error: {0}")]
    Adapter(String),

    #[error("malformed wallet response: {0}")]
    MalformedResponse(String),
}

impl From<ProviderRpcError> for WalletError {
    fn from(err: ProviderRpcError) -> Self {
        match err.code {
            USER_REJECTED_REQUEST => WalletError::UserRejected,
            UNRECOGNIZED_CHAIN => WalletError::UnrecognizedChain(err.message),
            code => WalletError::Provider {
                code,
                message: err.message,
            },
        }
    }
}
