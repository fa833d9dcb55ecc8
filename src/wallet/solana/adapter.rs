use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::watch;
use tracing::info;

use crate::error::WalletError;
use crate::state::storage::{BrowserStorage, StorageScope, WALLET_NAME_KEY};

/// What the wallet-adapter context exposes about the selected wallet.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AdapterState {
    pub wallet_name: Option<String>,
    pub connected: bool,
    /// Base58 public key, set only while connected.
    pub public_key: Option<String>,
}

/// The Solana wallet-adapter collaborator. It owns connect UI, wallet
/// selection and persistence of the last used wallet.
#[async_trait]
pub trait WalletAdapter: Send + Sync {
    /// At least one wallet is installed and selectable.
    fn is_ready(&self) -> bool;

    fn state(&self) -> watch::Receiver<AdapterState>;

    async fn connect(&self) -> Result<(), WalletError>;

    async fn disconnect(&self) -> Result<(), WalletError>;
}

pub const WATCH_ONLY_WALLET: &str = "Watch-only";

/// Adapter for a fixed public key, for running without a browser wallet.
///
/// Persists its name under the same key browser adapters use, and
/// auto-connects on construction when that entry is present.
pub struct WatchOnlyAdapter {
    public_key: Option<String>,
    storage: Arc<dyn BrowserStorage>,
    state: watch::Sender<AdapterState>,
}

impl WatchOnlyAdapter {
    pub fn new(public_key: Option<String>, storage: Arc<dyn BrowserStorage>) -> Self {
        let (state, _) = watch::channel(AdapterState::default());
        let adapter = Self {
            public_key,
            storage,
            state,
        };

        let remembered = adapter.storage.get(StorageScope::Local, WALLET_NAME_KEY);
        if remembered.as_deref() == Some(WATCH_ONLY_WALLET) {
            if let Some(key) = adapter.public_key.clone() {
                info!(public_key = %key, "auto-connecting remembered watch-only wallet");
                adapter.state.send_replace(connected_state(key));
            }
        }
        adapter
    }
}

fn connected_state(public_key: String) -> AdapterState {
    AdapterState {
        wallet_name: Some(WATCH_ONLY_WALLET.to_string()),
        connected: true,
        public_key: Some(public_key),
    }
}

#[async_trait]
impl WalletAdapter for WatchOnlyAdapter {
    fn is_ready(&self) -> bool {
        self.public_key.is_some()
    }

    fn state(&self) -> watch::Receiver<AdapterState> {
        self.state.subscribe()
    }

    async fn connect(&self) -> Result<(), WalletError> {
        let Some(key) = self.public_key.clone() else {
            return Err(WalletError::Adapter("no watch address configured".into()));
        };
        if !is_valid_public_key(&key) {
            return Err(WalletError::Adapter(format!("not a Solana public key: {key}")));
        }

        self.storage
            .set(StorageScope::Local, WALLET_NAME_KEY, WATCH_ONLY_WALLET.to_string());
        self.state.send_replace(connected_state(key));
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), WalletError> {
        self.state.send_replace(AdapterState::default());
        Ok(())
    }
}

const BASE58_ALPHABET: &str = "123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";

/// Shape check only: 32-44 base58 characters.
pub fn is_valid_public_key(key: &str) -> bool {
    (32..=44).contains(&key.len()) && key.chars().all(|c| BASE58_ALPHABET.contains(c))
}
