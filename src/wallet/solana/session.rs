use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use async_trait::async_trait;
use futures::FutureExt;
use rust_decimal::Decimal;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::adapter::WalletAdapter;
use super::rpc::BalanceClient;
use crate::error::WalletError;
use crate::lifecycle::{Liveness, Subscription};
use crate::state::chain::Chain;
use crate::state::session::{SolanaSession, lamports_to_sol};
use crate::state::storage::{BrowserStorage, StorageScope};
use crate::telemetry::prometheus as telemetry;
use crate::wallet::WalletSession;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
struct BalanceState {
    /// Key the balance below belongs to.
    public_key: Option<String>,
    sol: Option<Decimal>,
}

/// Solana side of the dashboard: observes the adapter, keeps the balance of
/// the connected key current, and owns the hard-disconnect flow.
pub struct SolanaWalletSession {
    adapter: Arc<dyn WalletAdapter>,
    balances: Arc<dyn BalanceClient>,
    storage: Arc<dyn BrowserStorage>,
    balance: Arc<watch::Sender<BalanceState>>,
    mounted: Liveness,
}

impl SolanaWalletSession {
    pub fn new(
        adapter: Arc<dyn WalletAdapter>,
        balances: Arc<dyn BalanceClient>,
        storage: Arc<dyn BrowserStorage>,
    ) -> Self {
        let (tx, _) = watch::channel(BalanceState::default());
        Self {
            adapter,
            balances,
            storage,
            balance: Arc::new(tx),
            mounted: Liveness::new(),
        }
    }

    pub fn session(&self) -> SolanaSession {
        let adapter = self.adapter.state().borrow().clone();
        let balance = self.balance.borrow();
        SolanaSession {
            connected: adapter.connected,
            // A balance for a previous key is never shown against a new one.
            balance: balance
                .sol
                .filter(|_| balance.public_key == adapter.public_key),
            public_key: adapter.public_key,
        }
    }

    /// Notified whenever the session may have changed.
    pub fn watch_changes(&self) -> (watch::Receiver<super::AdapterState>, BalanceWatch) {
        (self.adapter.state(), BalanceWatch(self.balance.subscribe()))
    }

    pub fn unmount(&self) {
        self.mounted.end();
    }

    /// Disconnects and wipes every persisted wallet selection so the next
    /// connect cannot silently reuse a stale default wallet.
    ///
    /// Storage is cleared and `on_complete` runs even if the adapter fails or
    /// panics while disconnecting.
    pub async fn hard_disconnect<F>(&self, on_complete: F)
    where
        F: FnOnce() + Send,
    {
        match AssertUnwindSafe(self.adapter.disconnect())
            .catch_unwind()
            .await
        {
            Ok(Ok(())) => {}
            Ok(Err(err)) => {
                warn!(error = %err, "adapter disconnect failed, clearing local wallet state anyway");
            }
            Err(_) => {
                warn!("adapter panicked during disconnect, clearing local wallet state anyway");
            }
        }

        self.storage.clear(StorageScope::Local);
        self.storage.clear(StorageScope::Session);
        self.balance.send_replace(BalanceState::default());

        info!("solana wallet disconnected, persisted selection cleared");
        telemetry::record_wallet_event(Chain::Solana, "disconnected");
        on_complete();
    }

    /// Refetches the balance every time the adapter's public key changes.
    pub fn watch_public_key(&self) -> Subscription {
        let mut adapter_rx = self.adapter.state();
        let balances = self.balances.clone();
        let balance = self.balance.clone();
        let mounted = self.mounted.clone();
        let liveness = Liveness::new();
        let alive = liveness.clone();

        Subscription::spawn("solana-public-key", liveness, async move {
            let mut current: Option<String> = None;
            loop {
                let key = adapter_rx.borrow_and_update().public_key.clone();
                if key != current {
                    current = key.clone();
                    on_key_changed(key, &balances, &balance, &alive, &mounted);
                }
                if adapter_rx.changed().await.is_err() {
                    debug!("wallet adapter dropped its state channel");
                    break;
                }
            }
        })
    }
}

/// Handle for balance change notifications.
pub struct BalanceWatch(watch::Receiver<BalanceState>);

impl BalanceWatch {
    pub async fn changed(&mut self) -> Result<(), watch::error::RecvError> {
        self.0.changed().await
    }
}

fn on_key_changed(
    key: Option<String>,
    balances: &Arc<dyn BalanceClient>,
    balance: &Arc<watch::Sender<BalanceState>>,
    alive: &Liveness,
    mounted: &Liveness,
) {
    let Some(key) = key else {
        debug!("public key cleared, dropping balance");
        balance.send_replace(BalanceState::default());
        return;
    };

    balance.send_replace(BalanceState {
        public_key: Some(key.clone()),
        sol: None,
    });
    telemetry::record_wallet_event(Chain::Solana, "public_key_changed");

    let balances = balances.clone();
    let balance = balance.clone();
    let alive = alive.clone();
    let mounted = mounted.clone();

    // In-flight queries are not cancelled; late results are dropped below.
    tokio::spawn(async move {
        let result = balances.get_balance(&key).await;

        if !alive.is_alive() || !mounted.is_alive() {
            debug!(public_key = %key, "balance arrived after teardown, discarding");
            return;
        }

        match result {
            Ok(lamports) => {
                let sol = lamports_to_sol(lamports);
                let committed = balance.send_if_modified(|state| {
                    if state.public_key.as_deref() != Some(key.as_str()) {
                        return false;
                    }
                    state.sol = Some(sol);
                    true
                });
                if committed {
                    info!(public_key = %key, %sol, "balance updated");
                } else {
                    debug!(public_key = %key, "balance for stale key, discarding");
                }
            }
            Err(err) => {
                warn!(public_key = %key, error = %err, "balance fetch failed");
            }
        }
    });
}

#[async_trait]
impl WalletSession for SolanaWalletSession {
    fn chain(&self) -> Chain {
        Chain::Solana
    }

    fn is_available(&self) -> bool {
        self.adapter.is_ready()
    }

    fn address(&self) -> Option<String> {
        let state = self.adapter.state();
        let state = state.borrow();
        state.public_key.clone().filter(|_| state.connected)
    }

    fn is_connected(&self) -> bool {
        self.adapter.state().borrow().connected
    }

    async fn connect(&self) -> Result<(), WalletError> {
        self.adapter.connect().await?;
        telemetry::record_wallet_event(Chain::Solana, "connected");
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), WalletError> {
        self.hard_disconnect(|| {}).await;
        Ok(())
    }

    fn subscribe(&self) -> Subscription {
        self.watch_public_key()
    }
}
