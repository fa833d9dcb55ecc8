use std::sync::Arc;

use serde::Serialize;
use tokio::sync::watch;
use tracing::info;

use crate::calculator::CalculatorState;
use crate::config::Config;
use crate::coordinator::ChainCoordinator;
use crate::error::WalletError;
use crate::execution::{BuyError, BuyHandler, BuyReceipt};
use crate::lifecycle::Subscription;
use crate::market_data::PriceSource;
use crate::market_data::poller::PriceFeed;
use crate::market_data::price_table::PriceTable;
use crate::state::chain::Chain;
use crate::state::session::{EvmSession, SolanaSession};
use crate::state::storage::BrowserStorage;
use crate::wallet::evm::{EvmWalletConnector, InjectedProvider};
use crate::wallet::solana::{BalanceClient, SolanaWalletSession, WalletAdapter};
use crate::wallet::{SwitchOutcome, WalletSession};

/// External collaborators the dashboard is wired to.
pub struct DashboardDeps {
    pub price_source: Arc<dyn PriceSource>,
    /// `None` when no Ethereum wallet injected a provider.
    pub provider: Option<Arc<dyn InjectedProvider>>,
    pub adapter: Arc<dyn WalletAdapter>,
    pub balances: Arc<dyn BalanceClient>,
    pub storage: Arc<dyn BrowserStorage>,
    pub buy_handler: Arc<dyn BuyHandler>,
}

/// Everything a view renders, in one serialisable value.
#[derive(Clone, Debug, Serialize)]
pub struct DashboardSnapshot {
    pub chain: Chain,
    pub buy_enabled: bool,
    pub prices: PriceTable,
    pub evm_available: bool,
    pub evm: EvmSession,
    pub solana_available: bool,
    pub solana: SolanaSession,
    pub calculator: CalculatorState,
    pub estimated_usd: String,
}

/// The mounted dashboard: owns the price feed, both wallets, the coordinator
/// and every long-lived subscription. Views get projections and intents,
/// never the state itself.
pub struct Dashboard {
    coordinator: Arc<ChainCoordinator>,
    evm: Arc<EvmWalletConnector>,
    solana: Arc<SolanaWalletSession>,
    prices: PriceFeed,
    subscriptions: Vec<Subscription>,
}

impl Dashboard {
    /// Starts the price feed and wallet listeners. Needs a tokio runtime.
    pub fn mount(config: &Config, deps: DashboardDeps) -> Self {
        let evm = Arc::new(EvmWalletConnector::new(deps.provider));
        let solana = Arc::new(SolanaWalletSession::new(
            deps.adapter,
            deps.balances,
            deps.storage,
        ));

        let coordinator = Arc::new(ChainCoordinator::new(
            solana.clone(),
            evm.clone(),
            config.reference_evm_chain_id.clone(),
            config.buy_gate,
            deps.buy_handler,
        ));

        let prices = PriceFeed::spawn(deps.price_source, config.price_poll_interval);
        let subscriptions = vec![evm.subscribe(), solana.subscribe()];

        info!(
            evm_available = evm.is_available(),
            solana_available = solana.is_available(),
            "dashboard mounted"
        );

        Self {
            coordinator,
            evm,
            solana,
            prices,
            subscriptions,
        }
    }

    pub fn coordinator(&self) -> &ChainCoordinator {
        &self.coordinator
    }

    pub fn evm(&self) -> &EvmWalletConnector {
        &self.evm
    }

    pub fn solana(&self) -> &SolanaWalletSession {
        &self.solana
    }

    pub fn prices(&self) -> watch::Receiver<PriceTable> {
        self.prices.prices()
    }

    pub fn snapshot(&self, calculator: &CalculatorState) -> DashboardSnapshot {
        let prices = self.prices.latest();
        DashboardSnapshot {
            chain: self.coordinator.selection(),
            buy_enabled: self.coordinator.buy_enabled(),
            estimated_usd: calculator.usd_value(&prices),
            prices,
            evm_available: self.evm.is_available(),
            evm: self.evm.session(),
            solana_available: self.solana.is_available(),
            solana: self.solana.session(),
            calculator: calculator.clone(),
        }
    }

    pub async fn select_chain(&self, chain: Chain) -> Result<Option<SwitchOutcome>, WalletError> {
        self.coordinator.select_chain(chain).await
    }

    /// Connects whichever wallet belongs to the selected chain.
    pub async fn connect_active_wallet(&self) -> Result<(), WalletError> {
        self.coordinator.active_wallet().connect().await
    }

    pub async fn disconnect_active_wallet(&self) -> Result<(), WalletError> {
        self.coordinator.active_wallet().disconnect().await
    }

    pub async fn buy(&self, calculator: &CalculatorState) -> Result<BuyReceipt, BuyError> {
        let prices = self.prices.latest();
        self.coordinator
            .buy(&prices, calculator.token(), calculator.amount())
            .await
    }

    /// Releases the timer and every listener; late completions are dropped.
    pub fn unmount(self) {
        self.evm.unmount();
        self.solana.unmount();
        for sub in self.subscriptions {
            sub.unsubscribe();
        }
        self.prices.stop();
        info!("dashboard unmounted");
    }
}
