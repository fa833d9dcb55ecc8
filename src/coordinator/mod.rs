use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;

use anyhow::bail;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::calculator;
use crate::error::WalletError;
use crate::execution::{BuyError, BuyHandler, BuyIntent, BuyReceipt};
use crate::market_data::price_table::PriceTable;
use crate::market_data::types::Token;
use crate::state::chain::Chain;
use crate::telemetry::prometheus as telemetry;
use crate::wallet::{SwitchOutcome, WalletSession};

/// What has to hold before the buy button is live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BuyGate {
    /// Solana selected.
    ChainOnly,
    /// Solana selected and a Solana wallet connected.
    #[default]
    ChainAndWallet,
}

impl FromStr for BuyGate {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "chain" | "chain-only" | "false" => Ok(BuyGate::ChainOnly),
            "wallet" | "chain-and-wallet" | "true" => Ok(BuyGate::ChainAndWallet),
            other => bail!("unknown buy gate: {other}"),
        }
    }
}

/// Owns the chain selection and reconciles it with both wallets.
///
/// Wallets are reached only through [`WalletSession`].
pub struct ChainCoordinator {
    selection: watch::Sender<Chain>,
    solana: Arc<dyn WalletSession>,
    evm: Arc<dyn WalletSession>,
    reference_evm_chain_id: String,
    buy_gate: BuyGate,
    buy_handler: Arc<dyn BuyHandler>,
}

impl ChainCoordinator {
    pub fn new(
        solana: Arc<dyn WalletSession>,
        evm: Arc<dyn WalletSession>,
        reference_evm_chain_id: impl Into<String>,
        buy_gate: BuyGate,
        buy_handler: Arc<dyn BuyHandler>,
    ) -> Self {
        let (selection, _) = watch::channel(Chain::default());
        Self {
            selection,
            solana,
            evm,
            reference_evm_chain_id: reference_evm_chain_id.into(),
            buy_gate,
            buy_handler,
        }
    }

    pub fn selection(&self) -> Chain {
        *self.selection.borrow()
    }

    pub fn watch_selection(&self) -> watch::Receiver<Chain> {
        self.selection.subscribe()
    }

    pub fn wallet(&self, chain: Chain) -> &Arc<dyn WalletSession> {
        match chain {
            Chain::Solana => &self.solana,
            Chain::Ethereum => &self.evm,
        }
    }

    /// Wallet whose controls the view should show.
    pub fn active_wallet(&self) -> &Arc<dyn WalletSession> {
        self.wallet(self.selection())
    }

    /// Selects `target` unconditionally.
    ///
    /// Selecting Ethereum while an EVM account is connected also asks that
    /// wallet to move to the reference network. The selection stands whatever
    /// the wallet answers; only a user rejection comes back as an error.
    pub async fn select_chain(&self, target: Chain) -> Result<Option<SwitchOutcome>, WalletError> {
        let previous = self.selection.send_replace(target);
        if previous != target {
            info!(from = %previous, to = %target, "chain selected");
            telemetry::record_chain_selected(target);
        }

        if target != Chain::Ethereum || !self.evm.is_connected() {
            return Ok(None);
        }

        match self.evm.switch_network(&self.reference_evm_chain_id).await {
            Ok(outcome) => Ok(Some(outcome)),
            Err(err) => {
                warn!(error = %err, "network switch failed, keeping chain selection");
                Err(err)
            }
        }
    }

    pub fn buy_enabled(&self) -> bool {
        self.check_buy().is_ok()
    }

    fn check_buy(&self) -> Result<(), BuyError> {
        let chain = self.selection();
        if chain != Chain::Solana {
            return Err(BuyError::Disabled { chain });
        }
        if self.buy_gate == BuyGate::ChainAndWallet && !self.solana.is_connected() {
            return Err(BuyError::WalletNotConnected);
        }
        Ok(())
    }

    /// Hands a buy intent to the handler. Nothing settles on-chain.
    pub async fn buy(
        &self,
        prices: &PriceTable,
        token: Token,
        amount_text: &str,
    ) -> Result<BuyReceipt, BuyError> {
        self.check_buy()?;

        let intent = BuyIntent {
            chain: self.selection(),
            wallet_address: self.solana.address(),
            token,
            amount: calculator::parse_amount(amount_text),
            estimated_usd: calculator::usd_value(prices, token, amount_text),
            created_at: Instant::now(),
        };
        telemetry::record_buy_intent(intent.chain);

        Ok(self.buy_handler.submit(intent).await)
    }
}
