//! In-process stand-ins for the price API, wallets and RPC node.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde_json::{Value, json};
use tokio::sync::{Notify, broadcast, watch};

use crate::error::WalletError;
use crate::lifecycle::Subscription;
use crate::market_data::PriceSource;
use crate::market_data::price_table::PriceTable;
use crate::market_data::types::{CoinQuote, QuoteResponse};
use crate::state::chain::Chain;
use crate::wallet::evm::provider::{InjectedProvider, ProviderEvent, ProviderRpcError, methods};
use crate::wallet::solana::adapter::{AdapterState, WalletAdapter};
use crate::wallet::solana::rpc::BalanceClient;
use crate::wallet::{SwitchOutcome, WalletSession};

pub const SAMPLE_PUBKEY: &str = "9WzDXwBbmkg8ZTbNMqUxvQRAyrZzDsGYdLVL9zYtAWWM";
pub const OTHER_PUBKEY: &str = "4Nd1mBQtrMJVYVfKf2PJy9NZUZdTAsp7D4xWLs4gDB4T";

/// `{solana:150, tether:1, usd-coin:1, ethereum:3000}`
pub fn scenario_quotes() -> QuoteResponse {
    [("solana", 150), ("tether", 1), ("usd-coin", 1), ("ethereum", 3000)]
        .into_iter()
        .map(|(id, usd)| {
            (
                id.to_string(),
                CoinQuote {
                    usd: Some(Decimal::from(usd)),
                },
            )
        })
        .collect()
}

pub fn scenario_table() -> PriceTable {
    PriceTable::from_quotes(&scenario_quotes(), 0)
}

// ── Price sources ────────────────────────────────────────────────

/// Replays a script of results, then repeats `fallback` (or fails).
pub struct ScriptedPriceSource {
    script: Mutex<VecDeque<Result<QuoteResponse, String>>>,
    fallback: Option<QuoteResponse>,
    calls: AtomicUsize,
}

impl ScriptedPriceSource {
    pub fn new(script: Vec<Result<QuoteResponse, String>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            fallback: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn repeating(quotes: QuoteResponse) -> Self {
        Self {
            fallback: Some(quotes),
            ..Self::new(Vec::new())
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PriceSource for ScriptedPriceSource {
    async fn fetch_quotes(&self, _coin_ids: &[&str]) -> Result<QuoteResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(result) => result.map_err(|e| anyhow!(e)),
            None => self
                .fallback
                .clone()
                .ok_or_else(|| anyhow!("script exhausted")),
        }
    }
}

/// Holds every fetch until `release()`.
pub struct GatedPriceSource {
    quotes: QuoteResponse,
    started: Notify,
    gate: Notify,
}

impl GatedPriceSource {
    pub fn new(quotes: QuoteResponse) -> Self {
        Self {
            quotes,
            started: Notify::new(),
            gate: Notify::new(),
        }
    }

    pub async fn wait_started(&self) {
        self.started.notified().await;
    }

    pub fn release(&self) {
        self.gate.notify_one();
    }
}

#[async_trait]
impl PriceSource for GatedPriceSource {
    async fn fetch_quotes(&self, _coin_ids: &[&str]) -> Result<QuoteResponse> {
        self.started.notify_one();
        self.gate.notified().await;
        Ok(self.quotes.clone())
    }
}

// ── EVM provider ─────────────────────────────────────────────────

/// Wallet-like provider: switching really changes the chain it reports.
pub struct FakeProvider {
    accounts: Vec<String>,
    chain_id: Mutex<String>,
    failures: Mutex<HashMap<String, VecDeque<ProviderRpcError>>>,
    calls: Mutex<Vec<(String, Value)>>,
    events: broadcast::Sender<ProviderEvent>,
}

impl FakeProvider {
    pub fn new(accounts: &[&str], chain_id: &str) -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            accounts: accounts.iter().map(|a| a.to_string()).collect(),
            chain_id: Mutex::new(chain_id.to_string()),
            failures: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            events,
        }
    }

    /// The next call to `method` fails with `err`.
    pub fn fail_next(&self, method: &str, err: ProviderRpcError) {
        self.failures
            .lock()
            .unwrap()
            .entry(method.to_string())
            .or_default()
            .push_back(err);
    }

    pub fn emit(&self, event: ProviderEvent) {
        let _ = self.events.send(event);
    }

    pub fn calls_to(&self, method: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(m, _)| m == method)
            .count()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn last_call(&self, method: &str) -> Option<(String, Value)> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(m, _)| m == method)
            .cloned()
    }
}

#[async_trait]
impl InjectedProvider for FakeProvider {
    async fn request(&self, method: &str, params: Value) -> Result<Value, ProviderRpcError> {
        self.calls
            .lock()
            .unwrap()
            .push((method.to_string(), params.clone()));

        let failure = self
            .failures
            .lock()
            .unwrap()
            .get_mut(method)
            .and_then(|q| q.pop_front());
        if let Some(err) = failure {
            return Err(err);
        }

        match method {
            methods::REQUEST_ACCOUNTS => Ok(json!(self.accounts)),
            methods::CHAIN_ID => Ok(json!(*self.chain_id.lock().unwrap())),
            methods::SWITCH_CHAIN => {
                if let Some(id) = params[0]["chainId"].as_str() {
                    *self.chain_id.lock().unwrap() = id.to_string();
                }
                Ok(Value::Null)
            }
            methods::ADD_CHAIN => Ok(Value::Null),
            other => Err(ProviderRpcError::new(-32601, format!("method not found: {other}"))),
        }
    }

    fn events(&self) -> broadcast::Receiver<ProviderEvent> {
        self.events.subscribe()
    }
}

// ── Solana adapter and RPC ───────────────────────────────────────

pub struct FakeAdapter {
    state: watch::Sender<AdapterState>,
    fail_disconnect: AtomicBool,
    panic_disconnect: AtomicBool,
    disconnects: AtomicUsize,
}

impl FakeAdapter {
    pub fn new() -> Self {
        let (state, _) = watch::channel(AdapterState::default());
        Self {
            state,
            fail_disconnect: AtomicBool::new(false),
            panic_disconnect: AtomicBool::new(false),
            disconnects: AtomicUsize::new(0),
        }
    }

    pub fn set_connected(&self, public_key: Option<&str>) {
        self.state.send_replace(AdapterState {
            wallet_name: public_key.map(|_| "Phantom".to_string()),
            connected: public_key.is_some(),
            public_key: public_key.map(str::to_string),
        });
    }

    pub fn fail_disconnect(&self) {
        self.fail_disconnect.store(true, Ordering::SeqCst);
    }

    pub fn panic_on_disconnect(&self) {
        self.panic_disconnect.store(true, Ordering::SeqCst);
    }

    pub fn disconnects(&self) -> usize {
        self.disconnects.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WalletAdapter for FakeAdapter {
    fn is_ready(&self) -> bool {
        true
    }

    fn state(&self) -> watch::Receiver<AdapterState> {
        self.state.subscribe()
    }

    async fn connect(&self) -> Result<(), WalletError> {
        self.set_connected(Some(SAMPLE_PUBKEY));
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), WalletError> {
        self.disconnects.fetch_add(1, Ordering::SeqCst);
        if self.panic_disconnect.load(Ordering::SeqCst) {
            panic!("adapter blew up");
        }
        if self.fail_disconnect.load(Ordering::SeqCst) {
            return Err(WalletError::Adapter("WalletDisconnectionError".into()));
        }
        self.state.send_replace(AdapterState::default());
        Ok(())
    }
}

pub struct FakeBalanceClient {
    balances: HashMap<String, u64>,
    calls: AtomicUsize,
    gated: bool,
    started: Notify,
    gate: Notify,
}

impl FakeBalanceClient {
    pub fn new(balances: &[(&str, u64)]) -> Self {
        Self {
            balances: balances
                .iter()
                .map(|(k, v)| (k.to_string(), *v))
                .collect(),
            calls: AtomicUsize::new(0),
            gated: false,
            started: Notify::new(),
            gate: Notify::new(),
        }
    }

    /// Every query waits for `release()`.
    pub fn gated(mut self) -> Self {
        self.gated = true;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub async fn wait_started(&self) {
        self.started.notified().await;
    }

    pub fn release(&self) {
        self.gate.notify_one();
    }
}

#[async_trait]
impl BalanceClient for FakeBalanceClient {
    async fn get_balance(&self, public_key: &str) -> Result<u64> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.gated {
            self.started.notify_one();
            self.gate.notified().await;
        }
        self.balances
            .get(public_key)
            .copied()
            .ok_or_else(|| anyhow!("could not find account {public_key}"))
    }
}

// ── Wallet sessions for the coordinator ──────────────────────────

pub struct FakeWalletSession {
    chain: Chain,
    address: Mutex<Option<String>>,
    switch_result: Mutex<Option<Result<SwitchOutcome, WalletError>>>,
    switch_calls: Mutex<Vec<String>>,
}

impl FakeWalletSession {
    pub fn new(chain: Chain) -> Self {
        Self {
            chain,
            address: Mutex::new(None),
            switch_result: Mutex::new(None),
            switch_calls: Mutex::new(Vec::new()),
        }
    }

    pub fn set_address(&self, address: Option<&str>) {
        *self.address.lock().unwrap() = address.map(str::to_string);
    }

    pub fn switch_result(&self, result: Result<SwitchOutcome, WalletError>) {
        *self.switch_result.lock().unwrap() = Some(result);
    }

    pub fn switch_calls(&self) -> Vec<String> {
        self.switch_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl WalletSession for FakeWalletSession {
    fn chain(&self) -> Chain {
        self.chain
    }

    fn is_available(&self) -> bool {
        true
    }

    fn address(&self) -> Option<String> {
        self.address.lock().unwrap().clone()
    }

    async fn connect(&self) -> Result<(), WalletError> {
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), WalletError> {
        self.set_address(None);
        Ok(())
    }

    fn subscribe(&self) -> Subscription {
        Subscription::inert("fake")
    }

    async fn switch_network(&self, chain_id: &str) -> Result<SwitchOutcome, WalletError> {
        self.switch_calls.lock().unwrap().push(chain_id.to_string());
        self.switch_result
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(|| {
                Ok(SwitchOutcome::Switched {
                    chain_id: chain_id.to_string(),
                })
            })
    }
}
