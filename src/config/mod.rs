use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, bail};

use crate::coordinator::BuyGate;
use crate::market_data::adapters::coingecko::DEFAULT_SIMPLE_PRICE_URL;
use crate::market_data::poller::DEFAULT_POLL_INTERVAL;
use crate::wallet::evm::networks::{ETHEREUM_MAINNET_ID, parse_chain_id};
use crate::wallet::solana::rpc::SolanaCluster;

#[derive(Debug, Clone)]
pub struct Config {
    pub log_level: String,
    pub price_api_url: String,
    pub price_poll_interval: Duration,
    pub solana_cluster: SolanaCluster,
    pub solana_rpc_url: String,
    /// Network an already-connected EVM wallet is moved to when the user
    /// selects Ethereum.
    pub reference_evm_chain_id: String,
    pub buy_gate: BuyGate,
    pub metrics_addr: Option<SocketAddr>,
}

impl Default for Config {
    fn default() -> Self {
        let solana_cluster = SolanaCluster::default();
        Self {
            log_level: "info".to_string(),
            price_api_url: DEFAULT_SIMPLE_PRICE_URL.to_string(),
            price_poll_interval: DEFAULT_POLL_INTERVAL,
            solana_cluster,
            solana_rpc_url: solana_cluster.rpc_url().to_string(),
            reference_evm_chain_id: ETHEREUM_MAINNET_ID.to_string(),
            buy_gate: BuyGate::default(),
            metrics_addr: None,
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        // dotenvy loads .env, but doesn't override already-set env vars
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from any key lookup; unset keys take defaults.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let log_level = get("RUST_LOG").unwrap_or(defaults.log_level);
        let price_api_url = get("PRICE_API_URL").unwrap_or(defaults.price_api_url);

        let price_poll_interval = match get("PRICE_POLL_INTERVAL_SECS") {
            Some(raw) => {
                let secs: u64 = raw
                    .trim()
                    .parse()
                    .with_context(|| format!("PRICE_POLL_INTERVAL_SECS is not a number: {raw}"))?;
                if secs == 0 {
                    bail!("PRICE_POLL_INTERVAL_SECS must be at least 1");
                }
                Duration::from_secs(secs)
            }
            None => defaults.price_poll_interval,
        };

        let solana_cluster = match get("SOLANA_CLUSTER") {
            Some(raw) => SolanaCluster::from_str(&raw)?,
            None => defaults.solana_cluster,
        };
        let solana_rpc_url =
            get("SOLANA_RPC_URL").unwrap_or_else(|| solana_cluster.rpc_url().to_string());

        let reference_evm_chain_id =
            get("REFERENCE_EVM_CHAIN_ID").unwrap_or(defaults.reference_evm_chain_id);
        if parse_chain_id(&reference_evm_chain_id).is_none() {
            bail!("REFERENCE_EVM_CHAIN_ID must be a hex chain id like 0x1, got {reference_evm_chain_id}");
        }

        let buy_gate = match get("BUY_REQUIRES_WALLET") {
            Some(raw) => BuyGate::from_str(&raw).context("BUY_REQUIRES_WALLET")?,
            None => defaults.buy_gate,
        };

        let metrics_addr = get("METRICS_ADDR")
            .map(|raw| {
                raw.parse::<SocketAddr>()
                    .with_context(|| format!("METRICS_ADDR is not a socket address: {raw}"))
            })
            .transpose()?;

        Ok(Self {
            log_level,
            price_api_url,
            price_poll_interval,
            solana_cluster,
            solana_rpc_url,
            reference_evm_chain_id,
            buy_gate,
            metrics_addr,
        })
    }
}
