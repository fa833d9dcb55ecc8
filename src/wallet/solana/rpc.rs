use std::fmt;
use std::str::FromStr;

use anyhow::{Context, Result, anyhow, bail};
use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;
use serde_json::json;

/// Balance lookups against a Solana RPC node.
#[async_trait]
pub trait BalanceClient: Send + Sync {
    /// Balance in lamports.
    async fn get_balance(&self, public_key: &str) -> Result<u64>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SolanaCluster {
    #[default]
    Devnet,
    Testnet,
    MainnetBeta,
}

impl SolanaCluster {
    pub fn rpc_url(&self) -> &'static str {
        match self {
            SolanaCluster::Devnet => "https://api.devnet.solana.com",
            SolanaCluster::Testnet => "https://api.testnet.solana.com",
            SolanaCluster::MainnetBeta => "https://api.mainnet-beta.solana.com",
        }
    }
}

impl FromStr for SolanaCluster {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "devnet" => Ok(SolanaCluster::Devnet),
            "testnet" => Ok(SolanaCluster::Testnet),
            "mainnet" | "mainnet-beta" => Ok(SolanaCluster::MainnetBeta),
            other => bail!("unknown solana cluster: {other}"),
        }
    }
}

impl fmt::Display for SolanaCluster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SolanaCluster::Devnet => "devnet",
            SolanaCluster::Testnet => "testnet",
            SolanaCluster::MainnetBeta => "mainnet-beta",
        })
    }
}

/// JSON-RPC `getBalance` over HTTP.
pub struct RpcBalanceClient {
    client: Client,
    endpoint: Url,
}

impl RpcBalanceClient {
    pub fn new(endpoint: &str) -> Result<Self> {
        let endpoint =
            Url::parse(endpoint).with_context(|| format!("invalid solana rpc url: {endpoint}"))?;
        Ok(Self {
            client: Client::new(),
            endpoint,
        })
    }
}

#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcErrorBody>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct BalanceResult {
    value: u64,
}

pub(crate) fn parse_balance_response(body: &[u8]) -> Result<u64> {
    let resp: RpcResponse<BalanceResult> =
        serde_json::from_slice(body).context("solana rpc: parse JSON failed")?;

    if let Some(err) = resp.error {
        return Err(anyhow!("solana rpc error {}: {}", err.code, err.message));
    }
    resp.result
        .map(|r| r.value)
        .ok_or_else(|| anyhow!("solana rpc: response has neither result nor error"))
}

#[async_trait]
impl BalanceClient for RpcBalanceClient {
    async fn get_balance(&self, public_key: &str) -> Result<u64> {
        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "getBalance",
            "params": [public_key, { "commitment": "confirmed" }],
        });

        let resp = self
            .client
            .post(self.endpoint.clone())
            .json(&body)
            .send()
            .await
            .context("solana rpc: request failed")?
            .error_for_status()
            .context("solana rpc: non-success status")?;

        let bytes = resp.bytes().await.context("solana rpc: read body failed")?;
        parse_balance_response(&bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_balance_value() {
        let body = br#"{"jsonrpc":"2.0","result":{"context":{"slot":1},"value":2500000000},"id":1}"#;
        assert_eq!(parse_balance_response(body).unwrap(), 2_500_000_000);
    }

    #[test]
    fn surfaces_rpc_error() {
        let body = br#"{"jsonrpc":"2.0","error":{"code":-32602,"message":"Invalid param: WrongSize"},"id":1}"#;
        let err = parse_balance_response(body).unwrap_err();
        assert!(err.to_string().contains("-32602"));
    }

    #[test]
    fn cluster_names_round_trip() {
        assert_eq!("mainnet-beta".parse::<SolanaCluster>().unwrap(), SolanaCluster::MainnetBeta);
        assert_eq!("Devnet".parse::<SolanaCluster>().unwrap(), SolanaCluster::Devnet);
        assert!("localnet".parse::<SolanaCluster>().is_err());
        assert_eq!(SolanaCluster::Testnet.to_string(), "testnet");
    }
}
