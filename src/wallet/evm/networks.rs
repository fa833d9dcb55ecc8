use once_cell::sync::Lazy;
use serde::Serialize;

pub const ETHEREUM_MAINNET_ID: &str = "0x1";

/// Payload for `wallet_addEthereumChain`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddChainParams {
    pub chain_id: String,
    pub chain_name: String,
    pub native_currency: NativeCurrency,
    pub rpc_urls: Vec<String>,
    pub block_explorer_urls: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NativeCurrency {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

static ETHEREUM_MAINNET: Lazy<AddChainParams> = Lazy::new(|| AddChainParams {
    chain_id: ETHEREUM_MAINNET_ID.to_string(),
    chain_name: "Ethereum Mainnet".to_string(),
    native_currency: NativeCurrency {
        name: "Ether".to_string(),
        symbol: "ETH".to_string(),
        decimals: 18,
    },
    rpc_urls: vec!["https://cloudflare-eth.com".to_string()],
    block_explorer_urls: vec!["https://etherscan.io".to_string()],
});

/// Registration parameters for networks we know how to add.
///
/// Only Ethereum mainnet is registered. Extending this list is a product
/// decision, not a fix.
pub fn registration_params(chain_id: &str) -> Option<&'static AddChainParams> {
    same_chain(chain_id, ETHEREUM_MAINNET_ID).then(|| &*ETHEREUM_MAINNET)
}

/// Chain ids are hex strings; wallets disagree on case and leading zeros.
pub fn same_chain(a: &str, b: &str) -> bool {
    match (parse_chain_id(a), parse_chain_id(b)) {
        (Some(x), Some(y)) => x == y,
        _ => a.eq_ignore_ascii_case(b),
    }
}

pub fn parse_chain_id(id: &str) -> Option<u64> {
    let hex = id.strip_prefix("0x").or_else(|| id.strip_prefix("0X"))?;
    u64::from_str_radix(hex, 16).ok()
}
