use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Url};

use crate::market_data::PriceSource;
use crate::market_data::types::QuoteResponse;

pub const DEFAULT_SIMPLE_PRICE_URL: &str = "https://api.coingecko.com/api/v3/simple/price";

/// CoinGecko `/simple/price`, unauthenticated.
pub struct CoingeckoSource {
    client: Client,
    base: Url,
}

impl CoingeckoSource {
    pub fn new(base: &str) -> Result<Self> {
        let base = Url::parse(base).with_context(|| format!("invalid price API url: {base}"))?;
        Ok(Self {
            client: Client::new(),
            base,
        })
    }

    pub fn quote_url(&self, coin_ids: &[&str]) -> Url {
        let mut url = self.base.clone();
        url.query_pairs_mut()
            .append_pair("ids", &coin_ids.join(","))
            .append_pair("vs_currencies", "usd");
        url
    }
}

#[async_trait]
impl PriceSource for CoingeckoSource {
    async fn fetch_quotes(&self, coin_ids: &[&str]) -> Result<QuoteResponse> {
        let resp = self
            .client
            .get(self.quote_url(coin_ids))
            .header("accept", "application/json")
            .send()
            .await
            .context("coingecko: request failed")?
            .error_for_status()
            .context("coingecko: non-success status")?;

        let body = resp.bytes().await.context("coingecko: read body failed")?;

        // { "solana": { "usd": 150.1 }, ... }
        serde_json::from_slice(&body).context("coingecko: parse JSON failed")
    }
}
