pub mod adapters;
pub mod poller;
pub mod price_table;
pub mod types;

use anyhow::Result;
use async_trait::async_trait;

use types::QuoteResponse;

/// Abstract interface for fetching USD quotes.
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// One read-only request for the given coin ids.
    async fn fetch_quotes(&self, coin_ids: &[&str]) -> Result<QuoteResponse>;
}
