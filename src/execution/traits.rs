use async_trait::async_trait;
use rust_decimal::Decimal;
use std::time::Instant;
use thiserror::Error;

use crate::market_data::types::Token;
use crate::state::chain::Chain;

/// What the user asked to buy. Carries no settlement details; there is no
/// on-chain step behind it yet.
#[derive(Debug, Clone)]
pub struct BuyIntent {
    pub chain: Chain,
    pub wallet_address: Option<String>,
    pub token: Token,
    pub amount: Decimal,
    pub estimated_usd: String,
    pub created_at: Instant,
}

#[derive(Debug, Clone)]
pub struct BuyReceipt {
    pub intent_id: u64,
    /// User-visible acknowledgement.
    pub message: String,
    pub completed_at: Instant,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BuyError {
    #[error("buying is not available on {chain}")]
    Disabled { chain: Chain },

    #[error("connect a Solana wallet first")]
    WalletNotConnected,
}

#[async_trait]
pub trait BuyHandler: Send + Sync {
    async fn submit(&self, intent: BuyIntent) -> BuyReceipt;
}
