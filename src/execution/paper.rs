use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::info;

use super::traits::{BuyHandler, BuyIntent, BuyReceipt};

/// Acknowledges buy intents without touching any chain.
pub struct PaperBuyHandler {
    next_intent_id: AtomicU64,
}

impl PaperBuyHandler {
    pub fn new() -> Self {
        Self {
            next_intent_id: AtomicU64::new(1),
        }
    }
}

impl Default for PaperBuyHandler {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BuyHandler for PaperBuyHandler {
    async fn submit(&self, intent: BuyIntent) -> BuyReceipt {
        let intent_id = self.next_intent_id.fetch_add(1, Ordering::Relaxed);

        info!(
            intent_id,
            chain = %intent.chain,
            wallet = ?intent.wallet_address,
            token = %intent.token,
            amount = %intent.amount,
            estimated_usd = %intent.estimated_usd,
            latency_us = intent.created_at.elapsed().as_micros(),
            "BUY INTENT (paper)"
        );

        BuyReceipt {
            intent_id,
            message: format!(
                "Buy request #{intent_id} received: {} {} (~${}). Purchasing is coming soon.",
                intent.amount, intent.token, intent.estimated_usd
            ),
            completed_at: Instant::now(),
        }
    }
}
