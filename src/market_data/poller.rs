use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use super::PriceSource;
use super::price_table::PriceTable;
use super::types::Token;
use crate::lifecycle::{Liveness, Subscription};
use crate::telemetry::prometheus as telemetry;

/// Default refresh cadence. Fixed: no jitter, no backoff on failure.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(15);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    Committed,
    /// Fetch failed; the previous table stays visible.
    Failed,
    /// Fetch finished after the feed was stopped.
    Discarded,
}

/// Live price table, refreshed in the background until stopped.
///
/// Views read through `prices()`; nothing outside the poll task writes.
pub struct PriceFeed {
    prices: watch::Receiver<PriceTable>,
    timer: Subscription,
}

impl PriceFeed {
    /// Polls once immediately, then every `period`.
    pub fn spawn(source: Arc<dyn PriceSource>, period: Duration) -> Self {
        let (tx, rx) = watch::channel(PriceTable::default());
        let liveness = Liveness::new();

        info!(period_secs = period.as_secs(), "price feed started");

        let timer = Subscription::spawn(
            "price-feed",
            liveness.clone(),
            run_price_poller(source, tx, liveness, period),
        );

        Self { prices: rx, timer }
    }

    pub fn prices(&self) -> watch::Receiver<PriceTable> {
        self.prices.clone()
    }

    pub fn latest(&self) -> PriceTable {
        self.prices.borrow().clone()
    }

    pub fn is_running(&self) -> bool {
        self.timer.is_active()
    }

    /// Releases the timer. Any fetch still in flight is never committed.
    pub fn stop(self) {
        info!("price feed stopped");
        self.timer.unsubscribe();
    }
}

async fn run_price_poller(
    source: Arc<dyn PriceSource>,
    tx: watch::Sender<PriceTable>,
    liveness: Liveness,
    period: Duration,
) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;
        if !liveness.is_alive() {
            break;
        }
        poll_once(source.as_ref(), &tx, &liveness).await;
    }
}

/// One fetch-and-commit cycle. Failures never leave this function.
pub async fn poll_once(
    source: &dyn PriceSource,
    tx: &watch::Sender<PriceTable>,
    liveness: &Liveness,
) -> PollOutcome {
    let ids: Vec<&str> = Token::ALL.iter().map(|t| t.coin_id()).collect();

    let outcome = match source.fetch_quotes(&ids).await {
        Ok(quotes) if liveness.is_alive() => {
            let table = PriceTable::from_quotes(&quotes, unix_now());
            debug!(?table, "prices refreshed");
            tx.send_replace(table);
            PollOutcome::Committed
        }
        Ok(_) => {
            debug!("price fetch completed after teardown, discarding");
            PollOutcome::Discarded
        }
        Err(err) => {
            warn!(error = %err, "price fetch failed, keeping previous table");
            PollOutcome::Failed
        }
    };

    telemetry::record_price_poll(outcome);
    outcome
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_secs()
}
