use std::net::SocketAddr;

use anyhow::Context;
use metrics::counter;
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::market_data::poller::PollOutcome;
use crate::state::chain::Chain;

/// Start the Prometheus HTTP exporter on `addr`.
/// After this call, any metrics recorded via the `metrics` crate
/// macros are exported at /metrics. Without it they are no-ops.
pub fn init_metrics_server(addr: SocketAddr) -> anyhow::Result<()> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .context("failed to start Prometheus metrics server")
}

// ── Price feed ───────────────────────────────────────────────────

pub fn record_price_poll(outcome: PollOutcome) {
    let outcome = match outcome {
        PollOutcome::Committed => "committed",
        PollOutcome::Failed => "failed",
        PollOutcome::Discarded => "discarded",
    };
    counter!("price_polls_total", "outcome" => outcome).increment(1);
}

// ── Wallets ──────────────────────────────────────────────────────

pub fn record_wallet_event(chain: Chain, event: &'static str) {
    counter!("wallet_events_total", "chain" => chain.as_str(), "event" => event).increment(1);
}

pub fn record_chain_switch(outcome: &'static str) {
    counter!("evm_chain_switches_total", "outcome" => outcome).increment(1);
}

// ── Coordinator ──────────────────────────────────────────────────

pub fn record_chain_selected(chain: Chain) {
    counter!("chain_selections_total", "chain" => chain.as_str()).increment(1);
}

pub fn record_buy_intent(chain: Chain) {
    counter!("buy_intents_total", "chain" => chain.as_str()).increment(1);
}
