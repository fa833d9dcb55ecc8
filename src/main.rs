use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::{info, warn};

use dual_chain_dashboard::dashboard::DashboardDeps;
use dual_chain_dashboard::execution::PaperBuyHandler;
use dual_chain_dashboard::market_data::adapters::coingecko::CoingeckoSource;
use dual_chain_dashboard::state::storage::MemoryStorage;
use dual_chain_dashboard::telemetry;
use dual_chain_dashboard::wallet::WalletSession;
use dual_chain_dashboard::wallet::solana::{RpcBalanceClient, WatchOnlyAdapter};
use dual_chain_dashboard::{CalculatorState, Chain, Config, Dashboard, Token};

/// Live prices, a USD calculator and wallet state for Solana and Ethereum.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Chain to select on start
    #[arg(long, value_enum, default_value_t = Chain::Solana)]
    chain: Chain,

    /// Calculator token: sol, usdt or usdc
    #[arg(long, value_parser = parse_calculator_token, default_value = "sol")]
    token: Token,

    /// Calculator amount (free text, invalid input counts as zero)
    #[arg(long, default_value = "1")]
    amount: String,

    /// Solana public key to follow as a watch-only wallet
    #[arg(long)]
    watch_address: Option<String>,

    /// Submit a (paper) buy once live prices arrive
    #[arg(long, default_value_t = false)]
    buy: bool,

    /// Exit after the first live price update
    #[arg(long, default_value_t = false)]
    once: bool,
}

fn parse_calculator_token(raw: &str) -> Result<Token, String> {
    Token::calculator_choice(raw).ok_or_else(|| {
        let choices: Vec<&str> = Token::CALCULATOR_CHOICES
            .iter()
            .map(|token| token.symbol())
            .collect();
        format!("expected one of {}", choices.join(", "))
    })
}

fn init_tracing(config: &Config) {
    let filter = tracing_subscriber::EnvFilter::try_new(&config.log_level)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn render(dashboard: &Dashboard, calculator: &CalculatorState) {
    let snap = dashboard.snapshot(calculator);
    let prices: Vec<String> = snap
        .prices
        .iter()
        .map(|(token, price)| format!("{token}=${price}"))
        .collect();

    info!(
        chain = %snap.chain,
        prices = %prices.join(" "),
        live = snap.prices.is_live(),
        solana_key = ?snap.solana.public_key,
        solana_balance = ?snap.solana.balance,
        evm_available = snap.evm_available,
        buy_enabled = snap.buy_enabled,
        "{} {} = {}",
        calculator.amount(),
        calculator.token(),
        calculator.readout(&snap.prices),
    );
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::from_env()?;
    init_tracing(&config);

    if let Some(addr) = config.metrics_addr {
        telemetry::init_metrics_server(addr)?;
        info!(%addr, "metrics exporter listening");
    }

    info!(
        cluster = %config.solana_cluster,
        rpc = %config.solana_rpc_url,
        "dual-chain-dashboard starting"
    );

    let storage = Arc::new(MemoryStorage::new());
    let deps = DashboardDeps {
        price_source: Arc::new(CoingeckoSource::new(&config.price_api_url)?),
        // Outside a browser nothing injects an Ethereum provider.
        provider: None,
        adapter: Arc::new(WatchOnlyAdapter::new(cli.watch_address.clone(), storage.clone())),
        balances: Arc::new(RpcBalanceClient::new(&config.solana_rpc_url)?),
        storage,
        buy_handler: Arc::new(PaperBuyHandler::new()),
    };
    let dashboard = Dashboard::mount(&config, deps);
    let calculator = CalculatorState::new(cli.token, cli.amount.clone());

    if cli.watch_address.is_some() {
        if let Err(err) = dashboard.solana().connect().await {
            warn!(error = %err, "could not follow watch address");
        }
    }
    if let Err(err) = dashboard.select_chain(cli.chain).await {
        warn!(error = %err, "network switch failed");
    }

    let mut prices = dashboard.prices();
    let (mut adapter_state, mut balance) = dashboard.solana().watch_changes();
    let mut bought = false;

    loop {
        tokio::select! {
            res = prices.changed() => {
                if res.is_err() {
                    warn!("price feed closed");
                    break;
                }
                render(&dashboard, &calculator);

                if !prices.borrow_and_update().is_live() {
                    continue;
                }
                if cli.buy && !bought {
                    bought = true;
                    match dashboard.buy(&calculator).await {
                        Ok(receipt) => info!(intent_id = receipt.intent_id, "{}", receipt.message),
                        Err(err) => warn!(error = %err, "buy unavailable"),
                    }
                }
                if cli.once {
                    break;
                }
            }
            res = adapter_state.changed() => {
                if res.is_err() {
                    break;
                }
                render(&dashboard, &calculator);
            }
            res = balance.changed() => {
                if res.is_err() {
                    break;
                }
                render(&dashboard, &calculator);
            }
            _ = tokio::signal::ctrl_c() => {
                info!("received Ctrl-C, shutting down");
                break;
            }
        }
    }

    dashboard.unmount();
    Ok(())
}
