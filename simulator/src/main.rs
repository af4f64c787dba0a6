//! FX Wallet Simulator
//!
//! Drives a persisted wallet session through built-in scenarios, scenario
//! files or seeded random operations.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod controller;
mod metrics;
mod scenario;

use controller::SimulationController;
use fxwallet_ledger::{JsonFileStore, WalletConfig};
use scenario::Scenario;

/// FX Wallet Simulator CLI
#[derive(Parser, Debug)]
#[command(name = "wallet-sim")]
#[command(about = "Multi-currency wallet simulation environment")]
struct Args {
    /// Balance file, overrides FXWALLET_STORE_PATH
    #[arg(long)]
    store: Option<PathBuf>,

    /// JSON rate table, overrides FXWALLET_RATES_PATH
    #[arg(long)]
    rates: Option<PathBuf>,

    /// Built-in scenario to run (basic-flow, round-trip, rejections)
    #[arg(short, long, conflicts_with = "scenario_file")]
    scenario: Option<String>,

    /// Scenario file to run
    #[arg(long)]
    scenario_file: Option<PathBuf>,

    /// Number of random operations when no scenario is given
    #[arg(short, long, default_value = "20")]
    operations: usize,

    /// Random seed for reproducibility
    #[arg(long)]
    seed: Option<u64>,

    /// Emit logs as JSON
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = WalletConfig::from_env();
    if let Some(store) = args.store.clone() {
        config.store_path = store;
    }
    if let Some(rates) = args.rates.clone() {
        config.rates_path = Some(rates);
    }

    init_logging(&config.log_level, args.json);

    config.validate().map_err(anyhow::Error::msg)?;
    let rates = config.rate_table()?;

    let store = Arc::new(JsonFileStore::new(&config.store_path));

    info!("Starting FX Wallet Simulator");
    info!("Store: {}", store.path().display());
    info!("Rate pairs: {}", rates.len());
    for (pair, rate) in rates.pairs() {
        debug!("{} = {}", pair, rate);
    }

    let mut controller = SimulationController::new(store, rates, args.seed);

    let scenario = match (&args.scenario, &args.scenario_file) {
        (Some(name), _) => Some(Scenario::load(name)?),
        (None, Some(path)) => Some(Scenario::from_file(path)?),
        (None, None) => None,
    };

    match scenario {
        Some(scenario) => {
            controller
                .initialize(scenario.initial_balances.clone())
                .await?;
            controller.run_scenario(&scenario).await?;
        }
        None => {
            controller.initialize(None).await?;
            controller.run_random(args.operations).await?;
        }
    }

    let metrics = controller.metrics();
    info!("Simulation complete");
    info!("Operations: {}", metrics.total_operations);
    info!("Committed: {}", metrics.committed_operations);
    for (code, count) in &metrics.rejected_by_code {
        info!("Rejected {}: {}", code, count);
    }
    info!("Quotes: {}", metrics.quotes);
    info!("Failed saves: {}", metrics.failed_saves);
    info!("Success rate: {:.1}%", metrics.success_rate() * 100.0);

    if metrics.failed_saves > 0 {
        controller.save().await?;
        info!("Saved balances on retry");
    }

    Ok(())
}

fn init_logging(level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}
