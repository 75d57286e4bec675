//! SuperTrend Signal Strategy Main Entry Point

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use supertrend_signals::{
    connect_first, CandleSource, FileSource, StrategyConfig, SuperTrendStrategy, SyntheticSource,
    TradingSignal,
};
use supertrend_strategy_shared::{init_strategy_logging, Strategy};
use tokio::signal;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

#[derive(Debug, Parser)]
#[command(name = "supertrend_signals", about = "SuperTrend signal generation service")]
struct Args {
    /// Base configuration file (defaults are used when it does not exist)
    #[arg(short, long, default_value = "configs/supertrend.toml")]
    config: PathBuf,

    /// Environment overlay from config/environments/<name>.toml
    #[arg(short, long)]
    environment: Option<String>,

    /// Symbol to monitor, overriding the configuration
    #[arg(short, long)]
    symbol: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = StrategyConfig::load(&args.config, args.environment.as_deref())
        .context("Failed to load SuperTrend strategy configuration")?;
    if let Some(symbol) = args.symbol {
        config.source.symbol = symbol;
    }

    init_strategy_logging("supertrend_signals", &config.global)?;

    info!(
        symbol = %config.source.symbol,
        periods = config.indicator.periods,
        multiplier = config.indicator.multiplier,
        "Starting SuperTrend Signal Strategy"
    );

    let source = connect_first(source_chain(&config))
        .await
        .context("No market data source could be connected")?;

    let (signal_tx, signal_rx) = mpsc::channel(config.signal_queue_size.max(1));
    let sink_handle = tokio::spawn(log_signals(signal_rx));

    let mut strategy = SuperTrendStrategy::new(&config, source, signal_tx)?;
    let shutdown = strategy.shutdown_handle();
    let collector = strategy.metrics_collector();

    let mut strategy_handle = tokio::spawn(async move {
        let outcome = strategy.start().await;
        (strategy.metrics(), outcome)
    });

    info!("SuperTrend Signal Strategy running. Press Ctrl+C to stop.");

    let finished = tokio::select! {
        interrupted = signal::ctrl_c() => {
            interrupted.context("Failed to listen for shutdown signal")?;
            info!("Shutting down SuperTrend Signal Strategy");
            shutdown.trigger();
            strategy_handle.await
        }
        finished = &mut strategy_handle => {
            warn!("Strategy exited before shutdown was requested");
            finished
        }
    };

    let (metrics, outcome) = finished.context("Strategy task panicked")?;
    if let Err(e) = outcome {
        error!("Strategy failed: {:?}", e);
    }
    sink_handle.await.context("Signal sink task panicked")?;

    info!(
        candles = metrics.candles_ingested,
        calculations = metrics.calculations,
        signals = metrics.signals_generated,
        suppressed = metrics.signals_suppressed,
        errors = metrics.errors,
        uptime_secs = collector.uptime().as_secs(),
        "Final strategy metrics"
    );

    Ok(())
}

/// Providers in priority order: terminal file bridge, then demo feed
fn source_chain(config: &StrategyConfig) -> Vec<Box<dyn CandleSource>> {
    let mut providers: Vec<Box<dyn CandleSource>> = Vec::new();
    if let Some(path) = config.source.ohlc_path() {
        providers.push(Box::new(FileSource::new(path)));
    }
    if config.source.enable_synthetic {
        providers.push(Box::new(SyntheticSource::new(config.source.synthetic_seed)));
    }
    providers
}

async fn log_signals(mut signal_rx: mpsc::Receiver<TradingSignal>) {
    while let Some(signal) = signal_rx.recv().await {
        match serde_json::to_string(&signal) {
            Ok(json) => info!(target: "supertrend_signals::output", "{}", json),
            Err(e) => error!("Failed to serialize signal {}: {}", signal.signal_id, e),
        }
    }
}
