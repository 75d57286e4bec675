//! Standardized logging bootstrap for strategy services

use anyhow::{Context, Result};
use supertrend_config::{GlobalConfig, LogFormat};
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global tracing subscriber.
///
/// `RUST_LOG` takes precedence over the configured level.
pub fn init_strategy_logging(service_name: &str, global: &GlobalConfig) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&global.log_level)
            .with_context(|| format!("Invalid log level: {}", global.log_level))?,
    };

    let (pretty, json) = match global.log_format {
        LogFormat::Pretty => (Some(fmt::layer().with_target(true)), None),
        LogFormat::Json => (None, Some(fmt::layer().json())),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(pretty)
        .with(json)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    info!(service = service_name, "Logging initialized");
    Ok(())
}
