//! Strategy configuration

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use supertrend_config::service::strategies::{ENV_PREFIX, SIGNAL_OUTPUT_QUEUE_SIZE};
use supertrend_config::{load_layered, GlobalConfig, SourceSettings};
use tracing::{info, warn};

use crate::error::ConfigError;

/// SuperTrend indicator parameters.
///
/// Ranges are enforced by [`IndicatorConfig::validate`]; out-of-range values
/// are rejected, never clamped.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorConfig {
    /// ATR and band lookback (5-50)
    pub periods: usize,

    /// Band width in ATRs (0.5-5.0)
    pub multiplier: f64,

    /// RSI lookback (5-30)
    pub rsi_length: usize,

    /// Buy flips need RSI above this (30-70)
    pub rsi_buy_threshold: u32,

    /// Sell flips need RSI below this (30-70)
    pub rsi_sell_threshold: u32,

    pub use_rsi_filter: bool,

    /// Suppress signals while ATR is below its recent average
    pub use_volatility_filter: bool,

    /// Trend strength above which a signal counts as strong (10-100)
    pub strong_trend_threshold: u32,

    /// Bars to wait after an emitted signal (1-20)
    pub cooldown_bars: usize,

    /// Bars in the ATR average used by the volatility filter (5-50)
    pub atr_ma_length: usize,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        Self {
            periods: 20,
            multiplier: 2.0,
            rsi_length: 14,
            rsi_buy_threshold: 50,
            rsi_sell_threshold: 50,
            use_rsi_filter: true,
            use_volatility_filter: true,
            strong_trend_threshold: 50,
            cooldown_bars: 5,
            atr_ma_length: 20,
        }
    }
}

fn check_range(field: &'static str, value: f64, min: f64, max: f64) -> Result<(), ConfigError> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            field,
            value,
            min,
            max,
        })
    }
}

impl IndicatorConfig {
    /// Check every field against its documented range
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_range("periods", self.periods as f64, 5.0, 50.0)?;
        check_range("multiplier", self.multiplier, 0.5, 5.0)?;
        check_range("rsi_length", self.rsi_length as f64, 5.0, 30.0)?;
        check_range(
            "rsi_buy_threshold",
            f64::from(self.rsi_buy_threshold),
            30.0,
            70.0,
        )?;
        check_range(
            "rsi_sell_threshold",
            f64::from(self.rsi_sell_threshold),
            30.0,
            70.0,
        )?;
        check_range(
            "strong_trend_threshold",
            f64::from(self.strong_trend_threshold),
            10.0,
            100.0,
        )?;
        check_range("cooldown_bars", self.cooldown_bars as f64, 1.0, 20.0)?;
        check_range("atr_ma_length", self.atr_ma_length as f64, 5.0, 50.0)?;
        Ok(())
    }

    /// Bars needed before a calculation can produce a result
    pub fn required_bars(&self) -> usize {
        self.periods + 1
    }
}

/// Complete service configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyConfig {
    pub global: GlobalConfig,
    pub source: SourceSettings,
    pub indicator: IndicatorConfig,

    /// Capacity of the outgoing signal channel
    pub signal_queue_size: usize,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            global: GlobalConfig::default(),
            source: SourceSettings::default(),
            indicator: IndicatorConfig::default(),
            signal_queue_size: SIGNAL_OUTPUT_QUEUE_SIZE,
        }
    }
}

impl StrategyConfig {
    /// Load from `path` with environment overrides; a missing file yields
    /// the defaults. The result is validated before it is returned.
    pub fn load(path: impl AsRef<Path>, environment: Option<&str>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            info!("Loading configuration from {:?}", path);
            load_layered::<Self>(path, environment, ENV_PREFIX)?
        } else {
            warn!("Config file {:?} not found, using defaults", path);
            Self::default()
        };

        config.source.expand_env_vars()?;
        config
            .indicator
            .validate()
            .context("Invalid indicator configuration")?;

        Ok(config)
    }
}
