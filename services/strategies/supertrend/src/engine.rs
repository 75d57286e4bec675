//! Indicator engine: owns the candle buffer and configuration for one symbol
//! and turns the buffered history into a [`SuperTrendResult`] on demand.
//!
//! Every calculation is a pure function of the buffer and configuration at
//! call time. Nothing is cached between calls, so a configuration swap never
//! invalidates buffered candles.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use supertrend_config::service::numeric::{ATR_FLOOR, FALLBACK_PRICE, NEUTRAL_RSI};
use tracing::{debug, info};

use crate::bands::{BandTracker, Trend};
use crate::candle::{AppendOutcome, Candle, CandleBuffer, PriceSeries};
use crate::config::IndicatorConfig;
use crate::error::{ConfigError, Result};
use crate::indicators::RollingStatistics;
use crate::numeric::{clamp, sanitize};
use crate::signals::SignalGenerator;

/// Indicator values for the newest bar
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SuperTrendResult {
    /// Support band (bullish trailing line)
    pub up: f64,
    /// Resistance band (bearish trailing line)
    pub down: f64,
    pub trend: Trend,
    pub atr: f64,
    pub rsi: f64,
    pub trend_strength: f64,
    pub buy_signal: bool,
    pub sell_signal: bool,
    pub strong_signal: bool,
}

impl SuperTrendResult {
    /// True when every numeric field is finite
    pub fn is_finite(&self) -> bool {
        [self.up, self.down, self.atr, self.rsi, self.trend_strength]
            .iter()
            .all(|v| v.is_finite())
    }
}

/// Outcome of a calculation request.
///
/// Too little history is an expected state, not an error.
#[derive(Debug, Clone, PartialEq)]
pub enum Calculation<T = SuperTrendResult> {
    Ready(T),
    InsufficientData { available: usize, required: usize },
}

impl<T> Calculation<T> {
    pub fn ready(self) -> Option<T> {
        match self {
            Calculation::Ready(value) => Some(value),
            Calculation::InsufficientData { .. } => None,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Calculation::Ready(_))
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Calculation<U> {
        match self {
            Calculation::Ready(value) => Calculation::Ready(f(value)),
            Calculation::InsufficientData {
                available,
                required,
            } => Calculation::InsufficientData {
                available,
                required,
            },
        }
    }
}

/// A result together with the context the signal layer needs
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub symbol: String,
    /// Timestamp of the newest bar
    pub timestamp: DateTime<Utc>,
    pub close: f64,
    /// Mean ATR over the last `atr_ma_length` bars
    pub atr_average: f64,
    /// Bars the calculation ran over
    pub bars: usize,
    pub result: SuperTrendResult,
}

/// Lifecycle of the engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineState {
    NoSymbol,
    Buffering { available: usize, required: usize },
    Ready,
}

/// Copy of everything a calculation reads
#[derive(Debug, Clone)]
pub struct EngineSnapshot {
    pub symbol: Option<String>,
    pub config: IndicatorConfig,
    pub candles: Vec<Candle>,
}

impl EngineSnapshot {
    pub fn evaluate(&self) -> Calculation<Evaluation> {
        evaluate_candles(self.symbol.as_deref(), &self.config, &self.candles)
    }

    /// Evaluate only if the snapshot holds history for `symbol`
    pub fn evaluate_for(&self, symbol: &str) -> Calculation<Evaluation> {
        if self.symbol.as_deref() != Some(symbol) {
            debug!(symbol, bound = ?self.symbol, "No history for requested symbol");
            return Calculation::InsufficientData {
                available: 0,
                required: self.config.required_bars(),
            };
        }
        self.evaluate()
    }
}

fn evaluate_candles(
    symbol: Option<&str>,
    config: &IndicatorConfig,
    candles: &[Candle],
) -> Calculation<Evaluation> {
    let required = config.required_bars();
    let (Some(symbol), Some(latest)) = (symbol, candles.last()) else {
        return Calculation::InsufficientData {
            available: 0,
            required,
        };
    };
    if candles.len() < required {
        debug!(symbol, available = candles.len(), required, "Insufficient data");
        return Calculation::InsufficientData {
            available: candles.len(),
            required,
        };
    }

    let series = PriceSeries::from_candles(candles);
    let stats = RollingStatistics::compute(&series, config.periods, config.rsi_length);
    let tracker = BandTracker::new(config.multiplier);
    let Some(bands) = tracker.track(&series.high, &series.low, &series.close, &stats.atr) else {
        return Calculation::InsufficientData {
            available: candles.len(),
            required,
        };
    };

    let close = sanitize(latest.close, FALLBACK_PRICE);
    let atr = stats.current_atr().max(ATR_FLOOR);
    let rsi = clamp(stats.current_rsi(), 0.0, 100.0);
    let Some(levels) = bands.current(close) else {
        return Calculation::InsufficientData {
            available: candles.len(),
            required,
        };
    };

    let flags = SignalGenerator::new(config).evaluate(&levels, bands.previous_trend(), close, atr, rsi);

    let result = SuperTrendResult {
        up: levels.up,
        down: levels.down,
        trend: levels.trend,
        atr,
        rsi: sanitize(rsi, NEUTRAL_RSI),
        trend_strength: sanitize(flags.trend_strength, 0.0),
        buy_signal: flags.buy,
        sell_signal: flags.sell,
        strong_signal: flags.strong,
    };

    Calculation::Ready(Evaluation {
        symbol: symbol.to_string(),
        timestamp: latest.timestamp,
        close,
        atr_average: stats.atr_average(config.atr_ma_length),
        bars: candles.len(),
        result,
    })
}

/// Owner of the candle buffer and active configuration
#[derive(Debug, Default)]
pub struct IndicatorEngine {
    buffer: CandleBuffer,
    config: IndicatorConfig,
}

impl IndicatorEngine {
    pub fn new(config: IndicatorConfig) -> std::result::Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            buffer: CandleBuffer::new(),
            config,
        })
    }

    /// Bind to `symbol`; switching symbols discards buffered history
    pub fn select_symbol(&mut self, symbol: &str) {
        if self.buffer.set_symbol(symbol) {
            info!(symbol, "Selected symbol");
        }
    }

    pub fn symbol(&self) -> Option<&str> {
        self.buffer.symbol()
    }

    pub fn push_candle(&mut self, candle: Candle) -> AppendOutcome {
        self.buffer.append(candle)
    }

    pub fn config(&self) -> IndicatorConfig {
        self.config
    }

    /// Swap the configuration. On rejection the previous one stays active.
    pub fn set_config(&mut self, config: IndicatorConfig) -> std::result::Result<(), ConfigError> {
        config.validate()?;
        if config != self.config {
            info!(?config, "Indicator configuration updated");
        }
        self.config = config;
        Ok(())
    }

    pub fn state(&self) -> EngineState {
        if self.buffer.symbol().is_none() {
            return EngineState::NoSymbol;
        }
        let required = self.config.required_bars();
        if self.buffer.len() < required {
            EngineState::Buffering {
                available: self.buffer.len(),
                required,
            }
        } else {
            EngineState::Ready
        }
    }

    pub fn buffer(&self) -> &CandleBuffer {
        &self.buffer
    }

    pub fn evaluate(&self) -> Calculation<Evaluation> {
        evaluate_candles(self.buffer.symbol(), &self.config, self.buffer.as_slice())
    }

    pub fn calculate(&self) -> Calculation {
        self.evaluate().map(|evaluation| evaluation.result)
    }

    /// Query for a specific symbol. A symbol other than the bound one has no
    /// buffered history and reports zero available bars.
    pub fn calculate_for(&self, symbol: &str) -> Calculation {
        if self.symbol() != Some(symbol) {
            return Calculation::InsufficientData {
                available: 0,
                required: self.config.required_bars(),
            };
        }
        self.calculate()
    }

    pub fn snapshot(&self) -> EngineSnapshot {
        EngineSnapshot {
            symbol: self.buffer.symbol().map(str::to_string),
            config: self.config,
            candles: self.buffer.as_slice().to_vec(),
        }
    }
}

/// Shared handle to an engine.
///
/// Ingestion takes the write lock for a single append. Calculations copy a
/// snapshot under the read lock and run on the blocking pool, so they never
/// observe a partially applied append and never stall ingestion.
#[derive(Debug, Clone)]
pub struct EngineHandle {
    inner: Arc<RwLock<IndicatorEngine>>,
}

impl EngineHandle {
    pub fn new(engine: IndicatorEngine) -> Self {
        Self {
            inner: Arc::new(RwLock::new(engine)),
        }
    }

    pub fn push_candle(&self, candle: Candle) -> AppendOutcome {
        self.inner.write().push_candle(candle)
    }

    /// Append a batch under one lock; returns how many were accepted
    pub fn push_candles(&self, candles: impl IntoIterator<Item = Candle>) -> usize {
        let mut engine = self.inner.write();
        let mut accepted = 0;
        for candle in candles {
            if engine.push_candle(candle).is_accepted() {
                accepted += 1;
            }
        }
        accepted
    }

    pub fn select_symbol(&self, symbol: &str) {
        self.inner.write().select_symbol(symbol);
    }

    pub fn symbol(&self) -> Option<String> {
        self.inner.read().symbol().map(str::to_string)
    }

    pub fn config(&self) -> IndicatorConfig {
        self.inner.read().config()
    }

    pub fn set_config(&self, config: IndicatorConfig) -> std::result::Result<(), ConfigError> {
        self.inner.write().set_config(config)
    }

    pub fn state(&self) -> EngineState {
        self.inner.read().state()
    }

    pub fn snapshot(&self) -> EngineSnapshot {
        self.inner.read().snapshot()
    }

    pub async fn evaluate(&self) -> Result<Calculation<Evaluation>> {
        let snapshot = self.snapshot();
        let calculation = tokio::task::spawn_blocking(move || snapshot.evaluate()).await?;
        Ok(calculation)
    }

    pub async fn calculate(&self) -> Result<Calculation> {
        Ok(self.evaluate().await?.map(|evaluation| evaluation.result))
    }

    pub async fn calculate_for(&self, symbol: &str) -> Result<Calculation> {
        let snapshot = self.snapshot();
        let symbol = symbol.to_string();
        let calculation = tokio::task::spawn_blocking(move || snapshot.evaluate_for(&symbol)).await?;
        Ok(calculation.map(|evaluation| evaluation.result))
    }
}
