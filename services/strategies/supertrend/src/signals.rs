//! Trading signal definitions and generation

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use crate::bands::{BandLevels, Trend};
use crate::config::IndicatorConfig;
use crate::engine::Evaluation;
use crate::numeric::{clamp, safe_divide};

/// Buy/sell/strength flags for the newest bar
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SignalFlags {
    pub buy: bool,
    pub sell: bool,
    pub strong: bool,
    pub trend_strength: f64,
}

/// Decides signal flags from the trend transition and RSI.
///
/// Signals fire on the flip edge only: a bar that merely continues the
/// current trend never produces a buy or sell, whatever the RSI says.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignalGenerator {
    use_rsi_filter: bool,
    rsi_buy_threshold: f64,
    rsi_sell_threshold: f64,
    strong_trend_threshold: f64,
}

impl SignalGenerator {
    pub fn new(config: &IndicatorConfig) -> Self {
        Self {
            use_rsi_filter: config.use_rsi_filter,
            rsi_buy_threshold: f64::from(config.rsi_buy_threshold),
            rsi_sell_threshold: f64::from(config.rsi_sell_threshold),
            strong_trend_threshold: f64::from(config.strong_trend_threshold),
        }
    }

    pub fn evaluate(
        &self,
        current: &BandLevels,
        previous: Option<Trend>,
        close: f64,
        atr: f64,
        rsi: f64,
    ) -> SignalFlags {
        let flipped_up = previous == Some(Trend::Bearish) && current.trend == Trend::Bullish;
        let flipped_down = previous == Some(Trend::Bullish) && current.trend == Trend::Bearish;

        let buy = flipped_up && !(self.use_rsi_filter && rsi <= self.rsi_buy_threshold);
        let sell = flipped_down && !(self.use_rsi_filter && rsi >= self.rsi_sell_threshold);

        if (flipped_up && !buy) || (flipped_down && !sell) {
            debug!(rsi, trend = %current.trend, "Trend flip filtered by RSI");
        }

        let distance = (close - current.active_band()).abs();
        let trend_strength = clamp(safe_divide(distance, atr, 0.0) * 100.0, 0.0, 100.0);

        SignalFlags {
            buy,
            sell,
            strong: trend_strength > self.strong_trend_threshold,
            trend_strength,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SignalType {
    Buy,
    Sell,
}

impl fmt::Display for SignalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignalType::Buy => write!(f, "BUY"),
            SignalType::Sell => write!(f, "SELL"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradingSignal {
    /// Unique signal identifier
    pub signal_id: u64,

    pub symbol: String,

    pub signal_type: SignalType,

    /// Close of the bar that triggered the signal
    pub price: f64,

    /// Trend strength (0-100)
    pub strength: f64,

    /// Signal confidence (0-100)
    pub confidence: u8,

    pub strong: bool,

    pub rsi: f64,

    pub atr: f64,

    /// Timestamp of the triggering bar
    pub timestamp: DateTime<Utc>,

    /// Human-readable reason for signal
    pub reason: String,
}

impl TradingSignal {
    /// Build a signal from an evaluation that carries a buy or sell flag
    pub fn from_evaluation(signal_id: u64, evaluation: &Evaluation) -> Option<Self> {
        let result = &evaluation.result;
        let signal_type = if result.buy_signal {
            SignalType::Buy
        } else if result.sell_signal {
            SignalType::Sell
        } else {
            return None;
        };

        let (band, band_value) = match signal_type {
            SignalType::Buy => ("support", result.up),
            SignalType::Sell => ("resistance", result.down),
        };
        let reason = format!(
            "SuperTrend flip {} {} {:.5}, RSI {:.1}",
            match signal_type {
                SignalType::Buy => "above",
                SignalType::Sell => "below",
            },
            band,
            band_value,
            result.rsi
        );

        Some(Self {
            signal_id,
            symbol: evaluation.symbol.clone(),
            signal_type,
            price: evaluation.close,
            strength: result.trend_strength,
            confidence: clamp(result.trend_strength.round(), 0.0, 100.0) as u8,
            strong: result.strong_signal,
            rsi: result.rsi,
            atr: result.atr,
            timestamp: evaluation.timestamp,
            reason,
        })
    }

    /// Get signal strength based on confidence
    pub fn strength_band(&self) -> SignalStrength {
        match self.confidence {
            90..=100 => SignalStrength::VeryStrong,
            80..=89 => SignalStrength::Strong,
            70..=79 => SignalStrength::Moderate,
            60..=69 => SignalStrength::Weak,
            _ => SignalStrength::VeryWeak,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalStrength {
    VeryWeak,
    Weak,
    Moderate,
    Strong,
    VeryStrong,
}

/// Outcome of passing a candidate signal through the emission filters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    Emit,
    /// Too few bars since the last emitted signal
    Cooldown { remaining: usize },
    /// Current ATR is below its recent average
    LowVolatility,
}

/// Emission filters applied after the indicator has flagged a flip.
///
/// These never alter the indicator result itself; they only decide whether a
/// flagged signal leaves the service.
#[derive(Debug, Clone, Default)]
pub struct SignalGate {
    bars_since_emit: Option<usize>,
}

impl SignalGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Account for newly ingested bars
    pub fn advance(&mut self, bars: usize) {
        if let Some(count) = self.bars_since_emit.as_mut() {
            *count = count.saturating_add(bars);
        }
    }

    /// Decide on a flagged signal. An `Emit` decision restarts the cooldown.
    pub fn decide(
        &mut self,
        config: &IndicatorConfig,
        current_atr: f64,
        atr_average: f64,
    ) -> GateDecision {
        if let Some(elapsed) = self.bars_since_emit {
            if elapsed < config.cooldown_bars {
                return GateDecision::Cooldown {
                    remaining: config.cooldown_bars - elapsed,
                };
            }
        }

        if config.use_volatility_filter && current_atr < atr_average {
            return GateDecision::LowVolatility;
        }

        self.bars_since_emit = Some(0);
        GateDecision::Emit
    }

    pub fn reset(&mut self) {
        self.bars_since_emit = None;
    }
}

/// Signal generation statistics
#[derive(Debug, Default, Clone, PartialEq)]
pub struct SignalStats {
    pub total_signals: u64,
    pub buy_signals: u64,
    pub sell_signals: u64,
    pub strong_signals: u64,
    pub avg_strength: f64,
    pub suppressed_cooldown: u64,
    pub suppressed_volatility: u64,
    pub last_signal_timestamp: Option<DateTime<Utc>>,
}

impl SignalStats {
    /// Update stats with an emitted signal
    pub fn record_signal(&mut self, signal: &TradingSignal) {
        self.total_signals += 1;

        match signal.signal_type {
            SignalType::Buy => self.buy_signals += 1,
            SignalType::Sell => self.sell_signals += 1,
        }
        if signal.strong {
            self.strong_signals += 1;
        }

        let total_strength = self.avg_strength * (self.total_signals - 1) as f64 + signal.strength;
        self.avg_strength = total_strength / self.total_signals as f64;

        self.last_signal_timestamp = Some(signal.timestamp);
    }

    pub fn record_suppressed(&mut self, decision: GateDecision) {
        match decision {
            GateDecision::Cooldown { .. } => self.suppressed_cooldown += 1,
            GateDecision::LowVolatility => self.suppressed_volatility += 1,
            GateDecision::Emit => {}
        }
    }
}
