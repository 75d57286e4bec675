//! SuperTrend band tracking.
//!
//! Naming follows the indicator's dashboard convention: the **upper** band
//! (`hl2 - m*ATR`) is the support line trailed under price in a bullish
//! trend, the **lower** band (`hl2 + m*ATR`) is the resistance line trailed
//! over price in a bearish trend.
//!
//! Each band ratchets: support only moves up and resistance only moves down
//! until the previous close crosses it, at which point it resets to the
//! basic band. The trend flips only when the close crosses the opposing band.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::numeric::sanitize;

const DEFAULT_MULTIPLIER: f64 = 2.0;

/// Trend direction, serialized as `1` / `-1`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "i8", try_from = "i8")]
pub enum Trend {
    Bullish,
    Bearish,
}

impl Trend {
    pub fn as_i8(self) -> i8 {
        match self {
            Trend::Bullish => 1,
            Trend::Bearish => -1,
        }
    }
}

impl From<Trend> for i8 {
    fn from(trend: Trend) -> i8 {
        trend.as_i8()
    }
}

impl TryFrom<i8> for Trend {
    type Error = String;

    fn try_from(value: i8) -> std::result::Result<Self, Self::Error> {
        match value {
            1 => Ok(Trend::Bullish),
            -1 => Ok(Trend::Bearish),
            other => Err(format!("trend must be 1 or -1, got {other}")),
        }
    }
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trend::Bullish => write!(f, "bullish"),
            Trend::Bearish => write!(f, "bearish"),
        }
    }
}

/// Band levels and trend at one bar
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BandLevels {
    pub up: f64,
    pub down: f64,
    pub trend: Trend,
}

impl BandLevels {
    /// The band price is currently measured against
    pub fn active_band(&self) -> f64 {
        match self.trend {
            Trend::Bullish => self.up,
            Trend::Bearish => self.down,
        }
    }
}

/// Final band and trend values for every bar of a series
#[derive(Debug, Clone, PartialEq)]
pub struct BandSeries {
    pub upper: Vec<f64>,
    pub lower: Vec<f64>,
    pub trend: Vec<Trend>,
}

impl BandSeries {
    pub fn len(&self) -> usize {
        self.trend.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trend.is_empty()
    }

    /// Levels at bar `index`, with `fallback` standing in for corrupt values
    pub fn levels_at(&self, index: usize, fallback: f64) -> Option<BandLevels> {
        Some(BandLevels {
            up: sanitize(*self.upper.get(index)?, fallback),
            down: sanitize(*self.lower.get(index)?, fallback),
            trend: *self.trend.get(index)?,
        })
    }

    /// Levels at the newest bar
    pub fn current(&self, current_close: f64) -> Option<BandLevels> {
        self.levels_at(self.len().checked_sub(1)?, current_close)
    }

    /// Trend one bar before the newest.
    ///
    /// Every step of the pipeline is causal, so this equals the final trend
    /// of the same computation run with the newest bar excluded.
    pub fn previous_trend(&self) -> Option<Trend> {
        self.trend.get(self.len().checked_sub(2)?).copied()
    }
}

/// Computes SuperTrend bands from prices and an ATR series
#[derive(Debug, Clone, Copy)]
pub struct BandTracker {
    multiplier: f64,
}

impl BandTracker {
    pub fn new(multiplier: f64) -> Self {
        let multiplier = sanitize(multiplier, DEFAULT_MULTIPLIER);
        Self {
            multiplier: if multiplier > 0.0 {
                multiplier
            } else {
                DEFAULT_MULTIPLIER
            },
        }
    }

    pub fn multiplier(&self) -> f64 {
        self.multiplier
    }

    /// Run the band state machine.
    ///
    /// Returns `None` when the inputs are empty or their lengths differ.
    pub fn track(&self, high: &[f64], low: &[f64], close: &[f64], atr: &[f64]) -> Option<BandSeries> {
        let n = close.len();
        if n == 0 || high.len() != n || low.len() != n || atr.len() != n {
            return None;
        }

        let mut upper = Vec::with_capacity(n);
        let mut lower = Vec::with_capacity(n);
        for i in 0..n {
            let hl2 = (high[i] + low[i]) / 2.0;
            let width = self.multiplier * atr[i];
            let basic_up = sanitize(hl2 - width, close[i]);
            let basic_down = sanitize(hl2 + width, close[i]);

            if i == 0 {
                upper.push(basic_up);
                lower.push(basic_down);
                continue;
            }

            let (prev_up, prev_down, prev_close) = (upper[i - 1], lower[i - 1], close[i - 1]);

            let up = if basic_up > prev_up || prev_close <= prev_up {
                basic_up
            } else {
                prev_up
            };
            let down = if basic_down < prev_down || prev_close >= prev_down {
                basic_down
            } else {
                prev_down
            };

            upper.push(sanitize(up, close[i]));
            lower.push(sanitize(down, close[i]));
        }

        let mut trend = Vec::with_capacity(n);
        trend.push(Trend::Bullish);
        for i in 1..n {
            let next = match trend[i - 1] {
                Trend::Bearish if close[i] > lower[i] => Trend::Bullish,
                Trend::Bullish if close[i] < upper[i] => Trend::Bearish,
                carried => carried,
            };
            trend.push(next);
        }

        Some(BandSeries {
            upper,
            lower,
            trend,
        })
    }
}
