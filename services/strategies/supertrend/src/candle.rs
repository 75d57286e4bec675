//! Candles and the per-symbol candle buffer

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use supertrend_config::service::buffer::{MAX_CANDLES, RETAINED_CANDLES};
use tracing::{debug, warn};

/// One completed OHLCV bar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub timestamp: DateTime<Utc>,
    pub symbol: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

impl Candle {
    pub fn new(
        timestamp: DateTime<Utc>,
        symbol: impl Into<String>,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: u64,
    ) -> Self {
        Self {
            timestamp,
            symbol: symbol.into(),
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// True when high/low enclose open and close
    pub fn has_valid_envelope(&self) -> bool {
        self.high >= self.open.max(self.close) && self.low <= self.open.min(self.close)
    }

    /// Repair feed noise instead of rejecting the bar.
    ///
    /// Non-finite or non-positive prices take the close (or the first usable
    /// price when the close itself is unusable), then high/low are widened to
    /// the OHLC envelope. Returns `None` only when no price is usable.
    pub fn repaired(mut self) -> Option<Self> {
        let usable = |p: f64| p.is_finite() && p > 0.0;
        let reference = [self.close, self.open, self.high, self.low]
            .into_iter()
            .find(|p| usable(*p))?;

        for price in [
            &mut self.open,
            &mut self.high,
            &mut self.low,
            &mut self.close,
        ] {
            if !usable(*price) {
                *price = reference;
            }
        }

        if !self.has_valid_envelope() {
            debug!(
                symbol = %self.symbol,
                timestamp = %self.timestamp,
                "Clamping high/low to OHLC envelope"
            );
            let (o, h, l, c) = (self.open, self.high, self.low, self.close);
            self.high = o.max(h).max(l).max(c);
            self.low = o.min(h).min(l).min(c);
        }

        Some(self)
    }
}

/// What happened to a candle offered to the buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendOutcome {
    Appended,
    /// Same timestamp as the newest bar: last write wins
    Replaced,
    SymbolMismatch,
    /// Older than the newest bar
    Stale,
    Unrepairable,
}

impl AppendOutcome {
    /// Whether the buffer contents changed
    pub fn is_accepted(self) -> bool {
        matches!(self, AppendOutcome::Appended | AppendOutcome::Replaced)
    }
}

/// Ordered, capped store of bars for one symbol.
///
/// Once the buffer holds more than `capacity` bars it is cut back to the most
/// recent `retain` bars in a single batch, which keeps appends amortized O(1)
/// at the cost of dropping history in chunks.
#[derive(Debug, Clone)]
pub struct CandleBuffer {
    symbol: Option<String>,
    candles: Vec<Candle>,
    capacity: usize,
    retain: usize,
}

impl CandleBuffer {
    pub fn new() -> Self {
        Self::with_limits(MAX_CANDLES, RETAINED_CANDLES)
    }

    pub fn with_limits(capacity: usize, retain: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            symbol: None,
            candles: Vec::with_capacity(capacity + 1),
            capacity,
            retain: retain.clamp(1, capacity),
        }
    }

    /// Symbol the buffer is bound to
    pub fn symbol(&self) -> Option<&str> {
        self.symbol.as_deref()
    }

    /// Bind to `symbol`, discarding all bars if it differs from the current one.
    /// Returns true when the binding changed.
    pub fn set_symbol(&mut self, symbol: &str) -> bool {
        if self.symbol.as_deref() == Some(symbol) {
            return false;
        }
        debug!(
            from = ?self.symbol,
            to = symbol,
            dropped = self.candles.len(),
            "Switching candle buffer symbol"
        );
        self.symbol = Some(symbol.to_string());
        self.candles.clear();
        true
    }

    pub fn append(&mut self, candle: Candle) -> AppendOutcome {
        if self.symbol.as_deref() != Some(candle.symbol.as_str()) {
            return AppendOutcome::SymbolMismatch;
        }

        let Some(candle) = candle.repaired() else {
            warn!("Dropping candle without a single usable price");
            return AppendOutcome::Unrepairable;
        };

        if let Some(last) = self.candles.last_mut() {
            if candle.timestamp == last.timestamp {
                *last = candle;
                return AppendOutcome::Replaced;
            }
            if candle.timestamp < last.timestamp {
                debug!(
                    timestamp = %candle.timestamp,
                    newest = %last.timestamp,
                    "Dropping out-of-order candle"
                );
                return AppendOutcome::Stale;
            }
        }

        self.candles.push(candle);

        if self.candles.len() > self.capacity {
            let excess = self.candles.len() - self.retain;
            self.candles.drain(..excess);
            debug!(
                evicted = excess,
                retained = self.candles.len(),
                "Trimmed candle buffer"
            );
        }

        AppendOutcome::Appended
    }

    pub fn as_slice(&self) -> &[Candle] {
        &self.candles
    }

    pub fn latest(&self) -> Option<&Candle> {
        self.candles.last()
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for CandleBuffer {
    fn default() -> Self {
        Self::new()
    }
}

/// Column view of a candle slice, with the OHLC envelope enforced
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceSeries {
    pub open: Vec<f64>,
    pub high: Vec<f64>,
    pub low: Vec<f64>,
    pub close: Vec<f64>,
}

impl PriceSeries {
    pub fn from_candles(candles: &[Candle]) -> Self {
        let mut series = Self {
            open: Vec::with_capacity(candles.len()),
            high: Vec::with_capacity(candles.len()),
            low: Vec::with_capacity(candles.len()),
            close: Vec::with_capacity(candles.len()),
        };
        for c in candles {
            series.open.push(c.open);
            series.high.push(c.open.max(c.high).max(c.low).max(c.close));
            series.low.push(c.open.min(c.high).min(c.low).min(c.close));
            series.close.push(c.close);
        }
        series
    }

    /// Same series with the newest bar dropped
    pub fn without_last(&self) -> Self {
        let n = self.len().saturating_sub(1);
        Self {
            open: self.open[..n].to_vec(),
            high: self.high[..n].to_vec(),
            low: self.low[..n].to_vec(),
            close: self.close[..n].to_vec(),
        }
    }

    pub fn len(&self) -> usize {
        self.close.len()
    }

    pub fn is_empty(&self) -> bool {
        self.close.is_empty()
    }
}
