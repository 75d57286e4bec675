//! Rolling statistics over a price series: true range, ATR and RSI.
//!
//! Both averages are simple moving averages over complete windows rather
//! than Wilder's recursive smoothing. Bars before the first complete window
//! take the first computed value, so consumers never see gaps.

use crate::candle::PriceSeries;
use crate::numeric::{clamp, safe_divide, sanitize, sanitize_series};
use supertrend_config::service::numeric::{ATR_FLOOR, NEUTRAL_RSI, RSI_LOSS_FLOOR};

/// Simple moving average over complete windows.
///
/// Entry `i` is `None` until `period` values are available.
pub fn rolling_mean(values: &[f64], period: usize) -> Vec<Option<f64>> {
    let period = period.max(1);
    let mut out = vec![None; values.len()];
    if values.len() < period {
        return out;
    }
    for (i, window) in values.windows(period).enumerate() {
        out[i + period - 1] = Some(window.iter().sum::<f64>() / period as f64);
    }
    out
}

/// Fill leading gaps with the first computed value (or `fallback` if none).
fn backfill(series: Vec<Option<f64>>, fallback: f64) -> Vec<f64> {
    let first = series.iter().flatten().copied().next().unwrap_or(fallback);
    series.into_iter().map(|v| v.unwrap_or(first)).collect()
}

/// Per-bar true range, floored at [`ATR_FLOOR`].
///
/// The first bar has no previous close and uses `high - low`.
pub fn true_range(series: &PriceSeries) -> Vec<f64> {
    let (high, low, close) = (&series.high, &series.low, &series.close);
    (0..series.len())
        .map(|i| {
            let range = high[i] - low[i];
            let tr = match i.checked_sub(1).map(|p| close[p]) {
                Some(prev_close) => range
                    .max((high[i] - prev_close).abs())
                    .max((low[i] - prev_close).abs()),
                None => range,
            };
            // NaN fails the comparison and lands on the floor too
            if tr > ATR_FLOOR {
                tr
            } else {
                ATR_FLOOR
            }
        })
        .collect()
}

/// Average True Range as a simple rolling mean of [`true_range`].
pub fn average_true_range(series: &PriceSeries, period: usize) -> Vec<f64> {
    let tr = true_range(series);
    let mut atr = backfill(rolling_mean(&tr, period), ATR_FLOOR);
    sanitize_series(&mut atr, ATR_FLOOR);
    atr
}

/// Relative Strength Index in `[0, 100]` over simple rolling averages of
/// gains and losses.
///
/// A window without any movement reports [`NEUTRAL_RSI`]; a zero average loss
/// is replaced by [`RSI_LOSS_FLOOR`] before the ratio is taken.
pub fn relative_strength_index(close: &[f64], period: usize) -> Vec<f64> {
    let mut gains = Vec::with_capacity(close.len());
    let mut losses = Vec::with_capacity(close.len());
    for i in 0..close.len() {
        let delta = if i == 0 { 0.0 } else { close[i] - close[i - 1] };
        let delta = sanitize(delta, 0.0);
        gains.push(delta.max(0.0));
        losses.push((-delta).max(0.0));
    }

    let avg_gain = rolling_mean(&gains, period);
    let avg_loss = rolling_mean(&losses, period);

    let raw: Vec<Option<f64>> = avg_gain
        .iter()
        .zip(&avg_loss)
        .map(|(gain, loss)| match (gain, loss) {
            (Some(gain), Some(loss)) => Some(rsi_value(*gain, *loss)),
            _ => None,
        })
        .collect();

    let mut rsi = backfill(raw, NEUTRAL_RSI);
    sanitize_series(&mut rsi, NEUTRAL_RSI);
    rsi
}

fn rsi_value(avg_gain: f64, avg_loss: f64) -> f64 {
    // A window with no movement is neutral; the loss floor alone would give 0
    if avg_gain == 0.0 && avg_loss == 0.0 {
        return NEUTRAL_RSI;
    }
    let avg_loss = if avg_loss == 0.0 {
        RSI_LOSS_FLOOR
    } else {
        avg_loss
    };
    let rs = safe_divide(avg_gain, avg_loss, 0.0);
    clamp(100.0 - 100.0 / (1.0 + rs), 0.0, 100.0)
}

/// Mean of the last `len` values (all of them if fewer)
pub fn tail_mean(values: &[f64], len: usize) -> Option<f64> {
    let len = len.min(values.len());
    if len == 0 {
        return None;
    }
    let tail = &values[values.len() - len..];
    Some(tail.iter().sum::<f64>() / len as f64)
}

/// ATR and RSI series computed together for one price series
#[derive(Debug, Clone, PartialEq)]
pub struct RollingStatistics {
    pub atr: Vec<f64>,
    pub rsi: Vec<f64>,
}

impl RollingStatistics {
    pub fn compute(series: &PriceSeries, atr_period: usize, rsi_period: usize) -> Self {
        Self {
            atr: average_true_range(series, atr_period),
            rsi: relative_strength_index(&series.close, rsi_period),
        }
    }

    pub fn current_atr(&self) -> f64 {
        sanitize(self.atr.last().copied().unwrap_or(ATR_FLOOR), ATR_FLOOR)
    }

    pub fn current_rsi(&self) -> f64 {
        sanitize(self.rsi.last().copied().unwrap_or(NEUTRAL_RSI), NEUTRAL_RSI)
    }

    /// Mean ATR over the last `len` bars
    pub fn atr_average(&self, len: usize) -> f64 {
        sanitize(tail_mean(&self.atr, len).unwrap_or(ATR_FLOOR), ATR_FLOOR)
    }
}
