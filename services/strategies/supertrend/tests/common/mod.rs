//! Candle series builders shared by the integration tests

#![allow(dead_code)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use supertrend_signals::{Calculation, Candle, Evaluation, IndicatorConfig, IndicatorEngine};

pub const SYMBOL: &str = "EURUSD";

pub fn start() -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000, 0).unwrap()
}

pub fn candle(index: usize, open: f64, high: f64, low: f64, close: f64) -> Candle {
    Candle::new(
        start() + Duration::minutes(index as i64),
        SYMBOL,
        open,
        high,
        low,
        close,
        100,
    )
}

/// Steady uptrend: open sits 0.0001 above the close of each bar
pub fn rising(count: usize) -> Vec<Candle> {
    (0..count)
        .map(|i| {
            let close = 1.1 + i as f64 * 0.0005;
            let open = close + 0.0001;
            candle(i, open, open + 0.0002, close - 0.0002, close)
        })
        .collect()
}

pub fn flat(count: usize, price: f64) -> Vec<Candle> {
    (0..count)
        .map(|i| candle(i, price, price, price, price))
        .collect()
}

/// 30 bars moving by `first_step` per bar, then 20 bars moving by
/// `second_step`; wicks extend 0.0003 beyond each body
pub fn swing(start_price: f64, first_step: f64, second_step: f64) -> Vec<Candle> {
    let mut price = start_price;
    (0..50)
        .map(|i| {
            let step = if i < 30 { first_step } else { second_step };
            let (open, close) = (price, price + step);
            price = close;
            candle(
                i,
                open,
                open.max(close) + 0.0003,
                open.min(close) - 0.0003,
                close,
            )
        })
        .collect()
}

pub fn engine(config: IndicatorConfig) -> IndicatorEngine {
    let mut engine = IndicatorEngine::new(config).unwrap();
    engine.select_symbol(SYMBOL);
    engine
}

/// Feed `candles` one at a time and collect the evaluation after each bar
pub fn evaluate_each(config: IndicatorConfig, candles: &[Candle]) -> Vec<Calculation<Evaluation>> {
    let mut engine = engine(config);
    candles
        .iter()
        .map(|c| {
            engine.push_candle(c.clone());
            engine.evaluate()
        })
        .collect()
}
