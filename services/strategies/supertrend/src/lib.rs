//! # SuperTrend Signals - Trend-Following Signal Generation
//!
//! ## Purpose
//!
//! Streaming SuperTrend indicator engine with RSI and volatility filters.
//! Completed OHLC bars from a trading terminal are buffered per symbol, the
//! indicator is recomputed over the buffered history on demand, and buy/sell
//! signals are emitted on trend flips.
//!
//! ## Integration Points
//!
//! - **Input Sources**: terminal file bridge (JSON OHLC records), synthetic demo feed
//! - **Output Destinations**: `mpsc` channel of [`TradingSignal`]s
//! - **Query Surface**: [`EngineHandle`] for dashboards and other concurrent readers
//! - **Configuration**: layered TOML + `SUPERTREND__*` environment overrides
//!
//! ## Architecture Role
//!
//! ```text
//! CandleSource → [CandleBuffer] → [RollingStatistics] → [BandTracker] → [SignalGenerator]
//!      ↓               ↓                  ↓                   ↓                 ↓
//! File bridge     Symbol binding     True range / ATR     Support and       Flip edge only
//! Synthetic feed  Envelope repair    RSI                  resistance bands  RSI filter
//!                 Batch trim                              Trend state       Trend strength
//!                                                                                 ↓
//!                                                        SignalGate → TradingSignal channel
//! ```
//!
//! ## Numeric Safety
//!
//! Indicator values never carry NaN or infinities outward. Every series passes
//! through the [`numeric`] guards, which substitute a documented default and
//! log the substitution at debug level.
//!
//! ## Examples
//!
//! ### Direct Engine Use
//! ```rust
//! use chrono::{Duration, TimeZone, Utc};
//! use supertrend_signals::{Calculation, Candle, IndicatorConfig, IndicatorEngine};
//!
//! let mut engine = IndicatorEngine::new(IndicatorConfig::default()).unwrap();
//! engine.select_symbol("EURUSD");
//!
//! let start = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
//! for i in 0..30 {
//!     let close = 1.1 + i as f64 * 0.0005;
//!     engine.push_candle(Candle::new(
//!         start + Duration::minutes(i),
//!         "EURUSD",
//!         close,
//!         close + 0.0003,
//!         close - 0.0003,
//!         close,
//!         100,
//!     ));
//! }
//!
//! match engine.calculate() {
//!     Calculation::Ready(result) => assert!(result.rsi >= 0.0 && result.rsi <= 100.0),
//!     Calculation::InsufficientData { .. } => unreachable!(),
//! }
//! ```
//!
//! ### Running the Strategy
//! ```rust,no_run
//! use supertrend_signals::{connect_first, StrategyConfig, SuperTrendStrategy, SyntheticSource};
//! use supertrend_strategy_shared::Strategy;
//! use tokio::sync::mpsc;
//!
//! # async fn run() -> anyhow::Result<()> {
//! let config = StrategyConfig::load("configs/supertrend.toml", None)?;
//! let source = connect_first(vec![Box::new(SyntheticSource::new(None))]).await?;
//!
//! let (signal_tx, mut signal_rx) = mpsc::channel(config.signal_queue_size);
//! let mut strategy = SuperTrendStrategy::new(&config, source, signal_tx)?;
//! tokio::spawn(async move { strategy.start().await });
//!
//! while let Some(signal) = signal_rx.recv().await {
//!     println!("{}", serde_json::to_string(&signal)?);
//! }
//! # Ok(())
//! # }
//! ```

pub mod bands;
pub mod candle;
pub mod config;
pub mod engine;
pub mod error;
pub mod indicators;
pub mod numeric;
pub mod signals;
pub mod source;
pub mod strategy;

pub use bands::{BandLevels, BandSeries, BandTracker, Trend};
pub use candle::{AppendOutcome, Candle, CandleBuffer, PriceSeries};
pub use config::{IndicatorConfig, StrategyConfig};
pub use engine::{
    Calculation, EngineHandle, EngineSnapshot, EngineState, Evaluation, IndicatorEngine,
    SuperTrendResult,
};
pub use error::{ConfigError, Result, StrategyError};
pub use indicators::RollingStatistics;
pub use signals::{
    GateDecision, SignalFlags, SignalGate, SignalGenerator, SignalStats, SignalStrength,
    SignalType, TradingSignal,
};
pub use source::{
    connect_first, CandleSource, ConnectionState, FileSource, SourceStatus, SyntheticSource,
};
pub use strategy::{ShutdownHandle, SuperTrendStrategy};
