//! SuperTrend signal strategy: polls a candle source, feeds the engine and
//! forwards gated signals to the output channel.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use supertrend_strategy_shared::{MetricsCollector, Strategy, StrategyMetrics};
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

use crate::config::StrategyConfig;
use crate::engine::{Calculation, EngineHandle, IndicatorEngine};
use crate::error::{Result, StrategyError};
use crate::signals::{GateDecision, SignalGate, SignalStats, TradingSignal};
use crate::source::CandleSource;

/// Requests a running strategy to stop after its current cycle
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl ShutdownHandle {
    pub fn trigger(&self) {
        let _ = self.tx.send(true);
    }
}

pub struct SuperTrendStrategy {
    engine: EngineHandle,
    source: Box<dyn CandleSource>,
    symbol: String,
    poll_interval: Duration,

    gate: SignalGate,
    stats: SignalStats,
    metrics: Arc<MetricsCollector>,
    next_signal_id: u64,

    signal_tx: mpsc::Sender<TradingSignal>,
    shutdown_tx: Arc<watch::Sender<bool>>,
    shutdown_rx: watch::Receiver<bool>,
}

impl SuperTrendStrategy {
    pub fn new(
        config: &StrategyConfig,
        source: Box<dyn CandleSource>,
        signal_tx: mpsc::Sender<TradingSignal>,
    ) -> Result<Self> {
        let engine = EngineHandle::new(IndicatorEngine::new(config.indicator)?);
        engine.select_symbol(&config.source.symbol);

        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        Ok(Self {
            engine,
            source,
            symbol: config.source.symbol.clone(),
            poll_interval: Duration::from_millis(config.source.poll_interval_ms.max(1)),
            gate: SignalGate::new(),
            stats: SignalStats::default(),
            metrics: Arc::new(MetricsCollector::new()),
            next_signal_id: 1,
            signal_tx,
            shutdown_tx: Arc::new(shutdown_tx),
            shutdown_rx,
        })
    }

    /// Engine shared with other readers (dashboards, tests)
    pub fn engine(&self) -> EngineHandle {
        self.engine.clone()
    }

    pub fn metrics_collector(&self) -> Arc<MetricsCollector> {
        Arc::clone(&self.metrics)
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            tx: Arc::clone(&self.shutdown_tx),
        }
    }

    pub fn stats(&self) -> &SignalStats {
        &self.stats
    }

    /// Switch the monitored symbol; buffered history and cooldown are reset
    pub fn select_symbol(&mut self, symbol: &str) {
        self.engine.select_symbol(symbol);
        self.gate.reset();
        self.symbol = symbol.to_string();
    }

    /// Run one fetch → ingest → evaluate → gate → send cycle
    pub async fn poll_once(&mut self) -> Result<Option<TradingSignal>> {
        let candles = self.source.fetch_candles(&self.symbol).await?;
        if candles.is_empty() {
            return Ok(None);
        }

        let offered = candles.len();
        let accepted = self.engine.push_candles(candles);
        self.metrics.add_candles(accepted as u64);
        if accepted < offered {
            debug!(offered, accepted, "Some candles were not accepted");
        }
        if accepted == 0 {
            return Ok(None);
        }
        self.gate.advance(accepted);

        // Only the newest bar is evaluated; a flip earlier in a multi-bar batch goes unsignalled
        let evaluation = match self.engine.evaluate().await? {
            Calculation::Ready(evaluation) => evaluation,
            Calculation::InsufficientData {
                available,
                required,
            } => {
                self.metrics.increment_insufficient();
                debug!(available, required, "Waiting for more candles");
                return Ok(None);
            }
        };
        self.metrics.increment_calculations();

        let Some(signal) = TradingSignal::from_evaluation(self.next_signal_id, &evaluation) else {
            return Ok(None);
        };

        let config = self.engine.config();
        match self
            .gate
            .decide(&config, evaluation.result.atr, evaluation.atr_average)
        {
            GateDecision::Emit => {}
            decision => {
                debug!(?decision, signal_type = %signal.signal_type, "Signal suppressed");
                self.stats.record_suppressed(decision);
                self.metrics.increment_suppressed();
                return Ok(None);
            }
        }

        self.next_signal_id += 1;
        self.stats.record_signal(&signal);
        self.metrics.increment_signals();
        info!(
            signal_id = signal.signal_id,
            symbol = %signal.symbol,
            signal_type = %signal.signal_type,
            price = signal.price,
            strength = signal.strength,
            strong = signal.strong,
            "Generated signal"
        );

        self.signal_tx
            .send(signal.clone())
            .await
            .map_err(|e| StrategyError::SignalSink {
                message: format!("signal receiver closed: {e}"),
            })?;

        Ok(Some(signal))
    }
}

#[async_trait]
impl Strategy for SuperTrendStrategy {
    fn name(&self) -> &'static str {
        "supertrend_signals"
    }

    async fn start(&mut self) -> anyhow::Result<()> {
        info!(
            symbol = %self.symbol,
            source = self.source.name(),
            interval_ms = self.poll_interval.as_millis() as u64,
            "Starting SuperTrend strategy"
        );

        let mut shutdown = self.shutdown_rx.clone();
        let mut interval = tokio::time::interval(self.poll_interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            if *shutdown.borrow() {
                break;
            }

            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                _ = interval.tick() => {
                    match self.poll_once().await {
                        Ok(_) => {}
                        Err(e @ StrategyError::SignalSink { .. }) => {
                            error!(error = %e, "Signal output closed, stopping");
                            self.metrics.increment_errors();
                            return Err(e.into());
                        }
                        Err(e) => {
                            self.metrics.increment_errors();
                            warn!(error = %e, source = self.source.name(), "Poll cycle failed");
                        }
                    }
                }
            }
        }

        info!(
            signals = self.stats.total_signals,
            candles = self.metrics.get_metrics().candles_ingested,
            "SuperTrend strategy stopped"
        );
        Ok(())
    }

    async fn stop(&mut self) -> anyhow::Result<()> {
        self.shutdown_handle().trigger();
        Ok(())
    }

    fn metrics(&self) -> StrategyMetrics {
        self.metrics.get_metrics()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candle::Candle;
    use crate::config::IndicatorConfig;
    use crate::engine::EngineState;
    use crate::signals::SignalType;
    use crate::source::{FileSource, SourceStatus, SyntheticSource};
    use chrono::{Duration as ChronoDuration, TimeZone, Utc};
    use std::collections::VecDeque;

    /// Hands out pre-built candles one per fetch
    struct ReplaySource {
        candles: VecDeque<Candle>,
        delivered: u64,
    }

    #[async_trait]
    impl CandleSource for ReplaySource {
        fn name(&self) -> &str {
            "replay"
        }

        async fn initialize(&mut self) -> Result<()> {
            Ok(())
        }

        async fn fetch_candles(&mut self, _symbol: &str) -> Result<Vec<Candle>> {
            self.delivered += 1;
            Ok(self.candles.pop_front().into_iter().collect())
        }

        fn status(&self) -> SourceStatus {
            SourceStatus {
                state: crate::source::ConnectionState::Connected,
                source: "replay".to_string(),
                last_update: None,
                candles_delivered: self.delivered,
            }
        }
    }

    fn reversal() -> VecDeque<Candle> {
        let start = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let mut price = 1.1;
        let mut candles = VecDeque::new();
        for i in 0..50 {
            let (open, close) = if i < 30 {
                (price, price + 0.001)
            } else {
                (price, price - 0.002)
            };
            candles.push_back(Candle::new(
                start + ChronoDuration::minutes(i),
                "EURUSD",
                open,
                open.max(close) + 0.0003,
                open.min(close) - 0.0003,
                close,
                100,
            ));
            price = close;
        }
        candles
    }

    fn config(use_rsi_filter: bool) -> StrategyConfig {
        StrategyConfig {
            indicator: IndicatorConfig {
                use_rsi_filter,
                ..IndicatorConfig::default()
            },
            ..StrategyConfig::default()
        }
    }

    #[tokio::test]
    async fn test_reversal_emits_one_sell() {
        let (tx, mut rx) = mpsc::channel(16);
        let source = Box::new(ReplaySource {
            candles: reversal(),
            delivered: 0,
        });
        let mut strategy = SuperTrendStrategy::new(&config(false), source, tx).unwrap();

        let mut emitted = Vec::new();
        for _ in 0..50 {
            if let Some(signal) = strategy.poll_once().await.unwrap() {
                emitted.push(signal);
            }
        }

        assert_eq!(emitted.len(), 1);
        assert_eq!(emitted[0].signal_type, SignalType::Sell);
        assert_eq!(emitted[0].signal_id, 1);
        assert_eq!(rx.recv().await.unwrap(), emitted[0]);

        assert_eq!(strategy.stats().sell_signals, 1);
        let metrics = strategy.metrics();
        assert_eq!(metrics.candles_ingested, 50);
        assert_eq!(metrics.insufficient_data, 20);
        assert_eq!(metrics.calculations, 30);
        assert_eq!(metrics.signals_generated, 1);
    }

    #[tokio::test]
    async fn test_rsi_filter_blocks_reversal() {
        let (tx, _rx) = mpsc::channel(16);
        let source = Box::new(ReplaySource {
            candles: reversal(),
            delivered: 0,
        });
        let mut strategy = SuperTrendStrategy::new(&config(true), source, tx).unwrap();

        for _ in 0..50 {
            assert!(strategy.poll_once().await.unwrap().is_none());
        }
        assert_eq!(strategy.stats().total_signals, 0);
    }

    #[tokio::test]
    async fn test_closed_sink_is_an_error() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let source = Box::new(ReplaySource {
            candles: reversal(),
            delivered: 0,
        });
        let mut strategy = SuperTrendStrategy::new(&config(false), source, tx).unwrap();

        let mut failure = None;
        for _ in 0..50 {
            if let Err(e) = strategy.poll_once().await {
                failure = Some(e);
                break;
            }
        }
        assert!(matches!(failure, Some(StrategyError::SignalSink { .. })));
    }

    #[tokio::test]
    async fn test_start_runs_until_shutdown() {
        let (tx, _rx) = mpsc::channel(16);
        let mut settings = config(true);
        settings.source.poll_interval_ms = 5;
        let mut strategy =
            SuperTrendStrategy::new(&settings, Box::new(SyntheticSource::new(Some(7))), tx).unwrap();

        let shutdown = strategy.shutdown_handle();
        let metrics = strategy.metrics_collector();
        let task = tokio::spawn(async move { strategy.start().await });

        tokio::time::sleep(Duration::from_millis(60)).await;
        shutdown.trigger();

        task.await.unwrap().unwrap();
        assert!(metrics.get_metrics().candles_ingested > 0);
    }

    #[tokio::test]
    async fn test_start_returns_when_sink_closes() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let mut settings = config(false);
        settings.source.poll_interval_ms = 1;
        let source = Box::new(ReplaySource {
            candles: reversal(),
            delivered: 0,
        });
        let mut strategy = SuperTrendStrategy::new(&settings, source, tx).unwrap();

        // No shutdown is ever triggered
        let outcome = tokio::time::timeout(Duration::from_secs(5), strategy.start())
            .await
            .expect("strategy should stop on its own");
        assert!(outcome.is_err());
        assert_eq!(strategy.metrics().errors, 1);
    }

    #[tokio::test]
    async fn test_select_symbol_resets_history_and_cooldown() {
        let (tx, _rx) = mpsc::channel(16);
        let source = Box::new(ReplaySource {
            candles: reversal(),
            delivered: 0,
        });
        let mut strategy = SuperTrendStrategy::new(&config(false), source, tx).unwrap();

        let mut emitted = None;
        for _ in 0..50 {
            if let Some(signal) = strategy.poll_once().await.unwrap() {
                emitted = Some(signal);
                break;
            }
        }
        assert!(emitted.is_some());

        strategy.select_symbol("GBPUSD");
        assert_eq!(strategy.engine().symbol().as_deref(), Some("GBPUSD"));
        assert_eq!(
            strategy.engine().state(),
            EngineState::Buffering {
                available: 0,
                required: 21
            }
        );
        // Cooldown from the EURUSD signal no longer applies
        let indicator = strategy.engine().config();
        assert_eq!(strategy.gate.decide(&indicator, 1.0, 1.0), GateDecision::Emit);
    }

    #[tokio::test]
    async fn test_select_symbol_reads_new_symbol_from_bridge_file() {
        fn line(minute: i64, symbol: &str, close: f64) -> String {
            format!(
                r#"{{"type":"OHLC","data":{{"timestamp":{},"symbol":"{symbol}","open":{close},"high":{},"low":{},"close":{close},"volume":100}}}}"#,
                1_700_000_000 + minute * 60,
                close + 0.0005,
                close - 0.0005
            )
        }

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ohlc_data.json");
        let mut lines = Vec::new();
        for i in 0..25 {
            lines.push(line(i, "EURUSD", 1.1 + i as f64 * 0.0001));
            lines.push(line(i, "GBPUSD", 1.26 + i as f64 * 0.0001));
        }
        std::fs::write(&path, lines.join("\n")).unwrap();

        let mut source = FileSource::new(&path);
        source.initialize().await.unwrap();

        let (tx, _rx) = mpsc::channel(16);
        let mut strategy = SuperTrendStrategy::new(&config(true), Box::new(source), tx).unwrap();

        strategy.poll_once().await.unwrap();
        assert_eq!(strategy.engine().snapshot().candles.len(), 25);

        strategy.select_symbol("GBPUSD");
        strategy.poll_once().await.unwrap();

        let snapshot = strategy.engine().snapshot();
        assert_eq!(snapshot.symbol.as_deref(), Some("GBPUSD"));
        assert_eq!(snapshot.candles.len(), 25);
        assert!(snapshot.candles.iter().all(|c| c.symbol == "GBPUSD"));
        assert_eq!(strategy.engine().state(), EngineState::Ready);
        assert_eq!(strategy.metrics().candles_ingested, 50);
    }

    #[test]
    fn test_invalid_indicator_config_is_rejected() {
        let (tx, _rx) = mpsc::channel(1);
        let mut config = StrategyConfig::default();
        config.indicator.periods = 100;

        let result = SuperTrendStrategy::new(&config, Box::new(SyntheticSource::new(Some(1))), tx);
        assert!(matches!(
            result,
            Err(StrategyError::InvalidConfiguration(_))
        ));
    }
}
