//! Market data sources
//!
//! Providers sit behind one [`CandleSource`] capability and are tried in
//! priority order by [`connect_first`]; the first one that initializes wins.

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use supertrend_config::service::numeric::FALLBACK_PRICE;
use tracing::{debug, info, warn};

use crate::candle::Candle;
use crate::error::{Result, StrategyError};

/// Connection lifecycle of a source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Connected,
    Disconnected,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SourceStatus {
    pub state: ConnectionState,
    /// Name of the provider
    pub source: String,
    pub last_update: Option<DateTime<Utc>>,
    pub candles_delivered: u64,
}

impl SourceStatus {
    fn new(source: &str) -> Self {
        Self {
            state: ConnectionState::Disconnected,
            source: source.to_string(),
            last_update: None,
            candles_delivered: 0,
        }
    }

    fn record_delivery(&mut self, count: usize) {
        if count > 0 {
            self.candles_delivered += count as u64;
            self.last_update = Some(Utc::now());
        }
    }
}

/// A provider of completed candles
#[async_trait]
pub trait CandleSource: Send + Sync {
    fn name(&self) -> &str;

    /// Prepare the source; an error means the next provider should be tried
    async fn initialize(&mut self) -> Result<()>;

    /// Candles for `symbol` that completed since the previous call
    async fn fetch_candles(&mut self, symbol: &str) -> Result<Vec<Candle>>;

    fn status(&self) -> SourceStatus;
}

/// Initialize `providers` in order and return the first that succeeds
pub async fn connect_first(providers: Vec<Box<dyn CandleSource>>) -> Result<Box<dyn CandleSource>> {
    let mut failures = Vec::new();
    for mut provider in providers {
        match provider.initialize().await {
            Ok(()) => {
                info!(source = provider.name(), "Market data source connected");
                return Ok(provider);
            }
            Err(e) => {
                warn!(source = provider.name(), error = %e, "Market data source unavailable");
                failures.push(format!("{}: {}", provider.name(), e));
            }
        }
    }

    Err(StrategyError::Source {
        message: if failures.is_empty() {
            "no market data sources configured".to_string()
        } else {
            format!("no market data source available ({})", failures.join("; "))
        },
    })
}

#[derive(Debug, Deserialize)]
struct BridgeMessage {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    data: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct BridgeBar {
    /// Unix seconds
    timestamp: i64,
    symbol: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    #[serde(default)]
    volume: f64,
}

impl BridgeBar {
    fn into_candle(self) -> Option<Candle> {
        let timestamp = Utc.timestamp_opt(self.timestamp, 0).single()?;
        Some(Candle::new(
            timestamp,
            self.symbol,
            self.open,
            self.high,
            self.low,
            self.close,
            self.volume.max(0.0) as u64,
        ))
    }
}

/// Parse bridge file content: a single JSON object or a stream of them
pub fn parse_bridge_content(content: &str) -> Vec<Candle> {
    let mut candles = Vec::new();
    for message in serde_json::Deserializer::from_str(content).into_iter::<BridgeMessage>() {
        let message = match message {
            Ok(message) => message,
            Err(e) => {
                warn!(error = %e, "Malformed bridge record, ignoring the rest of the file");
                break;
            }
        };
        if message.kind != "OHLC" {
            continue;
        }
        let Some(data) = message.data else {
            continue;
        };
        match serde_json::from_value::<BridgeBar>(data) {
            Ok(bar) => candles.extend(bar.into_candle()),
            Err(e) => debug!(error = %e, "Skipping OHLC record with missing fields"),
        }
    }
    candles
}

/// Reads completed bars from the JSON file a trading terminal writes
#[derive(Debug)]
pub struct FileSource {
    path: PathBuf,
    /// Modification time and length of the file as last read per symbol
    signatures: HashMap<String, (SystemTime, u64)>,
    last_delivered: HashMap<String, DateTime<Utc>>,
    status: SourceStatus,
}

impl FileSource {
    pub const NAME: &'static str = "file_bridge";

    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            signatures: HashMap::new(),
            last_delivered: HashMap::new(),
            status: SourceStatus::new(Self::NAME),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn file_signature(&self) -> Result<(SystemTime, u64)> {
        let metadata = tokio::fs::metadata(&self.path).await?;
        Ok((metadata.modified()?, metadata.len()))
    }
}

#[async_trait]
impl CandleSource for FileSource {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn initialize(&mut self) -> Result<()> {
        self.status.state = ConnectionState::Connecting;

        let directory_ok = match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => tokio::fs::metadata(dir)
                .await
                .map(|m| m.is_dir())
                .unwrap_or(false),
            _ => true,
        };
        if !directory_ok || !tokio::fs::try_exists(&self.path).await.unwrap_or(false) {
            self.status.state = ConnectionState::Error;
            return Err(StrategyError::Source {
                message: format!("bridge file {} not found", self.path.display()),
            });
        }

        self.status.state = ConnectionState::Connected;
        info!(path = %self.path.display(), "Watching terminal bridge file");
        Ok(())
    }

    async fn fetch_candles(&mut self, symbol: &str) -> Result<Vec<Candle>> {
        let signature = match self.file_signature().await {
            Ok(signature) => signature,
            Err(e) => {
                self.status.state = ConnectionState::Error;
                return Err(e);
            }
        };
        self.status.state = ConnectionState::Connected;

        if self.signatures.get(symbol) == Some(&signature) {
            return Ok(Vec::new());
        }
        self.signatures.insert(symbol.to_string(), signature);

        let content = tokio::fs::read_to_string(&self.path).await?;
        let newest = self.last_delivered.get(symbol).copied();

        let mut candles: Vec<Candle> = parse_bridge_content(&content)
            .into_iter()
            .filter(|c| c.symbol == symbol && newest.map_or(true, |t| c.timestamp > t))
            .collect();
        candles.sort_by_key(|c| c.timestamp);

        if let Some(last) = candles.last() {
            self.last_delivered.insert(symbol.to_string(), last.timestamp);
        }
        self.status.record_delivery(candles.len());
        debug!(symbol, count = candles.len(), "Read bridge file");

        Ok(candles)
    }

    fn status(&self) -> SourceStatus {
        self.status.clone()
    }
}

/// Base price and per-bar volatility for the demo feed
pub fn synthetic_profile(symbol: &str) -> (f64, f64) {
    match symbol {
        "EURUSD" => (1.0850, 0.0001),
        "GBPUSD" => (1.2650, 0.0002),
        "USDJPY" => (149.50, 0.01),
        "XAUUSD" => (2050.0, 0.5),
        "BTCUSD" => (43500.0, 50.0),
        _ => (FALLBACK_PRICE, 0.0001),
    }
}

#[derive(Debug, Clone)]
struct SyntheticState {
    price: f64,
    next_timestamp: DateTime<Utc>,
    step: u64,
}

/// Demo-mode random walk, one-minute bars, one bar per fetch
#[derive(Debug)]
pub struct SyntheticSource {
    rng: StdRng,
    start: DateTime<Utc>,
    states: HashMap<String, SyntheticState>,
    status: SourceStatus,
}

impl SyntheticSource {
    pub const NAME: &'static str = "synthetic";

    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::with_rng(rng, Utc::now())
    }

    /// Deterministic generator starting at `start`
    pub fn seeded(seed: u64, start: DateTime<Utc>) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed), start)
    }

    fn with_rng(rng: StdRng, start: DateTime<Utc>) -> Self {
        Self {
            rng,
            start,
            states: HashMap::new(),
            status: SourceStatus::new(Self::NAME),
        }
    }

    fn next_bar(&mut self, symbol: &str) -> Candle {
        let (base, volatility) = synthetic_profile(symbol);
        let start = self.start;
        let state = self
            .states
            .entry(symbol.to_string())
            .or_insert_with(|| SyntheticState {
                price: base,
                next_timestamp: start,
                step: 0,
            });

        let drift = (state.step as f64 / 60.0).sin() * 0.3;
        let noise: f64 = self.rng.gen_range(-1.0..1.0);
        let open = state.price;
        let close = (open + (drift + noise) * volatility).max(open * 0.95);
        let high = open.max(close) + self.rng.gen_range(0.0..volatility);
        let low = open.min(close) - self.rng.gen_range(0.0..volatility);
        let volume = self.rng.gen_range(100..=1000);

        let candle = Candle::new(state.next_timestamp, symbol, open, high, low, close, volume);

        state.price = close;
        state.next_timestamp += Duration::minutes(1);
        state.step += 1;
        candle
    }
}

#[async_trait]
impl CandleSource for SyntheticSource {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn initialize(&mut self) -> Result<()> {
        self.status.state = ConnectionState::Connected;
        warn!("Using synthetic demo candles");
        Ok(())
    }

    async fn fetch_candles(&mut self, symbol: &str) -> Result<Vec<Candle>> {
        let candle = self.next_bar(symbol);
        self.status.record_delivery(1);
        Ok(vec![candle])
    }

    fn status(&self) -> SourceStatus {
        self.status.clone()
    }
}
