//! Service configuration and defaults
//!
//! Default configuration values and constants used across the SuperTrend
//! services for consistency.

/// Candle buffer limits
pub mod buffer {
    /// Buffer size that triggers a batch trim
    pub const MAX_CANDLES: usize = 1000;

    /// Candles kept after a batch trim (most recent tail)
    pub const RETAINED_CANDLES: usize = 500;
}

/// Numeric guard values shared by the indicator pipeline
pub mod numeric {
    /// Values with a larger magnitude are treated as corrupt
    pub const MAX_MAGNITUDE: f64 = 1e10;

    /// Floor applied to every true range and ATR fallback
    pub const ATR_FLOOR: f64 = 0.0001;

    /// Substitute for a zero average loss in the RSI ratio
    pub const RSI_LOSS_FLOOR: f64 = 0.0001;

    /// RSI reported when there is no usable momentum information
    pub const NEUTRAL_RSI: f64 = 50.0;

    /// Price fallback when no finite close is available
    pub const FALLBACK_PRICE: f64 = 1.0;
}

/// Market data source defaults
pub mod sources {
    /// Symbol monitored when none is configured
    pub const DEFAULT_SYMBOL: &str = "EURUSD";

    /// Polling interval for candle sources (milliseconds)
    pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1_000;

    /// File written by the terminal bridge with completed bars
    pub const DEFAULT_OHLC_FILE: &str = "ohlc_data.json";
}

/// Strategy service defaults
pub mod strategies {
    /// Signal output queue size
    pub const SIGNAL_OUTPUT_QUEUE_SIZE: usize = 1000;

    /// Environment variable prefix for overrides
    pub const ENV_PREFIX: &str = "SUPERTREND";
}
