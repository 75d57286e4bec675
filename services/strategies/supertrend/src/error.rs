//! Error types for the SuperTrend signal strategy

use thiserror::Error;

/// Field-level rejection of an indicator configuration
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("{field} = {value} is outside the allowed range [{min}, {max}]")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
}

impl ConfigError {
    /// Name of the rejected field
    pub fn field(&self) -> &'static str {
        match self {
            ConfigError::OutOfRange { field, .. } => field,
        }
    }
}

#[derive(Debug, Error)]
pub enum StrategyError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(#[from] ConfigError),

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Market data source error: {message}")]
    Source { message: String },

    #[error("Signal sink error: {message}")]
    SignalSink { message: String },

    #[error("Calculation task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

pub type Result<T> = std::result::Result<T, StrategyError>;
