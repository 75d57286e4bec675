//! # SuperTrend Centralized Configuration
//!
//! Configuration loading and shared constants for the SuperTrend services,
//! so that buffer limits, numeric guards and default settings live in one
//! place instead of being repeated per service.
//!
//! ## Features
//!
//! - **Service Constants**: candle buffer limits, numeric guard values, defaults
//! - **Layered Loading**: TOML base file, environment file, `PREFIX__*` variables
//! - **Shared Sections**: logging and market data source settings
//!
//! ## Usage
//!
//! ```rust,no_run
//! use serde::Deserialize;
//! use supertrend_config::{load_layered, service, GlobalConfig};
//!
//! #[derive(Deserialize)]
//! struct MyServiceConfig {
//!     global: GlobalConfig,
//! }
//!
//! let cap = service::buffer::MAX_CANDLES;
//! let config: MyServiceConfig =
//!     load_layered("configs/supertrend.toml", Some("dev"), "SUPERTREND").unwrap();
//! ```

pub mod service;
pub mod service_config;

// Re-export commonly used types
pub use service_config::{load_layered, GlobalConfig, LogFormat, SourceSettings};
