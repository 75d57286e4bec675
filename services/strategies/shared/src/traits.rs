//! Strategy traits and interfaces

use anyhow::Result;
use async_trait::async_trait;

/// Core lifecycle trait that all signal strategies implement
#[async_trait]
pub trait Strategy: Send + Sync {
    /// Strategy name for identification
    fn name(&self) -> &'static str;

    /// Run the strategy until it is stopped or fails
    async fn start(&mut self) -> Result<()>;

    /// Ask a running strategy to finish its current cycle and return
    async fn stop(&mut self) -> Result<()>;

    /// Get current strategy metrics
    fn metrics(&self) -> StrategyMetrics;
}

/// Basic strategy metrics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StrategyMetrics {
    pub candles_ingested: u64,
    pub calculations: u64,
    pub insufficient_data: u64,
    pub signals_generated: u64,
    pub signals_suppressed: u64,
    pub errors: u64,
}
