//! Strategy metrics collection

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Thread-safe metrics collector for strategies
#[derive(Debug)]
pub struct MetricsCollector {
    start_time: Instant,
    candles_ingested: AtomicU64,
    calculations: AtomicU64,
    insufficient_data: AtomicU64,
    signals_generated: AtomicU64,
    signals_suppressed: AtomicU64,
    errors: AtomicU64,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            candles_ingested: AtomicU64::new(0),
            calculations: AtomicU64::new(0),
            insufficient_data: AtomicU64::new(0),
            signals_generated: AtomicU64::new(0),
            signals_suppressed: AtomicU64::new(0),
            errors: AtomicU64::new(0),
        }
    }

    pub fn add_candles(&self, count: u64) {
        self.candles_ingested.fetch_add(count, Ordering::Relaxed);
    }

    pub fn increment_calculations(&self) {
        self.calculations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_insufficient(&self) {
        self.insufficient_data.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_signals(&self) {
        self.signals_generated.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_suppressed(&self) {
        self.signals_suppressed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_errors(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn get_metrics(&self) -> super::StrategyMetrics {
        super::StrategyMetrics {
            candles_ingested: self.candles_ingested.load(Ordering::Relaxed),
            calculations: self.calculations.load(Ordering::Relaxed),
            insufficient_data: self.insufficient_data.load(Ordering::Relaxed),
            signals_generated: self.signals_generated.load(Ordering::Relaxed),
            signals_suppressed: self.signals_suppressed.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
        }
    }

    pub fn uptime(&self) -> std::time::Duration {
        self.start_time.elapsed()
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}
