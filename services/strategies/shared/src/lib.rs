//! Shared Strategy Framework
//!
//! Common utilities and traits for signal strategy services.

pub mod logging;
pub mod metrics;
pub mod traits;

pub use logging::*;
pub use metrics::*;
pub use traits::*;
