//! Float-safety guards shared by the indicator pipeline
//!
//! Every value that leaves a series computation passes through [`sanitize`]:
//! NaN, infinities and magnitudes above [`MAX_MAGNITUDE`] are replaced by a
//! caller-supplied default. Substitutions are data-quality events and are
//! logged at debug level, never surfaced as errors.

use supertrend_config::service::numeric;
use tracing::debug;

pub use numeric::MAX_MAGNITUDE;

/// Replace a non-finite or out-of-range value with `default`.
#[inline]
pub fn sanitize(value: f64, default: f64) -> f64 {
    if !value.is_finite() {
        debug!(value, default, "Non-finite value replaced");
        return default;
    }
    if value.abs() > MAX_MAGNITUDE {
        debug!(value, default, "Out-of-range value replaced");
        return default;
    }
    value
}

/// Sanitize every element of a series in place.
pub fn sanitize_series(values: &mut [f64], default: f64) {
    for value in values.iter_mut() {
        *value = sanitize(*value, default);
    }
}

/// Divide, returning `default` for a zero or non-finite denominator or a
/// result that fails [`sanitize`].
#[inline]
pub fn safe_divide(numerator: f64, denominator: f64, default: f64) -> f64 {
    if denominator == 0.0 || !denominator.is_finite() {
        return default;
    }
    sanitize(numerator / denominator, default)
}

/// Clamp into `[min, max]`; NaN collapses to `min`.
#[inline]
pub fn clamp(value: f64, min: f64, max: f64) -> f64 {
    if value.is_nan() {
        return min;
    }
    value.clamp(min, max)
}
