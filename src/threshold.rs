//! Threshold sizing for `DistinctCounter`.
//!
//! The CVM paper derives, via Chernoff bounds, that a sample of
//! `ceil(12 / epsilon^2 * ln(8 * m / delta))` elements keeps the estimate within
//! relative error `epsilon` of the true distinct count with probability at least `1 - delta`
//! for any stream of at most `m` elements.
//!
//! Expected thresholds for `m = 1_000_000`:
//! - epsilon = 0.20, delta = 0.01: 6_151
//! - epsilon = 0.10, delta = 0.01: 24_601
//! - epsilon = 0.05, delta = 0.01: 98_401

use crate::error::ThresholdError;

/// Return a threshold suitable for a `DistinctCounter` given:
///
/// - `epsilon`: relative error of the estimate, lower is more accurate
/// - `delta`: probability of exceeding `epsilon`, lower is more accurate
/// - `m`: total expected elements in the stream, repeats included
///
/// # Errors
/// Returns [`ThresholdError`] when `epsilon` is not finite and positive, `delta` is
/// outside of `(0, 1)`, `m` is zero, or the result does not fit into `usize`.
pub fn threshold(epsilon: f64, delta: f64, m: usize) -> Result<usize, ThresholdError> {
    if !epsilon.is_finite() || epsilon <= 0.0 {
        return Err(ThresholdError::InvalidEpsilon(epsilon));
    }
    if !(delta > 0.0 && delta < 1.0) {
        return Err(ThresholdError::InvalidDelta(delta));
    }
    if m == 0 {
        return Err(ThresholdError::InvalidStreamLength);
    }

    let thresh = ((12.0 / (epsilon * epsilon)) * (8.0 * m as f64 / delta).ln()).ceil();
    // `usize::MAX as f64` rounds up to 2^64, so `>=` rejects everything that would saturate
    if !thresh.is_finite() || thresh >= usize::MAX as f64 {
        return Err(ThresholdError::Overflow);
    }

    tracing::debug!(
        target: "distinct_counter",
        epsilon,
        delta,
        m,
        threshold = thresh,
        "threshold_sized"
    );

    Ok(thresh as usize)
}
