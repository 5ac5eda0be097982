use std::fmt;

/// Errors returned by `DistinctCounter` construction and insertion.
///
/// `ThresholdReached` and `GenerationOverflow` signal a misconfigured counter:
/// the threshold is far too small for the stream being counted. They are not
/// retryable; once returned, the counter rejects every further insertion.
#[derive(Debug, Clone, PartialEq)]
pub enum DistinctCounterError {
    /// Threshold passed to the constructor was zero.
    InvalidThreshold,
    /// Accuracy parameters could not be turned into a threshold.
    Sizing(ThresholdError),
    /// Sample size still equals the threshold after thinning.
    ThresholdReached {
        threshold: usize,
        generation: u8,
    },
    /// Sampling probability dropped below `2^-63`.
    GenerationOverflow { threshold: usize },
    /// Serialized counter state violates the counter invariants.
    InvalidState(&'static str),
}

impl fmt::Display for DistinctCounterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidThreshold => write!(f, "threshold must be greater than zero"),
            Self::Sizing(err) => write!(f, "invalid accuracy parameters: {err}"),
            Self::ThresholdReached {
                threshold,
                generation,
            } => write!(
                f,
                "sample size equals threshold {threshold} after thinning at generation {generation}"
            ),
            Self::GenerationOverflow { threshold } => write!(
                f,
                "too many generations, threshold {threshold} is too small for the stream"
            ),
            Self::InvalidState(message) => write!(f, "invalid counter state: {message}"),
        }
    }
}

impl std::error::Error for DistinctCounterError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Sizing(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ThresholdError> for DistinctCounterError {
    fn from(err: ThresholdError) -> Self {
        Self::Sizing(err)
    }
}

/// Errors returned by [`threshold`](crate::threshold::threshold) for malformed parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ThresholdError {
    /// `epsilon` is not a finite positive number.
    InvalidEpsilon(f64),
    /// `delta` is outside of the open `(0, 1)` interval.
    InvalidDelta(f64),
    /// Expected stream length is zero.
    InvalidStreamLength,
    /// Computed threshold does not fit into `usize`.
    Overflow,
}

impl fmt::Display for ThresholdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidEpsilon(epsilon) => {
                write!(f, "epsilon must be finite and positive, got {epsilon}")
            }
            Self::InvalidDelta(delta) => write!(f, "delta must be in (0, 1), got {delta}"),
            Self::InvalidStreamLength => write!(f, "expected stream length must be at least 1"),
            Self::Overflow => write!(f, "threshold does not fit into usize"),
        }
    }
}

impl std::error::Error for ThresholdError {}
