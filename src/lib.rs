//! `distinct-counter` is a Rust crate designed to estimate the number of distinct elements in a stream or dataset
//! using memory bounded by a chosen accuracy target rather than by the stream's cardinality.
//!
//! This library implements the CVM sampling algorithm (<https://arxiv.org/pdf/2301.10191>): a small sample of the
//! stream is kept and thinned by half whenever it fills up, and the estimate is the sample size scaled by the
//! inverse sampling probability.
//!
//! ```
//! use distinct_counter::{threshold, DistinctCounter};
//!
//! let thresh = threshold(0.1, 0.01, 100_000).unwrap();
//! let mut counter = DistinctCounter::<u64>::with_threshold(thresh).unwrap();
//! for i in 0..100_000u64 {
//!     counter.insert(i % 300).unwrap();
//! }
//! assert_eq!(counter.estimate(), 300);
//! ```
mod error;
pub mod estimator;
#[cfg(feature = "with_serde")]
mod serde;
pub mod threshold;

pub use error::{DistinctCounterError, ThresholdError};
pub use estimator::DistinctCounter;
pub use threshold::threshold;
