//! Distinct counter allows to estimate number of distinct elements
//! in the stream or dataset and is defined with a single `threshold` parameter:
//! the maximum number of elements retained in the sample.
//!
//! # Algorithm
//!
//! Counter keeps a sample of stream elements and a generation number `g`,
//! which encodes sampling probability `p = 2^-g`. For every inserted element:
//! 1. element is removed from the sample if present;
//! 2. element is re-inserted with probability `p`;
//! 3. if the sample reached `threshold` elements, every element is dropped
//!    with probability 1/2 and generation is incremented.
//!
//! Estimate is `|sample| / p = |sample| * 2^g`.
//!
//! Original CVM paper: <https://arxiv.org/pdf/2301.10191>
//!
//! # Data-structure design rationale
//!
//! ## Bounded memory footprint
//! Sample never holds more than `threshold` elements, regardless of the stream length
//! or its true cardinality. Use [`threshold`](crate::threshold::threshold) to derive
//! a threshold from the required accuracy.
//!
//! ## Exact probabilities
//! - Probability `2^-g` is realized with a single `u64` draw compared against `u64::MAX >> g`,
//!   which is exact for every `g < 64`, including `g = 63` (draws `0` and `1` pass).
//! - Thinning coin flip keeps an element iff its draw has the top bit set.
//!
//! ## Reproducibility
//! Random source is injected via [`RngCore`] and the sample uses a fixed-seed hasher
//! (`WyHash` by default), so a counter fed the same stream from the same seed
//! always reaches the same state.
//!
//! ## Accuracy
//! - While the sample never filled up (generation 0), the estimate is exact.
//! - Afterwards, with threshold sized for `(epsilon, delta, m)`, the estimate is within
//!   `epsilon` relative error with probability at least `1 - delta`.

use std::collections::HashSet;
use std::fmt::{Debug, Formatter};
use std::hash::{BuildHasherDefault, Hash, Hasher};
use std::mem::size_of;

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use wyhash::WyHash;

use crate::error::DistinctCounterError;
use crate::threshold::threshold;

/// Generation at which sampling probability underflows the `u64` draw precision
const MAX_GENERATIONS: u8 = 64;
/// Thinning keeps an element iff its draw is at least `2^63`, i.e. with probability exactly 1/2
const COIN_FLIP: u64 = 1 << 63;
/// Tracing target shared by all events emitted by this crate
const TARGET: &str = "distinct_counter";

/// Streaming distinct counter with memory bounded by `threshold`.
pub struct DistinctCounter<T, R = StdRng, H = WyHash> {
    /// Maximum sample size, fixed at construction
    threshold: usize,
    /// Number of thinning events, sampling probability is `2^-generation`
    generation: u8,
    /// Current sample of the stream
    sample: HashSet<T, BuildHasherDefault<H>>,
    /// Random source exclusively owned by the counter
    rng: R,
    /// Fatal error returned by every insert once the counter is misconfigured
    failure: Option<DistinctCounterError>,
}

impl<T: Hash + Eq> DistinctCounter<T> {
    /// Creates new instance of `DistinctCounter` with random source seeded from OS entropy
    pub fn with_threshold(threshold: usize) -> Result<Self, DistinctCounterError> {
        Self::new(threshold, StdRng::from_entropy())
    }

    /// Creates new instance of `DistinctCounter` sized for relative error `epsilon` with
    /// probability at least `1 - delta` over a stream of at most `m` elements.
    pub fn with_accuracy(epsilon: f64, delta: f64, m: usize) -> Result<Self, DistinctCounterError> {
        Self::with_threshold(threshold(epsilon, delta, m)?)
    }
}

impl<T, R, H> DistinctCounter<T, R, H>
where
    T: Hash + Eq,
    R: RngCore,
    H: Hasher + Default,
{
    /// Creates new instance of `DistinctCounter` with the given random source.
    ///
    /// Any positive `threshold` is accepted, accuracy guarantees only hold
    /// for thresholds produced by [`threshold`](crate::threshold::threshold).
    pub fn new(threshold: usize, rng: R) -> Result<Self, DistinctCounterError> {
        if threshold == 0 {
            return Err(DistinctCounterError::InvalidThreshold);
        }

        tracing::debug!(target: TARGET, threshold, "counter_created");

        Ok(Self {
            threshold,
            generation: 0,
            sample: HashSet::default(),
            rng,
            failure: None,
        })
    }

    /// Restore counter from its serialized parts, validating counter invariants
    #[cfg_attr(not(feature = "with_serde"), allow(dead_code))]
    pub(crate) fn from_parts(
        threshold: usize,
        generation: u8,
        items: Vec<T>,
        rng: R,
    ) -> Result<Self, DistinctCounterError> {
        let mut counter = Self::new(threshold, rng)?;
        if generation >= MAX_GENERATIONS {
            return Err(DistinctCounterError::InvalidState(
                "generation must be below 64",
            ));
        }

        let len = items.len();
        counter.sample.extend(items);
        if counter.sample.len() != len {
            return Err(DistinctCounterError::InvalidState(
                "sample contains duplicate elements",
            ));
        }
        if len >= threshold {
            return Err(DistinctCounterError::InvalidState(
                "sample size must be below threshold",
            ));
        }

        counter.generation = generation;
        Ok(counter)
    }

    /// Insert an element into `DistinctCounter`.
    ///
    /// # Errors
    /// Returns [`DistinctCounterError::ThresholdReached`] or
    /// [`DistinctCounterError::GenerationOverflow`] when threshold is too small for
    /// the stream. Both are programmer errors: the counter keeps returning the same
    /// error for every further insert and must be discarded.
    #[inline]
    pub fn insert(&mut self, item: T) -> Result<(), DistinctCounterError> {
        if let Some(err) = &self.failure {
            return Err(err.clone());
        }

        // drop any earlier decision, so membership reflects the current generation only
        self.sample.remove(&item);
        if self.rng.next_u64() <= u64::MAX >> self.generation {
            self.sample.insert(item);
        }

        if self.sample.len() < self.threshold {
            return Ok(());
        }

        self.thin();

        if self.sample.len() == self.threshold {
            return self.fail(DistinctCounterError::ThresholdReached {
                threshold: self.threshold,
                generation: self.generation,
            });
        }
        if self.generation == MAX_GENERATIONS {
            return self.fail(DistinctCounterError::GenerationOverflow {
                threshold: self.threshold,
            });
        }

        Ok(())
    }

    /// Insert every element of `items`, stopping at the first error
    pub fn insert_all<I>(&mut self, items: I) -> Result<(), DistinctCounterError>
    where
        I: IntoIterator<Item = T>,
    {
        items.into_iter().try_for_each(|item| self.insert(item))
    }

    /// Drop every sampled element with probability 1/2 and move to the next generation
    fn thin(&mut self) {
        let before = self.sample.len();
        let rng = &mut self.rng;
        self.sample.retain(|_| rng.next_u64() >= COIN_FLIP);
        self.generation += 1;

        tracing::trace!(
            target: TARGET,
            threshold = self.threshold,
            generation = self.generation,
            before,
            after = self.sample.len(),
            "sample_thinned"
        );
    }

    /// Poison the counter with `err` and return it
    #[cold]
    fn fail(&mut self, err: DistinctCounterError) -> Result<(), DistinctCounterError> {
        tracing::warn!(target: TARGET, error = %err, "counter_failed");
        self.failure = Some(err.clone());
        Err(err)
    }

    /// Return whether `item` is currently retained in the sample
    #[inline]
    pub fn contains(&self, item: &T) -> bool {
        self.sample.contains(item)
    }
}

impl<T, R, H> DistinctCounter<T, R, H> {
    /// Return distinct count estimate, saturating at `u64::MAX`
    #[inline]
    pub fn estimate(&self) -> u64 {
        let len = self.sample.len() as u64;
        match 1u64.checked_shl(u32::from(self.generation)) {
            Some(scale) => len.saturating_mul(scale),
            // only reachable after `GenerationOverflow`
            None if len == 0 => 0,
            None => u64::MAX,
        }
    }

    /// Return maximum sample size
    #[inline]
    pub fn threshold(&self) -> usize {
        self.threshold
    }

    /// Return number of thinning events so far
    #[inline]
    pub fn generation(&self) -> u8 {
        self.generation
    }

    /// Return current sampling probability `2^-generation`
    #[inline]
    pub fn probability(&self) -> f64 {
        0.5f64.powi(i32::from(self.generation))
    }

    /// Return number of sampled elements
    #[inline]
    pub fn len(&self) -> usize {
        self.sample.len()
    }

    /// Return whether the sample is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.sample.is_empty()
    }

    /// Return iterator over sampled elements in arbitrary order
    pub fn sample(&self) -> impl Iterator<Item = &T> {
        self.sample.iter()
    }

    /// Return whether the counter hit a fatal error and rejects inserts
    #[inline]
    pub fn is_failed(&self) -> bool {
        self.failure.is_some()
    }

    /// Return approximate memory size of `DistinctCounter`
    /// (one control byte per hash table slot on top of the element itself)
    pub fn size_of(&self) -> usize {
        size_of::<Self>() + self.sample.capacity() * (size_of::<T>() + 1)
    }
}

impl<T, R, H> Debug for DistinctCounter<T, R, H> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{{ threshold: {}, generation: {}, sample: {}, estimate: {} }}",
            self.threshold,
            self.generation,
            self.sample.len(),
            self.estimate()
        )
    }
}

impl<T, R, H> Clone for DistinctCounter<T, R, H>
where
    T: Clone,
    R: Clone,
{
    /// Clone `DistinctCounter` together with its random source state,
    /// so both copies draw the same sequence afterwards
    fn clone(&self) -> Self {
        Self {
            threshold: self.threshold,
            generation: self.generation,
            sample: self.sample.clone(),
            rng: self.rng.clone(),
            failure: self.failure.clone(),
        }
    }
}

impl<T, R, H> PartialEq for DistinctCounter<T, R, H>
where
    T: Hash + Eq,
    H: Hasher + Default,
{
    /// Compare counter states, random sources are not compared
    fn eq(&self, rhs: &Self) -> bool {
        self.threshold == rhs.threshold
            && self.generation == rhs.generation
            && self.sample == rhs.sample
    }
}
