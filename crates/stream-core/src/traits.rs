//! Core traits for streaming estimation
//!
//! Algorithm-specific types (like the P² quantile estimator) live in their
//! own crates and implement the traits defined here.

use crate::Result;

/// Online quantile estimator fed one observation at a time
///
/// Implementations keep bounded state regardless of how many observations
/// they have seen. Calls are expected to be sequential; no implementation is
/// required to be `Sync`.
///
/// # Example
///
/// ```rust
/// use stream_core::{Result, StreamingQuantileEstimator};
///
/// // Tracks only the running maximum, which is the 1.0 quantile.
/// #[derive(Default)]
/// struct RunningMax {
///     max: Option<f64>,
///     seen: u64,
/// }
///
/// impl StreamingQuantileEstimator for RunningMax {
///     fn add_observation(&mut self, value: f64) {
///         self.max = Some(self.max.map_or(value, |m| m.max(value)));
///         self.seen += 1;
///     }
///
///     fn estimate(&self, _p: f64) -> Result<f64> {
///         self.max.ok_or_else(|| stream_core::Error::empty_input())
///     }
///
///     fn observations(&self) -> u64 {
///         self.seen
///     }
///
///     fn reset(&mut self) {
///         *self = Self::default();
///     }
/// }
///
/// let mut est = RunningMax::default();
/// assert!(est.is_empty());
/// est.add_observation(3.0);
/// est.add_observation(7.0);
/// assert_eq!(est.estimate(1.0).unwrap(), 7.0);
/// ```
pub trait StreamingQuantileEstimator {
    /// Ingest one observation
    fn add_observation(&mut self, value: f64);

    /// Estimate the value at quantile `p`
    fn estimate(&self, p: f64) -> Result<f64>;

    /// Number of observations ingested so far
    fn observations(&self) -> u64;

    /// Forget all observations
    fn reset(&mut self);

    /// Check whether nothing has been observed yet
    fn is_empty(&self) -> bool {
        self.observations() == 0
    }

    /// Ingest every observation from an iterator, in order
    fn add_all<I>(&mut self, values: I)
    where
        I: IntoIterator<Item = f64>,
        Self: Sized,
    {
        for value in values {
            self.add_observation(value);
        }
    }
}
