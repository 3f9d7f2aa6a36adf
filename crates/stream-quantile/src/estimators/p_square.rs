//! P² (piecewise-parabolic) streaming quantile estimator
//!
//! Estimates quantiles of an unbounded stream in `O(markers)` memory. Each
//! marker holds a height (the estimate), an actual rank and a desired rank.
//! Every observation shifts the ranks; interior markers whose actual rank
//! drifts a full position away from the desired one are moved by parabolic
//! interpolation through their neighbours, falling back to linear
//! interpolation when the parabola would break the height ordering.
//!
//! Reference: Jain & Chlamtac (1985), "The P² Algorithm for Dynamic
//! Calculation of Quantiles and Histograms Without Storing Observations",
//! *Communications of the ACM* 28(10).
//!
//! # Example
//!
//! ```rust
//! use stream_quantile::PSquare;
//!
//! let mut p99 = PSquare::with_quantile(0.99);
//! for i in 0..10_000 {
//!     p99.add((i % 100) as f64);
//! }
//! let estimate = p99.result().unwrap();
//! assert!(estimate > 90.0 && estimate <= 99.0);
//! ```

use crate::builder::PSquareBuilder;
use crate::config::{PSquareConfig, WarmupBaseline};
use crate::markers::{Marker, MarkerSet};
use crate::{Error, Result};
use stream_core::utils::insertion_sort;
use stream_core::StreamingQuantileEstimator;
use tracing::{debug, trace};

/// Lifecycle phase of the estimator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Buffering the first observations into the marker heights
    WarmUp { remaining: usize },

    /// Every observation runs the marker update rule
    Steady,
}

/// P² quantile estimator
#[derive(Debug, Clone)]
pub struct PSquare {
    markers: MarkerSet,
    // Pre-pass copy of the markers for the adjustment step
    scratch: Vec<Marker>,
    observations: u64,
    config: PSquareConfig,
}

impl PSquare {
    /// Estimator with only the end markers (running minimum and maximum)
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Five-marker estimator tracking `quantile`
    pub fn with_quantile(quantile: f64) -> Self {
        Self::builder().add_quantile(quantile).build()
    }

    /// Estimator tracking the `count - 1` quantiles `i / count`
    pub fn with_equal_spacing(count: usize) -> Self {
        Self::builder().add_equal_spacing(count).build()
    }

    /// Five-marker estimator tracking `quantile`, fed from `values`
    pub fn from_iter_with_quantile<I>(quantile: f64, values: I) -> Self
    where
        I: IntoIterator<Item = f64>,
    {
        let mut estimator = Self::with_quantile(quantile);
        estimator.extend(values);
        estimator
    }

    /// Start a configurable estimator
    pub fn builder() -> PSquareBuilder {
        PSquareBuilder::new()
    }

    pub(crate) fn from_parts(markers: MarkerSet, config: PSquareConfig) -> Self {
        debug!(
            markers = markers.len(),
            growth = ?config.growth,
            warmup_baseline = ?config.warmup_baseline,
            "configured P² estimator"
        );
        let scratch = Vec::with_capacity(markers.len());
        Self {
            markers,
            scratch,
            observations: 0,
            config,
        }
    }

    /// Ingest one observation
    ///
    /// Input is not checked: NaN or infinite values flow into the marker
    /// arithmetic. Use [`try_add`](Self::try_add) to reject them.
    pub fn add(&mut self, value: f64) {
        let marker_count = self.markers.len();

        if self.observations < marker_count as u64 {
            let slot = self.observations as usize;
            self.markers.as_mut_slice()[slot].height = value;
            self.observations += 1;

            if self.observations == marker_count as u64 {
                self.markers.sort_heights(marker_count);
                self.markers.seed_counts();
                debug!(markers = marker_count, "warm-up complete");
            }
            return;
        }

        self.observations += 1;
        let bracket = self.classify(value);
        self.advance(bracket);
        self.adjust();
    }

    /// Ingest one observation, rejecting NaN and infinities
    ///
    /// A rejected value leaves the estimator untouched.
    pub fn try_add(&mut self, value: f64) -> Result<()> {
        Error::check_finite(value)?;
        self.add(value);
        Ok(())
    }

    /// Find the bracket of `value`, widening the end markers if needed
    fn classify(&mut self, value: f64) -> usize {
        let markers = self.markers.as_mut_slice();
        let last = markers.len() - 1;

        if value < markers[0].height {
            markers[0].height = value;
            1
        } else if value >= markers[last].height {
            markers[last].height = value;
            last
        } else {
            // Unordered input (NaN) falls through to bracket 0
            (1..=last)
                .find(|&i| value < markers[i].height)
                .unwrap_or(0)
        }
    }

    /// Shift ranks: markers at or past `bracket` gain one actual position
    fn advance(&mut self, bracket: usize) {
        for (i, marker) in self.markers.as_mut_slice().iter_mut().enumerate() {
            if i >= bracket {
                marker.count += 1;
            }
            marker.desired += marker.increment;
        }
    }

    /// Move interior markers that drifted from their desired rank
    ///
    /// Neighbour heights and ranks are read from a copy taken before the
    /// pass, so a marker never sees a neighbour's value from this same pass.
    fn adjust(&mut self) {
        let Self {
            markers, scratch, ..
        } = self;
        let len = markers.len();
        if len < 3 {
            return;
        }

        scratch.clear();
        scratch.extend_from_slice(markers.as_slice());
        let live = markers.as_mut_slice();

        for i in 1..len - 1 {
            let drift = scratch[i].desired - scratch[i].count as f64;
            let gap_up = scratch[i + 1].count - scratch[i].count;
            let gap_down = scratch[i - 1].count - scratch[i].count;

            if (drift >= 1.0 && gap_up > 1) || (drift <= -1.0 && gap_down < -1) {
                let step = sign(drift);
                let candidate = parabolic(scratch, i, step);
                let height = if scratch[i - 1].height < candidate
                    && candidate < scratch[i + 1].height
                {
                    candidate
                } else {
                    linear(scratch, i, step)
                };

                trace!(marker = i, step, height, "adjusted marker");
                live[i].height = height;
                live[i].count += step;
            }
        }
    }

    /// Estimate the value at quantile `p`
    ///
    /// During warm-up the answer is one of the buffered observations. Once
    /// steady, it is the height of the interior marker whose tracked quantile
    /// is closest to `p`.
    pub fn quantile(&self, p: f64) -> Result<f64> {
        let markers = self.markers.as_slice();
        let marker_count = markers.len();

        if self.observations == 0 {
            return Err(stream_core::Error::empty_input().into());
        }

        if self.observations < marker_count as u64 {
            let seen = self.observations as usize;
            let mut buffered: Vec<f64> = markers[..seen].iter().map(|m| m.height).collect();
            insertion_sort(&mut buffered);

            let baseline = match self.config.warmup_baseline {
                WarmupBaseline::MarkerCount => marker_count,
                WarmupBaseline::ObservationCount => seen,
            } as f64;

            // A single buffered value has no slot 1 to start from
            let mut closest = (seen - 1).min(1);
            for i in 2..seen {
                if (i as f64 / seen as f64 - p).abs() < (closest as f64 / baseline - p).abs() {
                    closest = i;
                }
            }
            return Ok(buffered[closest]);
        }

        let mut closest = 1;
        for i in 2..marker_count - 1 {
            if (markers[i].increment - p).abs() < (markers[closest].increment - p).abs() {
                closest = i;
            }
        }
        Ok(markers[closest].height)
    }

    /// Estimate the single tracked quantile
    ///
    /// Only defined for the five-marker layout built by
    /// [`with_quantile`](Self::with_quantile); any other layout returns
    /// [`Error::InvalidState`].
    pub fn result(&self) -> Result<f64> {
        let marker_count = self.markers.len();
        Error::check_single_quantile(marker_count)?;
        let target = self.markers.as_slice()[(marker_count - 1) / 2].increment;
        self.quantile(target)
    }

    /// Smallest observation, if any
    pub fn min(&self) -> Option<f64> {
        self.extreme(f64::min, 0)
    }

    /// Largest observation, if any
    pub fn max(&self) -> Option<f64> {
        self.extreme(f64::max, self.markers.len() - 1)
    }

    fn extreme(&self, pick: fn(f64, f64) -> f64, end: usize) -> Option<f64> {
        let markers = self.markers.as_slice();
        match self.phase() {
            _ if self.observations == 0 => None,
            Phase::WarmUp { .. } => markers[..self.observations as usize]
                .iter()
                .map(|m| m.height)
                .reduce(pick),
            Phase::Steady => Some(markers[end].height),
        }
    }

    /// Current lifecycle phase
    pub fn phase(&self) -> Phase {
        let marker_count = self.markers.len() as u64;
        if self.observations < marker_count {
            Phase::WarmUp {
                remaining: (marker_count - self.observations) as usize,
            }
        } else {
            Phase::Steady
        }
    }

    /// Forget every observation, keeping the marker layout
    pub fn reset(&mut self) {
        self.markers.clear_observations();
        self.observations = 0;
    }

    /// Number of markers
    pub fn marker_count(&self) -> usize {
        self.markers.len()
    }

    /// Number of observations ingested
    pub fn observations(&self) -> u64 {
        self.observations
    }

    /// Read-only view of the marker records, ordered by tracked quantile
    ///
    /// Marker state can only change through ingestion:
    ///
    /// ```compile_fail
    /// let mut est = stream_quantile::PSquare::with_quantile(0.5);
    /// est.extend([1.0, 2.0, 3.0, 4.0, 5.0]);
    /// est.markers()[1].count = 4;
    /// ```
    ///
    /// ```compile_fail
    /// use stream_quantile::markers::MarkerSet;
    /// ```
    pub fn markers(&self) -> &[Marker] {
        self.markers.as_slice()
    }

    /// Marker heights; during warm-up the buffered observations in arrival
    /// order, followed by unfilled zero slots
    pub fn heights(&self) -> Vec<f64> {
        self.markers().iter().map(|m| m.height).collect()
    }

    /// Actual marker ranks (all zero until warm-up completes)
    pub fn counts(&self) -> Vec<i64> {
        self.markers().iter().map(|m| m.count).collect()
    }

    /// Quantile fraction tracked by each marker
    pub fn increments(&self) -> Vec<f64> {
        self.markers().iter().map(|m| m.increment).collect()
    }

    /// Ideal marker ranks for the observations seen so far
    pub fn desired_positions(&self) -> Vec<f64> {
        self.markers().iter().map(|m| m.desired).collect()
    }

    /// Configuration the estimator was built with
    pub fn config(&self) -> PSquareConfig {
        self.config
    }

    /// Memory held by the estimator in bytes
    pub fn size_bytes(&self) -> usize {
        std::mem::size_of::<Self>()
            + self.markers.size_bytes()
            + self.scratch.capacity() * std::mem::size_of::<Marker>()
    }
}

impl Default for PSquare {
    fn default() -> Self {
        Self::new()
    }
}

impl Extend<f64> for PSquare {
    fn extend<I: IntoIterator<Item = f64>>(&mut self, values: I) {
        for value in values {
            self.add(value);
        }
    }
}

impl StreamingQuantileEstimator for PSquare {
    fn add_observation(&mut self, value: f64) {
        self.add(value);
    }

    fn estimate(&self, p: f64) -> stream_core::Result<f64> {
        self.quantile(p).map_err(Into::into)
    }

    fn observations(&self) -> u64 {
        self.observations
    }

    fn reset(&mut self) {
        PSquare::reset(self);
    }
}

/// Direction of a marker move; zero counts as upward
fn sign(drift: f64) -> i64 {
    if drift >= 0.0 {
        1
    } else {
        -1
    }
}

/// Parabolic prediction of marker `i`'s height after moving `step` ranks
fn parabolic(m: &[Marker], i: usize, step: i64) -> f64 {
    let d = step as f64;
    let (q_lo, q, q_hi) = (m[i - 1].height, m[i].height, m[i + 1].height);
    let (n_lo, n, n_hi) = (
        m[i - 1].count as f64,
        m[i].count as f64,
        m[i + 1].count as f64,
    );

    q + d / (n_hi - n_lo)
        * ((n - n_lo + d) * (q_hi - q) / (n_hi - n) + (n_hi - n - d) * (q - q_lo) / (n - n_lo))
}

/// Linear prediction toward the neighbour in the direction of `step`
fn linear(m: &[Marker], i: usize, step: i64) -> f64 {
    let j = (i as i64 + step) as usize;
    let d = step as f64;
    m[i].height + d * (m[j].height - m[i].height) / (m[j].count - m[i].count) as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GrowthPolicy;
    use approx::assert_relative_eq;

    fn marker(height: f64, count: i64) -> Marker {
        Marker {
            height,
            count,
            ..Marker::default()
        }
    }

    #[test]
    fn test_sign_zero_is_positive() {
        assert_eq!(sign(0.0), 1);
        assert_eq!(sign(-0.0), 1);
        assert_eq!(sign(2.5), 1);
        assert_eq!(sign(-1.0), -1);
    }

    #[test]
    fn test_parabolic_on_linear_data_is_exact() {
        // Heights on a straight line through the ranks: the parabola is that line
        let m = [marker(10.0, 1), marker(30.0, 3), marker(60.0, 6)];
        assert_relative_eq!(parabolic(&m, 1, 1), 40.0);
        assert_relative_eq!(parabolic(&m, 1, -1), 20.0);
    }

    #[test]
    fn test_linear_moves_toward_neighbour() {
        let m = [marker(0.0, 1), marker(4.0, 3), marker(10.0, 5)];
        assert_relative_eq!(linear(&m, 1, 1), 7.0);
        assert_relative_eq!(linear(&m, 1, -1), 2.0);
    }

    #[test]
    fn test_new_has_end_markers_only() {
        let est = PSquare::new();
        assert_eq!(est.marker_count(), 2);
        assert_eq!(est.increments(), vec![0.0, 1.0]);
        assert_eq!(est.observations(), 0);
        assert_eq!(est.phase(), Phase::WarmUp { remaining: 2 });
    }

    #[test]
    fn test_with_quantile_layout() {
        let est = PSquare::with_quantile(0.5);
        assert_eq!(est.marker_count(), 5);
        assert_eq!(est.increments(), vec![0.0, 0.25, 0.5, 0.75, 1.0]);
        assert_eq!(est.desired_positions(), vec![1.0, 2.0, 3.0, 4.0, 5.0]);
    }

    #[test]
    fn test_with_equal_spacing_layout() {
        let est = PSquare::with_equal_spacing(10);
        assert_eq!(est.marker_count(), 11);
        let inc = est.increments();
        for (i, v) in inc.iter().enumerate() {
            assert_relative_eq!(*v, i as f64 / 10.0);
        }
    }

    #[test]
    fn test_empty_query_fails() {
        let est = PSquare::with_quantile(0.5);
        assert!(matches!(
            est.quantile(0.5),
            Err(Error::Core(stream_core::Error::InsufficientData { .. }))
        ));
        assert!(est.result().is_err());
        assert_eq!(est.min(), None);
        assert_eq!(est.max(), None);
    }

    #[test]
    fn test_result_requires_five_markers() {
        // Equal spacing of four also lands on five markers
        let mut est = PSquare::with_equal_spacing(4);
        est.extend([1.0, 2.0, 3.0, 4.0, 5.0]);
        assert_eq!(est.result().unwrap(), 3.0);

        let mut est = PSquare::with_equal_spacing(10);
        est.extend([1.0, 2.0, 3.0]);
        assert!(matches!(
            est.result(),
            Err(Error::InvalidState { markers: 11 })
        ));

        let mut est = PSquare::new();
        est.add(1.0);
        assert!(matches!(est.result(), Err(Error::InvalidState { markers: 2 })));
    }

    #[test]
    fn test_warm_up_fill_sorts_and_seeds_counts() {
        let mut est = PSquare::with_quantile(0.5);
        est.extend([3.0, 1.0, 4.0, 1.0, 5.0]);

        assert_eq!(est.phase(), Phase::Steady);
        assert_eq!(est.heights(), vec![1.0, 1.0, 3.0, 4.0, 5.0]);
        assert_eq!(est.counts(), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_scenario_keeps_end_markers_extreme() {
        let mut est = PSquare::with_quantile(0.5);
        let data = [3.0, 1.0, 4.0, 1.0, 5.0, 9.0, 2.0, 6.0];
        est.extend(data);

        let heights = est.heights();
        assert_eq!(heights[0], 1.0);
        assert_eq!(heights[4], 9.0);
        assert!(heights[1..4].iter().all(|&h| h >= heights[0] && h <= heights[4]));

        let counts = est.counts();
        assert_eq!(counts[0], 1);
        assert_eq!(counts[4], 8);
        assert!(counts.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_scenario_step_by_step() {
        let mut est = PSquare::with_quantile(0.5);
        est.extend([3.0, 1.0, 4.0, 1.0, 5.0]);

        // New maximum: only the top rank moves, no marker drifts a full rank
        est.add(9.0);
        assert_eq!(est.heights(), vec![1.0, 1.0, 3.0, 4.0, 9.0]);
        assert_eq!(est.counts(), vec![1, 2, 3, 4, 6]);
        assert_eq!(est.desired_positions(), vec![1.0, 2.25, 3.5, 4.75, 6.0]);

        // Bracket 2: ranks shift but drifts stay below one
        est.add(2.0);
        assert_eq!(est.heights(), vec![1.0, 1.0, 3.0, 4.0, 9.0]);
        assert_eq!(est.counts(), vec![1, 2, 4, 5, 7]);

        // Bracket 4: marker 3 drifts 1.25 ranks and moves up parabolically
        est.add(6.0);
        assert_eq!(est.counts(), vec![1, 2, 4, 6, 8]);
        let heights = est.heights();
        assert_eq!(&heights[..3], &[1.0, 1.0, 3.0]);
        assert_relative_eq!(heights[3], 16.0 / 3.0, epsilon = 1e-12);
        assert_eq!(heights[4], 9.0);
    }

    #[test]
    fn test_adjacent_markers_read_pre_pass_neighbours() {
        let mut est = PSquare::with_quantile(0.5);
        est.extend([1.0, 2.0, 3.0, 4.0, 5.0, 5.0, 11.0]);
        assert_eq!(est.counts(), vec![1, 2, 3, 5, 7]);
        assert_relative_eq!(est.heights()[3], 17.0 / 3.0, epsilon = 1e-12);

        // Markers 2 and 3 both drift past one rank on this observation
        est.add(11.0);
        assert_eq!(est.counts(), vec![1, 2, 4, 6, 8]);
        let heights = est.heights();
        assert_relative_eq!(heights[2], 38.0 / 9.0, epsilon = 1e-12);
        // Marker 3 interpolates through marker 2 at (3.0, rank 3). Reading the
        // freshly moved (38/9, rank 4) instead would give 131/18.
        assert_relative_eq!(heights[3], 109.0 / 15.0, epsilon = 1e-12);
        assert!((heights[3] - 131.0 / 18.0).abs() > 1e-3);
        assert_eq!(heights[4], 11.0);
    }

    #[test]
    fn test_warm_up_query_returns_buffered_value() {
        let mut est = PSquare::with_quantile(0.9);
        est.add(7.0);
        assert_eq!(est.quantile(0.9).unwrap(), 7.0);

        est.add(3.0);
        est.add(5.0);
        let value = est.quantile(0.9).unwrap();
        assert!([3.0, 5.0, 7.0].contains(&value));
    }

    #[test]
    fn test_warm_up_baseline_denominators() {
        // Three of five values buffered; index 2 scores |2/3 - p|. The
        // marker-count baseline scores index 1 as |1/5 - p|, so index 2 wins
        // above p = 0.433. The observation-count baseline scores it as
        // |1/3 - p|, moving the switch to p = 0.5.
        let mut legacy = PSquare::with_quantile(0.5);
        legacy.extend([10.0, 20.0, 30.0]);
        assert_eq!(legacy.quantile(0.3).unwrap(), 20.0);
        assert_eq!(legacy.quantile(0.45).unwrap(), 30.0);
        assert_eq!(legacy.quantile(0.7).unwrap(), 30.0);

        let mut fixed = PSquare::builder()
            .add_quantile(0.5)
            .warmup_baseline(WarmupBaseline::ObservationCount)
            .build();
        fixed.extend([10.0, 20.0, 30.0]);
        assert_eq!(fixed.quantile(0.3).unwrap(), 20.0);
        assert_eq!(fixed.quantile(0.45).unwrap(), 20.0);
        assert_eq!(fixed.quantile(0.7).unwrap(), 30.0);
    }

    #[test]
    fn test_steady_query_picks_nearest_marker() {
        let mut est = PSquare::with_equal_spacing(4);
        est.extend((1..=5).map(f64::from));

        assert_eq!(est.quantile(0.5).unwrap(), 3.0);
        assert_eq!(est.quantile(0.3).unwrap(), 2.0);
        assert_eq!(est.quantile(0.7).unwrap(), 4.0);
        // End markers are never returned for extreme quantiles
        assert_eq!(est.quantile(0.0).unwrap(), 2.0);
        assert_eq!(est.quantile(1.0).unwrap(), 4.0);
    }

    #[test]
    fn test_result_uses_middle_marker() {
        let mut est = PSquare::with_quantile(0.5);
        est.extend([3.0, 1.0, 4.0, 1.0, 5.0]);
        assert_eq!(est.result().unwrap(), 3.0);
    }

    #[test]
    fn test_try_add_rejects_non_finite() {
        let mut est = PSquare::with_quantile(0.5);
        est.try_add(1.0).unwrap();
        assert!(matches!(
            est.try_add(f64::NAN),
            Err(Error::NonFinite { .. })
        ));
        assert!(est.try_add(f64::INFINITY).is_err());
        assert_eq!(est.observations(), 1);
    }

    #[test]
    fn test_min_max_tracking() {
        let mut est = PSquare::with_quantile(0.5);
        est.extend([4.0, -2.0, 8.0]);
        assert_eq!(est.min(), Some(-2.0));
        assert_eq!(est.max(), Some(8.0));

        est.extend([1.0, 3.0, 100.0, -50.0, 7.0]);
        assert_eq!(est.min(), Some(-50.0));
        assert_eq!(est.max(), Some(100.0));
    }

    #[test]
    fn test_reset_keeps_layout() {
        let mut est = PSquare::with_quantile(0.9);
        est.extend((0..100).map(f64::from));
        est.reset();

        assert_eq!(est.observations(), 0);
        assert_eq!(est.marker_count(), 5);
        assert_eq!(est.counts(), vec![0; 5]);
        assert_eq!(est.desired_positions(), vec![1.0, 2.0, 3.0, 4.0, 5.0]);
        assert!(est.quantile(0.9).is_err());

        est.extend([5.0, 4.0, 3.0, 2.0, 1.0]);
        assert_eq!(est.heights(), vec![1.0, 2.0, 3.0, 4.0, 5.0]);
    }

    #[test]
    fn test_two_marker_estimator_tracks_extremes() {
        let mut est = PSquare::new();
        est.extend([5.0, 2.0, 9.0, -1.0, 3.0]);
        assert_eq!(est.heights(), vec![-1.0, 9.0]);
        assert_eq!(est.counts(), vec![1, 5]);
        // No interior markers: the query falls back to the top marker
        assert_eq!(est.quantile(0.5).unwrap(), 9.0);
    }

    #[test]
    fn test_legacy_growth_policy_is_selectable() {
        let est = PSquare::builder()
            .growth_policy(GrowthPolicy::EndMarkersOnly)
            .add_quantile(0.5)
            .add_equal_spacing(2)
            .build();
        assert_eq!(est.increments(), vec![0.0, 0.0, 0.0, 0.0, 0.25, 0.5]);

        let est = PSquare::builder()
            .add_quantile(0.5)
            .add_equal_spacing(2)
            .build();
        assert_eq!(est.increments(), vec![0.0, 0.25, 0.5, 0.75, 1.0]);
    }

    #[test]
    fn test_trait_object_usage() {
        let mut est = PSquare::with_quantile(0.5);
        assert!(StreamingQuantileEstimator::is_empty(&est));
        est.add_all((1..=9).map(f64::from));
        assert_eq!(StreamingQuantileEstimator::observations(&est), 9);
        let median = est.estimate(0.5).unwrap();
        assert!(median > 1.0 && median < 9.0);

        StreamingQuantileEstimator::reset(&mut est);
        assert!(matches!(
            est.estimate(0.5),
            Err(stream_core::Error::InsufficientData { .. })
        ));
    }
}
