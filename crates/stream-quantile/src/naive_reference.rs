//! Naive exact quantile references
//!
//! These implementations store and sort the whole sample. They exist to
//! check the streaming estimator against ground truth in tests and benches.
//!
//! DO NOT USE IN PRODUCTION - memory grows with the sample!

/// Exact quantiles over a fully stored sample
pub struct NaiveQuantile;

impl NaiveQuantile {
    fn sorted(data: &[f64]) -> Vec<f64> {
        assert!(!data.is_empty(), "Cannot compute quantile of empty data");
        let mut sorted = data.to_vec();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
        sorted
    }

    /// Percentile estimate with position `p * (n + 1)`, interpolating
    /// linearly between the neighbouring order statistics and clamping to
    /// the sample extremes
    ///
    /// # Arguments
    /// * `data` - The data sample (sorted internally)
    /// * `p` - The probability (0.0 to 1.0)
    pub fn quantile(data: &[f64], p: f64) -> f64 {
        assert!((0.0..=1.0).contains(&p), "Probability must be in [0, 1]");
        let sorted = Self::sorted(data);
        let n = sorted.len();

        let pos = p * (n as f64 + 1.0);
        if pos < 1.0 {
            return sorted[0];
        }
        if pos >= n as f64 {
            return sorted[n - 1];
        }

        let floor = pos.floor();
        let lower = sorted[floor as usize - 1];
        let upper = sorted[floor as usize];
        lower + (pos - floor) * (upper - lower)
    }

    /// Order statistic of rank `ceil(p * n)` (nearest rank)
    pub fn nearest_rank(data: &[f64], p: f64) -> f64 {
        assert!((0.0..=1.0).contains(&p), "Probability must be in [0, 1]");
        let sorted = Self::sorted(data);
        let rank = (p * sorted.len() as f64).ceil() as usize;
        sorted[rank.clamp(1, sorted.len()) - 1]
    }
}
