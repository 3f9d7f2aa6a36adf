//! Configuration types for the P² estimator

/// How the marker set grows when an extension is added
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrowthPolicy {
    /// Keep every existing marker; only the new slots start empty
    Preserve,

    /// Copy only the first two marker slots into the grown set
    ///
    /// Matches the historical allocation routine bit for bit: any marker
    /// added by an earlier extension is zeroed. Exists for compatibility
    /// tests against that behaviour.
    EndMarkersOnly,
}

impl Default for GrowthPolicy {
    fn default() -> Self {
        Self::Preserve
    }
}

/// Denominator used for the running best candidate during warm-up queries
///
/// During warm-up each candidate index `i` is scored as
/// `|i / observations - p|` and compared against the current best scored as
/// `|best / D - p|`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarmupBaseline {
    /// `D` is the marker count (historical behaviour)
    MarkerCount,

    /// `D` is the observation count, so both sides are scored alike
    ObservationCount,
}

impl Default for WarmupBaseline {
    fn default() -> Self {
        Self::MarkerCount
    }
}

/// Estimator configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PSquareConfig {
    /// Marker growth behaviour during configuration
    pub growth: GrowthPolicy,

    /// Warm-up query scoring
    pub warmup_baseline: WarmupBaseline,
}

impl PSquareConfig {
    /// Configuration reproducing the historical estimator exactly
    pub fn legacy() -> Self {
        Self {
            growth: GrowthPolicy::EndMarkersOnly,
            warmup_baseline: WarmupBaseline::MarkerCount,
        }
    }
}
