//! Builder for configuring a [`PSquare`] estimator
//!
//! Marker extensions are recorded in call order and applied when the
//! estimator is built, so the growth policy applies to all of them no matter
//! where it is set in the chain.

use crate::config::{GrowthPolicy, PSquareConfig, WarmupBaseline};
use crate::estimators::PSquare;
use crate::markers::MarkerSet;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Extension {
    Quantile(f64),
    EqualSpacing(usize),
}

/// Configures the marker layout and behaviour of a [`PSquare`]
///
/// # Example
///
/// ```rust
/// use stream_quantile::{PSquare, WarmupBaseline};
///
/// let est = PSquare::builder()
///     .add_quantile(0.9)
///     .add_equal_spacing(4)
///     .warmup_baseline(WarmupBaseline::ObservationCount)
///     .build();
/// assert_eq!(est.marker_count(), 8);
/// ```
#[derive(Debug, Clone, Default)]
pub struct PSquareBuilder {
    config: PSquareConfig,
    extensions: Vec<Extension>,
}

impl PSquareBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add three markers tracking `quantile` precisely
    ///
    /// The quantile is not range checked; values outside (0, 1) produce a
    /// meaningless layout.
    pub fn add_quantile(mut self, quantile: f64) -> Self {
        self.extensions.push(Extension::Quantile(quantile));
        self
    }

    /// Add `count - 1` markers at `i / count`
    pub fn add_equal_spacing(mut self, count: usize) -> Self {
        self.extensions.push(Extension::EqualSpacing(count));
        self
    }

    pub fn growth_policy(mut self, policy: GrowthPolicy) -> Self {
        self.config.growth = policy;
        self
    }

    pub fn warmup_baseline(mut self, baseline: WarmupBaseline) -> Self {
        self.config.warmup_baseline = baseline;
        self
    }

    /// Replace the whole configuration
    pub fn config(mut self, config: PSquareConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> PSquare {
        let mut markers = MarkerSet::with_end_markers(self.config.growth);
        for extension in &self.extensions {
            match *extension {
                Extension::Quantile(q) => markers.add_quantile(q),
                Extension::EqualSpacing(count) => markers.add_equal_spacing(count),
            }
        }
        PSquare::from_parts(markers, self.config)
    }
}
