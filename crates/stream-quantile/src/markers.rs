//! Marker storage and construction-time layout
//!
//! A marker tracks one point on the estimated CDF of the stream. The set
//! always holds the two end markers (increments 0.0 and 1.0, i.e. the running
//! minimum and maximum) and grows only while the estimator is configured.
//!
//! Under [`GrowthPolicy::Preserve`] increments are kept strictly increasing:
//! an extension that repeats a tracked quantile does not add a second marker
//! for it. Two markers sharing an increment share a desired position, both
//! drift in the same adjustment pass and end up on the same rank.

use crate::config::GrowthPolicy;
use stream_core::utils::insertion_sort;
use tracing::{debug, warn};

/// One tracked position on the estimated CDF
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Marker {
    /// Estimated data value at this marker's position
    pub height: f64,
    /// Quantile fraction tracked; the desired position advances by this much
    /// per observation
    pub increment: f64,
    /// Ideal rank among the observations seen so far
    pub desired: f64,
    /// Actual rank among the observations seen so far
    pub count: i64,
}

fn height_mut(marker: &mut Marker) -> &mut f64 {
    &mut marker.height
}

fn increment_mut(marker: &mut Marker) -> &mut f64 {
    &mut marker.increment
}

/// Ordered set of markers
#[derive(Debug, Clone)]
pub(crate) struct MarkerSet {
    markers: Vec<Marker>,
    policy: GrowthPolicy,
}

impl MarkerSet {
    /// Create the minimal set: the two end markers
    pub(crate) fn with_end_markers(policy: GrowthPolicy) -> Self {
        let mut set = Self {
            markers: vec![
                Marker {
                    increment: 0.0,
                    ..Marker::default()
                },
                Marker {
                    increment: 1.0,
                    ..Marker::default()
                },
            ],
            policy,
        };
        set.update_desired();
        set
    }

    /// Track one quantile precisely with three extra markers at `q`, `q/2`
    /// and `(1+q)/2`
    pub(crate) fn add_quantile(&mut self, quantile: f64) {
        let start = self.allocate(3);
        self.markers[start].increment = quantile;
        self.markers[start + 1].increment = quantile / 2.0;
        self.markers[start + 2].increment = (1.0 + quantile) / 2.0;
        self.update_desired();
        debug!(quantile, markers = self.len(), "added single-quantile markers");
    }

    /// Track `count - 1` evenly spaced quantiles `i / count`
    ///
    /// A `count` below two adds nothing.
    pub(crate) fn add_equal_spacing(&mut self, count: usize) {
        if count < 2 {
            return;
        }
        let start = self.allocate(count - 1);
        for i in 1..count {
            self.markers[start + i - 1].increment = i as f64 / count as f64;
        }
        self.update_desired();
        debug!(count, markers = self.len(), "added equally spaced markers");
    }

    /// Grow by `additional` empty slots and return the index of the first one
    fn allocate(&mut self, additional: usize) -> usize {
        let start = self.markers.len();
        if self.policy == GrowthPolicy::EndMarkersOnly && start > 2 {
            warn!(
                discarded = start - 2,
                "growth keeps only the first two marker slots"
            );
            for marker in &mut self.markers[2..] {
                *marker = Marker::default();
            }
        }
        self.markers.resize(start + additional, Marker::default());
        start
    }

    /// Re-sort increments and recompute every desired position from scratch
    fn update_desired(&mut self) {
        let len = self.markers.len();
        self.sort_column(len, increment_mut);
        if self.policy == GrowthPolicy::Preserve {
            self.markers.dedup_by(|later, earlier| later.increment == earlier.increment);
            if self.markers.len() < len {
                debug!(
                    merged = len - self.markers.len(),
                    "dropped markers repeating a tracked quantile"
                );
            }
        }
        let last = (self.markers.len() - 1) as f64;
        for marker in &mut self.markers {
            marker.desired = last * marker.increment + 1.0;
        }
    }

    /// Sort the first `len` heights ascending, leaving the other fields alone
    pub(crate) fn sort_heights(&mut self, len: usize) {
        self.sort_column(len, height_mut);
    }

    fn sort_column(&mut self, len: usize, field: fn(&mut Marker) -> &mut f64) {
        let mut column: Vec<f64> = self.markers[..len]
            .iter_mut()
            .map(|m| *field(m))
            .collect();
        insertion_sort(&mut column);
        for (marker, value) in self.markers.iter_mut().zip(column) {
            *field(marker) = value;
        }
    }

    /// Seed ranks `1..=len` once the warm-up buffer is sorted
    pub(crate) fn seed_counts(&mut self) {
        for (i, marker) in self.markers.iter_mut().enumerate() {
            marker.count = i as i64 + 1;
        }
    }

    /// Drop observation state while keeping the configured increments
    pub(crate) fn clear_observations(&mut self) {
        for marker in &mut self.markers {
            marker.height = 0.0;
            marker.count = 0;
        }
        self.update_desired();
    }

    /// Number of markers
    pub(crate) fn len(&self) -> usize {
        self.markers.len()
    }

    pub(crate) fn as_slice(&self) -> &[Marker] {
        &self.markers
    }

    pub(crate) fn as_mut_slice(&mut self) -> &mut [Marker] {
        &mut self.markers
    }

    /// Bytes held by the marker storage
    pub(crate) fn size_bytes(&self) -> usize {
        self.markers.capacity() * std::mem::size_of::<Marker>()
    }
}
