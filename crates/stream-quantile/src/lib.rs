//! Bounded-memory streaming quantile estimation
//!
//! This crate provides the P² (piecewise-parabolic) estimator, which tracks
//! one or more quantiles of an unbounded stream with a handful of markers
//! and never stores the observations themselves.
//!
//! # Features
//!
//! - **Single quantile**: five markers concentrated around the target
//! - **Equally spaced quantiles**: `k - 1` markers at `i / k`
//! - **Constant memory**: state depends only on the marker count
//! - **Compatibility switches**: growth and warm-up query behaviour of the
//!   historical implementation can be selected explicitly
//!
//! # Example
//!
//! ```rust
//! use stream_quantile::PSquare;
//!
//! let mut median = PSquare::with_quantile(0.5);
//! for value in [3.0, 1.0, 4.0, 1.0, 5.0, 9.0, 2.0, 6.0] {
//!     median.add(value);
//! }
//! let estimate = median.result().unwrap();
//! assert!(estimate >= 1.0 && estimate <= 9.0);
//! ```

pub mod builder;
pub mod config;
pub mod error;
pub mod estimators;
mod markers;

// Re-export main types
pub use builder::PSquareBuilder;
pub use config::{GrowthPolicy, PSquareConfig, WarmupBaseline};
pub use error::{Error, Result};
pub use estimators::{PSquare, Phase};
pub use markers::Marker;

// Re-export from stream-core
pub use stream_core::StreamingQuantileEstimator;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        Error, GrowthPolicy, PSquare, PSquareConfig, Result, StreamingQuantileEstimator,
        WarmupBaseline,
    };
}
