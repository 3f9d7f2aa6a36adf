//! Bounded-memory streaming statistics
//!
//! Umbrella crate re-exporting the stream-stats workspace:
//!
//! - [`stream_core`]: error type, the streaming estimator trait, slice helpers
//! - [`stream_quantile`]: the P² streaming quantile estimator
//!
//! # Example
//!
//! ```rust
//! use stream_stats::prelude::*;
//!
//! let mut p99 = PSquare::with_quantile(0.99);
//! for i in 0..1_000 {
//!     p99.add(i as f64);
//! }
//! let estimate = p99.result().unwrap();
//! assert!(estimate > 900.0 && estimate <= 999.0);
//! ```

pub use stream_core;
pub use stream_quantile;

pub use stream_core::{Error, Result, StreamingQuantileEstimator};
pub use stream_quantile::{PSquare, PSquareBuilder};

/// Prelude for convenient imports
pub mod prelude {
    pub use stream_quantile::prelude::*;
}
