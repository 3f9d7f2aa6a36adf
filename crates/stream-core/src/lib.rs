//! Core traits and types for streaming statistical estimation
//!
//! This crate holds what every stream-stats estimator shares: the error
//! type, the [`StreamingQuantileEstimator`] trait and small slice helpers.

pub mod error;
pub mod traits;
pub mod utils;

pub use error::{Error, Result};
pub use traits::StreamingQuantileEstimator;
