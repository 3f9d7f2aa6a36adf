//! Streaming quantile estimators

pub mod p_square;

pub use p_square::{PSquare, Phase};
