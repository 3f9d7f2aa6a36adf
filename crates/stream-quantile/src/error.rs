//! Error types for streaming quantile estimation

use thiserror::Error;

/// Errors that can occur during streaming quantile estimation
#[derive(Error, Debug)]
pub enum Error {
    /// The no-argument query needs the single-quantile (five marker) layout
    #[error("Estimator tracks multiple quantiles ({markers} markers); query with an explicit quantile")]
    InvalidState { markers: usize },

    /// Observation rejected by checked ingestion
    #[error("Observation {value} is not finite")]
    NonFinite { value: f64 },

    /// Core computation error
    #[error("Core computation error: {0}")]
    Core(#[from] stream_core::Error),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Check that the marker layout supports the no-argument query
    pub fn check_single_quantile(markers: usize) -> Result<()> {
        if markers != 5 {
            return Err(Error::InvalidState { markers });
        }
        Ok(())
    }

    /// Check that an observation is finite
    pub fn check_finite(value: f64) -> Result<()> {
        if !value.is_finite() {
            return Err(Error::NonFinite { value });
        }
        Ok(())
    }
}

impl From<Error> for stream_core::Error {
    fn from(err: Error) -> Self {
        match err {
            Error::Core(inner) => inner,
            Error::NonFinite { .. } => stream_core::Error::InvalidInput(err.to_string()),
            Error::InvalidState { .. } => stream_core::Error::Computation(err.to_string()),
        }
    }
}
