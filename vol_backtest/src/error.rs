//! Error types for the vol_backtest crate

use forecast_math::MathError;
use polars::prelude::PolarsError;
use thiserror::Error;

/// Custom error types for the vol_backtest crate
#[derive(Debug, Error)]
pub enum ForecastError {
    /// Caller supplied an unrecognised or out-of-range parameter
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// An operation was invoked outside its valid input range
    #[error("Precondition violated: {0}")]
    PreconditionViolation(String),

    /// Not enough forecast origins in the test set
    #[error("Insufficient test data: {origins} usable forecast origins, more than {required} required")]
    InsufficientTestData { origins: usize, required: usize },

    /// Two sequences that must line up do not
    #[error("Shape mismatch in {context}: expected {expected}, got {actual}")]
    ShapeMismatch {
        context: String,
        expected: String,
        actual: String,
    },

    /// A value fell outside the domain of a loss function
    #[error("Domain error: {0}")]
    DomainError(String),

    /// Error related to data validation or processing
    #[error("Data error: {0}")]
    DataError(String),

    /// Error reading or interpreting a run configuration
    #[error("Config error: {0}")]
    ConfigError(String),

    /// Error from numerical routines
    #[error("Math error: {0}")]
    Math(#[from] MathError),

    /// Error from IO operations
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error from Polars operations
    #[error("Polars error: {0}")]
    PolarsError(String),
}

/// Result type with our custom error
pub type Result<T> = std::result::Result<T, ForecastError>;

impl From<PolarsError> for ForecastError {
    fn from(err: PolarsError) -> Self {
        ForecastError::PolarsError(err.to_string())
    }
}

impl From<toml::de::Error> for ForecastError {
    fn from(err: toml::de::Error) -> Self {
        ForecastError::ConfigError(err.to_string())
    }
}

impl ForecastError {
    pub(crate) fn shape_mismatch(
        context: impl Into<String>,
        expected: impl ToString,
        actual: impl ToString,
    ) -> Self {
        ForecastError::ShapeMismatch {
            context: context.into(),
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }
}
