//! # Forecast Math
//!
//! Numerical building blocks for volatility forecasting models.
//! This crate provides least-squares estimation and the trailing-window
//! averages used to build heterogeneous autoregressive features.

use thiserror::Error;

pub mod moving_averages;
pub mod regression;

pub use moving_averages::{trailing_mean, window_mean};
pub use regression::{LeastSquares, RegressionFit};

/// Errors that can occur in numerical calculations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MathError {
    #[error("Insufficient data for calculation: {0}")]
    InsufficientData(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Calculation error: {0}")]
    CalculationError(String),
}

/// Result type for forecast math operations
pub type Result<T> = std::result::Result<T, MathError>;
