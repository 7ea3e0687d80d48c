//! # Vol Backtest
//!
//! Walk-forward evaluation of multi-step volatility forecasting models.
//!
//! ## Features
//!
//! - Train/test containers with an optional reversible scaler
//! - Heterogeneous autoregressive (HAR) and echo state network models
//! - Expanding, rolling and fixed refit windows
//! - Recursive multi-step forecasts built from one-step predictors
//! - Running RMSE, QLIK and L1 error vectors per forecast horizon
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use vol_backtest::backtest::{Backtest, BacktestConfig};
//! use vol_backtest::data::Data;
//! use vol_backtest::models::HarModel;
//! use vol_backtest::window::WindowMode;
//!
//! # fn main() -> vol_backtest::Result<()> {
//! let log_rv: Vec<f64> = load_log_realized_volatility();
//! let data = Data::from_log_series(&log_rv, 0.8, true)?;
//!
//! let backtest = Backtest::new(
//!     BacktestConfig::new(10, WindowMode::Rolling).with_window_size(1000),
//! )?;
//! let mut model = HarModel::new();
//! let metrics = backtest.evaluate(&mut model, &data)?;
//! println!("{}", metrics);
//! # Ok(())
//! # }
//! # fn load_log_realized_volatility() -> Vec<f64> { Vec::new() }
//! ```

pub mod backtest;
pub mod config;
pub mod data;
pub mod error;
pub mod features;
pub mod metrics;
pub mod models;
pub mod recursive;
pub mod window;

// Re-export commonly used types
pub use crate::backtest::{Backtest, BacktestConfig, BacktestReport};
pub use crate::data::{Data, DataLoader, MinMaxScaler, Scaler, ValueDomain};
pub use crate::error::{ForecastError, Result};
pub use crate::metrics::{ErrorMetrics, Metric};
pub use crate::models::{ForecastingModel, ModelKind, ModelSpec};
pub use crate::window::WindowMode;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
