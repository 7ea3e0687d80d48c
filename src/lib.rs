//! # Volatility Eval Workspace
//!
//! Umbrella crate for the volatility forecast evaluation workspace. It
//! re-exports the member crates so downstream code can depend on a single
//! package.
//!
//! ## Example
//!
//! ```
//! use volatility_eval_workspace::backtest::WindowMode;
//!
//! let mode: WindowMode = "rolling".parse().unwrap();
//! assert_eq!(mode, WindowMode::Rolling);
//! ```

/// Numerical building blocks
pub use forecast_math as math;

/// Walk-forward backtesting engine
pub use vol_backtest as backtest;
