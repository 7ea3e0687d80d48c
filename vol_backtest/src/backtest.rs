//! Walk-forward backtest harness
//!
//! Slides a forecast origin through the test split. At each origin the
//! model is refit according to the window mode, a recursive multi-step
//! forecast is produced, both forecast and realized values are mapped back
//! to the unscaled domain, and the errors are accumulated.

use crate::data::Data;
use crate::error::{ForecastError, Result};
use crate::metrics::{score_origin, ErrorAccumulator, ErrorMetrics, OriginErrors};
use crate::models::{check_origin, ForecastingModel};
use crate::recursive::recursive_forecast;
use crate::window::{validate_window, WindowMode};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::ops::Range;
use tracing::{debug, info};

/// First test index used as a forecast origin by default
pub const DEFAULT_MIN_ORIGIN: usize = 25;
/// A backtest needs strictly more usable origins than this
pub const DEFAULT_MIN_ORIGINS: usize = 25;

const PROGRESS_INTERVAL: usize = 25;

/// Backtest parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestConfig {
    /// Number of steps forecast at each origin
    pub horizon: usize,
    pub window_mode: WindowMode,
    /// Length of the rolling training window
    pub window_size: Option<usize>,
    /// First test index used as a forecast origin
    pub min_origin: usize,
    /// Required number of usable origins (exclusive lower bound)
    pub min_origins: usize,
    /// Score origins on the rayon pool when the window is fixed
    pub parallel: bool,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            horizon: 1,
            window_mode: WindowMode::Expanding,
            window_size: None,
            min_origin: DEFAULT_MIN_ORIGIN,
            min_origins: DEFAULT_MIN_ORIGINS,
            parallel: false,
        }
    }
}

impl BacktestConfig {
    pub fn new(horizon: usize, window_mode: WindowMode) -> Self {
        Self {
            horizon,
            window_mode,
            ..Self::default()
        }
    }

    pub fn with_window_size(mut self, window_size: usize) -> Self {
        self.window_size = Some(window_size);
        self
    }

    pub fn with_min_origin(mut self, min_origin: usize) -> Self {
        self.min_origin = min_origin;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.horizon == 0 {
            return Err(ForecastError::InvalidParameter(
                "Forecast horizon must be positive".to_string(),
            ));
        }
        validate_window(self.window_mode, self.window_size)
    }

    /// Forecast origins available in a test split of `test_len` observations
    pub fn origins(&self, test_len: usize) -> Result<Range<usize>> {
        let end = (test_len + 1).saturating_sub(self.horizon);
        let usable = end.saturating_sub(self.min_origin);
        if usable <= self.min_origins {
            return Err(ForecastError::InsufficientTestData {
                origins: usable,
                required: self.min_origins,
            });
        }
        Ok(self.min_origin..end)
    }
}

/// Forecast and realized values at one origin, in the unscaled domain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OriginForecast {
    pub origin: usize,
    pub forecast: Vec<f64>,
    pub actual: Vec<f64>,
}

/// Everything produced by a backtest run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestReport {
    pub model: String,
    pub window_mode: WindowMode,
    pub horizon: usize,
    pub metrics: ErrorMetrics,
    /// Per-origin forecasts for diagnostics, in origin order
    pub trace: Vec<OriginForecast>,
}

struct ScoredOrigin {
    errors: OriginErrors,
    record: OriginForecast,
}

/// Walk-forward evaluator
#[derive(Debug, Clone, Default)]
pub struct Backtest {
    config: BacktestConfig,
}

impl Backtest {
    pub fn new(config: BacktestConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &BacktestConfig {
        &self.config
    }

    /// Run the backtest and return the accumulated error metrics
    pub fn evaluate(&self, model: &mut dyn ForecastingModel, data: &Data) -> Result<ErrorMetrics> {
        Ok(self.run(model, data)?.metrics)
    }

    /// Run the backtest, keeping the per-origin forecasts
    pub fn run(&self, model: &mut dyn ForecastingModel, data: &Data) -> Result<BacktestReport> {
        let config = &self.config;
        let origins = config.origins(data.test_len())?;

        info!(
            model = model.name(),
            mode = %config.window_mode,
            horizon = config.horizon,
            origins = origins.len(),
            "Starting walk-forward backtest"
        );

        let scored = if config.window_mode == WindowMode::Fixed && config.parallel {
            self.score_fixed_parallel(model, data, origins)?
        } else {
            self.score_sequential(model, data, origins)?
        };

        let mut accumulator = ErrorAccumulator::new(config.horizon);
        let mut trace = Vec::with_capacity(scored.len());
        for origin in scored {
            accumulator.push(&origin.errors)?;
            trace.push(origin.record);
        }
        let metrics = accumulator.finish()?;

        info!(
            model = model.name(),
            origins = metrics.origins(),
            "Finished walk-forward backtest"
        );

        Ok(BacktestReport {
            model: model.name().to_string(),
            window_mode: config.window_mode,
            horizon: config.horizon,
            metrics,
            trace,
        })
    }

    fn score_sequential(
        &self,
        model: &mut dyn ForecastingModel,
        data: &Data,
        origins: Range<usize>,
    ) -> Result<Vec<ScoredOrigin>> {
        let config = &self.config;
        let last = origins.end - 1;
        let mut scored = Vec::with_capacity(origins.len());

        for origin in origins {
            if origin % PROGRESS_INTERVAL == 0 || origin == last {
                debug!(model = model.name(), origin, last, "Backtest progress");
            }

            let forecast = model.multi_step_ahead_forecast(
                data,
                config.horizon,
                origin,
                config.window_mode,
                config.window_size,
            )?;
            scored.push(self.score(data, origin, forecast)?);
        }

        Ok(scored)
    }

    // A fixed model is read-only after the first fit, so origins are independent.
    fn score_fixed_parallel(
        &self,
        model: &mut dyn ForecastingModel,
        data: &Data,
        origins: Range<usize>,
    ) -> Result<Vec<ScoredOrigin>> {
        if !model.is_fitted() {
            let frame = model.build_frame(data.x_train())?;
            model.fit(&frame)?;
        }

        let model: &dyn ForecastingModel = model;
        let lookback = model.lookback();
        let horizon = self.config.horizon;

        origins
            .into_par_iter()
            .map(|origin| {
                check_origin(origin, lookback)?;
                let history = &data.x_test()[origin - lookback..origin];
                let forecast = recursive_forecast(model, history, horizon)?;
                self.score(data, origin, forecast)
            })
            .collect()
    }

    fn score(&self, data: &Data, origin: usize, forecast: Vec<f64>) -> Result<ScoredOrigin> {
        let horizon = self.config.horizon;
        let actual = data
            .y_test()
            .get(origin..origin + horizon)
            .ok_or_else(|| {
                ForecastError::shape_mismatch(
                    format!("realized values at origin {}", origin),
                    format!("{} test targets", origin + horizon),
                    data.y_test().len(),
                )
            })?;

        if forecast.len() != actual.len() {
            return Err(ForecastError::shape_mismatch(
                format!("forecast at origin {}", origin),
                format!("({}, 1)", actual.len()),
                format!("({}, 1)", forecast.len()),
            ));
        }

        let forecast = data.to_natural_scale(&forecast)?;
        let actual = data.to_natural_scale(actual)?;
        let errors = score_origin(&forecast, &actual, data.domain())?;

        Ok(ScoredOrigin {
            errors,
            record: OriginForecast {
                origin,
                forecast,
                actual,
            },
        })
    }
}
