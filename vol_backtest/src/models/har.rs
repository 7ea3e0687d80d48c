//! Heterogeneous autoregressive (HAR) model
//!
//! Next-period log volatility is regressed on the previous observation and
//! on weekly and monthly averages of the history:
//!
//! ```text
//! x[t+1] = c + β_d x[t] + β_w mean(x[t-4..t]) + β_m mean(x[t-21..t])
//! ```

use crate::error::{ForecastError, Result};
use crate::features::{har_frame, SupervisedFrame, HAR_LOOKBACK};
use crate::models::ForecastingModel;
use forecast_math::{trailing_mean, LeastSquares, RegressionFit};
use serde::{Deserialize, Serialize};
use tracing::debug;

const WEEKLY_PERIOD: usize = 4;
const MONTHLY_PERIOD: usize = 21;

/// Estimated HAR coefficients
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HarCoefficients {
    pub intercept: f64,
    pub daily: f64,
    pub weekly: f64,
    pub monthly: f64,
}

/// HAR model fitted by ordinary least squares
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HarModel {
    regression: Option<RegressionFit>,
}

impl HarModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Coefficients of the last fit
    pub fn coefficients(&self) -> Option<HarCoefficients> {
        self.regression.as_ref().map(|fit| {
            let c = fit.coefficients();
            HarCoefficients {
                intercept: c[0],
                daily: c[1],
                weekly: c[2],
                monthly: c[3],
            }
        })
    }

    /// In-sample R² of the last fit
    pub fn r_squared(&self) -> Option<f64> {
        self.regression.as_ref().map(RegressionFit::r_squared)
    }
}

impl ForecastingModel for HarModel {
    fn name(&self) -> &str {
        "HAR"
    }

    fn lookback(&self) -> usize {
        HAR_LOOKBACK
    }

    fn is_fitted(&self) -> bool {
        self.regression.is_some()
    }

    fn build_frame(&self, series: &[f64]) -> Result<SupervisedFrame> {
        har_frame(series)
    }

    fn fit(&mut self, frame: &SupervisedFrame) -> Result<()> {
        frame.ensure_trainable()?;
        if frame.columns().len() != 3 {
            return Err(ForecastError::shape_mismatch(
                "HAR training frame",
                "3 feature columns",
                frame.columns().len(),
            ));
        }

        let fit = LeastSquares::ols().fit(frame.features(), frame.target())?;
        debug!(
            rows = frame.len(),
            coefficients = ?fit.coefficients(),
            r_squared = fit.r_squared(),
            "Fitted HAR model"
        );
        self.regression = Some(fit);
        Ok(())
    }

    fn one_step_ahead_forecast(&self, history: &[f64]) -> Result<f64> {
        let coefficients = self.coefficients().ok_or_else(|| {
            ForecastError::PreconditionViolation("HAR model used before fit".to_string())
        })?;
        if history.len() < HAR_LOOKBACK {
            return Err(ForecastError::PreconditionViolation(format!(
                "HAR forecast needs {} observations of history, got {}",
                HAR_LOOKBACK,
                history.len()
            )));
        }

        // Weekly and monthly terms exclude the most recent observation.
        let daily = history[history.len() - 1];
        let weekly = trailing_mean(history, WEEKLY_PERIOD, 1)?;
        let monthly = trailing_mean(history, MONTHLY_PERIOD, 1)?;

        Ok(coefficients.intercept
            + coefficients.daily * daily
            + coefficients.weekly * weekly
            + coefficients.monthly * monthly)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn ar_series(n: usize) -> Vec<f64> {
        let mut series = vec![-1.0; n];
        for t in 1..n {
            let shock = ((t * 37) % 11) as f64 / 11.0 - 0.5;
            series[t] = -0.3 + 0.7 * series[t - 1] + 0.2 * shock;
        }
        series
    }

    #[test]
    fn test_fit_sets_fitted_flag() {
        let mut model = HarModel::new();
        assert!(!model.is_fitted());

        let frame = model.build_frame(&ar_series(200)).unwrap();
        model.fit(&frame).unwrap();

        assert!(model.is_fitted());
        assert!(model.coefficients().is_some());
        assert!(model.r_squared().unwrap() > 0.0);
    }

    #[test]
    fn test_empty_frame_is_rejected() {
        let mut model = HarModel::new();
        let frame = model.build_frame(&ar_series(20)).unwrap();
        assert!(model.fit(&frame).is_err());
        assert!(!model.is_fitted());
    }

    #[test]
    fn test_one_step_uses_har_averages() {
        let model = HarModel {
            regression: Some(
                LeastSquares::ols()
                    .fit(
                        &[
                            vec![1.0, 0.0, 0.0],
                            vec![0.0, 1.0, 0.0],
                            vec![0.0, 0.0, 1.0],
                            vec![0.0, 0.0, 0.0],
                        ],
                        &[2.0, 3.0, 4.0, 1.0],
                    )
                    .unwrap(),
            ),
        };
        let c = model.coefficients().unwrap();
        assert_relative_eq!(c.intercept, 1.0, epsilon = 1e-9);
        assert_relative_eq!(c.daily, 1.0, epsilon = 1e-9);
        assert_relative_eq!(c.weekly, 2.0, epsilon = 1e-9);
        assert_relative_eq!(c.monthly, 3.0, epsilon = 1e-9);

        let history: Vec<f64> = (0..22).map(|i| i as f64).collect();
        let forecast = model.one_step_ahead_forecast(&history).unwrap();

        // daily 21, weekly mean(17..21) = 18.5, monthly mean(0..21) = 10
        assert_relative_eq!(forecast, 1.0 + 21.0 + 2.0 * 18.5 + 3.0 * 10.0, epsilon = 1e-9);
    }

    #[test]
    fn test_short_history_fails_fast() {
        let mut model = HarModel::new();
        let frame = model.build_frame(&ar_series(100)).unwrap();
        model.fit(&frame).unwrap();

        let result = model.one_step_ahead_forecast(&[0.0; 21]);
        assert!(matches!(result, Err(ForecastError::PreconditionViolation(_))));
    }

    #[test]
    fn test_unfitted_forecast_fails() {
        let model = HarModel::new();
        assert!(model.one_step_ahead_forecast(&[0.0; 22]).is_err());
    }
}
