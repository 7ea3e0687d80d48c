#![allow(dead_code)]

use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Uniform};
use vol_backtest::data::Data;
use vol_backtest::features::{lagged_window_frame, SupervisedFrame};
use vol_backtest::models::ForecastingModel;
use vol_backtest::{ForecastError, Result};

/// Log-volatility path with HAR-style persistence and deterministic shocks
pub fn synthetic_log_volatility(n: usize) -> Vec<f64> {
    let mut series = vec![-1.0; 22];
    let mut rng = StdRng::seed_from_u64(7);
    let shocks = Uniform::new(-0.5, 0.5);

    while series.len() < n {
        let shock = shocks.sample(&mut rng);

        let t = series.len();
        let daily = series[t - 1];
        let weekly = series[t - 5..t].iter().sum::<f64>() / 5.0;
        let monthly = series[t - 22..t].iter().sum::<f64>() / 22.0;
        series.push(-0.1 + 0.4 * daily + 0.3 * weekly + 0.2 * monthly + 0.3 * shock);
    }

    series.truncate(n);
    series
}

pub fn synthetic_data(n: usize, scale: bool) -> Data {
    Data::from_log_series(&synthetic_log_volatility(n), 0.8, scale).unwrap()
}

/// Model whose one-step prediction is always `value`
#[derive(Debug, Clone)]
pub struct ConstantModel {
    pub value: f64,
    pub lookback: usize,
    pub fitted: bool,
    /// Length of every training series fitted on
    pub fit_sizes: Vec<usize>,
    /// Final observation of every training series fitted on
    pub fit_last: Vec<f64>,
}

impl ConstantModel {
    pub fn new(value: f64, lookback: usize) -> Self {
        Self {
            value,
            lookback,
            fitted: false,
            fit_sizes: Vec::new(),
            fit_last: Vec::new(),
        }
    }
}

impl ForecastingModel for ConstantModel {
    fn name(&self) -> &str {
        "constant"
    }

    fn lookback(&self) -> usize {
        self.lookback
    }

    fn is_fitted(&self) -> bool {
        self.fitted
    }

    fn build_frame(&self, series: &[f64]) -> Result<SupervisedFrame> {
        lagged_window_frame(series, self.lookback)
    }

    fn fit(&mut self, frame: &SupervisedFrame) -> Result<()> {
        frame.ensure_trainable()?;
        self.fit_sizes.push(frame.len() + self.lookback);
        if let Some(&last) = frame.target().last() {
            self.fit_last.push(last);
        }
        self.fitted = true;
        Ok(())
    }

    fn one_step_ahead_forecast(&self, history: &[f64]) -> Result<f64> {
        if history.len() < self.lookback {
            return Err(ForecastError::PreconditionViolation(
                "history shorter than lookback".to_string(),
            ));
        }
        Ok(self.value)
    }
}
