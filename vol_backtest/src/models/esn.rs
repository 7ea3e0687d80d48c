//! Echo state network (reservoir computing) forecaster
//!
//! A fixed random leaky-tanh reservoir is driven through the lookback
//! window from a zero state. Only the linear readout from the final
//! reservoir state to the next observation is trained, with ridge
//! regression. Reservoir weights depend on the seed alone, so refitting
//! replaces the readout and nothing else.

use crate::error::{ForecastError, Result};
use crate::features::{lagged_window_frame, SupervisedFrame};
use crate::models::ForecastingModel;
use forecast_math::{LeastSquares, RegressionFit};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Reservoir hyper-parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EsnConfig {
    pub reservoir_size: usize,
    pub lookback: usize,
    /// Fraction of recurrent connections that are non-zero
    pub connectivity: f64,
    /// Largest absolute row sum of the recurrent matrix, below 1
    pub contraction: f64,
    pub leak_rate: f64,
    pub input_scaling: f64,
    pub ridge: f64,
    pub seed: u64,
}

impl Default for EsnConfig {
    fn default() -> Self {
        Self {
            reservoir_size: 50,
            lookback: 22,
            connectivity: 0.2,
            contraction: 0.9,
            leak_rate: 0.5,
            input_scaling: 0.5,
            ridge: 1e-4,
            seed: 1,
        }
    }
}

impl EsnConfig {
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| -> Result<()> { Err(ForecastError::InvalidParameter(msg)) };

        if self.reservoir_size == 0 || self.lookback == 0 {
            return invalid("Reservoir size and lookback must be positive".to_string());
        }
        if !(self.connectivity > 0.0 && self.connectivity <= 1.0) {
            return invalid(format!(
                "Connectivity must lie in (0, 1], got {}",
                self.connectivity
            ));
        }
        if !(self.contraction > 0.0 && self.contraction < 1.0) {
            return invalid(format!(
                "Contraction must lie in (0, 1), got {}",
                self.contraction
            ));
        }
        if !(self.leak_rate > 0.0 && self.leak_rate <= 1.0) {
            return invalid(format!("Leak rate must lie in (0, 1], got {}", self.leak_rate));
        }
        if !(self.input_scaling > 0.0) || !(self.ridge >= 0.0) {
            return invalid("Input scaling must be positive and ridge non-negative".to_string());
        }
        Ok(())
    }
}

/// Echo state network with a ridge readout
#[derive(Debug, Clone)]
pub struct EchoStateNetwork {
    config: EsnConfig,
    input_weights: Vec<f64>,
    bias: Vec<f64>,
    recurrent: Vec<Vec<f64>>,
    readout: Option<RegressionFit>,
}

impl EchoStateNetwork {
    pub fn new(config: EsnConfig) -> Result<Self> {
        config.validate()?;

        let n = config.reservoir_size;
        let mut rng = StdRng::seed_from_u64(config.seed);
        let normal = Normal::new(0.0, 1.0)
            .map_err(|e| ForecastError::InvalidParameter(e.to_string()))?;

        let input_weights = (0..n)
            .map(|_| rng.gen_range(-config.input_scaling..=config.input_scaling))
            .collect();
        let bias = (0..n).map(|_| rng.gen_range(-0.1..=0.1)).collect();

        let mut recurrent: Vec<Vec<f64>> = (0..n)
            .map(|_| {
                (0..n)
                    .map(|_| {
                        if rng.gen_bool(config.connectivity) {
                            normal.sample(&mut rng)
                        } else {
                            0.0
                        }
                    })
                    .collect()
            })
            .collect();

        // Row-sum norm below one keeps the state update contractive.
        let norm = recurrent
            .iter()
            .map(|row| row.iter().map(|w| w.abs()).sum::<f64>())
            .fold(0.0, f64::max);
        if norm > 0.0 {
            let scale = config.contraction / norm;
            for w in recurrent.iter_mut().flatten() {
                *w *= scale;
            }
        }

        Ok(Self {
            config,
            input_weights,
            bias,
            recurrent,
            readout: None,
        })
    }

    pub fn config(&self) -> &EsnConfig {
        &self.config
    }

    /// Readout weights of the last fit, intercept first
    pub fn readout(&self) -> Option<&[f64]> {
        self.readout.as_ref().map(RegressionFit::coefficients)
    }

    /// Final reservoir state after consuming `window` from a zero state
    fn reservoir_state(&self, window: &[f64]) -> Vec<f64> {
        let n = self.config.reservoir_size;
        let leak = self.config.leak_rate;
        let mut state = vec![0.0; n];
        let mut next = vec![0.0; n];

        for &u in window {
            for (i, slot) in next.iter_mut().enumerate() {
                let recurrent: f64 = self.recurrent[i]
                    .iter()
                    .zip(&state)
                    .map(|(w, s)| w * s)
                    .sum();
                let activation = (self.input_weights[i] * u + self.bias[i] + recurrent).tanh();
                *slot = (1.0 - leak) * state[i] + leak * activation;
            }
            std::mem::swap(&mut state, &mut next);
        }

        state
    }
}

impl ForecastingModel for EchoStateNetwork {
    fn name(&self) -> &str {
        "ESN"
    }

    fn lookback(&self) -> usize {
        self.config.lookback
    }

    fn is_fitted(&self) -> bool {
        self.readout.is_some()
    }

    fn build_frame(&self, series: &[f64]) -> Result<SupervisedFrame> {
        lagged_window_frame(series, self.config.lookback)
    }

    fn fit(&mut self, frame: &SupervisedFrame) -> Result<()> {
        frame.ensure_trainable()?;
        if frame.columns().len() != self.config.lookback {
            return Err(ForecastError::shape_mismatch(
                "ESN training frame",
                format!("{} lag columns", self.config.lookback),
                frame.columns().len(),
            ));
        }

        let states: Vec<Vec<f64>> = frame
            .features()
            .iter()
            .map(|window| self.reservoir_state(window))
            .collect();
        let readout = LeastSquares::ridge(self.config.ridge)?.fit(&states, frame.target())?;

        debug!(
            rows = frame.len(),
            reservoir = self.config.reservoir_size,
            r_squared = readout.r_squared(),
            "Fitted ESN readout"
        );
        self.readout = Some(readout);
        Ok(())
    }

    fn one_step_ahead_forecast(&self, history: &[f64]) -> Result<f64> {
        let readout = self.readout.as_ref().ok_or_else(|| {
            ForecastError::PreconditionViolation("ESN used before fit".to_string())
        })?;
        let lookback = self.config.lookback;
        if history.len() < lookback {
            return Err(ForecastError::PreconditionViolation(format!(
                "ESN forecast needs {} observations of history, got {}",
                lookback,
                history.len()
            )));
        }

        let state = self.reservoir_state(&history[history.len() - lookback..]);
        Ok(readout.predict(&state)?)
    }
}
