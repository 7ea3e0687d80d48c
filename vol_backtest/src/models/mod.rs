//! Forecasting models for volatility series
//!
//! Every model implements [`ForecastingModel`]: it can be fitted on a
//! supervised frame, predicts one step ahead from a history window, and
//! builds multi-step forecasts by feeding its own predictions back in.
//! The backtest harness only ever talks to this trait.

use crate::data::Data;
use crate::error::{ForecastError, Result};
use crate::features::SupervisedFrame;
use crate::recursive::recursive_forecast;
use crate::window::{training_slice, WindowMode};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Debug};
use std::str::FromStr;
use tracing::trace;

pub mod esn;
pub mod har;

pub use esn::{EchoStateNetwork, EsnConfig};
pub use har::{HarCoefficients, HarModel};

/// Common interface for one-step-ahead forecasting models
pub trait ForecastingModel: Debug + Send + Sync {
    /// Human-readable model name
    fn name(&self) -> &str;

    /// Number of trailing observations `one_step_ahead_forecast` needs
    fn lookback(&self) -> usize;

    /// Whether `fit` has succeeded at least once
    fn is_fitted(&self) -> bool;

    /// Turn a raw series into the frame this model trains on
    fn build_frame(&self, series: &[f64]) -> Result<SupervisedFrame>;

    /// Estimate parameters from `frame`, replacing any previous fit
    fn fit(&mut self, frame: &SupervisedFrame) -> Result<()>;

    /// Predict the observation that follows `history`
    fn one_step_ahead_forecast(&self, history: &[f64]) -> Result<f64>;

    /// Forecast `horizon` steps from test index `origin`.
    ///
    /// Refits according to `mode` first, then seeds the recursion with the
    /// `lookback` test observations preceding `origin`. Under
    /// [`WindowMode::Fixed`] an unfitted model is fitted once on the
    /// training split.
    fn multi_step_ahead_forecast(
        &mut self,
        data: &Data,
        horizon: usize,
        origin: usize,
        mode: WindowMode,
        window_size: Option<usize>,
    ) -> Result<Vec<f64>> {
        let lookback = self.lookback();
        check_origin(origin, lookback)?;
        if horizon == 0 {
            return Err(ForecastError::InvalidParameter(
                "Forecast horizon must be positive".to_string(),
            ));
        }

        match training_slice(data, origin, mode, window_size)? {
            Some(slice) => {
                trace!(origin, rows = slice.len(), %mode, "Refitting model");
                let frame = self.build_frame(&slice)?;
                self.fit(&frame)?;
            }
            None if !self.is_fitted() => {
                let frame = self.build_frame(data.x_train())?;
                self.fit(&frame)?;
            }
            None => {}
        }

        let history = &data.x_test()[origin - lookback..origin];
        recursive_forecast(&*self, history, horizon)
    }
}

/// Forecast origins must leave a full lookback window of test history
pub fn check_origin(origin: usize, lookback: usize) -> Result<()> {
    if origin <= lookback {
        return Err(ForecastError::PreconditionViolation(format!(
            "Forecast origin {} must exceed the model lookback of {}",
            origin, lookback
        )));
    }
    Ok(())
}

/// Implemented model families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ModelKind {
    /// Heterogeneous autoregressive regression
    Har,
    /// Echo state network with a ridge readout
    Esn,
}

impl ModelKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelKind::Har => "HAR",
            ModelKind::Esn => "ESN",
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for ModelKind {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "HAR" => Ok(ModelKind::Har),
            "ESN" => Ok(ModelKind::Esn),
            _ => Err(ForecastError::InvalidParameter(format!(
                "Model type '{}' not recognized, expected HAR or ESN",
                s
            ))),
        }
    }
}

impl TryFrom<String> for ModelKind {
    type Error = ForecastError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<ModelKind> for String {
    fn from(kind: ModelKind) -> Self {
        kind.as_str().to_string()
    }
}

/// Model family together with its construction parameters
#[derive(Debug, Clone, PartialEq)]
pub enum ModelSpec {
    Har,
    Esn(EsnConfig),
}

impl ModelSpec {
    pub fn kind(&self) -> ModelKind {
        match self {
            ModelSpec::Har => ModelKind::Har,
            ModelSpec::Esn(_) => ModelKind::Esn,
        }
    }

    /// Construct an unfitted model
    pub fn build(&self) -> Result<Box<dyn ForecastingModel>> {
        Ok(match self {
            ModelSpec::Har => Box::new(HarModel::new()),
            ModelSpec::Esn(config) => Box::new(EchoStateNetwork::new(config.clone())?),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_kind_parsing() {
        assert_eq!("har".parse::<ModelKind>().unwrap(), ModelKind::Har);
        assert_eq!("Esn".parse::<ModelKind>().unwrap(), ModelKind::Esn);
        assert!(matches!(
            "LSTM".parse::<ModelKind>(),
            Err(ForecastError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_spec_builds_unfitted_models() {
        let har = ModelSpec::Har.build().unwrap();
        assert_eq!(har.name(), "HAR");
        assert!(!har.is_fitted());

        let esn = ModelSpec::Esn(EsnConfig::default()).build().unwrap();
        assert_eq!(esn.lookback(), EsnConfig::default().lookback);
        assert!(!esn.is_fitted());
    }

    #[test]
    fn test_origin_must_exceed_lookback() {
        assert!(check_origin(22, 22).is_err());
        assert!(check_origin(23, 22).is_ok());
    }
}
