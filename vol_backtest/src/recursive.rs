//! Recursive (plug-in) multi-step forecasting
//!
//! A one-step predictor is iterated `horizon` times. After the first step
//! the working buffer contains the predictor's own outputs, never further
//! observations.

use crate::error::{ForecastError, Result};
use crate::models::ForecastingModel;

/// Build a `horizon`-step forecast from the trailing `lookback` values of `history`.
pub fn recursive_forecast<M>(model: &M, history: &[f64], horizon: usize) -> Result<Vec<f64>>
where
    M: ForecastingModel + ?Sized,
{
    let lookback = model.lookback();
    if history.len() < lookback {
        return Err(ForecastError::PreconditionViolation(format!(
            "Recursive forecast needs {} observations of history, got {}",
            lookback,
            history.len()
        )));
    }

    let mut buffer = Vec::with_capacity(lookback + horizon);
    buffer.extend_from_slice(&history[history.len() - lookback..]);
    let mut forecasts = Vec::with_capacity(horizon);

    while forecasts.len() < horizon {
        let next = model.one_step_ahead_forecast(&buffer)?;
        forecasts.push(next);
        buffer.push(next);
    }

    Ok(forecasts)
}
