//! Supervised training frames built from a raw series

use crate::error::{ForecastError, Result};
use forecast_math::window_mean;

/// Number of past observations the HAR feature set reaches back
pub const HAR_LOOKBACK: usize = 22;

/// Target plus lag-derived features, one row per training example
#[derive(Debug, Clone, PartialEq)]
pub struct SupervisedFrame {
    columns: Vec<String>,
    features: Vec<Vec<f64>>,
    target: Vec<f64>,
}

impl SupervisedFrame {
    pub fn new(columns: Vec<String>, features: Vec<Vec<f64>>, target: Vec<f64>) -> Result<Self> {
        if features.len() != target.len() {
            return Err(ForecastError::shape_mismatch(
                "supervised frame",
                format!("{} target rows", features.len()),
                target.len(),
            ));
        }
        if let Some(row) = features.iter().position(|r| r.len() != columns.len()) {
            return Err(ForecastError::shape_mismatch(
                format!("supervised frame row {}", row),
                format!("{} features", columns.len()),
                features[row].len(),
            ));
        }

        Ok(Self {
            columns,
            features,
            target,
        })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn features(&self) -> &[Vec<f64>] {
        &self.features
    }

    pub fn target(&self) -> &[f64] {
        &self.target
    }

    pub fn len(&self) -> usize {
        self.target.len()
    }

    pub fn is_empty(&self) -> bool {
        self.target.is_empty()
    }

    /// Fail unless the frame can be fitted on
    pub fn ensure_trainable(&self) -> Result<()> {
        if self.is_empty() {
            return Err(ForecastError::DataError(
                "Training frame has no rows".to_string(),
            ));
        }
        Ok(())
    }

    fn push_if_finite(&mut self, row: Vec<f64>, target: f64) {
        if target.is_finite() && row.iter().all(|v| v.is_finite()) {
            self.features.push(row);
            self.target.push(target);
        }
    }
}

/// Heterogeneous autoregressive frame.
///
/// For every `i` in `[22, len - 1)` the target is `series[i + 1]` and the
/// features are `series[i]`, the mean of `series[i-5..i]` and the mean of
/// `series[i-22..i]`. Rows containing non-finite values are dropped.
pub fn har_frame(series: &[f64]) -> Result<SupervisedFrame> {
    let mut frame = SupervisedFrame::new(
        vec!["X1".to_string(), "X5".to_string(), "X22".to_string()],
        Vec::new(),
        Vec::new(),
    )?;

    if series.len() <= HAR_LOOKBACK + 1 {
        return Ok(frame);
    }

    for i in HAR_LOOKBACK..series.len() - 1 {
        let row = vec![
            series[i],
            window_mean(series, i - 5, i)?,
            window_mean(series, i - HAR_LOOKBACK, i)?,
        ];
        frame.push_if_finite(row, series[i + 1]);
    }

    Ok(frame)
}

/// Fixed-length lookback windows with the following observation as target.
///
/// Row `i` (for `i` in `[lookback, len)`) holds `series[i-lookback..i]`.
pub fn lagged_window_frame(series: &[f64], lookback: usize) -> Result<SupervisedFrame> {
    if lookback == 0 {
        return Err(ForecastError::InvalidParameter(
            "Lookback must be positive".to_string(),
        ));
    }

    let columns = (1..=lookback).rev().map(|lag| format!("lag{}", lag)).collect();
    let mut frame = SupervisedFrame::new(columns, Vec::new(), Vec::new())?;

    for i in lookback..series.len() {
        frame.push_if_finite(series[i - lookback..i].to_vec(), series[i]);
    }

    Ok(frame)
}

/// Multi-output windows for sequence models.
///
/// Direct multi-horizon learners (recurrent networks) train on these instead
/// of a [`SupervisedFrame`]: every example pairs one input window with the
/// whole `horizon`-long target path.
#[derive(Debug, Clone, PartialEq)]
pub struct SequenceDataset {
    /// One `lookback`-long input window per example
    pub inputs: Vec<Vec<f64>>,
    /// One `horizon`-long target window per example
    pub targets: Vec<Vec<f64>>,
}

/// Windows `series[i-lookback..i]` paired with `series[i..i+horizon]` for
/// every `i` in `[lookback, len - 1 - horizon)`.
pub fn sequence_dataset(series: &[f64], lookback: usize, horizon: usize) -> Result<SequenceDataset> {
    if lookback == 0 || horizon == 0 {
        return Err(ForecastError::InvalidParameter(format!(
            "Lookback and horizon must be positive, got {} and {}",
            lookback, horizon
        )));
    }

    let mut dataset = SequenceDataset {
        inputs: Vec::new(),
        targets: Vec::new(),
    };
    if series.len() < lookback + horizon + 1 {
        return Ok(dataset);
    }

    for i in lookback..series.len() - 1 - horizon {
        dataset.inputs.push(series[i - lookback..i].to_vec());
        dataset.targets.push(series[i..i + horizon].to_vec());
    }

    Ok(dataset)
}
