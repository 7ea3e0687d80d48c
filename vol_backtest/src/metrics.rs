//! Forecast error metrics accumulated across forecast origins

use crate::data::ValueDomain;
use crate::error::{ForecastError, Result};
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;
use std::collections::BTreeMap;
use std::fmt;

/// Error metrics tracked by the backtest
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Metric {
    /// Root mean squared error of the exponentiated values
    #[serde(rename = "RMSE")]
    Rmse,
    /// Quasi-likelihood loss `ln(a/f) + a/f`
    #[serde(rename = "QLIK")]
    Qlik,
    /// Absolute deviation of forecast from actual per horizon step
    #[serde(rename = "L1Norm")]
    L1Norm,
}

impl Metric {
    pub const ALL: [Metric; 3] = [Metric::Rmse, Metric::Qlik, Metric::L1Norm];

    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::Rmse => "RMSE",
            Metric::Qlik => "QLIK",
            Metric::L1Norm => "L1Norm",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Per-horizon errors for a single forecast origin
#[derive(Debug, Clone, PartialEq)]
pub struct OriginErrors {
    /// Squared differences of the exponentiated values
    pub squared: Vec<f64>,
    pub qlik: Vec<f64>,
    pub l1: Vec<f64>,
}

impl OriginErrors {
    fn get(&self, metric: Metric) -> &[f64] {
        match metric {
            Metric::Rmse => &self.squared,
            Metric::Qlik => &self.qlik,
            Metric::L1Norm => &self.l1,
        }
    }
}

/// Score one forecast against the realized values.
///
/// Both slices must already be in the unscaled domain. Under
/// [`ValueDomain::Log`] the RMSE and QLIK terms are computed on `exp` of the
/// values; the L1 term always uses the values as given. QLIK fails with a
/// domain error if either side is not strictly positive and finite.
pub fn score_origin(forecast: &[f64], actual: &[f64], domain: ValueDomain) -> Result<OriginErrors> {
    if forecast.len() != actual.len() {
        return Err(ForecastError::shape_mismatch(
            "forecast scoring",
            format!("({}, 1)", forecast.len()),
            format!("({}, 1)", actual.len()),
        ));
    }

    let natural = |v: f64| match domain {
        ValueDomain::Log => v.exp(),
        ValueDomain::Level => v,
    };

    let mut errors = OriginErrors {
        squared: Vec::with_capacity(forecast.len()),
        qlik: Vec::with_capacity(forecast.len()),
        l1: Vec::with_capacity(forecast.len()),
    };

    for (step, (&f, &a)) in forecast.iter().zip(actual).enumerate() {
        let (nf, na) = (natural(f), natural(a));
        if !(nf > 0.0 && nf.is_finite() && na > 0.0 && na.is_finite()) {
            return Err(ForecastError::DomainError(format!(
                "QLIK needs positive finite values, got forecast {} and actual {} at step {}",
                nf, na, step
            )));
        }

        let ratio = na / nf;
        errors.squared.push((nf - na).powi(2));
        errors.qlik.push(ratio.ln() + ratio);
        errors.l1.push((f - a).abs());
    }

    Ok(errors)
}

/// Running totals of per-origin errors
#[derive(Debug, Clone)]
pub struct ErrorAccumulator {
    horizon: usize,
    count: usize,
    sums: BTreeMap<Metric, Vec<f64>>,
    matrices: BTreeMap<Metric, Vec<Vec<f64>>>,
}

impl ErrorAccumulator {
    pub fn new(horizon: usize) -> Self {
        Self {
            horizon,
            count: 0,
            sums: Metric::ALL.iter().map(|&m| (m, vec![0.0; horizon])).collect(),
            matrices: Metric::ALL.iter().map(|&m| (m, Vec::new())).collect(),
        }
    }

    /// Number of origins recorded
    pub fn count(&self) -> usize {
        self.count
    }

    /// Record the errors of the next origin
    pub fn push(&mut self, errors: &OriginErrors) -> Result<()> {
        for metric in Metric::ALL {
            let row = errors.get(metric);
            if row.len() != self.horizon {
                return Err(ForecastError::shape_mismatch(
                    format!("{} error vector", metric),
                    self.horizon,
                    row.len(),
                ));
            }
        }

        for metric in Metric::ALL {
            let row = errors.get(metric);
            if let Some(sum) = self.sums.get_mut(&metric) {
                for (s, v) in sum.iter_mut().zip(row) {
                    *s += v;
                }
            }
            if let Some(matrix) = self.matrices.get_mut(&metric) {
                matrix.push(row.to_vec());
            }
        }
        self.count += 1;
        Ok(())
    }

    /// Current per-horizon average of `metric`.
    ///
    /// RMSE is the square root of the mean squared error.
    pub fn running_average(&self, metric: Metric) -> Vec<f64> {
        let n = self.count.max(1) as f64;
        self.sums
            .get(&metric)
            .map(|sum| {
                sum.iter()
                    .map(|s| match metric {
                        Metric::Rmse => (s / n).sqrt(),
                        _ => s / n,
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Freeze the accumulated errors
    pub fn finish(self) -> Result<ErrorMetrics> {
        if self.count == 0 {
            return Err(ForecastError::PreconditionViolation(
                "No forecast origins were scored".to_string(),
            ));
        }

        let error_vector = Metric::ALL
            .iter()
            .map(|&m| (m, self.running_average(m)))
            .collect();

        Ok(ErrorMetrics {
            error_vector,
            error_matrix: self.matrices,
        })
    }
}

/// Final error metrics of a backtest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorMetrics {
    /// Per-horizon average of each metric across all origins
    pub error_vector: BTreeMap<Metric, Vec<f64>>,
    /// Per-origin error vectors in origin order
    pub error_matrix: BTreeMap<Metric, Vec<Vec<f64>>>,
}

impl ErrorMetrics {
    pub fn vector(&self, metric: Metric) -> &[f64] {
        self.error_vector
            .get(&metric)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn matrix(&self, metric: Metric) -> &[Vec<f64>] {
        self.error_matrix
            .get(&metric)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Number of forecast origins scored
    pub fn origins(&self) -> usize {
        self.matrix(Metric::Rmse).len()
    }

    pub fn horizon(&self) -> usize {
        self.vector(Metric::Rmse).len()
    }

    /// Sample standard deviation across origins of the stored per-origin
    /// values, per horizon step. NaN with fewer than two origins.
    pub fn std_dev(&self, metric: Metric) -> Vec<f64> {
        let matrix = self.matrix(metric);
        (0..self.horizon())
            .map(|step| matrix.iter().map(|row| row[step]).std_dev())
            .collect()
    }
}

impl fmt::Display for ErrorMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Forecast Error Metrics ({} origins):", self.origins())?;
        writeln!(f, "  {:>4}  {:>12}  {:>12}  {:>12}", "h", "RMSE", "QLIK", "L1Norm")?;
        for step in 0..self.horizon() {
            writeln!(
                f,
                "  {:>4}  {:>12.6}  {:>12.6}  {:>12.6}",
                step + 1,
                self.vector(Metric::Rmse)[step],
                self.vector(Metric::Qlik)[step],
                self.vector(Metric::L1Norm)[step]
            )?;
        }
        Ok(())
    }
}
