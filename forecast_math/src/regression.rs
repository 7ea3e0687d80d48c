//! Least-squares regression with an intercept
//!
//! Coefficients are obtained from the normal equations `(X'X + λI) β = X'y`,
//! equilibrated to a unit diagonal and solved by Gaussian elimination with
//! partial pivoting, so the singularity check does not depend on the
//! magnitude of the data. With `λ = 0` this is
//! ordinary least squares; a positive `λ` gives a ridge estimate. The
//! intercept is never penalised.

use crate::{MathError, Result};
use serde::{Deserialize, Serialize};

const PIVOT_TOLERANCE: f64 = 1e-12;

/// Least-squares estimator
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LeastSquares {
    ridge: f64,
}

/// Estimated linear model `y = β₀ + Σ βᵢ xᵢ`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionFit {
    /// Intercept followed by one slope per feature column
    coefficients: Vec<f64>,
    /// Coefficient of determination on the estimation sample
    r_squared: f64,
    /// Number of observations used
    observations: usize,
}

impl LeastSquares {
    /// Ordinary least squares
    pub fn ols() -> Self {
        Self { ridge: 0.0 }
    }

    /// Ridge regression with penalty `lambda` on the slopes
    pub fn ridge(lambda: f64) -> Result<Self> {
        if !lambda.is_finite() || lambda < 0.0 {
            return Err(MathError::InvalidInput(format!(
                "Ridge penalty must be a non-negative finite number, got {}",
                lambda
            )));
        }
        Ok(Self { ridge: lambda })
    }

    /// Fit the model on row-major `features` against `target`.
    pub fn fit(&self, features: &[Vec<f64>], target: &[f64]) -> Result<RegressionFit> {
        if features.is_empty() {
            return Err(MathError::InsufficientData(
                "Cannot fit a regression on an empty design matrix".to_string(),
            ));
        }
        if features.len() != target.len() {
            return Err(MathError::InvalidInput(format!(
                "Design matrix has {} rows but target has {}",
                features.len(),
                target.len()
            )));
        }

        let columns = features[0].len();
        if let Some(bad) = features.iter().position(|row| row.len() != columns) {
            return Err(MathError::InvalidInput(format!(
                "Row {} has {} columns, expected {}",
                bad,
                features[bad].len(),
                columns
            )));
        }

        // Intercept column is index 0
        let dim = columns + 1;
        let mut gram = vec![vec![0.0; dim]; dim];
        let mut moment = vec![0.0; dim];

        for (row, &y) in features.iter().zip(target) {
            for i in 0..dim {
                let xi = if i == 0 { 1.0 } else { row[i - 1] };
                moment[i] += xi * y;
                for j in i..dim {
                    let xj = if j == 0 { 1.0 } else { row[j - 1] };
                    gram[i][j] += xi * xj;
                }
            }
        }
        for i in 0..dim {
            for j in 0..i {
                gram[i][j] = gram[j][i];
            }
        }
        for (i, row) in gram.iter_mut().enumerate().skip(1) {
            row[i] += self.ridge;
        }

        let coefficients = solve(gram, moment)?;

        let mean = target.iter().sum::<f64>() / target.len() as f64;
        let mut ss_res = 0.0;
        let mut ss_tot = 0.0;
        for (row, &y) in features.iter().zip(target) {
            let fitted = linear_combination(&coefficients, row);
            ss_res += (y - fitted).powi(2);
            ss_tot += (y - mean).powi(2);
        }
        let r_squared = if ss_tot > 0.0 { 1.0 - ss_res / ss_tot } else { 1.0 };

        Ok(RegressionFit {
            coefficients,
            r_squared,
            observations: target.len(),
        })
    }
}

impl RegressionFit {
    /// Intercept followed by the slopes, in feature order
    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    pub fn intercept(&self) -> f64 {
        self.coefficients[0]
    }

    pub fn slopes(&self) -> &[f64] {
        &self.coefficients[1..]
    }

    pub fn r_squared(&self) -> f64 {
        self.r_squared
    }

    pub fn observations(&self) -> usize {
        self.observations
    }

    /// Evaluate the fitted model on one feature row
    pub fn predict(&self, row: &[f64]) -> Result<f64> {
        if row.len() + 1 != self.coefficients.len() {
            return Err(MathError::InvalidInput(format!(
                "Expected {} features, got {}",
                self.coefficients.len() - 1,
                row.len()
            )));
        }
        Ok(linear_combination(&self.coefficients, row))
    }
}

fn linear_combination(coefficients: &[f64], row: &[f64]) -> f64 {
    coefficients[0]
        + coefficients[1..]
            .iter()
            .zip(row)
            .map(|(b, x)| b * x)
            .sum::<f64>()
}

/// Solve the symmetric system `a x = b` by Gaussian elimination with
/// partial pivoting after scaling rows and columns by `1 / sqrt(a[i][i])`.
fn solve(mut a: Vec<Vec<f64>>, mut b: Vec<f64>) -> Result<Vec<f64>> {
    let n = b.len();

    let scale: Vec<f64> = (0..n)
        .map(|i| {
            let d = a[i][i];
            if d > 0.0 && d.is_finite() {
                1.0 / d.sqrt()
            } else {
                1.0
            }
        })
        .collect();
    for i in 0..n {
        for j in 0..n {
            a[i][j] *= scale[i] * scale[j];
        }
        b[i] *= scale[i];
    }

    for col in 0..n {
        let pivot = (col..n)
            .max_by(|&i, &j| a[i][col].abs().total_cmp(&a[j][col].abs()))
            .unwrap_or(col);

        if a[pivot][col].abs() < PIVOT_TOLERANCE {
            return Err(MathError::CalculationError(format!(
                "Normal equations are singular (column {})",
                col
            )));
        }
        a.swap(col, pivot);
        b.swap(col, pivot);

        for row in (col + 1)..n {
            let factor = a[row][col] / a[col][col];
            if factor == 0.0 {
                continue;
            }
            for k in col..n {
                a[row][k] -= factor * a[col][k];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = vec![0.0; n];
    for row in (0..n).rev() {
        let tail: f64 = ((row + 1)..n).map(|k| a[row][k] * x[k]).sum();
        x[row] = (b[row] - tail) / a[row][row];
    }
    for (v, s) in x.iter_mut().zip(&scale) {
        *v *= s;
    }

    if x.iter().any(|v| !v.is_finite()) {
        return Err(MathError::CalculationError(
            "Regression produced non-finite coefficients".to_string(),
        ));
    }

    Ok(x)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_recovers_exact_linear_relation() {
        let features: Vec<Vec<f64>> = (0..20)
            .map(|i| vec![i as f64, ((i * 7) % 5) as f64])
            .collect();
        let target: Vec<f64> = features
            .iter()
            .map(|row| 0.5 + 2.0 * row[0] - 3.0 * row[1])
            .collect();

        let fit = LeastSquares::ols().fit(&features, &target).unwrap();

        assert_relative_eq!(fit.intercept(), 0.5, epsilon = 1e-9);
        assert_relative_eq!(fit.slopes()[0], 2.0, epsilon = 1e-9);
        assert_relative_eq!(fit.slopes()[1], -3.0, epsilon = 1e-9);
        assert_relative_eq!(fit.r_squared(), 1.0, epsilon = 1e-9);
        assert_eq!(fit.observations(), 20);
    }

    #[test]
    fn test_ridge_shrinks_slopes() {
        let features: Vec<Vec<f64>> = (0..30).map(|i| vec![(i as f64).sin()]).collect();
        let target: Vec<f64> = features.iter().map(|r| 1.0 + 4.0 * r[0]).collect();

        let ols = LeastSquares::ols().fit(&features, &target).unwrap();
        let ridge = LeastSquares::ridge(10.0)
            .unwrap()
            .fit(&features, &target)
            .unwrap();

        assert!(ridge.slopes()[0].abs() < ols.slopes()[0].abs());
    }

    #[test]
    fn test_singular_design_is_rejected() {
        let features = vec![vec![1.0, 2.0]; 10];
        let target = vec![1.0; 10];

        let result = LeastSquares::ols().fit(&features, &target);
        assert!(matches!(result, Err(MathError::CalculationError(_))));
    }

    #[test]
    fn test_small_magnitude_design_is_not_singular() {
        let base: Vec<f64> = (0..300)
            .map(|t| 1.0 + 0.5 * (t as f64 * 0.37).sin() + 0.2 * (t as f64 * 1.3).cos())
            .collect();
        let design = |k: f64| -> (Vec<Vec<f64>>, Vec<f64>) {
            let features = (2..base.len() - 1)
                .map(|t| vec![base[t] * k, (base[t - 1] + base[t - 2]) / 2.0 * k])
                .collect();
            let target = (2..base.len() - 1).map(|t| base[t + 1] * k).collect();
            (features, target)
        };

        let (x1, y1) = design(1.0);
        let (x6, y6) = design(1e-6);
        let unit = LeastSquares::ols().fit(&x1, &y1).unwrap();
        let tiny = LeastSquares::ols().fit(&x6, &y6).unwrap();

        for (a, b) in unit.slopes().iter().zip(tiny.slopes()) {
            assert_relative_eq!(a, b, epsilon = 1e-6);
        }
        assert_relative_eq!(tiny.intercept(), unit.intercept() * 1e-6, epsilon = 1e-12);
    }

    #[test]
    fn test_shape_validation() {
        let features = vec![vec![1.0], vec![2.0]];
        assert!(LeastSquares::ols().fit(&features, &[1.0]).is_err());
        assert!(LeastSquares::ols().fit(&[], &[]).is_err());
        assert!(LeastSquares::ridge(-1.0).is_err());

        let ragged = vec![vec![1.0], vec![2.0, 3.0]];
        assert!(LeastSquares::ols().fit(&ragged, &[1.0, 2.0]).is_err());
    }

    #[test]
    fn test_predict_checks_width() {
        let features: Vec<Vec<f64>> = (0..5).map(|i| vec![i as f64]).collect();
        let target: Vec<f64> = (0..5).map(|i| 1.0 + i as f64).collect();
        let fit = LeastSquares::ols().fit(&features, &target).unwrap();

        assert_relative_eq!(fit.predict(&[10.0]).unwrap(), 11.0, epsilon = 1e-9);
        assert!(fit.predict(&[1.0, 2.0]).is_err());
    }
}
