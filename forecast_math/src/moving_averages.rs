//! Trailing-window averages over plain slices
//!
//! The heterogeneous autoregressive model summarises history at daily,
//! weekly and monthly resolution. Both the feature builder and the one-step
//! predictor need the same window arithmetic, so it lives here.

use crate::{MathError, Result};

/// Mean of `values[start..end]`.
pub fn window_mean(values: &[f64], start: usize, end: usize) -> Result<f64> {
    if start >= end {
        return Err(MathError::InvalidInput(format!(
            "Empty window [{}, {})",
            start, end
        )));
    }
    if end > values.len() {
        return Err(MathError::InsufficientData(format!(
            "Window end {} exceeds series length {}",
            end,
            values.len()
        )));
    }

    let window = &values[start..end];
    Ok(window.iter().sum::<f64>() / window.len() as f64)
}

/// Mean of the `period` values that end `skip` places before the end of the slice.
///
/// `trailing_mean(v, 4, 1)` averages the four observations preceding the
/// most recent one.
pub fn trailing_mean(values: &[f64], period: usize, skip: usize) -> Result<f64> {
    if period == 0 {
        return Err(MathError::InvalidInput(
            "Period must be greater than zero".to_string(),
        ));
    }
    if values.len() < period + skip {
        return Err(MathError::InsufficientData(format!(
            "Need {} values for a {}-period trailing mean, have {}",
            period + skip,
            period,
            values.len()
        )));
    }

    let end = values.len() - skip;
    window_mean(values, end - period, end)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_window_mean() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert_relative_eq!(window_mean(&values, 0, 5).unwrap(), 3.0);
        assert_relative_eq!(window_mean(&values, 3, 5).unwrap(), 4.5);
    }

    #[test]
    fn test_window_mean_rejects_bad_bounds() {
        let values = [1.0, 2.0, 3.0];
        assert!(window_mean(&values, 2, 2).is_err());
        assert!(window_mean(&values, 1, 4).is_err());
    }

    #[test]
    fn test_trailing_mean_skips_most_recent() {
        let values = [10.0, 1.0, 2.0, 3.0, 4.0, 100.0];
        // four values before the last one
        assert_relative_eq!(trailing_mean(&values, 4, 1).unwrap(), 2.5);
        assert_relative_eq!(trailing_mean(&values, 2, 0).unwrap(), 52.0);
    }

    #[test]
    fn test_trailing_mean_insufficient() {
        let values = [1.0, 2.0, 3.0];
        assert!(matches!(
            trailing_mean(&values, 3, 1),
            Err(MathError::InsufficientData(_))
        ));
        assert!(matches!(
            trailing_mean(&values, 0, 0),
            Err(MathError::InvalidInput(_))
        ));
    }
}
