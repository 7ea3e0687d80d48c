//! Refit policy applied before each forecast origin

use crate::data::Data;
use crate::error::{ForecastError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Training window used to refit a model before forecasting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum WindowMode {
    /// All training data plus every test observation before the origin
    Expanding,
    /// The most recent `window_size` observations of the expanding slice
    Rolling,
    /// No refit; the model fitted once is reused at every origin
    Fixed,
}

impl WindowMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            WindowMode::Expanding => "EXPANDING",
            WindowMode::Rolling => "ROLLING",
            WindowMode::Fixed => "FIXED",
        }
    }

    /// Whether the model is refit at every origin
    pub fn refits(&self) -> bool {
        !matches!(self, WindowMode::Fixed)
    }
}

impl fmt::Display for WindowMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for WindowMode {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "EXPANDING" => Ok(WindowMode::Expanding),
            "ROLLING" => Ok(WindowMode::Rolling),
            "FIXED" => Ok(WindowMode::Fixed),
            _ => Err(ForecastError::InvalidParameter(format!(
                "Window mode '{}' not recognized, expected EXPANDING, ROLLING or FIXED",
                s
            ))),
        }
    }
}

impl TryFrom<String> for WindowMode {
    type Error = ForecastError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<WindowMode> for String {
    fn from(mode: WindowMode) -> Self {
        mode.as_str().to_string()
    }
}

/// Check that `window_size` is usable for `mode`
pub fn validate_window(mode: WindowMode, window_size: Option<usize>) -> Result<()> {
    if mode == WindowMode::Rolling && !matches!(window_size, Some(n) if n > 0) {
        return Err(ForecastError::InvalidParameter(format!(
            "Rolling window mode requires a positive window size, got {:?}",
            window_size
        )));
    }
    Ok(())
}

/// Training data to refit on before forecasting from `origin`.
///
/// Returns `None` under [`WindowMode::Fixed`]. The slice is always freshly
/// allocated; `data` is never modified.
pub fn training_slice(
    data: &Data,
    origin: usize,
    mode: WindowMode,
    window_size: Option<usize>,
) -> Result<Option<Vec<f64>>> {
    validate_window(mode, window_size)?;
    if origin > data.test_len() {
        return Err(ForecastError::PreconditionViolation(format!(
            "Forecast origin {} lies beyond the test set of length {}",
            origin,
            data.test_len()
        )));
    }

    let expanding = || {
        let mut slice = Vec::with_capacity(data.x_train().len() + origin);
        slice.extend_from_slice(data.x_train());
        slice.extend_from_slice(&data.x_test()[..origin]);
        slice
    };

    Ok(match mode {
        WindowMode::Expanding => Some(expanding()),
        WindowMode::Rolling => {
            let mut slice = expanding();
            let size = window_size.unwrap_or(slice.len());
            if slice.len() > size {
                slice.drain(..slice.len() - size);
            }
            Some(slice)
        }
        WindowMode::Fixed => None,
    })
}
