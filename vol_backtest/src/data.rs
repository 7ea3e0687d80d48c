//! Train/test containers and realized-volatility preprocessing

use crate::error::{ForecastError, Result};
use chrono::NaiveDate;
use polars::prelude::*;
use std::collections::BTreeMap;
use std::fmt::Debug;
use std::fs::File;
use std::path::Path;
use std::sync::Arc;

/// Longest run of consecutive missing observations that is interpolated
pub const INTERPOLATION_LIMIT: usize = 3;

/// Scale the stored observations live in.
///
/// Scoring exponentiates `Log` values before computing RMSE and QLIK and
/// uses `Level` values as they are.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValueDomain {
    #[default]
    Log,
    Level,
}

/// A reversible value transform fitted on training data
pub trait Scaler: Debug + Send + Sync {
    /// Fit the transform on `values` and return them transformed
    fn fit_transform(&mut self, values: &[f64]) -> Result<Vec<f64>>;

    /// Apply the fitted transform
    fn transform(&self, values: &[f64]) -> Result<Vec<f64>>;

    /// Undo the fitted transform
    fn inverse_transform(&self, values: &[f64]) -> Result<Vec<f64>>;
}

/// Min-max scaling onto a closed feature range
#[derive(Debug, Clone, PartialEq)]
pub struct MinMaxScaler {
    range: (f64, f64),
    fitted: Option<(f64, f64)>,
}

impl MinMaxScaler {
    /// Create a scaler targeting `[lower, upper]`
    pub fn new(lower: f64, upper: f64) -> Result<Self> {
        if !lower.is_finite() || !upper.is_finite() || lower >= upper {
            return Err(ForecastError::InvalidParameter(format!(
                "Feature range must satisfy lower < upper, got ({}, {})",
                lower, upper
            )));
        }
        Ok(Self {
            range: (lower, upper),
            fitted: None,
        })
    }

    /// Minimum and maximum seen during fitting
    pub fn data_range(&self) -> Option<(f64, f64)> {
        self.fitted
    }

    fn bounds(&self) -> Result<(f64, f64)> {
        self.fitted.ok_or_else(|| {
            ForecastError::PreconditionViolation("MinMaxScaler used before fit".to_string())
        })
    }

    // Constant input maps onto the lower end of the range.
    fn span(min: f64, max: f64) -> f64 {
        if max > min {
            max - min
        } else {
            1.0
        }
    }
}

impl Default for MinMaxScaler {
    fn default() -> Self {
        Self {
            range: (0.0, 1.0),
            fitted: None,
        }
    }
}

impl Scaler for MinMaxScaler {
    fn fit_transform(&mut self, values: &[f64]) -> Result<Vec<f64>> {
        if values.is_empty() {
            return Err(ForecastError::DataError(
                "Cannot fit a scaler on an empty series".to_string(),
            ));
        }
        if values.iter().any(|v| !v.is_finite()) {
            return Err(ForecastError::DataError(
                "Cannot fit a scaler on non-finite values".to_string(),
            ));
        }

        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        self.fitted = Some((min, max));

        self.transform(values)
    }

    fn transform(&self, values: &[f64]) -> Result<Vec<f64>> {
        let (min, max) = self.bounds()?;
        let (lower, upper) = self.range;
        let span = Self::span(min, max);

        Ok(values
            .iter()
            .map(|v| (v - min) / span * (upper - lower) + lower)
            .collect())
    }

    fn inverse_transform(&self, values: &[f64]) -> Result<Vec<f64>> {
        let (min, max) = self.bounds()?;
        let (lower, upper) = self.range;
        let span = Self::span(min, max);

        Ok(values
            .iter()
            .map(|v| (v - lower) / (upper - lower) * span + min)
            .collect())
    }
}

/// Train/test split of a univariate series.
///
/// `y_train[i]` and `y_test[i]` are the observations that follow
/// `x_train[i]` and `x_test[i]`.
#[derive(Debug, Clone)]
pub struct Data {
    x_train: Vec<f64>,
    y_train: Vec<f64>,
    x_test: Vec<f64>,
    y_test: Vec<f64>,
    scaler: Option<Arc<dyn Scaler>>,
    domain: ValueDomain,
}

impl Data {
    /// Create a container from already aligned arrays
    pub fn new(
        x_train: Vec<f64>,
        y_train: Vec<f64>,
        x_test: Vec<f64>,
        y_test: Vec<f64>,
    ) -> Result<Self> {
        if x_train.len() != y_train.len() {
            return Err(ForecastError::shape_mismatch(
                "training split",
                format!("y_train of length {}", x_train.len()),
                y_train.len(),
            ));
        }
        if x_test.len() != y_test.len() {
            return Err(ForecastError::shape_mismatch(
                "test split",
                format!("y_test of length {}", x_test.len()),
                y_test.len(),
            ));
        }

        Ok(Self {
            x_train,
            y_train,
            x_test,
            y_test,
            scaler: None,
            domain: ValueDomain::default(),
        })
    }

    /// Attach the transform the stored arrays were produced with
    pub fn with_scaler(mut self, scaler: Arc<dyn Scaler>) -> Self {
        self.scaler = Some(scaler);
        self
    }

    /// Declare the scale of the stored observations
    pub fn with_domain(mut self, domain: ValueDomain) -> Self {
        self.domain = domain;
        self
    }

    /// Split a log-volatility series into shifted train/test pairs.
    ///
    /// The first `floor(len * train_fraction)` observations form the
    /// training block. When `scale` is set, a [`MinMaxScaler`] onto `[0, 1]`
    /// is fitted on `x_train` and applied to every array.
    pub fn from_log_series(series: &[f64], train_fraction: f64, scale: bool) -> Result<Self> {
        if !(train_fraction > 0.0 && train_fraction < 1.0) {
            return Err(ForecastError::InvalidParameter(format!(
                "Train fraction must lie in (0, 1), got {}",
                train_fraction
            )));
        }

        let len = series.len();
        let n_train = (len as f64 * train_fraction) as usize;
        if n_train < 2 || n_train + 2 > len {
            return Err(ForecastError::DataError(format!(
                "Series of length {} cannot be split at fraction {}",
                len, train_fraction
            )));
        }

        let mut x_train = series[..n_train - 1].to_vec();
        let mut y_train = series[1..n_train].to_vec();
        let mut x_test = series[n_train..len - 1].to_vec();
        let mut y_test = series[n_train + 1..].to_vec();

        let mut scaler = None;
        if scale {
            let mut min_max = MinMaxScaler::default();
            x_train = min_max.fit_transform(&x_train)?;
            y_train = min_max.transform(&y_train)?;
            y_test = min_max.transform(&y_test)?;
            x_test = min_max.transform(&x_test)?;
            scaler = Some(Arc::new(min_max) as Arc<dyn Scaler>);
        }

        let data = Self::new(x_train, y_train, x_test, y_test)?;
        Ok(match scaler {
            Some(scaler) => data.with_scaler(scaler),
            None => data,
        })
    }

    pub fn x_train(&self) -> &[f64] {
        &self.x_train
    }

    pub fn y_train(&self) -> &[f64] {
        &self.y_train
    }

    pub fn x_test(&self) -> &[f64] {
        &self.x_test
    }

    pub fn y_test(&self) -> &[f64] {
        &self.y_test
    }

    pub fn scaler(&self) -> Option<&dyn Scaler> {
        self.scaler.as_deref()
    }

    pub fn domain(&self) -> ValueDomain {
        self.domain
    }

    /// Number of test observations
    pub fn test_len(&self) -> usize {
        self.x_test.len()
    }

    /// Map values back to the natural scale if a transform is attached
    pub fn to_natural_scale(&self, values: &[f64]) -> Result<Vec<f64>> {
        match &self.scaler {
            Some(scaler) => scaler.inverse_transform(values),
            None => Ok(values.to_vec()),
        }
    }
}

/// Cleaned realized-volatility levels for one or more assets
#[derive(Debug, Clone)]
pub struct RealizedVolatility {
    dates: Vec<NaiveDate>,
    levels: BTreeMap<String, Vec<f64>>,
}

impl RealizedVolatility {
    /// Build from aligned date and level columns, interpolating short gaps
    /// and dropping rows where any asset is still missing.
    pub fn from_columns(
        dates: Vec<NaiveDate>,
        columns: BTreeMap<String, Vec<Option<f64>>>,
    ) -> Result<Self> {
        for (asset, values) in &columns {
            if values.len() != dates.len() {
                return Err(ForecastError::shape_mismatch(
                    format!("column {}", asset),
                    dates.len(),
                    values.len(),
                ));
            }
        }

        let filled: BTreeMap<String, Vec<Option<f64>>> = columns
            .into_iter()
            .map(|(asset, values)| (asset, interpolate_gaps(&values, INTERPOLATION_LIMIT)))
            .collect();

        let keep: Vec<bool> = (0..dates.len())
            .map(|row| filled.values().all(|values| values[row].is_some()))
            .collect();

        let dates = dates
            .into_iter()
            .zip(&keep)
            .filter_map(|(date, &k)| k.then_some(date))
            .collect();
        let levels = filled
            .into_iter()
            .map(|(asset, values)| {
                let kept = values
                    .into_iter()
                    .zip(&keep)
                    .filter_map(|(v, &k)| if k { v } else { None })
                    .collect();
                (asset, kept)
            })
            .collect();

        Ok(Self { dates, levels })
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn assets(&self) -> impl Iterator<Item = &str> {
        self.levels.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// Realized volatility levels for `asset`
    pub fn levels(&self, asset: &str) -> Result<&[f64]> {
        self.levels
            .get(asset)
            .map(Vec::as_slice)
            .ok_or_else(|| ForecastError::DataError(format!("Unknown asset '{}'", asset)))
    }

    /// Natural logarithm of the levels for `asset`
    pub fn log_series(&self, asset: &str) -> Result<Vec<f64>> {
        self.levels(asset)?
            .iter()
            .enumerate()
            .map(|(i, &v)| {
                if v > 0.0 {
                    Ok(v.ln())
                } else {
                    Err(ForecastError::DataError(format!(
                        "Non-positive realized volatility {} for '{}' at row {}",
                        v, asset, i
                    )))
                }
            })
            .collect()
    }
}

/// Linearly fill at most `limit` consecutive missing values after each
/// observed value. Missing values before the first observation stay missing;
/// trailing gaps repeat the last observation.
pub fn interpolate_gaps(values: &[Option<f64>], limit: usize) -> Vec<Option<f64>> {
    let mut out = values.to_vec();
    let mut last_valid: Option<usize> = None;
    let mut i = 0;

    while i < values.len() {
        if values[i].is_some() {
            last_valid = Some(i);
            i += 1;
            continue;
        }

        let gap_start = i;
        while i < values.len() && values[i].is_none() {
            i += 1;
        }
        let Some(left) = last_valid else { continue };
        let Some(left_value) = values[left] else { continue };
        let right = (i < values.len()).then_some(i);

        for (offset, slot) in out[gap_start..i].iter_mut().enumerate().take(limit) {
            let idx = gap_start + offset;
            *slot = Some(match right.and_then(|r| values[r].map(|v| (r, v))) {
                Some((r, right_value)) => {
                    let weight = (idx - left) as f64 / (r - left) as f64;
                    left_value + weight * (right_value - left_value)
                }
                None => left_value,
            });
        }
    }

    out
}

/// Loader for realized-volatility CSV exports
#[derive(Debug)]
pub struct DataLoader;

impl DataLoader {
    /// Date column expected in every export
    pub const DATE_COLUMN: &'static str = "Dates";
    /// Suffix of the realized-volatility columns
    pub const RV_SUFFIX: &'static str = "_rv";

    /// Load `<ASSET>_rv` columns for `assets` from a CSV file.
    ///
    /// `skip_rows` leading lines are ignored before the header. Header names
    /// may be quoted.
    pub fn from_csv<P: AsRef<Path>>(
        path: P,
        assets: &[&str],
        skip_rows: usize,
    ) -> Result<RealizedVolatility> {
        let file = File::open(path)?;
        let df = CsvReader::new(file)
            .infer_schema(None)
            .has_header(true)
            .with_skip_rows(skip_rows)
            .finish()?;

        Self::from_dataframe(&df, assets)
    }

    /// Extract the requested assets from an already loaded frame
    pub fn from_dataframe(df: &DataFrame, assets: &[&str]) -> Result<RealizedVolatility> {
        if assets.is_empty() {
            return Err(ForecastError::InvalidParameter(
                "At least one asset must be requested".to_string(),
            ));
        }

        let date_column = Self::find_column(df, Self::DATE_COLUMN)?;
        let dates = Self::parse_dates(df.column(&date_column)?)?;

        let mut columns = BTreeMap::new();
        for asset in assets {
            let name = Self::find_column(df, &format!("{}{}", asset, Self::RV_SUFFIX))?;
            let values: Vec<Option<f64>> = df
                .column(&name)?
                .cast(&DataType::Float64)?
                .f64()?
                .into_iter()
                .map(|v| v.filter(|x| x.is_finite()))
                .collect();
            columns.insert(asset.to_string(), values);
        }

        RealizedVolatility::from_columns(dates, columns)
    }

    fn find_column(df: &DataFrame, wanted: &str) -> Result<String> {
        df.get_column_names()
            .into_iter()
            .find(|name| name.trim().trim_matches('"') == wanted)
            .map(str::to_string)
            .ok_or_else(|| ForecastError::DataError(format!("Column '{}' not found", wanted)))
    }

    fn parse_dates(column: &Series) -> Result<Vec<NaiveDate>> {
        let as_text = column.cast(&DataType::Utf8)?;
        as_text
            .utf8()?
            .into_iter()
            .enumerate()
            .map(|(row, value)| {
                let raw = value.ok_or_else(|| {
                    ForecastError::DataError(format!("Missing date at row {}", row))
                })?;
                NaiveDate::parse_from_str(raw.trim().trim_matches('"'), "%Y%m%d").map_err(|e| {
                    ForecastError::DataError(format!("Invalid date '{}' at row {}: {}", raw, row, e))
                })
            })
            .collect()
    }
}
