//! TOML run configuration

use crate::backtest::BacktestConfig;
use crate::data::{Data, DataLoader, ValueDomain};
use crate::error::{ForecastError, Result};
use crate::models::{EsnConfig, ModelKind, ModelSpec};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Deserialize)]
pub struct RunConfig {
    pub data: DataConfig,
    #[serde(default)]
    pub backtest: BacktestConfig,
    pub model: ModelConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DataConfig {
    pub path: PathBuf,
    /// Asset whose series is backtested
    pub asset: String,
    /// Assets loaded together; rows missing any of them are dropped
    #[serde(default)]
    pub assets: Vec<String>,
    #[serde(default)]
    pub skip_rows: usize,
    #[serde(default = "default_train_fraction")]
    pub train_fraction: f64,
    #[serde(default = "default_scale")]
    pub scale: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    pub kind: ModelKind,
    #[serde(default)]
    pub esn: EsnConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

fn default_train_fraction() -> f64 {
    0.8
}

fn default_scale() -> bool {
    true
}

impl RunConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: RunConfig = toml::from_str(text)?;
        config.backtest.validate()?;
        Ok(config)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            ForecastError::ConfigError(format!(
                "Cannot read config {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        Self::from_toml_str(&text)
    }

    pub fn model_spec(&self) -> ModelSpec {
        match self.model.kind {
            ModelKind::Har => ModelSpec::Har,
            ModelKind::Esn => ModelSpec::Esn(self.model.esn.clone()),
        }
    }
}

impl DataConfig {
    /// Assets to load, always including the backtested one
    pub fn asset_list(&self) -> Vec<&str> {
        let mut assets: Vec<&str> = self.assets.iter().map(String::as_str).collect();
        if !assets.contains(&self.asset.as_str()) {
            assets.push(&self.asset);
        }
        assets
    }

    /// Load, clean, log-transform and split the configured series
    pub fn load_data(&self) -> Result<Data> {
        let volatility = DataLoader::from_csv(&self.path, &self.asset_list(), self.skip_rows)?;
        let series = volatility.log_series(&self.asset)?;
        info!(
            asset = %self.asset,
            rows = series.len(),
            first = ?volatility.dates().first(),
            last = ?volatility.dates().last(),
            "Loaded realized volatility"
        );

        Ok(Data::from_log_series(&series, self.train_fraction, self.scale)?
            .with_domain(ValueDomain::Log))
    }
}
