use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::data::export::EXPORT_FILE_NAME;
use crate::data::model::DatasetSchema;

/// Env var naming a JSON config file.
pub const CONFIG_ENV: &str = "RIO_DASHBOARD_CONFIG";

/// Config file picked up from the working directory when the env var is unset.
pub const DEFAULT_CONFIG_FILE: &str = "rio-dashboard.json";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("at least one category column is required")]
    NoCategoryColumns,

    #[error("summary timestamp '{0}' is not one of the timestamp columns")]
    UnknownSummaryTimestamp(String),

    #[error("histogram_bins must be greater than zero")]
    ZeroBins,

    #[error("invalid colour '{0}', expected #RRGGBB")]
    BadColor(String),
}

/// Background and font colours as `#RRGGBB`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThemeConfig {
    pub background: String,
    pub font: String,
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            background: "#FFFFFF".to_string(),
            font: "#000000".to_string(),
        }
    }
}

/// Dashboard settings. Every field has a default, so a config file only needs
/// the keys it changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub category_columns: Vec<String>,
    pub timestamp_columns: Vec<String>,
    /// Timestamp column used for the metrics, histogram and scatter plot.
    pub summary_timestamp: String,
    /// Distinct uploads kept parsed in memory.
    pub cache_capacity: usize,
    pub export_file_name: String,
    /// Rows shown in the upload preview.
    pub preview_rows: usize,
    pub histogram_bins: usize,
    pub theme: ThemeConfig,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        let schema = DatasetSchema::default();
        Self {
            category_columns: schema.category_columns,
            timestamp_columns: schema.timestamp_columns,
            summary_timestamp: "created".to_string(),
            cache_capacity: 8,
            export_file_name: EXPORT_FILE_NAME.to_string(),
            preview_rows: 5,
            histogram_bins: 20,
            theme: ThemeConfig::default(),
        }
    }
}

impl DashboardConfig {
    /// Read and validate a JSON config file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: DashboardConfig = serde_json::from_str(&text)
            .with_context(|| format!("parsing config {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `$RIO_DASHBOARD_CONFIG`, else `./rio-dashboard.json` if it
    /// exists, else defaults.
    pub fn load() -> Result<Self> {
        match Self::config_path() {
            Some(path) => {
                log::info!("Loading config from {}", path.display());
                Self::from_file(&path)
            }
            None => Ok(Self::default()),
        }
    }

    fn config_path() -> Option<PathBuf> {
        if let Some(path) = std::env::var_os(CONFIG_ENV) {
            return Some(PathBuf::from(path));
        }
        let local = PathBuf::from(DEFAULT_CONFIG_FILE);
        local.exists().then_some(local)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.category_columns.is_empty() {
            return Err(ConfigError::NoCategoryColumns);
        }
        if !self.timestamp_columns.contains(&self.summary_timestamp) {
            return Err(ConfigError::UnknownSummaryTimestamp(
                self.summary_timestamp.clone(),
            ));
        }
        if self.histogram_bins == 0 {
            return Err(ConfigError::ZeroBins);
        }
        for color in [&self.theme.background, &self.theme.font] {
            if crate::color::parse_hex_color(color).is_none() {
                return Err(ConfigError::BadColor(color.clone()));
            }
        }
        Ok(())
    }

    pub fn schema(&self) -> DatasetSchema {
        DatasetSchema {
            category_columns: self.category_columns.clone(),
            timestamp_columns: self.timestamp_columns.clone(),
        }
    }
}
