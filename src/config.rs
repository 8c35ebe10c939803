//! Dashboard configuration (`rca_dashboard.toml`).
//!
//! Every section and field is optional; command-line flags override whatever
//! the file sets.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::ConfigError;
use crate::loader::LoadOptions;
use crate::ranking::DEFAULT_TOP_K;
use crate::report::{DEFAULT_REPORT_FILE, DEFAULT_REPORT_TITLE};
use crate::types::Threshold;

pub const DEFAULT_CONFIG_FILE: &str = "rca_dashboard.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct DashboardConfig {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub filters: FilterConfig,

    #[serde(default)]
    pub report: ReportConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataConfig {
    /// Bundled dataset used when no file is given on the command line
    #[serde(default = "default_data_path")]
    pub path: PathBuf,

    #[serde(default = "default_delimiter")]
    pub delimiter: char,

    /// Cell value meaning "no observation"
    #[serde(default = "default_sentinel")]
    pub missing_sentinel: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterConfig {
    #[serde(default = "default_threshold")]
    pub threshold: f64,

    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportConfig {
    #[serde(default = "default_report_file")]
    pub file_name: PathBuf,

    #[serde(default = "default_report_title")]
    pub title: String,
}

fn default_data_path() -> PathBuf {
    PathBuf::from("rca_data.csv")
}

fn default_delimiter() -> char {
    ','
}

fn default_sentinel() -> String {
    "-".to_string()
}

fn default_threshold() -> f64 {
    Threshold::DEFAULT
}

fn default_top_k() -> usize {
    DEFAULT_TOP_K
}

fn default_report_file() -> PathBuf {
    PathBuf::from(DEFAULT_REPORT_FILE)
}

fn default_report_title() -> String {
    DEFAULT_REPORT_TITLE.to_string()
}

impl Default for DataConfig {
    fn default() -> Self {
        DataConfig {
            path: default_data_path(),
            delimiter: default_delimiter(),
            missing_sentinel: default_sentinel(),
        }
    }
}

impl Default for FilterConfig {
    fn default() -> Self {
        FilterConfig {
            threshold: default_threshold(),
            top_k: default_top_k(),
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        ReportConfig {
            file_name: default_report_file(),
            title: default_report_title(),
        }
    }
}

impl DashboardConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: DashboardConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        debug!("Loaded config from {}", path.display());
        Self::from_toml_str(&text)
    }

    /// Load `path` if given, else the default file if it exists, else defaults.
    pub fn discover(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => Self::load(p),
            None => {
                let default = Path::new(DEFAULT_CONFIG_FILE);
                if default.exists() {
                    Self::load(default)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let delimiter = self.data.delimiter;
        if !delimiter.is_ascii() || matches!(delimiter, '"' | '\n' | '\r') {
            return Err(ConfigError::Invalid(format!(
                "delimiter {:?} must be a single ASCII character other than a quote or line break",
                delimiter
            )));
        }
        if self.data.missing_sentinel.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "missing_sentinel must not be blank".to_string(),
            ));
        }
        if self.filters.top_k == 0 {
            return Err(ConfigError::Invalid("top_k must be at least 1".to_string()));
        }
        self.threshold()?;
        Ok(())
    }

    pub fn threshold(&self) -> Result<Threshold, ConfigError> {
        Threshold::new(self.filters.threshold).map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            delimiter: self.data.delimiter as u8,
            missing_sentinel: self.data.missing_sentinel.clone(),
        }
    }
}
