use thiserror::Error;

/// Failure to turn raw tabular text into an observation table.
///
/// Loading is all-or-nothing: any of these means no table was produced.
#[derive(Debug, Error)]
pub enum DataFormatError {
    #[error("failed to read input: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed delimited file: {0}")]
    Csv(#[from] csv::Error),

    #[error("missing required column(s): {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("no metric columns found (expected DD-MM-YYYY dated columns or a `Combined Index` column)")]
    NoMetricColumns,

    #[error("row {row}, column `{column}`: `{value}` is neither a number nor the missing marker")]
    InvalidNumber {
        row: usize,
        column: String,
        value: String,
    },
}

#[derive(Debug, Error, PartialEq)]
pub enum CriteriaError {
    #[error("threshold {0} is outside the allowed range [0.0, 10.0]")]
    ThresholdOutOfRange(f64),

    #[error("threshold must be a finite number")]
    ThresholdNotFinite,
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to write {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("csv serialization failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("json serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config value: {0}")]
    Invalid(String),
}
