use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalyzerError {
    #[error("No dataset found: expected {} or {}", cleaned.display(), raw.display())]
    DatasetNotFound { cleaned: PathBuf, raw: PathBuf },

    #[error("Cannot determine entity column (available columns: {})", available.join(", "))]
    EntityColumnNotFound { available: Vec<String> },

    #[error("Cannot determine measure column (available columns: {})", available.join(", "))]
    MeasureColumnNotFound { available: Vec<String> },

    #[error("Duplicate column after name normalization: {0}")]
    DuplicateColumn(String),

    #[error("Chart error: {0}")]
    Chart(String),

    #[error("Interactive export error: {0}")]
    InteractiveExport(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Polars error: {0}")]
    Polars(String),
}

impl From<polars::error::PolarsError> for AnalyzerError {
    fn from(err: polars::error::PolarsError) -> Self {
        AnalyzerError::Polars(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AnalyzerError>;
