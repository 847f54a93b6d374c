//! Analyzer configuration
//!
//! Every knob the three subcommands use lives here: file locations, the
//! cleaning policy, the inference candidate lists and the ranking size.
//! A config file is optional JSON; any field it omits keeps its default.

use crate::error::{AnalyzerError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable naming a config file when `--config` is not given
pub const CONFIG_ENV_VAR: &str = "CAR_SALES_CONFIG";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Directory holding the raw and cleaned tables
    pub data_dir: PathBuf,

    /// File name of the raw table inside `data_dir`
    pub raw_file: String,

    /// File name of the cleaned table inside `data_dir`
    pub cleaned_file: String,

    /// Directory the chart artifacts are written to
    pub plots_dir: PathBuf,

    /// Number of entities kept in the ranking
    pub top_n: usize,

    /// Whether the interactive (HTML) charts are attempted at all
    pub interactive: bool,

    pub cleaning: CleaningPolicy,

    pub inference: InferenceConfig,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("car_data1"),
            raw_file: "Car_sales.csv".to_string(),
            cleaned_file: "Car_sales_cleaned.csv".to_string(),
            plots_dir: PathBuf::from("plots"),
            top_n: 10,
            interactive: true,
            cleaning: CleaningPolicy::default(),
            inference: InferenceConfig::default(),
        }
    }
}

impl AnalyzerConfig {
    /// Load a config file. Missing fields fall back to their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| AnalyzerError::Config(format!("Failed to read {}: {}", path.display(), e)))?;
        let config: Self = serde_json::from_str(&content)
            .map_err(|e| AnalyzerError::Config(format!("Failed to parse {}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.top_n == 0 {
            return Err(AnalyzerError::Config("top_n must be at least 1".to_string()));
        }
        if self.raw_file.trim().is_empty() || self.cleaned_file.trim().is_empty() {
            return Err(AnalyzerError::Config("raw_file and cleaned_file must not be empty".to_string()));
        }
        Ok(())
    }

    pub fn raw_path(&self) -> PathBuf {
        self.data_dir.join(&self.raw_file)
    }

    pub fn cleaned_path(&self) -> PathBuf {
        self.data_dir.join(&self.cleaned_file)
    }
}

/// Column policy applied by the cleaner. Names are compared after
/// normalization, so they should be given in normalized form.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CleaningPolicy {
    /// Rows missing this value are dropped
    pub measure_column: String,

    /// Missing values here are filled with the column median
    pub price_column: String,

    /// Columns coerced to Float64 after imputation
    pub numeric_columns: Vec<String>,
}

impl Default for CleaningPolicy {
    fn default() -> Self {
        Self {
            measure_column: "sales_in_thousands".to_string(),
            price_column: "price_in_thousands".to_string(),
            numeric_columns: vec![
                "sales_in_thousands".to_string(),
                "price_in_thousands".to_string(),
            ],
        }
    }
}

/// Candidate names tried, in order, before falling back to the
/// first column of a matching value kind.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct InferenceConfig {
    pub entity_candidates: Vec<String>,
    pub measure_candidates: Vec<String>,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            entity_candidates: ["model", "car_model", "car", "model_name", "name"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            measure_candidates: [
                "sales",
                "sales_in_thousands",
                "units_sold",
                "sold",
                "quantity",
                "sales_count",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_paths() {
        let config = AnalyzerConfig::default();
        assert_eq!(config.raw_path(), PathBuf::from("car_data1/Car_sales.csv"));
        assert_eq!(config.cleaned_path(), PathBuf::from("car_data1/Car_sales_cleaned.csv"));
        assert_eq!(config.top_n, 10);
        assert_eq!(config.inference.entity_candidates[0], "model");
        assert_eq!(config.inference.measure_candidates.len(), 6);
    }

    #[test]
    fn test_partial_config_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"top_n": 3, "cleaning": {{"price_column": "msrp"}}}}"#).unwrap();

        let config = AnalyzerConfig::load(file.path()).unwrap();
        assert_eq!(config.top_n, 3);
        assert_eq!(config.cleaning.price_column, "msrp");
        assert_eq!(config.cleaning.measure_column, "sales_in_thousands");
        assert_eq!(config.plots_dir, PathBuf::from("plots"));
    }

    #[test]
    fn test_zero_top_n_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"top_n": 0}}"#).unwrap();

        let err = AnalyzerConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, AnalyzerError::Config(_)));
    }
}
