//! Table I/O and column-name normalization shared by every subcommand.

use crate::error::{AnalyzerError, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs::{self, File};
use std::path::Path;
use tracing::debug;

/// Coarse classification of a column, used by the inference fallbacks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValueKind {
    Numeric,
    Text,
    Other,
}

impl ValueKind {
    pub fn of(dtype: &DataType) -> Self {
        if dtype.is_numeric() || matches!(dtype, DataType::Boolean) {
            ValueKind::Numeric
        } else if matches!(dtype, DataType::String) {
            ValueKind::Text
        } else {
            ValueKind::Other
        }
    }
}

/// Cell contents read as missing, in addition to empty cells
pub const MISSING_TOKENS: [&str; 18] = [
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN", "<NA>", "N/A",
    "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// Load a delimited file with a header row. The whole file is scanned for
/// schema inference, so a single stray token turns a column into text.
pub fn load_table(path: &Path) -> Result<DataFrame> {
    let missing = MISSING_TOKENS.iter().map(|t| t.to_string()).collect();
    let df = LazyCsvReader::new(path)
        .with_infer_schema_length(None)
        .with_null_values(Some(NullValues::AllColumns(missing)))
        .finish()
        .and_then(|lf| lf.collect())
        .map_err(|e| AnalyzerError::Polars(format!("Failed to load {}: {}", path.display(), e)))?;
    debug!("loaded {} ({} rows x {} columns)", path.display(), df.height(), df.width());
    Ok(df)
}

/// Write the table wholesale, replacing whatever was at `path`
pub fn write_table(df: &mut DataFrame, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let mut file = File::create(path)?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .with_separator(b',')
        .finish(df)?;
    Ok(())
}

/// trim -> lowercase -> every space becomes `_`
pub fn normalize_column_name(name: &str) -> String {
    name.trim().to_lowercase().replace(' ', "_")
}

/// Rename every column to its normalized form. Two source columns that
/// normalize to the same name are rejected rather than shadowed.
pub fn normalize_column_names(df: DataFrame) -> Result<DataFrame> {
    let mut seen = HashSet::new();
    let mut columns = Vec::with_capacity(df.width());

    for series in df.get_columns() {
        let name = normalize_column_name(series.name());
        if !seen.insert(name.clone()) {
            return Err(AnalyzerError::DuplicateColumn(name));
        }
        let mut renamed = series.clone();
        renamed.rename(&name);
        columns.push(renamed);
    }

    Ok(DataFrame::new(columns)?)
}

pub fn column_names(df: &DataFrame) -> Vec<String> {
    df.get_column_names().iter().map(|s| s.to_string()).collect()
}
