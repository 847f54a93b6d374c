//! Inspector - read-only diagnostic pass over a raw table
//!
//! Reports shape, column names, a short preview, per-column dtype and null
//! counts, and descriptive statistics for numeric columns.

use crate::error::Result;
use crate::table::{column_names, load_table};
use itertools::Itertools;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

pub const PREVIEW_ROWS: usize = 5;

/// Per-column dtype and null summary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnSummary {
    pub name: String,
    pub dtype: String,
    pub non_null: usize,
    pub null_count: usize,
}

/// Descriptive statistics of one numeric column. Statistics that are
/// undefined for the available values are `None`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NumericStats {
    pub column: String,
    pub count: usize,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub q25: Option<f64>,
    pub median: Option<f64>,
    pub q75: Option<f64>,
    pub max: Option<f64>,
}

impl NumericStats {
    /// Describe the present values of `series` after a Float64 cast
    pub fn from_series(series: &Series) -> Result<Self> {
        let present = series.cast(&DataType::Float64)?.drop_nulls();
        let values = present.f64()?;

        Ok(Self {
            column: series.name().to_string(),
            count: values.len(),
            mean: values.mean(),
            std: values.std(1),
            min: values.min(),
            q25: values.quantile(0.25, QuantileInterpolOptions::Linear)?,
            median: values.median(),
            q75: values.quantile(0.75, QuantileInterpolOptions::Linear)?,
            max: values.max(),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InspectionReport {
    pub rows: usize,
    pub columns: usize,
    pub column_names: Vec<String>,
    /// First rows rendered as text, missing cells as `None`
    pub preview: Vec<Vec<Option<String>>>,
    pub column_summaries: Vec<ColumnSummary>,
    pub numeric_stats: Vec<NumericStats>,
}

pub struct Inspector;

impl Inspector {
    pub fn inspect_file(path: &Path) -> Result<InspectionReport> {
        let df = load_table(path)?;
        Self::inspect(&df)
    }

    pub fn inspect(df: &DataFrame) -> Result<InspectionReport> {
        let (rows, columns) = df.shape();

        let mut column_summaries = Vec::with_capacity(columns);
        let mut numeric_stats = Vec::new();
        for series in df.get_columns() {
            let null_count = series.null_count();
            column_summaries.push(ColumnSummary {
                name: series.name().to_string(),
                dtype: series.dtype().to_string(),
                non_null: series.len() - null_count,
                null_count,
            });

            if series.dtype().is_numeric() {
                numeric_stats.push(NumericStats::from_series(series)?);
            }
        }

        Ok(InspectionReport {
            rows,
            columns,
            column_names: column_names(df),
            preview: preview_rows(df, PREVIEW_ROWS)?,
            column_summaries,
            numeric_stats,
        })
    }
}

fn preview_rows(df: &DataFrame, n: usize) -> Result<Vec<Vec<Option<String>>>> {
    let head = df.head(Some(n));
    let mut as_text = Vec::with_capacity(head.width());
    for series in head.get_columns() {
        let cells: Vec<Option<String>> = series
            .cast(&DataType::String)?
            .str()?
            .into_iter()
            .map(|v| v.map(|s| s.to_string()))
            .collect();
        as_text.push(cells);
    }

    Ok((0..head.height())
        .map(|row| as_text.iter().map(|col| col[row].clone()).collect())
        .collect())
}

fn fmt_stat(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.4}", v),
        None => "NaN".to_string(),
    }
}

impl fmt::Display for InspectionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Shape of dataset: ({}, {})", self.rows, self.columns)?;
        writeln!(f)?;
        writeln!(f, "Column names: [{}]", self.column_names.iter().join(", "))?;
        writeln!(f)?;

        writeln!(f, "First {} rows:", self.preview.len())?;
        writeln!(f, "{}", self.column_names.join(" | "))?;
        for row in &self.preview {
            let mut cells = row.iter().map(|c| c.as_deref().unwrap_or("null"));
            writeln!(f, "{}", cells.join(" | "))?;
        }
        writeln!(f)?;

        writeln!(f, "Data info:")?;
        writeln!(f, "{:<4} {:<28} {:>14} {:>10}  Dtype", "#", "Column", "Non-Null Count", "Nulls")?;
        for (idx, col) in self.column_summaries.iter().enumerate() {
            writeln!(
                f,
                "{:<4} {:<28} {:>14} {:>10}  {}",
                idx, col.name, col.non_null, col.null_count, col.dtype
            )?;
        }
        writeln!(f)?;

        writeln!(f, "Summary statistics (numerical columns):")?;
        if self.numeric_stats.is_empty() {
            writeln!(f, "  (no numerical columns)")?;
        }
        for stats in &self.numeric_stats {
            writeln!(f, "  {}", stats.column)?;
            writeln!(f, "    count {}", stats.count)?;
            writeln!(f, "    mean  {}", fmt_stat(stats.mean))?;
            writeln!(f, "    std   {}", fmt_stat(stats.std))?;
            writeln!(f, "    min   {}", fmt_stat(stats.min))?;
            writeln!(f, "    25%   {}", fmt_stat(stats.q25))?;
            writeln!(f, "    50%   {}", fmt_stat(stats.median))?;
            writeln!(f, "    75%   {}", fmt_stat(stats.q75))?;
            writeln!(f, "    max   {}", fmt_stat(stats.max))?;
        }
        Ok(())
    }
}
