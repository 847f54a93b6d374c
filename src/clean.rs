//! Normalizer/Cleaner
//!
//! Steps run in a fixed order, each one assuming the previous has completed:
//! 1. column-name normalization
//! 2. drop rows missing the sales measure
//! 3. median imputation of the price column
//! 4. numeric coercion of the designated numeric columns
//! 5. persist the result, replacing any previous cleaned table
//!
//! Missing values are handled strictly here: a missing measure removes the
//! row, a missing price is imputed, and values that only fail to parse in
//! step 4 stay missing. The aggregator applies a lenient zero-fill instead.

use crate::config::CleaningPolicy;
use crate::error::Result;
use crate::table::{column_names, load_table, normalize_column_names, write_table, ValueKind};
use itertools::Itertools;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use tracing::{info, warn};

/// Outcome of the median imputation step
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Imputation {
    pub column: String,
    pub median: f64,
    pub filled: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleaningReport {
    pub column_names: Vec<String>,
    pub rows_before: usize,
    /// `None` when the measure column is absent and the drop was skipped
    pub rows_dropped: Option<usize>,
    pub imputation: Option<Imputation>,
    /// Cells per column that became missing because they did not parse
    pub coercion_failures: Vec<(String, usize)>,
    pub shape: (usize, usize),
    pub missing_per_column: Vec<(String, usize)>,
}

pub struct Cleaner {
    policy: CleaningPolicy,
}

impl Cleaner {
    pub fn new(policy: CleaningPolicy) -> Self {
        Self { policy }
    }

    /// Load `raw`, clean it, and write the result to `cleaned`
    pub fn clean_file(&self, raw: &Path, cleaned: &Path) -> Result<CleaningReport> {
        let df = load_table(raw)?;
        let (mut df, report) = self.clean(df)?;
        write_table(&mut df, cleaned)?;
        info!("cleaned table written to {}", cleaned.display());
        Ok(report)
    }

    /// Run steps 1-4 in memory
    pub fn clean(&self, df: DataFrame) -> Result<(DataFrame, CleaningReport)> {
        let rows_before = df.height();
        let df = normalize_column_names(df)?;
        let names = column_names(&df);
        info!("normalized column names: {:?}", names);

        let (df, rows_dropped) = if df.column(&self.policy.measure_column).is_ok() {
            let (df, dropped) = drop_missing_measure(df, &self.policy.measure_column)?;
            (df, Some(dropped))
        } else {
            warn!(
                "measure column '{}' not present, no rows dropped",
                self.policy.measure_column
            );
            (df, None)
        };

        let (df, imputation) = impute_median(df, &self.policy.price_column)?;

        let (df, coercion_failures) = coerce_numeric(df, &self.policy.numeric_columns)?;

        let missing_per_column = df
            .get_columns()
            .iter()
            .map(|s| (s.name().to_string(), s.null_count()))
            .collect();

        let report = CleaningReport {
            column_names: names,
            rows_before,
            rows_dropped,
            imputation,
            coercion_failures,
            shape: df.shape(),
            missing_per_column,
        };
        Ok((df, report))
    }
}

/// Remove every row whose `measure` cell is missing. Returns the number of
/// rows removed.
pub fn drop_missing_measure(df: DataFrame, measure: &str) -> Result<(DataFrame, usize)> {
    let before = df.height();
    let df = df.lazy().filter(col(measure).is_not_null()).collect()?;
    let dropped = before - df.height();
    if dropped > 0 {
        info!("dropped {} rows with missing '{}'", dropped, measure);
    }
    Ok((df, dropped))
}

/// Fill missing cells of `column` with the median of its parseable values.
///
/// A text column keeps its malformed cells as they are; only genuinely
/// missing cells are filled. Absent columns and columns with nothing to take
/// a median of are returned unchanged.
pub fn impute_median(mut df: DataFrame, column: &str) -> Result<(DataFrame, Option<Imputation>)> {
    if df.column(column).is_err() {
        return Ok((df, None));
    }
    let series = df.column(column)?.clone();

    let missing = series.null_count();
    if missing == 0 {
        return Ok((df, None));
    }

    let parsed = series.cast(&DataType::Float64)?;
    let fill_value = match parsed.f64()?.median() {
        Some(m) => m,
        None => {
            warn!("'{}' has no numeric values, skipping imputation", column);
            return Ok((df, None));
        }
    };

    let filled = match ValueKind::of(series.dtype()) {
        ValueKind::Numeric => {
            let cells: Vec<Option<f64>> = parsed
                .f64()?
                .into_iter()
                .map(|v| Some(v.unwrap_or(fill_value)))
                .collect();
            Series::new(column, cells)
        }
        _ => {
            let fill = fill_value.to_string();
            let cells: Vec<Option<String>> = series
                .cast(&DataType::String)?
                .str()?
                .into_iter()
                .map(|v| Some(v.map(|s| s.to_string()).unwrap_or_else(|| fill.clone())))
                .collect();
            Series::new(column, cells)
        }
    };
    df.with_column(filled)?;

    info!("filled {} missing '{}' values with median {}", missing, column, fill_value);
    Ok((
        df,
        Some(Imputation {
            column: column.to_string(),
            median: fill_value,
            filled: missing,
        }),
    ))
}

/// Cast each present column in `columns` to Float64. Unparseable cells
/// become missing and are reported per column; they are not dropped or
/// re-imputed.
pub fn coerce_numeric(mut df: DataFrame, columns: &[String]) -> Result<(DataFrame, Vec<(String, usize)>)> {
    let mut failures = Vec::new();
    for name in columns {
        let series = match df.column(name) {
            Ok(s) => s.clone(),
            Err(_) => continue,
        };
        let before = series.null_count();
        let coerced = series.cast(&DataType::Float64)?;
        let newly_missing = coerced.null_count().saturating_sub(before);
        if newly_missing > 0 {
            warn!("{} values in '{}' could not be parsed as numbers", newly_missing, name);
        }
        df.with_column(coerced)?;
        failures.push((name.clone(), newly_missing));
    }
    Ok((df, failures))
}

impl fmt::Display for CleaningReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Cleaned column names: [{}]", self.column_names.iter().join(", "))?;
        match self.rows_dropped {
            Some(n) => writeln!(f, "Rows dropped for missing sales: {} of {}", n, self.rows_before)?,
            None => writeln!(f, "Sales column not found, no rows dropped")?,
        }
        if let Some(imp) = &self.imputation {
            writeln!(f, "Filled {} missing '{}' values with median {}", imp.filled, imp.column, imp.median)?;
        }
        for (column, n) in &self.coercion_failures {
            if *n > 0 {
                writeln!(f, "'{}': {} values could not be parsed and are now missing", column, n)?;
            }
        }
        writeln!(f)?;
        writeln!(f, "Shape after cleaning: ({}, {})", self.shape.0, self.shape.1)?;
        writeln!(f, "Missing values left:")?;
        for (column, n) in &self.missing_per_column {
            writeln!(f, "  {:<28} {}", column, n)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_frame() -> DataFrame {
        df!(
            "Model" => &["Civic", "Accord", "Golf", "Focus", "Corolla"],
            "Sales in thousands" => &[Some(10.0), None, Some(7.5), Some(3.0), None],
            "Price in thousands" => &[Some(20.0), Some(99.0), None, Some(30.0), Some(40.0)],
        )
        .unwrap()
    }

    #[test]
    fn test_median_of_odd_and_even_counts() {
        let odd = df!("price" => &[Some(3.0), None, Some(1.0), Some(2.0)]).unwrap();
        let (_, imputation) = impute_median(odd, "price").unwrap();
        assert_eq!(imputation.unwrap().median, 2.0);

        let even = df!("price" => &[Some(4.0), Some(1.0), None, Some(3.0), Some(2.0)]).unwrap();
        let (_, imputation) = impute_median(even, "price").unwrap();
        assert_eq!(imputation.unwrap().median, 2.5);

        let nothing = df!("price" => &[None::<f64>, None]).unwrap();
        let (_, imputation) = impute_median(nothing, "price").unwrap();
        assert!(imputation.is_none());
    }

    #[test]
    fn test_drop_missing_measure() {
        let df = normalize_column_names(raw_frame()).unwrap();
        let (df, dropped) = drop_missing_measure(df, "sales_in_thousands").unwrap();

        assert_eq!(dropped, 2);
        assert_eq!(df.height(), 3);
        assert_eq!(df.column("sales_in_thousands").unwrap().null_count(), 0);
    }

    #[test]
    fn test_impute_uses_post_drop_median() {
        let df = normalize_column_names(raw_frame()).unwrap();
        let (df, _) = drop_missing_measure(df, "sales_in_thousands").unwrap();
        // Remaining prices: 20, missing, 30 -> median 25 (the dropped 99 and 40 do not count)
        let (df, imputation) = impute_median(df, "price_in_thousands").unwrap();

        let imputation = imputation.unwrap();
        assert_eq!(imputation.median, 25.0);
        assert_eq!(imputation.filled, 1);

        let prices = df.column("price_in_thousands").unwrap().f64().unwrap();
        assert_eq!(prices.null_count(), 0);
        assert_eq!(prices.get(1), Some(25.0));
    }

    #[test]
    fn test_median_ignores_row_order() {
        let a = df!("price" => &[Some(5.0), None, Some(1.0), Some(3.0)]).unwrap();
        let b = df!("price" => &[Some(3.0), Some(1.0), None, Some(5.0)]).unwrap();

        let (_, ia) = impute_median(a, "price").unwrap();
        let (_, ib) = impute_median(b, "price").unwrap();
        assert_eq!(ia.unwrap().median, ib.unwrap().median);
    }

    #[test]
    fn test_impute_text_column_keeps_malformed_cells() {
        let df = df!("price" => &[Some("10"), Some("n/a"), None, Some("30")]).unwrap();
        let (df, imputation) = impute_median(df, "price").unwrap();
        assert_eq!(imputation.unwrap().median, 20.0);

        let cells = df.column("price").unwrap().str().unwrap();
        assert_eq!(cells.get(1), Some("n/a"));
        assert_eq!(cells.get(2), Some("20"));
    }

    #[test]
    fn test_impute_absent_column_is_noop() {
        let df = df!("model" => &["Civic"]).unwrap();
        let (df, imputation) = impute_median(df, "price_in_thousands").unwrap();
        assert!(imputation.is_none());
        assert_eq!(df.width(), 1);
    }

    #[test]
    fn test_coerce_leaves_malformed_values_missing() {
        let df = df!(
            "sales" => &[Some("10"), Some("abc"), Some("2.5")],
            "price" => &[Some("1"), Some("2"), Some("x")],
        )
        .unwrap();
        let columns = vec!["sales".to_string(), "price".to_string(), "absent".to_string()];
        let (df, failures) = coerce_numeric(df, &columns).unwrap();

        assert_eq!(failures, vec![("sales".to_string(), 1), ("price".to_string(), 1)]);
        let sales = df.column("sales").unwrap();
        assert_eq!(sales.dtype(), &DataType::Float64);
        assert_eq!(sales.f64().unwrap().get(1), None);
        assert_eq!(sales.f64().unwrap().get(2), Some(2.5));
    }

    #[test]
    fn test_clean_end_to_end() {
        let cleaner = Cleaner::new(CleaningPolicy::default());
        let (df, report) = cleaner.clean(raw_frame()).unwrap();

        assert_eq!(report.column_names, vec!["model", "sales_in_thousands", "price_in_thousands"]);
        assert_eq!(report.rows_before, 5);
        assert_eq!(report.rows_dropped, Some(2));
        assert_eq!(report.shape, (3, 3));
        assert_eq!(df.height(), 5 - 2);
        assert!(report.missing_per_column.iter().all(|(_, n)| *n == 0));
        assert!(report.to_string().contains("Shape after cleaning: (3, 3)"));
    }

    #[test]
    fn test_clean_without_measure_column_succeeds() {
        let df = df!("Model" => &["Civic", "Golf"], "Price" => &[Some(1.0), None]).unwrap();
        let policy = CleaningPolicy {
            price_column: "price".to_string(),
            ..CleaningPolicy::default()
        };
        let (df, report) = Cleaner::new(policy).clean(df).unwrap();

        assert_eq!(report.rows_dropped, None);
        assert_eq!(df.height(), 2);
        assert_eq!(report.imputation.map(|i| i.median), Some(1.0));
    }

    #[test]
    fn test_missing_tokens_are_dropped_and_imputed() {
        let dir = tempfile::tempdir().unwrap();
        let raw = dir.path().join("Car_sales.csv");
        let cleaned = dir.path().join("Car_sales_cleaned.csv");
        std::fs::write(
            &raw,
            "Model,Sales in thousands,Price in thousands\nCivic,10,NA\nGolf,NA,20\nFocus,5,30\n",
        )
        .unwrap();

        let report = Cleaner::new(CleaningPolicy::default()).clean_file(&raw, &cleaned).unwrap();
        assert_eq!(report.rows_dropped, Some(1));
        assert_eq!(
            report.imputation,
            Some(Imputation {
                column: "price_in_thousands".to_string(),
                median: 30.0,
                filled: 1,
            })
        );
        assert!(report.missing_per_column.iter().all(|(_, n)| *n == 0));

        let written = load_table(&cleaned).unwrap();
        assert_eq!(written.height(), 2);
    }
}
