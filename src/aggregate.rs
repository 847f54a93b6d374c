//! Measure sanitization, per-entity aggregation and top-N ranking
//!
//! Unlike the cleaner, nothing here drops a row for a bad measure value:
//! any cell that does not yield a number counts as zero.

use crate::error::Result;
use lazy_static::lazy_static;
use polars::prelude::*;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

lazy_static! {
    static ref NON_NUMERIC_CHARS: Regex =
        Regex::new(r"[^\d\.-]").expect("static pattern compiles");
}

/// Strip everything but digits, `.` and `-`, then parse. Empty, unparseable
/// and non-finite results are all zero, so this never fails.
pub fn sanitize_measure_value(raw: &str) -> f64 {
    let stripped = NON_NUMERIC_CHARS.replace_all(raw, "");
    if stripped.is_empty() {
        return 0.0;
    }
    match stripped.parse::<f64>() {
        Ok(v) if v.is_finite() => v,
        _ => 0.0,
    }
}

/// Apply the lenient policy to a whole column. The result is Float64 with
/// no missing cells. Numeric columns skip the text round trip.
pub fn sanitize_measure(series: &Series) -> Result<Series> {
    let values: Vec<f64> = if series.dtype().is_numeric() {
        series
            .cast(&DataType::Float64)?
            .f64()?
            .into_iter()
            .map(|v| v.filter(|x| x.is_finite()).unwrap_or(0.0))
            .collect()
    } else {
        series
            .cast(&DataType::String)?
            .str()?
            .into_iter()
            .map(|v| v.map(sanitize_measure_value).unwrap_or(0.0))
            .collect()
    };
    Ok(Series::new(series.name(), values))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedEntity {
    pub entity: String,
    pub total: f64,
}

const ENTITY_KEY: &str = "entity";
const TOTAL_KEY: &str = "total";

/// Sum the sanitized measure per exact entity value. Groups come back in
/// ascending key order; rows with a missing entity form no group.
pub fn aggregate_by_entity(df: &DataFrame, entity: &str, measure: &str) -> Result<Vec<RankedEntity>> {
    let keys = df.column(entity)?.cast(&DataType::String)?.with_name(ENTITY_KEY);
    let values = sanitize_measure(df.column(measure)?)?.with_name(TOTAL_KEY);

    let grouped = DataFrame::new(vec![keys, values])?
        .lazy()
        .filter(col(ENTITY_KEY).is_not_null())
        .group_by([col(ENTITY_KEY)])
        .agg([col(TOTAL_KEY).sum()])
        .sort_by_exprs([col(ENTITY_KEY)], SortMultipleOptions::default())
        .collect()?;

    let names = grouped.column(ENTITY_KEY)?.str()?;
    let totals = grouped.column(TOTAL_KEY)?.f64()?;
    Ok(names
        .into_iter()
        .zip(totals.into_iter())
        .filter_map(|(name, total)| {
            name.map(|n| RankedEntity {
                entity: n.to_string(),
                total: total.unwrap_or(0.0),
            })
        })
        .collect())
}

/// Entities ordered by total, descending, at most `limit` long
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ranking {
    pub limit: usize,
    pub entries: Vec<RankedEntity>,
}

impl Ranking {
    /// Stable sort: equal totals keep their incoming order
    pub fn top(mut groups: Vec<RankedEntity>, limit: usize) -> Self {
        groups.sort_by(|a, b| b.total.partial_cmp(&a.total).unwrap_or(std::cmp::Ordering::Equal));
        groups.truncate(limit);
        Self { limit, entries: groups }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn labels(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.entity.clone()).collect()
    }

    pub fn totals(&self) -> Vec<f64> {
        self.entries.iter().map(|e| e.total).collect()
    }
}

impl fmt::Display for Ranking {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self.entries.iter().map(|e| e.entity.len()).max().unwrap_or(0);
        for entry in &self.entries {
            writeln!(f, "{:<width$}  {}", entry.entity, entry.total, width = width)?;
        }
        Ok(())
    }
}
