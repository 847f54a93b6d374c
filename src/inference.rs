//! Column Inference - pick the entity and measure columns of an unknown schema
//!
//! Each role is resolved by an ordered chain of predicates: every candidate
//! name from the configuration, then a value-kind fallback. The first
//! predicate that matches a column wins; a chain that matches nothing yields
//! an explicit `NoMatch`.
//!
//! Known limitation: when several non-candidate columns have the fallback
//! kind, the leftmost one is taken with no further disambiguation.

use crate::config::InferenceConfig;
use crate::error::{AnalyzerError, Result};
use crate::table::{column_names, ValueKind};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnRole {
    Entity,
    Measure,
}

/// One test applied to the frame's columns
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnPredicate {
    /// A column with exactly this (normalized) name
    Named(String),
    /// The first column, left to right, of this kind
    FirstOfKind(ValueKind),
}

impl ColumnPredicate {
    fn find(&self, df: &DataFrame) -> Option<String> {
        match self {
            ColumnPredicate::Named(name) => df.column(name).ok().map(|_| name.clone()),
            ColumnPredicate::FirstOfKind(kind) => df
                .get_columns()
                .iter()
                .find(|s| ValueKind::of(s.dtype()) == *kind)
                .map(|s| s.name().to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InferenceMatch {
    Found {
        column: String,
        /// The predicate that produced the match
        via: ColumnPredicate,
    },
    NoMatch,
}

#[derive(Debug, Clone)]
pub struct InferenceChain {
    pub role: ColumnRole,
    pub predicates: Vec<ColumnPredicate>,
}

impl InferenceChain {
    pub fn new(role: ColumnRole, candidates: &[String], fallback: ValueKind) -> Self {
        let mut predicates: Vec<ColumnPredicate> = candidates
            .iter()
            .map(|c| ColumnPredicate::Named(c.clone()))
            .collect();
        predicates.push(ColumnPredicate::FirstOfKind(fallback));
        Self { role, predicates }
    }

    /// Candidate names, then the first text column
    pub fn entity(config: &InferenceConfig) -> Self {
        Self::new(ColumnRole::Entity, &config.entity_candidates, ValueKind::Text)
    }

    /// Candidate names, then the first numeric column
    pub fn measure(config: &InferenceConfig) -> Self {
        Self::new(ColumnRole::Measure, &config.measure_candidates, ValueKind::Numeric)
    }

    pub fn resolve(&self, df: &DataFrame) -> InferenceMatch {
        for predicate in &self.predicates {
            if let Some(column) = predicate.find(df) {
                return InferenceMatch::Found {
                    column,
                    via: predicate.clone(),
                };
            }
        }
        InferenceMatch::NoMatch
    }
}

/// The resolved pair of columns the aggregation runs on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InferredColumns {
    pub entity: String,
    pub measure: String,
    pub entity_by_fallback: bool,
    pub measure_by_fallback: bool,
}

/// Resolve both roles. Either chain ending in `NoMatch` is fatal.
pub fn infer_columns(df: &DataFrame, config: &InferenceConfig) -> Result<InferredColumns> {
    let (entity, entity_by_fallback) = match InferenceChain::entity(config).resolve(df) {
        InferenceMatch::Found { column, via } => (column, is_fallback(&via)),
        InferenceMatch::NoMatch => {
            return Err(AnalyzerError::EntityColumnNotFound {
                available: column_names(df),
            })
        }
    };
    let (measure, measure_by_fallback) = match InferenceChain::measure(config).resolve(df) {
        InferenceMatch::Found { column, via } => (column, is_fallback(&via)),
        InferenceMatch::NoMatch => {
            return Err(AnalyzerError::MeasureColumnNotFound {
                available: column_names(df),
            })
        }
    };

    info!(
        "using entity column '{}'{} and measure column '{}'{}",
        entity,
        if entity_by_fallback { " (type fallback)" } else { "" },
        measure,
        if measure_by_fallback { " (type fallback)" } else { "" },
    );

    Ok(InferredColumns {
        entity,
        measure,
        entity_by_fallback,
        measure_by_fallback,
    })
}

fn is_fallback(predicate: &ColumnPredicate) -> bool {
    matches!(predicate, ColumnPredicate::FirstOfKind(_))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_names_win_in_list_order() {
        let df = df!(
            "name" => &["a"],
            "car_model" => &["b"],
            "units_sold" => &[1i64],
            "sales_in_thousands" => &[2.0],
        )
        .unwrap();

        let inferred = infer_columns(&df, &InferenceConfig::default()).unwrap();
        // car_model precedes name in the candidate list even though it is further right
        assert_eq!(inferred.entity, "car_model");
        assert_eq!(inferred.measure, "sales_in_thousands");
        assert!(!inferred.entity_by_fallback);
        assert!(!inferred.measure_by_fallback);
    }

    #[test]
    fn test_entity_type_fallback_picks_brand() {
        let df = df!(
            "year" => &[2020i64],
            "brand" => &["Honda"],
            "sales" => &[10.0],
        )
        .unwrap();

        let chain = InferenceChain::entity(&InferenceConfig::default());
        assert_eq!(
            chain.resolve(&df),
            InferenceMatch::Found {
                column: "brand".to_string(),
                via: ColumnPredicate::FirstOfKind(ValueKind::Text),
            }
        );

        let inferred = infer_columns(&df, &InferenceConfig::default()).unwrap();
        assert_eq!(inferred.entity, "brand");
        assert!(inferred.entity_by_fallback);
    }

    #[test]
    fn test_measure_type_fallback_takes_first_numeric() {
        let df = df!(
            "model" => &["Civic"],
            "revenue" => &[5.0],
            "units" => &[3i64],
        )
        .unwrap();

        let inferred = infer_columns(&df, &InferenceConfig::default()).unwrap();
        assert_eq!(inferred.measure, "revenue");
        assert!(inferred.measure_by_fallback);
    }

    #[test]
    fn test_no_entity_column() {
        let df = df!("a" => &[1.0], "b" => &[2i64]).unwrap();
        let err = infer_columns(&df, &InferenceConfig::default()).unwrap_err();
        assert!(matches!(err, AnalyzerError::EntityColumnNotFound { .. }));
    }

    #[test]
    fn test_no_measure_column() {
        let df = df!("brand" => &["Honda"], "country" => &["JP"]).unwrap();
        assert_eq!(
            InferenceChain::measure(&InferenceConfig::default()).resolve(&df),
            InferenceMatch::NoMatch
        );
        let err = infer_columns(&df, &InferenceConfig::default()).unwrap_err();
        assert!(matches!(err, AnalyzerError::MeasureColumnNotFound { .. }));
    }

    #[test]
    fn test_custom_candidates() {
        let config = InferenceConfig {
            entity_candidates: vec!["trim".to_string()],
            measure_candidates: vec!["volume".to_string()],
        };
        let df = df!(
            "model" => &["Civic"],
            "trim" => &["EX"],
            "sales" => &[1.0],
            "volume" => &[2.0],
        )
        .unwrap();

        let inferred = infer_columns(&df, &config).unwrap();
        assert_eq!(inferred.entity, "trim");
        assert_eq!(inferred.measure, "volume");
    }

    #[test]
    fn test_chain_order() {
        let chain = InferenceChain::measure(&InferenceConfig::default());
        assert_eq!(chain.role, ColumnRole::Measure);
        assert_eq!(chain.predicates.len(), 7);
        assert_eq!(chain.predicates[0], ColumnPredicate::Named("sales".to_string()));
        assert_eq!(chain.predicates[6], ColumnPredicate::FirstOfKind(ValueKind::Numeric));
    }
}
