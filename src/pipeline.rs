//! Aggregator run: source selection, inference, ranking, export.
//!
//! The three stages are kept separate so the fatal preconditions
//! (no dataset, no usable columns) are all checked before anything is
//! written to the plots directory.

use crate::aggregate::{aggregate_by_entity, Ranking};
use crate::charts::{ChartExporter, ExportSummary};
use crate::config::AnalyzerConfig;
use crate::error::{AnalyzerError, Result};
use crate::inference::{infer_columns, InferredColumns};
use crate::table::{column_names, load_table, normalize_column_names};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DatasetSource {
    Cleaned(PathBuf),
    Raw(PathBuf),
}

impl DatasetSource {
    /// Prefer the cleaned table, fall back to the raw one
    pub fn locate(cleaned: &Path, raw: &Path) -> Result<Self> {
        if cleaned.is_file() {
            Ok(DatasetSource::Cleaned(cleaned.to_path_buf()))
        } else if raw.is_file() {
            Ok(DatasetSource::Raw(raw.to_path_buf()))
        } else {
            Err(AnalyzerError::DatasetNotFound {
                cleaned: cleaned.to_path_buf(),
                raw: raw.to_path_buf(),
            })
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            DatasetSource::Cleaned(p) | DatasetSource::Raw(p) => p,
        }
    }

    pub fn describe(&self) -> &'static str {
        match self {
            DatasetSource::Cleaned(_) => "cleaned",
            DatasetSource::Raw(_) => "original",
        }
    }
}

/// Everything computed before export
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalesAnalysis {
    pub source: DatasetSource,
    pub columns: Vec<String>,
    pub inferred: InferredColumns,
    pub ranking: Ranking,
}

pub fn analyze(config: &AnalyzerConfig) -> Result<SalesAnalysis> {
    let source = DatasetSource::locate(&config.cleaned_path(), &config.raw_path())?;
    info!("loading {} dataset: {}", source.describe(), source.path().display());

    let df = normalize_column_names(load_table(source.path())?)?;
    let columns = column_names(&df);

    let inferred = infer_columns(&df, &config.inference)?;
    let groups = aggregate_by_entity(&df, &inferred.entity, &inferred.measure)?;
    let ranking = Ranking::top(groups, config.top_n);
    info!("ranked {} of the top {} entities", ranking.len(), config.top_n);

    Ok(SalesAnalysis {
        source,
        columns,
        inferred,
        ranking,
    })
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlotOutcome {
    pub analysis: SalesAnalysis,
    pub export: ExportSummary,
}

/// Analyze then export. Export is only reached once every fatal
/// precondition has passed.
pub fn run_plot(config: &AnalyzerConfig, exporter: &ChartExporter) -> Result<PlotOutcome> {
    let analysis = analyze(config)?;
    let export = exporter.export(&analysis.ranking, &analysis.inferred.entity, &config.plots_dir)?;
    Ok(PlotOutcome { analysis, export })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_locate_prefers_cleaned() {
        let dir = tempfile::tempdir().unwrap();
        let cleaned = dir.path().join("cleaned.csv");
        let raw = dir.path().join("raw.csv");
        fs::write(&raw, "model,sales\nCivic,1\n").unwrap();

        assert_eq!(DatasetSource::locate(&cleaned, &raw).unwrap(), DatasetSource::Raw(raw.clone()));

        fs::write(&cleaned, "model,sales\nCivic,1\n").unwrap();
        assert_eq!(DatasetSource::locate(&cleaned, &raw).unwrap(), DatasetSource::Cleaned(cleaned.clone()));
    }

    #[test]
    fn test_locate_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let err = DatasetSource::locate(&dir.path().join("a.csv"), &dir.path().join("b.csv")).unwrap_err();
        assert!(matches!(err, AnalyzerError::DatasetNotFound { .. }));
    }

    #[test]
    fn test_analyze_raw_with_messy_headers() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("Car_sales.csv"),
            " Model ,Sales\nCivic,10\nCivic,5\nAccord,abc7\n",
        )
        .unwrap();
        let config = AnalyzerConfig {
            data_dir: dir.path().to_path_buf(),
            top_n: 2,
            ..AnalyzerConfig::default()
        };

        let analysis = analyze(&config).unwrap();
        assert!(matches!(analysis.source, DatasetSource::Raw(_)));
        assert_eq!(analysis.columns, vec!["model", "sales"]);
        assert_eq!(analysis.inferred.entity, "model");
        assert_eq!(analysis.inferred.measure, "sales");
        assert_eq!(analysis.ranking.labels(), vec!["Civic", "Accord"]);
        assert_eq!(analysis.ranking.totals(), vec![15.0, 7.0]);
    }
}
