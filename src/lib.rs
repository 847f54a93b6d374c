pub mod aggregate;
pub mod charts;
pub mod clean;
pub mod config;
pub mod error;
pub mod inference;
pub mod inspect;
pub mod pipeline;
pub mod table;

pub use aggregate::{aggregate_by_entity, sanitize_measure, sanitize_measure_value, RankedEntity, Ranking};
pub use charts::{ChartExporter, ChartKind, ChartRenderer, ChartRequest, ExportSummary};
pub use clean::{Cleaner, CleaningReport};
pub use config::{AnalyzerConfig, CleaningPolicy, InferenceConfig};
pub use error::{AnalyzerError, Result};
pub use inference::{infer_columns, InferenceChain, InferenceMatch, InferredColumns};
pub use inspect::{InspectionReport, Inspector};
pub use pipeline::{analyze, run_plot, DatasetSource, PlotOutcome, SalesAnalysis};
