//! Chart export
//!
//! Static PNG charts are the required deliverable; interactive HTML charts
//! are optional and may be missing at runtime. `ChartExporter` runs the
//! static renderer first and lets its errors propagate, then runs the
//! interactive renderer, if any, turning each failure into a warning.

pub mod interactive;
pub mod static_png;

pub use interactive::PlotlyHtmlRenderer;
pub use static_png::PngRenderer;

use crate::aggregate::Ranking;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChartKind {
    Bar,
    Pie,
}

impl ChartKind {
    pub const ALL: [ChartKind; 2] = [ChartKind::Bar, ChartKind::Pie];

    pub fn slug(&self) -> &'static str {
        match self {
            ChartKind::Bar => "bar",
            ChartKind::Pie => "pie",
        }
    }
}

/// Everything a renderer needs to draw one chart
#[derive(Debug, Clone, Copy)]
pub struct ChartRequest<'a> {
    pub kind: ChartKind,
    pub ranking: &'a Ranking,
    /// Axis/legend label for the entity values
    pub entity_label: &'a str,
}

pub trait ChartRenderer {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// File name of the artifact for `kind`, relative to the output directory
    fn file_name(&self, kind: ChartKind, top_n: usize) -> String;

    fn render(&self, request: &ChartRequest<'_>, path: &Path) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ArtifactStatus {
    Saved,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artifact {
    pub kind: ChartKind,
    pub renderer: String,
    pub path: PathBuf,
    pub status: ArtifactStatus,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExportSummary {
    pub static_artifacts: Vec<Artifact>,
    /// Empty when no interactive renderer is available
    pub interactive_artifacts: Vec<Artifact>,
    pub interactive_enabled: bool,
}

impl ExportSummary {
    pub fn interactive_failures(&self) -> usize {
        self.interactive_artifacts
            .iter()
            .filter(|a| matches!(a.status, ArtifactStatus::Failed(_)))
            .count()
    }
}

pub struct ChartExporter {
    static_renderer: Box<dyn ChartRenderer>,
    interactive_renderer: Option<Box<dyn ChartRenderer>>,
}

impl ChartExporter {
    pub fn new(
        static_renderer: Box<dyn ChartRenderer>,
        interactive_renderer: Option<Box<dyn ChartRenderer>>,
    ) -> Self {
        Self {
            static_renderer,
            interactive_renderer,
        }
    }

    /// PNG charts plus, when `interactive` is set, the HTML charts
    pub fn standard(interactive: bool) -> Self {
        let interactive_renderer: Option<Box<dyn ChartRenderer>> = if interactive {
            Some(Box::new(PlotlyHtmlRenderer::default()))
        } else {
            None
        };
        Self::new(Box::new(PngRenderer::default()), interactive_renderer)
    }

    pub fn export(&self, ranking: &Ranking, entity_label: &str, out_dir: &Path) -> Result<ExportSummary> {
        fs::create_dir_all(out_dir)?;
        let mut summary = ExportSummary {
            interactive_enabled: self.interactive_renderer.is_some(),
            ..ExportSummary::default()
        };

        for kind in ChartKind::ALL {
            let request = ChartRequest { kind, ranking, entity_label };
            let path = out_dir.join(self.static_renderer.file_name(kind, ranking.limit));
            self.static_renderer.render(&request, &path)?;
            info!("saved {} {} chart: {}", self.static_renderer.name(), kind.slug(), path.display());
            summary.static_artifacts.push(Artifact {
                kind,
                renderer: self.static_renderer.name().to_string(),
                path,
                status: ArtifactStatus::Saved,
            });
        }

        let renderer = match &self.interactive_renderer {
            Some(r) => r,
            None => {
                info!("interactive charts disabled");
                return Ok(summary);
            }
        };

        for kind in ChartKind::ALL {
            let request = ChartRequest { kind, ranking, entity_label };
            let path = out_dir.join(renderer.file_name(kind, ranking.limit));
            let status = match renderer.render(&request, &path) {
                Ok(()) => {
                    info!("saved {} {} chart: {}", renderer.name(), kind.slug(), path.display());
                    ArtifactStatus::Saved
                }
                Err(e) => {
                    warn!("{} {} chart not created: {}", renderer.name(), kind.slug(), e);
                    ArtifactStatus::Failed(e.to_string())
                }
            };
            summary.interactive_artifacts.push(Artifact {
                kind,
                renderer: renderer.name().to_string(),
                path,
                status,
            });
        }

        Ok(summary)
    }
}
