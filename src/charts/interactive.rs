//! Interactive charts as self-contained HTML documents that load plotly.js
//! from a CDN and embed the ranking as a plotly figure.

use super::{ChartKind, ChartRenderer, ChartRequest};
use crate::error::{AnalyzerError, Result};
use serde_json::{json, Value};
use std::fs;
use std::path::Path;

pub const PLOTLY_CDN: &str = "https://cdn.plot.ly/plotly-2.35.2.min.js";

#[derive(Debug, Clone)]
pub struct PlotlyHtmlRenderer {
    pub script_src: String,
}

impl Default for PlotlyHtmlRenderer {
    fn default() -> Self {
        Self {
            script_src: PLOTLY_CDN.to_string(),
        }
    }
}

impl PlotlyHtmlRenderer {
    /// The plotly figure (`data` + `layout`) for a request
    pub fn figure(&self, request: &ChartRequest<'_>) -> Value {
        let ranking = request.ranking;
        let labels = ranking.labels();
        let totals = ranking.totals();

        match request.kind {
            ChartKind::Bar => json!({
                "data": [{
                    "type": "bar",
                    "x": labels,
                    "y": totals,
                    "name": "sales",
                }],
                "layout": {
                    "title": { "text": format!("Top {} Car Models (interactive)", ranking.limit) },
                    "xaxis": { "title": { "text": request.entity_label } },
                    "yaxis": { "title": { "text": "sales" } },
                },
            }),
            ChartKind::Pie => json!({
                "data": [{
                    "type": "pie",
                    "labels": labels,
                    "values": totals,
                    "textinfo": "percent+label",
                }],
                "layout": {
                    "title": { "text": format!("Top {} Sales Distribution", ranking.limit) },
                },
            }),
        }
    }

    pub fn html(&self, request: &ChartRequest<'_>) -> Result<String> {
        let figure = self.figure(request);
        let title = figure["layout"]["title"]["text"]
            .as_str()
            .unwrap_or("chart")
            .to_string();
        // `</` inside the JSON would end the script element early
        let payload = serde_json::to_string(&figure)?.replace("</", "<\\/");

        Ok(format!(
            r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>{title}</title>
<script src="{src}"></script>
</head>
<body>
<div id="chart" style="width:100%;height:100vh;"></div>
<script>
var figure = {payload};
Plotly.newPlot("chart", figure.data, figure.layout, {{responsive: true}});
</script>
</body>
</html>
"#,
            title = escape_html(&title),
            src = self.script_src,
            payload = payload,
        ))
    }
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

impl ChartRenderer for PlotlyHtmlRenderer {
    fn name(&self) -> &str {
        "plotly"
    }

    fn file_name(&self, kind: ChartKind, top_n: usize) -> String {
        format!("top_{}_{}_plotly.html", top_n, kind.slug())
    }

    fn render(&self, request: &ChartRequest<'_>, path: &Path) -> Result<()> {
        let html = self.html(request)?;
        fs::write(path, html)
            .map_err(|e| AnalyzerError::InteractiveExport(format!("{}: {}", path.display(), e)))
    }
}
