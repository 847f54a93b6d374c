//! PNG bar and pie charts drawn with plotters

use super::{ChartKind, ChartRenderer, ChartRequest};
use crate::aggregate::Ranking;
use crate::error::{AnalyzerError, Result};
use plotters::prelude::*;
use std::error::Error;
use std::f64::consts::PI;
use std::path::Path;

pub const BAR_Y_LABEL: &str = "Sales (units or value depending on your dataset)";

/// Angle of the first wedge edge, counter-clockwise from 3 o'clock
pub const PIE_START_DEGREES: f64 = 140.0;

type DrawResult = std::result::Result<(), Box<dyn Error>>;

#[derive(Debug, Clone)]
pub struct PngRenderer {
    pub bar_size: (u32, u32),
    pub pie_size: (u32, u32),
}

impl Default for PngRenderer {
    fn default() -> Self {
        Self {
            bar_size: (1800, 900),
            pie_size: (1200, 1200),
        }
    }
}

impl ChartRenderer for PngRenderer {
    fn name(&self) -> &str {
        "png"
    }

    fn file_name(&self, kind: ChartKind, top_n: usize) -> String {
        format!("top_{}_{}.png", top_n, kind.slug())
    }

    fn render(&self, request: &ChartRequest<'_>, path: &Path) -> Result<()> {
        let drawn = match request.kind {
            ChartKind::Bar => draw_bar(request.ranking, request.entity_label, path, self.bar_size),
            ChartKind::Pie => draw_pie(request.ranking, path, self.pie_size),
        };
        drawn.map_err(|e| AnalyzerError::Chart(format!("{}: {}", path.display(), e)))
    }
}

/// Half the width of a bar, in slots
const BAR_HALF_WIDTH: f64 = 0.4;

/// Label for the x value `v` when it sits on a slot centre
fn slot_label(labels: &[String], v: f64) -> String {
    let slot = v.round();
    if (v - slot).abs() > 1e-6 || slot < 0.0 {
        return String::new();
    }
    labels.get(slot as usize).cloned().unwrap_or_default()
}

fn draw_bar(ranking: &Ranking, entity_label: &str, path: &Path, size: (u32, u32)) -> DrawResult {
    let root = BitMapBackend::new(path, size).into_drawing_area();
    root.fill(&WHITE)?;

    let labels = ranking.labels();
    let totals = ranking.totals();
    let high = totals.iter().copied().fold(0.0_f64, f64::max);
    let low = totals.iter().copied().fold(0.0_f64, f64::min);
    let y_range = (if low < 0.0 { low * 1.1 } else { 0.0 })..(if high > 0.0 { high * 1.1 } else { 1.0 });

    // One unit per entity, centred on its index
    let slots = labels.len().max(1);
    let x_range = -0.5..(slots as f64 - 0.5);

    let mut chart = ChartBuilder::on(&root)
        .caption(format!("Top {} Car Models by Sales", ranking.limit), ("sans-serif", 36))
        .margin(20)
        .x_label_area_size(160)
        .y_label_area_size(90)
        .build_cartesian_2d(x_range, y_range)?;

    let formatter = |v: &f64| slot_label(&labels, *v);
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(slots)
        .x_label_formatter(&formatter)
        .x_label_style(("sans-serif", 16).into_font().transform(FontTransform::Rotate90))
        .x_desc(entity_label)
        .y_desc(BAR_Y_LABEL)
        .draw()?;

    if ranking.is_empty() {
        let (w, h) = root.dim_in_pixel();
        root.draw(&Text::new(
            "No sales to chart",
            (w as i32 / 2 - 100, h as i32 / 2),
            ("sans-serif", 28).into_font(),
        ))?;
    }

    chart.draw_series(totals.iter().enumerate().map(|(i, total)| {
        let x = i as f64;
        Rectangle::new(
            [(x - BAR_HALF_WIDTH, 0.0), (x + BAR_HALF_WIDTH, *total)],
            BLUE.mix(0.8).filled(),
        )
    }))?;

    root.present()?;
    Ok(())
}

/// One wedge of the pie, angles in degrees
#[derive(Debug, Clone, PartialEq)]
pub struct PieSlice {
    pub label: String,
    pub share: f64,
    pub start_degrees: f64,
    pub sweep_degrees: f64,
}

/// Lay out wedges for the positive totals, counter-clockwise from
/// `PIE_START_DEGREES`. Entities with a non-positive total get no wedge.
pub fn pie_slices(ranking: &Ranking) -> Vec<PieSlice> {
    let positive: Vec<_> = ranking.entries.iter().filter(|e| e.total > 0.0).collect();
    let total: f64 = positive.iter().map(|e| e.total).sum();
    if total <= 0.0 {
        return Vec::new();
    }

    let mut start = PIE_START_DEGREES;
    positive
        .into_iter()
        .map(|e| {
            let share = e.total / total;
            let slice = PieSlice {
                label: e.entity.clone(),
                share,
                start_degrees: start,
                sweep_degrees: share * 360.0,
            };
            start += slice.sweep_degrees;
            slice
        })
        .collect()
}

/// Pixel position at `radius` and `degrees` around `center`; screen y grows downwards
fn polar(center: (i32, i32), radius: f64, degrees: f64) -> (i32, i32) {
    let rad = degrees * PI / 180.0;
    (
        center.0 + (radius * rad.cos()).round() as i32,
        center.1 - (radius * rad.sin()).round() as i32,
    )
}

/// Outline of a wedge as a polygon: the centre followed by points on the arc
pub fn wedge_points(center: (i32, i32), radius: f64, slice: &PieSlice) -> Vec<(i32, i32)> {
    let steps = ((slice.sweep_degrees / 2.0).ceil() as usize).max(1);
    let mut points = Vec::with_capacity(steps + 2);
    points.push(center);
    for step in 0..=steps {
        let deg = slice.start_degrees + slice.sweep_degrees * step as f64 / steps as f64;
        points.push(polar(center, radius, deg));
    }
    points
}

fn draw_pie(ranking: &Ranking, path: &Path, size: (u32, u32)) -> DrawResult {
    let root = BitMapBackend::new(path, size).into_drawing_area();
    root.fill(&WHITE)?;
    let title = format!("Sales distribution - Top {} Models", ranking.limit);
    let root = root.titled(&title, ("sans-serif", 36))?;

    let (w, h) = root.dim_in_pixel();
    let center = (w as i32 / 2, h as i32 / 2);
    let radius = f64::from(w.min(h)) * 0.32;

    let slices = pie_slices(ranking);
    if slices.is_empty() {
        root.draw(&Text::new(
            "No positive sales to chart",
            (center.0 - 160, center.1),
            ("sans-serif", 28).into_font(),
        ))?;
        root.present()?;
        return Ok(());
    }

    for (idx, slice) in slices.iter().enumerate() {
        root.draw(&Polygon::new(
            wedge_points(center, radius, slice),
            Palette99::pick(idx).filled(),
        ))?;
    }

    for slice in &slices {
        let mid = slice.start_degrees + slice.sweep_degrees / 2.0;
        root.draw(&Text::new(
            slice.label.clone(),
            polar(center, radius * 1.12, mid),
            ("sans-serif", 18).into_font(),
        ))?;
        root.draw(&Text::new(
            format!("{:.1}%", slice.share * 100.0),
            polar(center, radius * 0.6, mid),
            ("sans-serif", 16).into_font(),
        ))?;
    }

    root.present()?;
    Ok(())
}
