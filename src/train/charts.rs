//! Diagnostic chart rendering for evaluation reports.
//!
//! Charts are drawn as SVG and returned base64-encoded so the report can
//! carry them inline as JSON strings.

use crate::error::PipelineError;
use crate::train::metrics::ConfusionCounts;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use plotters::prelude::*;

const CHART_SIZE: (u32, u32) = (640, 480);

/// Render the accuracy progression line.
///
/// The first two points are fixed illustrative values; only the last point
/// is the measured accuracy. Dashboards expect exactly this 3-point shape.
pub fn accuracy_curve(final_accuracy: f64) -> Result<String, PipelineError> {
    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, CHART_SIZE).into_drawing_area();
        root.fill(&WHITE).map_err(render_err)?;

        let mut chart = ChartBuilder::on(&root)
            .caption("Accuracy (sample curve)", ("sans-serif", 24))
            .margin(10)
            .x_label_area_size(40)
            .y_label_area_size(50)
            .build_cartesian_2d(0.0f64..2.0f64, 0.0f64..1.05f64)
            .map_err(render_err)?;

        chart
            .configure_mesh()
            .x_desc("epoch")
            .y_desc("accuracy")
            .draw()
            .map_err(render_err)?;

        let points = vec![(0.0, 0.6), (1.0, 0.75), (2.0, final_accuracy)];
        chart
            .draw_series(LineSeries::new(points, &BLUE))
            .map_err(render_err)?;

        root.present().map_err(render_err)?;
    }
    Ok(BASE64.encode(svg.as_bytes()))
}

/// Render the confusion breakdown pie over (tp, fp, fn, tn).
///
/// Percentage labels are only drawn when the counts sum to something; a
/// zero total would make the slice angles undefined.
pub fn confusion_pie(counts: &ConfusionCounts) -> Result<String, PipelineError> {
    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, CHART_SIZE).into_drawing_area();
        root.fill(&WHITE).map_err(render_err)?;
        let root = root
            .titled("Confusion breakdown", ("sans-serif", 24))
            .map_err(render_err)?;

        if counts.total() > 0 {
            let dims = root.dim_in_pixel();
            let center = (dims.0 as i32 / 2, dims.1 as i32 / 2);
            let radius = (dims.0.min(dims.1) as f64) * 0.35;
            let sizes = [
                counts.tp as f64,
                counts.fp as f64,
                counts.fn_ as f64,
                counts.tn as f64,
            ];
            let colors = [GREEN, RED, MAGENTA, BLUE];
            let labels = ["TP", "FP", "FN", "TN"];

            let mut pie = Pie::new(&center, &radius, &sizes, &colors, &labels);
            pie.label_style(("sans-serif", 18).into_font().color(&BLACK));
            pie.percentages(("sans-serif", 14).into_font().color(&BLACK));
            root.draw(&pie).map_err(render_err)?;
        }

        root.present().map_err(render_err)?;
    }
    Ok(BASE64.encode(svg.as_bytes()))
}

fn render_err<E: std::fmt::Display>(e: E) -> PipelineError {
    PipelineError::Render(e.to_string())
}
