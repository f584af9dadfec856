use hll_estimator::sweep::SweepReport;
use plotters::prelude::*;
use std::path::Path;

const ESTIMATE_COLOR: RGBColor = RGBColor(31, 119, 180); // blue
const ERROR_COLOR: RGBColor = RGBColor(214, 39, 40); // red

/// Draws the sweep as two charts side by side: the estimate against the true
/// cardinality, and the relative error in percent.
pub fn plot_errors(report: &SweepReport, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let max_n = report
        .rows
        .iter()
        .map(|row| row.expected)
        .max()
        .unwrap_or(1) as f64;
    let max_estimate = report
        .rows
        .iter()
        .map(|row| row.actual as f64)
        .fold(max_n, f64::max);
    let error_bound = report.max_abs_error.max(1.0) * 1.1;

    let root = BitMapBackend::new(path, (1600, 800)).into_drawing_area();
    root.fill(&WHITE)?;

    let areas = root.split_evenly((1, 2));

    let mut estimates = ChartBuilder::on(&areas[0])
        .caption("Estimate", ("sans-serif", 32).into_font())
        .margin(15)
        .x_label_area_size(50)
        .y_label_area_size(80)
        .build_cartesian_2d(0f64..max_n, 0f64..max_estimate * 1.05)?;

    estimates
        .configure_mesh()
        .x_desc("n")
        .y_desc("estimate")
        .label_style(("sans-serif", 18))
        .draw()?;

    // perfect counter, y = x
    estimates.draw_series(LineSeries::new(
        vec![(0.0, 0.0), (max_n, max_n)],
        ShapeStyle::from(&BLACK).stroke_width(2),
    ))?;
    estimates.draw_series(LineSeries::new(
        report
            .rows
            .iter()
            .map(|row| (row.expected as f64, row.actual as f64)),
        ESTIMATE_COLOR.stroke_width(2),
    ))?;

    let mut errors = ChartBuilder::on(&areas[1])
        .caption("Relative error (%)", ("sans-serif", 32).into_font())
        .margin(15)
        .x_label_area_size(50)
        .y_label_area_size(80)
        .build_cartesian_2d(0f64..max_n, -error_bound..error_bound)?;

    errors
        .configure_mesh()
        .x_desc("n")
        .y_desc("error (%)")
        .label_style(("sans-serif", 18))
        .draw()?;

    errors
        .draw_series(LineSeries::new(
            report.rows.iter().map(|row| (row.expected as f64, row.error)),
            ERROR_COLOR.stroke_width(1),
        ))?
        .label(format!("max |error| {:.3}%", report.max_abs_error))
        .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 30, y)], ERROR_COLOR.stroke_width(3)));

    errors
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .label_font(("sans-serif", 18))
        .border_style(BLACK)
        .background_style(WHITE.mix(0.8))
        .draw()?;

    root.present()?;
    tracing::info!(path = %path.display(), "plot saved");

    Ok(())
}
