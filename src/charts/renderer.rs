//! Static Chart Renderer
//! Renders the nominal vs real income chart to a PNG file with plotters.
//!
//! Layout:
//! 1. Caption naming the state, centered
//! 2. Line chart with markers, x = year, y = income in dollars
//! 3. Legend in the upper left: Nominal, Real ({base_year}$)

use crate::charts::plotter::format_dollars;
use crate::charts::ChartData;
use plotters::prelude::*;
use std::path::Path;
use thiserror::Error;
use tracing::info;

const NOMINAL: RGBColor = RGBColor(52, 152, 219);
const REAL: RGBColor = RGBColor(231, 76, 60);

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("No chart data to render")]
    NoData,
    #[error("Failed to draw chart: {0}")]
    Draw(String),
}

pub struct StaticChartRenderer;

impl StaticChartRenderer {
    /// Render the chart to a PNG file.
    pub fn render_png(
        data: &ChartData,
        path: &Path,
        width: u32,
        height: u32,
    ) -> Result<(), RenderError> {
        let (x_min, x_max) = data.x_range().ok_or(RenderError::NoData)?;
        let (y_min, y_max) = data.y_range().ok_or(RenderError::NoData)?;
        let (x_min, x_max) = Self::pad_years(x_min, x_max);

        let root = BitMapBackend::new(path, (width, height)).into_drawing_area();
        root.fill(&WHITE).map_err(Self::draw_error)?;

        let mut chart = ChartBuilder::on(&root)
            .caption(
                format!("{} — Nominal vs Real Income", data.state),
                ("sans-serif", 26),
            )
            .margin(20)
            .x_label_area_size(40)
            .y_label_area_size(90)
            .build_cartesian_2d(x_min..x_max, y_min..y_max)
            .map_err(Self::draw_error)?;

        let x_labels = ((x_max - x_min).round() as usize + 1).min(12);
        chart
            .configure_mesh()
            .x_desc("Year")
            .y_desc("Income")
            .x_labels(x_labels)
            .x_label_formatter(&|x| {
                if x.fract().abs() < 1e-9 {
                    format!("{x:.0}")
                } else {
                    String::new()
                }
            })
            .y_label_formatter(&|y| format_dollars(*y))
            .draw()
            .map_err(Self::draw_error)?;

        let series = [
            (data.nominal_label().to_string(), &data.nominal, NOMINAL),
            (data.real_label(), &data.real, REAL),
        ];

        for (name, points, color) in series {
            if points.is_empty() {
                continue;
            }
            let coords: Vec<(f64, f64)> = points.iter().map(|[x, y]| (*x, *y)).collect();

            chart
                .draw_series(LineSeries::new(coords.clone(), color.stroke_width(2)))
                .map_err(Self::draw_error)?
                .label(name)
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2)));

            chart
                .draw_series(coords.into_iter().map(|c| Circle::new(c, 4, color.filled())))
                .map_err(Self::draw_error)?;
        }

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperLeft)
            .background_style(WHITE.mix(0.85))
            .border_style(BLACK)
            .draw()
            .map_err(Self::draw_error)?;

        root.present().map_err(Self::draw_error)?;
        info!(path = %path.display(), "rendered chart image");
        Ok(())
    }

    /// Half a year of padding on each side so end markers are not clipped.
    fn pad_years(min: f64, max: f64) -> (f64, f64) {
        (min - 0.5, max + 0.5)
    }

    fn draw_error<E: std::fmt::Display>(e: E) -> RenderError {
        RenderError::Draw(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_chart_is_rejected_before_drawing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.png");

        let err = StaticChartRenderer::render_png(&ChartData::default(), &path, 800, 500).unwrap_err();
        assert!(matches!(err, RenderError::NoData));
        assert!(!path.exists());
    }

    #[test]
    fn single_year_gets_a_visible_x_range() {
        assert_eq!(StaticChartRenderer::pad_years(2017.0, 2017.0), (2016.5, 2017.5));
    }
}
