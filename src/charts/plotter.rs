//! Chart Plotter Module
//! Interactive nominal vs real income chart and ranking tables using egui_plot.

use crate::data::{REAL_INCOME, VALUE, YEAR};
use crate::stats::StateGrowth;
use egui::{Color32, RichText};
use egui_plot::{Legend, Line, Plot, PlotPoints, Points};
use polars::prelude::*;

/// Line colors
pub const NOMINAL_COLOR: Color32 = Color32::from_rgb(52, 152, 219); // Blue
pub const REAL_COLOR: Color32 = Color32::from_rgb(231, 76, 60); // Red
pub const POSITIVE_COLOR: Color32 = Color32::from_rgb(40, 167, 69);
pub const NEGATIVE_COLOR: Color32 = Color32::from_rgb(220, 53, 69);

/// Points of the selected state's nominal and real income, x = year.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChartData {
    pub state: String,
    pub base_year: i32,
    pub nominal: Vec<[f64; 2]>,
    /// Years without a CPI index are absent
    pub real: Vec<[f64; 2]>,
}

impl ChartData {
    /// Extract chart points from a state series frame.
    pub fn from_series(df: &DataFrame, state: &str, base_year: i32) -> PolarsResult<Self> {
        let years = df.column(YEAR)?.i32()?;
        let nominal = df.column(VALUE)?.f64()?;
        let real = df.column(REAL_INCOME)?.f64()?;

        let mut data = ChartData {
            state: state.to_string(),
            base_year,
            ..Default::default()
        };

        for ((year, nominal), real) in years.into_iter().zip(nominal).zip(real) {
            let Some(year) = year else { continue };
            if let Some(v) = nominal {
                data.nominal.push([year as f64, v]);
            }
            if let Some(v) = real.filter(|v| v.is_finite()) {
                data.real.push([year as f64, v]);
            }
        }

        Ok(data)
    }

    pub fn is_empty(&self) -> bool {
        self.nominal.is_empty() && self.real.is_empty()
    }

    pub fn nominal_label(&self) -> &'static str {
        "Nominal"
    }

    pub fn real_label(&self) -> String {
        format!("Real ({}$)", self.base_year)
    }

    /// Min and max over both series, padded by 10% (or 1.0 for a flat line).
    pub fn y_range(&self) -> Option<(f64, f64)> {
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for [_, y] in self.nominal.iter().chain(&self.real) {
            min = min.min(*y);
            max = max.max(*y);
        }
        if !min.is_finite() {
            return None;
        }
        let pad = if max > min { (max - min) * 0.1 } else { 1.0 };
        Some((min - pad, max + pad))
    }

    /// Min and max year.
    pub fn x_range(&self) -> Option<(f64, f64)> {
        let years = self.nominal.iter().chain(&self.real).map(|[x, _]| *x);
        let min = years.clone().fold(f64::INFINITY, f64::min);
        let max = years.fold(f64::NEG_INFINITY, f64::max);
        min.is_finite().then_some((min, max))
    }
}

/// Format a dollar amount with thousands separators.
pub fn format_dollars(value: f64) -> String {
    let rounded = value.round() as i64;
    let digits = rounded.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if rounded < 0 {
        format!("-${grouped}")
    } else {
        format!("${grouped}")
    }
}

/// Draws the dashboard's charts and tables.
pub struct ChartPlotter;

impl ChartPlotter {
    /// Draw the nominal vs real line chart with markers.
    pub fn draw_income_chart(ui: &mut egui::Ui, chart_data: &ChartData, height: f32) {
        Plot::new(format!("income_{}", chart_data.state))
            .height(height)
            .legend(Legend::default())
            .x_axis_label("Year")
            .y_axis_label("Income")
            .allow_scroll(false)
            .x_axis_formatter(|mark, _range| {
                if mark.value.fract().abs() < f64::EPSILON {
                    format!("{:.0}", mark.value)
                } else {
                    String::new()
                }
            })
            .y_axis_formatter(|mark, _range| format_dollars(mark.value))
            .label_formatter(|name, value| {
                if name.is_empty() {
                    format!("{:.0}\n{}", value.x, format_dollars(value.y))
                } else {
                    format!("{}\n{:.0}: {}", name, value.x, format_dollars(value.y))
                }
            })
            .show(ui, |plot_ui| {
                let series = [
                    (chart_data.nominal_label().to_string(), &chart_data.nominal, NOMINAL_COLOR),
                    (chart_data.real_label(), &chart_data.real, REAL_COLOR),
                ];

                for (name, points, color) in series {
                    if points.is_empty() {
                        continue;
                    }
                    plot_ui.line(
                        Line::new(PlotPoints::from_iter(points.iter().copied()))
                            .color(color)
                            .width(2.0)
                            .name(&name),
                    );
                    plot_ui.points(
                        Points::new(PlotPoints::from_iter(points.iter().copied()))
                            .radius(3.5)
                            .color(color)
                            .name(&name),
                    );
                }
            });
    }

    /// Draw a growth ranking table.
    pub fn draw_growth_table(ui: &mut egui::Ui, id: &str, rows: &[StateGrowth]) {
        egui::Frame::none()
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .rounding(5.0)
            .inner_margin(8.0)
            .show(ui, |ui| {
                if rows.is_empty() {
                    ui.label(RichText::new("No states with two or more years").color(Color32::GRAY));
                    return;
                }

                egui::Grid::new(ui.make_persistent_id(format!("growth_table_{id}")))
                    .striped(true)
                    .min_col_width(55.0)
                    .spacing([10.0, 4.0])
                    .show(ui, |ui| {
                        for header in ["#", "State", "Growth %", "CAGR %", "Years", "First", "Last"] {
                            ui.label(RichText::new(header).strong().size(11.0));
                        }
                        ui.end_row();

                        for (i, g) in rows.iter().enumerate() {
                            let color = if g.growth_pct >= 0.0 {
                                POSITIVE_COLOR
                            } else {
                                NEGATIVE_COLOR
                            };

                            ui.label(RichText::new((i + 1).to_string()).size(11.0));
                            ui.label(RichText::new(&g.state).size(11.0).strong());
                            ui.label(
                                RichText::new(format!("{:+.2}", g.growth_pct))
                                    .size(11.0)
                                    .color(color),
                            );
                            ui.label(
                                RichText::new(
                                    g.cagr_pct
                                        .map(|c| format!("{c:+.2}"))
                                        .unwrap_or_else(|| "-".to_string()),
                                )
                                .size(11.0),
                            );
                            ui.label(
                                RichText::new(format!("{}-{}", g.first_year, g.last_year)).size(11.0),
                            );
                            ui.label(RichText::new(format_dollars(g.first_real)).size(11.0));
                            ui.label(RichText::new(format_dollars(g.last_real)).size(11.0));
                            ui.end_row();
                        }
                    });
            });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_points_and_skips_missing_real_values() {
        let df = df!(
            YEAR => [2016i32, 2017, 2018],
            VALUE => [48000.0f64, 50000.0, 53000.0],
            REAL_INCOME => [Some(50000.0f64), Some(50000.0), None],
        )
        .unwrap();

        let chart = ChartData::from_series(&df, "MD", 2017).unwrap();
        assert_eq!(chart.nominal.len(), 3);
        assert_eq!(chart.real, vec![[2016.0, 50000.0], [2017.0, 50000.0]]);
        assert_eq!(chart.real_label(), "Real (2017$)");
        assert_eq!(chart.x_range(), Some((2016.0, 2018.0)));
    }

    #[test]
    fn y_range_pads_both_series() {
        let chart = ChartData {
            state: "MD".into(),
            base_year: 2017,
            nominal: vec![[2016.0, 100.0], [2017.0, 200.0]],
            real: vec![[2016.0, 150.0]],
        };
        assert_eq!(chart.y_range(), Some((90.0, 210.0)));
        assert_eq!(ChartData::default().y_range(), None);
    }

    #[test]
    fn formats_dollars_with_separators() {
        assert_eq!(format_dollars(0.0), "$0");
        assert_eq!(format_dollars(999.4), "$999");
        assert_eq!(format_dollars(61234.6), "$61,235");
        assert_eq!(format_dollars(1_234_567.0), "$1,234,567");
        assert_eq!(format_dollars(-1500.0), "-$1,500");
    }
}
