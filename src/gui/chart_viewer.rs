//! Chart Viewer Widget
//! Central scrollable panel: data check, income chart and growth rankings.

use crate::analysis::{AnalysisError, AnalysisResult};
use crate::charts::{format_dollars, ChartPlotter};
use crate::data::{DatasetSummary, ProcessorError};
use egui::{Color32, RichText, ScrollArea};

const CHART_HEIGHT: f32 = 420.0;
const SECTION_SPACING: f32 = 15.0;

const WARNING_COLOR: Color32 = Color32::from_rgb(243, 156, 18);
const ERROR_COLOR: Color32 = Color32::from_rgb(220, 53, 69);
const SUCCESS_COLOR: Color32 = Color32::from_rgb(40, 167, 69);

/// Scrollable dashboard display area.
pub struct ChartViewer {
    /// Summary of the loaded dataset
    pub summary: Option<DatasetSummary>,
    preferred_income_topic: String,
}

impl ChartViewer {
    pub fn new(preferred_income_topic: &str) -> Self {
        Self {
            summary: None,
            preferred_income_topic: preferred_income_topic.to_string(),
        }
    }

    pub fn set_summary(&mut self, summary: DatasetSummary) {
        self.summary = Some(summary);
    }

    /// Draw the dashboard
    pub fn show(
        &self,
        ui: &mut egui::Ui,
        outcome: Option<&Result<AnalysisResult, AnalysisError>>,
    ) {
        ScrollArea::vertical()
            .auto_shrink([false, false])
            .show(ui, |ui| {
                ui.heading(RichText::new("Real Income by State Explorer").size(26.0).strong());
                ui.label(
                    RichText::new("Upload your cleaned economic dataset to begin")
                        .color(Color32::GRAY),
                );
                ui.add_space(SECTION_SPACING);

                let Some(summary) = &self.summary else {
                    Self::message(
                        ui,
                        "ℹ Please upload cleaned_economic_dataset.xlsx to continue.",
                        Color32::from_rgb(100, 149, 237),
                    );
                    return;
                };

                self.draw_data_check(ui, summary);
                ui.add_space(SECTION_SPACING);

                match outcome {
                    None => {}
                    Some(Err(e)) => {
                        let color = match e {
                            AnalysisError::Processing(ProcessorError::InvalidBaseYear(_)) => {
                                WARNING_COLOR
                            }
                            _ => ERROR_COLOR,
                        };
                        Self::message(ui, &e.to_string(), color);
                    }
                    Some(Ok(result)) => self.draw_result(ui, result),
                }

                ui.add_space(SECTION_SPACING);
                ui.label(
                    RichText::new("No folders. No paths. Just upload and go.")
                        .size(11.0)
                        .color(Color32::GRAY),
                );
            });
    }

    fn draw_data_check(&self, ui: &mut egui::Ui, summary: &DatasetSummary) {
        egui::CollapsingHeader::new(RichText::new("Data check (what's in your file)").strong())
            .default_open(true)
            .show(ui, |ui| {
                ui.label(format!("Topics: {}", summary.sorted_topics().join(", ")));
                ui.label(format!("Geo levels: {}", summary.geo_levels.join(", ")));

                let mut rows = format!("Rows: {}", summary.row_count);
                if summary.dropped_rows > 0 {
                    rows.push_str(&format!(
                        " ({} dropped without a valid date or value)",
                        summary.dropped_rows
                    ));
                }
                if let Some((min, max)) = summary.year_bounds {
                    rows.push_str(&format!(", years {min}-{max}"));
                }
                ui.label(rows);

                let topic = &self.preferred_income_topic;
                if summary.has_preferred_income {
                    ui.label(
                        RichText::new(format!("✅ {topic} is present")).color(SUCCESS_COLOR),
                    );
                } else {
                    ui.label(
                        RichText::new(format!("❌ {topic} is NOT present (BEA data missing)"))
                            .color(ERROR_COLOR),
                    );
                }
            });
    }

    fn draw_result(&self, ui: &mut egui::Ui, result: &AnalysisResult) {
        let state = &result.params.state;
        ui.heading(RichText::new(format!("{state} — Nominal vs Real Income")).strong());

        if result.income_topic != self.preferred_income_topic {
            ui.label(
                RichText::new(format!("Using income topic: {}", result.income_topic))
                    .size(11.0)
                    .color(Color32::GRAY),
            );
        }
        ui.add_space(8.0);

        if result.has_state_data() {
            ChartPlotter::draw_income_chart(ui, &result.chart, CHART_HEIGHT);
        } else {
            Self::message(ui, "No income data for selected state.", WARNING_COLOR);
        }

        ui.add_space(SECTION_SPACING);
        ui.separator();
        ui.heading(RichText::new("Real Income Growth by State").strong());

        if let Some(s) = &result.summary {
            ui.label(
                RichText::new(format!(
                    "{} states, full history: median {:+.2}%, mean {:+.2}%, std dev {:.2}",
                    s.count, s.median, s.mean, s.std_dev
                ))
                .size(12.0)
                .color(Color32::GRAY),
            );
        }
        if let Some((i, g)) = result.ranking.iter().enumerate().find(|(_, g)| &g.state == state) {
            ui.label(format!(
                "{state}: {:+.2}% ({} to {}), rank {} of {}",
                g.growth_pct,
                format_dollars(g.first_real),
                format_dollars(g.last_real),
                i + 1,
                result.ranking.len()
            ));
        }
        ui.add_space(8.0);

        ui.columns(2, |columns| {
            columns[0].label(RichText::new(format!("Top {} States", result.top.len())).strong());
            ChartPlotter::draw_growth_table(&mut columns[0], "top", &result.top);

            columns[1]
                .label(RichText::new(format!("Bottom {} States", result.bottom.len())).strong());
            ChartPlotter::draw_growth_table(&mut columns[1], "bottom", &result.bottom);
        });
    }

    fn message(ui: &mut egui::Ui, text: &str, color: Color32) {
        egui::Frame::none()
            .rounding(6.0)
            .stroke(egui::Stroke::new(1.5, color))
            .inner_margin(10.0)
            .show(ui, |ui| {
                ui.label(RichText::new(text).size(14.0).color(color));
            });
    }
}
