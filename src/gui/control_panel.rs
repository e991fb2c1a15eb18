//! Control Panel Widget
//! Left side panel with file selection, dashboard controls and exports.

use crate::analysis::AnalysisParams;
use crate::config::ViewConfig;
use egui::{Color32, ComboBox, RichText};
use std::path::PathBuf;

/// Current control values
#[derive(Debug, Default, Clone)]
pub struct UserSettings {
    pub file_path: Option<PathBuf>,
    pub state: String,
    pub year_range: (i32, i32),
    pub base_year: i32,
}

/// Left side control panel.
pub struct ControlPanel {
    pub settings: UserSettings,
    pub states: Vec<String>,
    pub year_bounds: Option<(i32, i32)>,
    pub base_year_bounds: (i32, i32),
    pub status: String,
    pub busy: bool,
    pub export_enabled: bool,
}

impl ControlPanel {
    pub fn new(view: &ViewConfig) -> Self {
        Self {
            settings: UserSettings {
                state: view.default_state.clone(),
                base_year: view.default_base_year,
                ..Default::default()
            },
            states: Vec::new(),
            year_bounds: None,
            base_year_bounds: (view.min_base_year, view.max_base_year),
            status: "Ready".to_string(),
            busy: false,
            export_enabled: false,
        }
    }

    /// Reset selectors after a new dataset is loaded.
    pub fn update_dataset(
        &mut self,
        states: Vec<String>,
        year_bounds: Option<(i32, i32)>,
        year_range: (i32, i32),
        fallback_state: &str,
    ) {
        self.settings.state = states
            .first()
            .cloned()
            .unwrap_or_else(|| fallback_state.to_string());
        self.states = if states.is_empty() {
            vec![fallback_state.to_string()]
        } else {
            states
        };
        self.year_bounds = year_bounds;
        self.settings.year_range = year_range;
    }

    /// Control values as pipeline parameters.
    pub fn params(&self) -> AnalysisParams {
        AnalysisParams {
            state: self.settings.state.clone(),
            year_range: self.settings.year_range,
            base_year: self.settings.base_year,
        }
    }

    /// Draw the control panel
    pub fn show(&mut self, ui: &mut egui::Ui) -> ControlPanelAction {
        let mut action = ControlPanelAction::None;

        // Title
        ui.vertical_centered(|ui| {
            ui.add_space(5.0);
            ui.label(
                RichText::new("📈 Controls")
                    .size(22.0)
                    .color(Color32::from_rgb(100, 149, 237)),
            );
        });
        ui.add_space(10.0);
        ui.separator();
        ui.add_space(5.0);

        // ===== Data Source Section =====
        ui.label(RichText::new("📁 Data Source").size(14.0).strong());
        ui.add_space(5.0);

        egui::Frame::none()
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .rounding(5.0)
            .inner_margin(8.0)
            .show(ui, |ui| {
                ui.horizontal(|ui| {
                    let path_text = self
                        .settings
                        .file_path
                        .as_ref()
                        .and_then(|p| p.file_name())
                        .map(|n| n.to_string_lossy().to_string())
                        .unwrap_or_else(|| "No file selected".to_string());

                    ui.label(RichText::new(&path_text).size(12.0).color(
                        if self.settings.file_path.is_some() {
                            ui.visuals().strong_text_color()
                        } else {
                            Color32::GRAY
                        },
                    ));

                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        ui.add_enabled_ui(!self.busy, |ui| {
                            if ui.button("📂 Browse").clicked() {
                                action = ControlPanelAction::BrowseFile;
                            }
                        });
                    });
                });
            });

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Selection Section =====
        ui.label(RichText::new("🔧 Selection").size(14.0).strong());
        ui.add_space(8.0);

        let label_width = 110.0;
        let combo_width = 150.0;
        let has_data = self.year_bounds.is_some();

        ui.add_enabled_ui(has_data, |ui| {
            ui.horizontal(|ui| {
                ui.add_sized([label_width, 20.0], egui::Label::new("State:"));
                ComboBox::from_id_salt("state")
                    .width(combo_width)
                    .selected_text(&self.settings.state)
                    .show_ui(ui, |ui| {
                        for state in &self.states {
                            ui.selectable_value(&mut self.settings.state, state.clone(), state);
                        }
                    });
            });

            ui.add_space(8.0);

            let (min_year, max_year) = self.year_bounds.unwrap_or((2000, 2000));
            let (start, end) = &mut self.settings.year_range;
            ui.label("Year range:");
            ui.add(egui::Slider::new(start, min_year..=max_year).text("from"));
            ui.add(egui::Slider::new(end, min_year..=max_year).text("to"));
            if *start > *end {
                *end = *start;
            }

            ui.add_space(8.0);

            let (min_base, max_base) = self.base_year_bounds;
            ui.horizontal(|ui| {
                ui.add_sized([label_width, 20.0], egui::Label::new("Deflation base year:"));
                ui.add(
                    egui::DragValue::new(&mut self.settings.base_year)
                        .range(min_base..=max_base)
                        .speed(0.2),
                );
            });
        });

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Export Buttons =====
        ui.vertical_centered(|ui| {
            ui.add_enabled_ui(self.export_enabled, |ui| {
                let state = &self.settings.state;
                let csv_button =
                    egui::Button::new(RichText::new(format!("⬇ Download {state} CSV")).size(14.0))
                        .min_size(egui::vec2(200.0, 30.0));
                if ui.add(csv_button).clicked() {
                    action = ControlPanelAction::ExportCsv;
                }

                ui.add_space(8.0);

                let png_button = egui::Button::new(RichText::new("🖼 Save Chart PNG").size(14.0))
                    .min_size(egui::vec2(200.0, 30.0));
                if ui.add(png_button).clicked() {
                    action = ControlPanelAction::ExportPng;
                }
            });
        });

        ui.add_space(15.0);
        ui.separator();
        ui.add_space(10.0);

        // ===== Status Section =====
        ui.label(RichText::new("📊 Status").size(14.0).strong());
        ui.add_space(5.0);

        ui.horizontal(|ui| {
            if self.busy {
                ui.spinner();
            }
            ui.label(
                RichText::new(&self.status)
                    .size(11.0)
                    .color(Self::status_color(&self.status)),
            );
        });

        action
    }

    fn status_color(status: &str) -> Color32 {
        if status.starts_with("Error") {
            Color32::from_rgb(220, 53, 69)
        } else if status.starts_with("Loaded") || status.starts_with("Exported") {
            Color32::from_rgb(40, 167, 69)
        } else {
            Color32::GRAY
        }
    }

    /// Set status line
    pub fn set_status(&mut self, status: &str) {
        self.status = status.to_string();
    }
}

/// Actions triggered by control panel
#[derive(Debug, Clone, PartialEq)]
pub enum ControlPanelAction {
    None,
    BrowseFile,
    ExportCsv,
    ExportPng,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_from_view_defaults() {
        let panel = ControlPanel::new(&ViewConfig::default());
        let params = panel.params();

        assert_eq!(params.state, "MD");
        assert_eq!(params.base_year, 2017);
        assert_eq!(panel.base_year_bounds, (1985, 2030));
        assert!(!panel.export_enabled);
    }

    #[test]
    fn dataset_update_selects_first_state() {
        let mut panel = ControlPanel::new(&ViewConfig::default());
        panel.update_dataset(
            vec!["AL".into(), "AK".into()],
            Some((1990, 2023)),
            (2000, 2023),
            "MD",
        );

        assert_eq!(panel.settings.state, "AL");
        assert_eq!(panel.settings.year_range, (2000, 2023));
    }

    #[test]
    fn empty_state_list_falls_back() {
        let mut panel = ControlPanel::new(&ViewConfig::default());
        panel.update_dataset(Vec::new(), Some((2010, 2020)), (2010, 2020), "MD");

        assert_eq!(panel.states, vec!["MD"]);
        assert_eq!(panel.settings.state, "MD");
    }
}
