//! Real Income Explorer Main Application
//! Main window with control panel and dashboard viewer.

use crate::analysis::{AnalysisResult, RealIncomeAnalysis};
use crate::charts::StaticChartRenderer;
use crate::config::AppConfig;
use crate::data::{DataLoader, DataProcessor, Dataset, DatasetSummary};
use crate::export;
use crate::gui::{ChartViewer, ControlPanel, ControlPanelAction};
use egui::SidePanel;
use std::path::PathBuf;
use std::sync::mpsc::{channel, Receiver};
use std::thread;
use tracing::{error, info};

const PNG_WIDTH: u32 = 1400;
const PNG_HEIGHT: u32 = 800;

/// File loading result from background thread
enum LoadResult {
    Progress(String),
    Complete(Dataset),
    Error(String),
}

/// Main application window.
pub struct RealIncomeApp {
    config: AppConfig,
    loader: DataLoader,
    control_panel: ControlPanel,
    chart_viewer: ChartViewer,
    analysis: RealIncomeAnalysis,

    // Async file loading
    load_rx: Option<Receiver<LoadResult>>,
    is_loading: bool,
}

impl RealIncomeApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, config: AppConfig) -> Self {
        Self {
            loader: DataLoader::new(),
            control_panel: ControlPanel::new(&config.view),
            chart_viewer: ChartViewer::new(&config.data.preferred_income_topic),
            analysis: RealIncomeAnalysis::new(),
            load_rx: None,
            is_loading: false,
            config,
        }
    }

    /// Handle file selection; parsing runs on a background thread.
    fn handle_browse_file(&mut self) {
        if self.is_loading {
            return; // Already loading
        }

        let Some(path) = rfd::FileDialog::new()
            .add_filter("Spreadsheets", &["xlsx", "xlsm", "xlsb", "xls", "ods"])
            .add_filter("CSV Files", &["csv"])
            .pick_file()
        else {
            return;
        };

        self.control_panel.settings.file_path = Some(path.clone());
        self.control_panel.set_status("Loading file...");
        self.control_panel.busy = true;
        self.is_loading = true;

        let (tx, rx) = channel();
        self.load_rx = Some(rx);
        let sheet_name = self.config.data.sheet_name.clone();

        thread::spawn(move || {
            let _ = tx.send(LoadResult::Progress(format!(
                "Reading {}...",
                path.file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_default()
            )));

            let result = match DataLoader::read_file(&path, &sheet_name) {
                Ok(dataset) => LoadResult::Complete(dataset),
                Err(e) => LoadResult::Error(e.to_string()),
            };
            let _ = tx.send(result);
        });
    }

    /// Check for file loading results
    fn check_load_results(&mut self) {
        let Some(rx) = self.load_rx.take() else {
            return;
        };
        let mut should_keep_receiver = true;

        while let Ok(result) = rx.try_recv() {
            match result {
                LoadResult::Progress(status) => {
                    self.control_panel.set_status(&status);
                }
                LoadResult::Complete(dataset) => {
                    self.install_dataset(dataset);
                    should_keep_receiver = false;
                }
                LoadResult::Error(e) => {
                    error!(error = %e, "failed to load file");
                    self.control_panel.set_status(&format!("Error: {e}"));
                    self.control_panel.settings.file_path = self.loader.file_path().cloned();
                    should_keep_receiver = false;
                }
            }
        }

        if should_keep_receiver {
            self.load_rx = Some(rx);
        } else {
            self.is_loading = false;
            self.control_panel.busy = false;
        }
    }

    /// Inspect a freshly loaded dataset and reset the controls.
    fn install_dataset(&mut self, dataset: Dataset) {
        let data = &self.config.data;
        let view = &self.config.view;

        let inspected = DataProcessor::summarize(&dataset, &data.preferred_income_topic).and_then(
            |summary| {
                let states = DataProcessor::state_list(&dataset.df, &data.state_level)?;
                Ok((summary, states))
            },
        );
        let (summary, states): (DatasetSummary, Vec<String>) = match inspected {
            Ok(inspected) => inspected,
            Err(e) => {
                error!(error = %e, "failed to inspect dataset");
                self.control_panel.set_status(&format!("Error: {e}"));
                return;
            }
        };

        let year_range = summary
            .year_bounds
            .map(|bounds| DataProcessor::default_year_range(bounds, view.default_start_year))
            .unwrap_or_default();
        info!(
            rows = summary.row_count,
            states = states.len(),
            topics = summary.topics.len(),
            "dataset ready"
        );

        self.control_panel.set_status(&format!(
            "Loaded {} rows, {} states",
            summary.row_count,
            states.len()
        ));
        self.control_panel
            .update_dataset(states, summary.year_bounds, year_range, &view.default_state);
        self.chart_viewer.set_summary(summary);
        self.analysis.reset();
        self.loader.set_dataset(dataset);
        self.control_panel.settings.file_path = self.loader.file_path().cloned();
    }

    /// Pipeline result for the current controls, if a dataset is loaded and
    /// the run did not abort.
    fn current_result(&mut self) -> Option<&AnalysisResult> {
        let dataset = self.loader.dataset()?;
        let params = self.control_panel.params();
        self.analysis
            .update(
                &dataset.df,
                &self.config.data,
                self.config.view.ranking_size,
                &params,
            )
            .as_ref()
            .ok()
    }

    fn save_dialog(file_name: &str, filter: &str, extension: &str) -> Option<PathBuf> {
        rfd::FileDialog::new()
            .add_filter(filter, &[extension])
            .set_file_name(file_name)
            .save_file()
    }

    /// Handle CSV export of the selected state's series
    fn handle_export_csv(&mut self) {
        let Some(result) = self.current_result().filter(|r| r.has_state_data()) else {
            self.control_panel.set_status("No state data to export");
            return;
        };
        let state = result.params.state.clone();
        let series = result.state_series.clone();

        let Some(path) = Self::save_dialog(&export::default_csv_name(&state), "CSV", "csv") else {
            return; // User cancelled
        };

        match export::export_csv(&series, &path) {
            Ok(rows) => self
                .control_panel
                .set_status(&format!("Exported {rows} rows to {}", path.display())),
            Err(e) => {
                error!(error = %e, "CSV export failed");
                self.control_panel.set_status(&format!("Error: {e}"));
            }
        }
    }

    /// Handle PNG export of the income chart
    fn handle_export_png(&mut self) {
        let Some(result) = self.current_result().filter(|r| r.has_state_data()) else {
            self.control_panel.set_status("No chart to export");
            return;
        };
        let chart = result.chart.clone();

        let Some(path) = Self::save_dialog(&export::default_png_name(&chart.state), "PNG", "png")
        else {
            return;
        };

        match StaticChartRenderer::render_png(&chart, &path, PNG_WIDTH, PNG_HEIGHT) {
            Ok(()) => self
                .control_panel
                .set_status(&format!("Exported chart to {}", path.display())),
            Err(e) => {
                error!(error = %e, "chart export failed");
                self.control_panel.set_status(&format!("Error: {e}"));
            }
        }
    }
}

impl eframe::App for RealIncomeApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Check for background results
        self.check_load_results();

        // Request repaint while loading
        if self.is_loading {
            ctx.request_repaint();
        }

        self.control_panel.export_enabled = self
            .current_result()
            .is_some_and(|r| r.has_state_data());

        // Left panel - Control Panel
        let mut action = ControlPanelAction::None;
        SidePanel::left("control_panel")
            .min_width(300.0)
            .max_width(350.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    action = self.control_panel.show(ui);
                });
            });

        match action {
            ControlPanelAction::BrowseFile => self.handle_browse_file(),
            ControlPanelAction::ExportCsv => self.handle_export_csv(),
            ControlPanelAction::ExportPng => self.handle_export_png(),
            ControlPanelAction::None => {}
        }

        // Central panel - Dashboard
        let Self {
            config,
            loader,
            control_panel,
            chart_viewer,
            analysis,
            ..
        } = self;
        let params = control_panel.params();
        let outcome = match loader.dataset() {
            Some(dataset) => Some(analysis.update(
                &dataset.df,
                &config.data,
                config.view.ranking_size,
                &params,
            )),
            None => None,
        };

        egui::CentralPanel::default().show(ctx, |ui| {
            chart_viewer.show(ui, outcome);
        });
    }
}
