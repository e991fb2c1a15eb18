//! Real Income by State Explorer
//!
//! Loads an economic time-series spreadsheet, deflates state income by CPI
//! and displays nominal vs real trends plus cross-state growth rankings.

mod analysis;
mod charts;
mod config;
mod data;
mod export;
mod gui;
mod stats;

use config::AppConfig;
use eframe::egui;
use gui::RealIncomeApp;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

fn main() -> anyhow::Result<()> {
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder().with_env_filter(env).init();

    let config = AppConfig::discover().inspect_err(|e| error!("configuration error: {e:#}"))?;
    info!(sheet = %config.data.sheet_name, "starting");

    // Configure native options
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([config.window.width, config.window.height])
            .with_min_inner_size([1000.0, 650.0])
            .with_title("Real Income by State Explorer"),
        ..Default::default()
    };

    // Run the application
    eframe::run_native(
        "Real Income by State Explorer",
        options,
        Box::new(|cc| Ok(Box::new(RealIncomeApp::new(cc, config)))),
    )
    .map_err(|e| anyhow::anyhow!("failed to run window: {e}"))
}
