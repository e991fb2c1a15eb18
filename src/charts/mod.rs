//! Charts module - Chart rendering

mod plotter;
mod renderer;

pub use plotter::{format_dollars, ChartData, ChartPlotter};
pub use renderer::StaticChartRenderer;
