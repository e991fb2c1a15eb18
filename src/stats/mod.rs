//! Stats module - growth rankings

mod growth;

pub use growth::{GrowthCalculator, GrowthSummary, StateGrowth};
