//! Data module - observation loading and processing

mod loader;
mod processor;

pub use loader::{DataLoader, Dataset, GEO, TOPIC, VALUE, YEAR};
pub use processor::{DataProcessor, DatasetSummary, ProcessorError, REAL_INCOME};
