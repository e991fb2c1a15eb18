//! CSV export of the selected state's real income series.

use polars::prelude::*;
use std::fs::File;
use std::path::Path;
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to write CSV: {0}")]
    CsvError(#[from] PolarsError),
    #[error("Nothing to export")]
    Empty,
}

/// Default file name offered in the save dialog.
pub fn default_csv_name(state: &str) -> String {
    format!("{state}_real_income.csv")
}

pub fn default_png_name(state: &str) -> String {
    format!("{state}_real_income.png")
}

/// Write a frame as CSV with a header row. Returns the number of rows written.
pub fn export_csv(df: &DataFrame, path: &Path) -> Result<usize, ExportError> {
    if df.height() == 0 {
        return Err(ExportError::Empty);
    }

    let mut file = File::create(path)?;
    let mut df = df.clone();
    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(&mut df)?;

    info!(path = %path.display(), rows = df.height(), "exported CSV");
    Ok(df.height())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{AnalysisParams, RealIncomeAnalysis};
    use crate::config::DataConfig;
    use crate::data::fixtures::sample_dataset;

    #[test]
    fn file_names_follow_state_code() {
        assert_eq!(default_csv_name("MD"), "MD_real_income.csv");
        assert_eq!(default_png_name("VA"), "VA_real_income.png");
    }

    #[test]
    fn writes_state_series_with_derived_columns() {
        let df = sample_dataset().df;
        let params = AnalysisParams {
            state: "VA".to_string(),
            year_range: (2016, 2019),
            base_year: 2017,
        };
        let result = RealIncomeAnalysis::run(&df, &DataConfig::default(), 10, &params).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(default_csv_name("VA"));
        let rows = export_csv(&result.state_series, &path).unwrap();
        assert_eq!(rows, 2);

        let text = std::fs::read_to_string(&path).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("date,geo,geo_level,series,topic,value,year,cpi_index,real_income")
        );
        let first: Vec<&str> = lines.next().unwrap().split(',').collect();
        assert_eq!(&first[..5], &["2016-01-01", "VA", "state", "VAPCPI", "income_per_capita"]);
        assert_eq!(first[6], "2016");
        let number = |s: &str| s.parse::<f64>().unwrap();
        assert!((number(first[5]) - 48000.0).abs() < 1e-6);
        assert!((number(first[7]) - 96.0).abs() < 1e-6);
        assert!((number(first[8]) - 50000.0).abs() < 1e-6);
        assert_eq!(lines.count(), 1);
    }

    #[test]
    fn refuses_empty_frame() {
        let dir = tempfile::tempdir().unwrap();
        let df = DataFrame::empty();
        assert!(matches!(
            export_csv(&df, &dir.path().join("x.csv")),
            Err(ExportError::Empty)
        ));
    }
}
