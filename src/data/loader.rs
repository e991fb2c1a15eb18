//! Observation Loader Module
//! Reads the economic dataset from a workbook sheet (calamine) or a CSV file
//! (Polars), validates the expected columns and normalizes every row into a
//! typed DataFrame.

use calamine::{open_workbook_auto, Data, DataType, Reader};
use chrono::{Datelike, NaiveDate, NaiveDateTime};
use polars::prelude::*;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

pub const DATE: &str = "date";
pub const GEO: &str = "geo";
pub const GEO_LEVEL: &str = "geo_level";
pub const SERIES: &str = "series";
pub const TOPIC: &str = "topic";
pub const VALUE: &str = "value";
pub const YEAR: &str = "year";

/// Columns every input file must provide (after header normalization).
pub const REQUIRED_COLUMNS: [&str; 6] = [DATE, GEO, GEO_LEVEL, SERIES, TOPIC, VALUE];

/// Extensions opened through calamine.
const WORKBOOK_EXTENSIONS: [&str; 5] = ["xlsx", "xlsm", "xlsb", "xls", "ods"];

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Failed to load CSV: {0}")]
    CsvError(#[from] PolarsError),
    #[error("Failed to read spreadsheet: {0}")]
    SpreadsheetError(#[from] calamine::Error),
    #[error("Sheet '{sheet}' not found (available: {})", .available.join(", "))]
    SheetNotFound {
        sheet: String,
        available: Vec<String>,
    },
    #[error("Sheet '{0}' is empty")]
    EmptySheet(String),
    #[error("Missing expected columns: {}", .0.join(", "))]
    MissingColumns(Vec<String>),
    #[error("No rows with a valid date and value ({0} rows dropped)")]
    NoValidRows(usize),
    #[error("Unsupported file type: {0}")]
    UnsupportedFile(String),
}

/// A single raw cell, independent of the file format it came from.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
    DateTime(NaiveDateTime),
}

impl Cell {
    /// Text rendering used for the string columns.
    fn as_text(&self) -> String {
        match self {
            Cell::Empty => String::new(),
            Cell::Text(s) => s.trim().to_string(),
            Cell::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => format!("{}", *n as i64),
            Cell::Number(n) => n.to_string(),
            Cell::DateTime(dt) => dt.date().to_string(),
        }
    }

    fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Cell::DateTime(dt) => Some(dt.date()),
            Cell::Text(s) => parse_date(s),
            // Annual files often store the date column as a plain year
            Cell::Number(n) if n.fract() == 0.0 && (1000.0..=9999.0).contains(n) => {
                NaiveDate::from_ymd_opt(*n as i32, 1, 1)
            }
            Cell::Empty | Cell::Number(_) => None,
        }
    }

    fn as_value(&self) -> Option<f64> {
        let value = match self {
            Cell::Number(n) => *n,
            Cell::Text(s) => s.trim().replace(',', "").parse::<f64>().ok()?,
            Cell::Empty | Cell::DateTime(_) => return None,
        };
        value.is_finite().then_some(value)
    }
}

/// Header row plus data rows, before any validation.
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

/// A validated, normalized observation table.
#[derive(Debug, Clone)]
pub struct Dataset {
    /// Columns: date, geo, geo_level, series, topic, value, year
    pub df: DataFrame,
    /// Rows discarded because the date or value could not be parsed
    pub dropped_rows: usize,
    pub source: Option<PathBuf>,
}

/// Parse a date written as text. Accepts ISO dates (optionally followed by a
/// time), `YYYY/MM/DD`, `MM/DD/YYYY`, `YYYY-MM` and a bare `YYYY`, which
/// reads as January 1st.
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    for fmt in ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(text, fmt) {
            return Some(date);
        }
    }

    // "2017-01-01 00:00:00", "2017-01-01T00:00:00.000"
    if let Some(prefix) = text.get(..10) {
        if text.len() > 10 {
            if let Ok(date) = NaiveDate::parse_from_str(prefix, "%Y-%m-%d") {
                return Some(date);
            }
        }
    }

    if text.len() == 4 && text.bytes().all(|b| b.is_ascii_digit()) {
        return text.parse().ok().and_then(|year| NaiveDate::from_ymd_opt(year, 1, 1));
    }

    NaiveDate::parse_from_str(&format!("{text}-01"), "%Y-%m-%d").ok()
}

/// Handles observation file loading.
pub struct DataLoader {
    dataset: Option<Dataset>,
    file_path: Option<PathBuf>,
}

impl Default for DataLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl DataLoader {
    pub fn new() -> Self {
        Self {
            dataset: None,
            file_path: None,
        }
    }

    /// Read and normalize a workbook or CSV file. Used directly by the
    /// background loading thread.
    pub fn read_file(file_path: &Path, sheet_name: &str) -> Result<Dataset, LoaderError> {
        let extension = file_path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        let table = if extension == "csv" {
            Self::read_csv(file_path)?
        } else if WORKBOOK_EXTENSIONS.contains(&extension.as_str()) {
            Self::read_workbook(file_path, sheet_name)?
        } else {
            return Err(LoaderError::UnsupportedFile(file_path.display().to_string()));
        };

        let mut dataset = Self::normalize(table)?;
        dataset.source = Some(file_path.to_path_buf());
        info!(
            path = %file_path.display(),
            rows = dataset.df.height(),
            dropped = dataset.dropped_rows,
            "loaded observations"
        );
        Ok(dataset)
    }

    /// Read one sheet of a workbook into a raw table.
    fn read_workbook(file_path: &Path, sheet_name: &str) -> Result<RawTable, LoaderError> {
        let mut workbook = open_workbook_auto(file_path)?;

        let available = workbook.sheet_names();
        if !available.iter().any(|name| name == sheet_name) {
            return Err(LoaderError::SheetNotFound {
                sheet: sheet_name.to_string(),
                available,
            });
        }

        let range = workbook.worksheet_range(sheet_name)?;
        let mut rows = range.rows();
        let headers = rows
            .next()
            .ok_or_else(|| LoaderError::EmptySheet(sheet_name.to_string()))?
            .iter()
            .map(|cell| Self::cell_from_workbook(cell).as_text())
            .collect();

        let rows = rows
            .map(|row| row.iter().map(Self::cell_from_workbook).collect())
            .collect();

        Ok(RawTable { headers, rows })
    }

    fn cell_from_workbook(data: &Data) -> Cell {
        match data {
            Data::Empty | Data::Error(_) => Cell::Empty,
            Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => Cell::Text(s.clone()),
            Data::Float(f) => Cell::Number(*f),
            Data::Int(i) => Cell::Number(*i as f64),
            Data::Bool(b) => Cell::Text(b.to_string()),
            Data::DateTime(_) => data.as_datetime().map(Cell::DateTime).unwrap_or(Cell::Empty),
        }
    }

    /// Read a CSV file with Polars and flatten it into a raw table.
    fn read_csv(file_path: &Path) -> Result<RawTable, LoaderError> {
        let df = LazyCsvReader::new(file_path)
            .with_infer_schema_length(Some(10000))
            .with_ignore_errors(true)
            .finish()?
            .collect()?;

        let headers = df
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();

        let columns: Vec<&Series> = df
            .get_columns()
            .iter()
            .map(|c| c.as_materialized_series())
            .collect();

        let mut rows = Vec::with_capacity(df.height());
        for i in 0..df.height() {
            let row = columns
                .iter()
                .map(|series| {
                    series
                        .get(i)
                        .map(Self::cell_from_any)
                        .unwrap_or(Cell::Empty)
                })
                .collect();
            rows.push(row);
        }

        Ok(RawTable { headers, rows })
    }

    fn cell_from_any(value: AnyValue) -> Cell {
        if value.is_null() {
            return Cell::Empty;
        }
        if let Some(s) = value.get_str() {
            return Cell::Text(s.to_string());
        }
        value
            .extract::<f64>()
            .map(Cell::Number)
            .unwrap_or_else(|| Cell::Text(value.to_string()))
    }

    /// Validate headers and convert raw rows into the typed observation frame.
    pub fn normalize(table: RawTable) -> Result<Dataset, LoaderError> {
        let headers: Vec<String> = table
            .headers
            .iter()
            .map(|h| h.trim().to_lowercase())
            .collect();

        let missing: Vec<String> = REQUIRED_COLUMNS
            .iter()
            .filter(|name| !headers.iter().any(|h| h == *name))
            .map(|name| name.to_string())
            .collect();
        if !missing.is_empty() {
            warn!(?missing, "input is missing expected columns");
            return Err(LoaderError::MissingColumns(missing));
        }

        let index_of = |name: &str| headers.iter().position(|h| h == name).unwrap_or(0);
        let [date_idx, geo_idx, level_idx, series_idx, topic_idx, value_idx] =
            REQUIRED_COLUMNS.map(index_of);

        let capacity = table.rows.len();
        let mut dates: Vec<NaiveDate> = Vec::with_capacity(capacity);
        let mut geos: Vec<String> = Vec::with_capacity(capacity);
        let mut levels: Vec<String> = Vec::with_capacity(capacity);
        let mut series: Vec<String> = Vec::with_capacity(capacity);
        let mut topics: Vec<String> = Vec::with_capacity(capacity);
        let mut values: Vec<f64> = Vec::with_capacity(capacity);
        let mut years: Vec<i32> = Vec::with_capacity(capacity);
        let mut dropped_rows = 0usize;

        let empty = Cell::Empty;
        for row in &table.rows {
            let cell = |idx: usize| row.get(idx).unwrap_or(&empty);

            let (Some(date), Some(value)) = (cell(date_idx).as_date(), cell(value_idx).as_value())
            else {
                dropped_rows += 1;
                continue;
            };

            years.push(date.year());
            dates.push(date);
            values.push(value);
            geos.push(cell(geo_idx).as_text().to_uppercase());
            levels.push(cell(level_idx).as_text().to_lowercase());
            series.push(cell(series_idx).as_text());
            topics.push(cell(topic_idx).as_text());
        }

        if dates.is_empty() {
            return Err(LoaderError::NoValidRows(dropped_rows));
        }
        if dropped_rows > 0 {
            debug!(dropped_rows, "dropped rows without a valid date or value");
        }

        let df = DataFrame::new(vec![
            Column::new(DATE.into(), dates),
            Column::new(GEO.into(), geos),
            Column::new(GEO_LEVEL.into(), levels),
            Column::new(SERIES.into(), series),
            Column::new(TOPIC.into(), topics),
            Column::new(VALUE.into(), values),
            Column::new(YEAR.into(), years),
        ])?;

        Ok(Dataset {
            df,
            dropped_rows,
            source: None,
        })
    }

    /// Get a reference to the loaded dataset.
    pub fn dataset(&self) -> Option<&Dataset> {
        self.dataset.as_ref()
    }

    /// Get file path.
    pub fn file_path(&self) -> Option<&PathBuf> {
        self.file_path.as_ref()
    }

    /// Store a dataset produced elsewhere (used for async loading).
    pub fn set_dataset(&mut self, dataset: Dataset) {
        self.file_path = dataset.source.clone();
        self.dataset = Some(dataset);
    }
}
