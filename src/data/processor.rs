//! Data Processor Module
//! Dataset inspection, CPI normalization and income deflation.

use super::loader::{Dataset, DATE, GEO, GEO_LEVEL, SERIES, TOPIC, VALUE, YEAR};
use polars::prelude::*;
use std::collections::HashSet;
use thiserror::Error;
use tracing::debug;

pub const CPI_INDEX: &str = "cpi_index";
pub const REAL_INCOME: &str = "real_income";

#[derive(Error, Debug)]
pub enum ProcessorError {
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
    #[error("Invalid CPI base year selected.")]
    InvalidBaseYear(i32),
}

/// What the uploaded file contains, shown as the "data check" section.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DatasetSummary {
    pub row_count: usize,
    pub dropped_rows: usize,
    /// Distinct topics in order of first appearance
    pub topics: Vec<String>,
    pub geo_levels: Vec<String>,
    pub year_bounds: Option<(i32, i32)>,
    /// Whether the preferred income topic is present
    pub has_preferred_income: bool,
}

impl DatasetSummary {
    pub fn sorted_topics(&self) -> Vec<String> {
        let mut topics = self.topics.clone();
        topics.sort();
        topics
    }
}

/// Stateless transformations over the observation frame.
pub struct DataProcessor;

impl DataProcessor {
    /// Distinct non-empty values of a string column, in order of first appearance.
    pub fn distinct_strings(df: &DataFrame, column: &str) -> Result<Vec<String>, ProcessorError> {
        let mut seen = HashSet::new();
        let values = df
            .column(column)?
            .str()?
            .into_iter()
            .flatten()
            .filter(|v| !v.is_empty() && seen.insert(v.to_string()))
            .map(|v| v.to_string())
            .collect();
        Ok(values)
    }

    pub fn summarize(
        dataset: &Dataset,
        preferred_income_topic: &str,
    ) -> Result<DatasetSummary, ProcessorError> {
        let df = &dataset.df;
        let topics = Self::distinct_strings(df, TOPIC)?;
        let mut geo_levels = Self::distinct_strings(df, GEO_LEVEL)?;
        geo_levels.sort();

        Ok(DatasetSummary {
            row_count: df.height(),
            dropped_rows: dataset.dropped_rows,
            has_preferred_income: topics.iter().any(|t| t == preferred_income_topic),
            topics,
            geo_levels,
            year_bounds: Self::year_bounds(df)?,
        })
    }

    /// Minimum and maximum observation year.
    pub fn year_bounds(df: &DataFrame) -> Result<Option<(i32, i32)>, ProcessorError> {
        let years = df.column(YEAR)?.i32()?;
        Ok(years.min().zip(years.max()))
    }

    /// Initial slider range: from `preferred_start` (or the first year when the
    /// data starts later) to the last year.
    pub fn default_year_range((min, max): (i32, i32), preferred_start: i32) -> (i32, i32) {
        (min.max(preferred_start).min(max), max)
    }

    /// Filter expression for state-level rows with a two-letter code.
    fn state_rows(state_level: &str) -> Expr {
        col(GEO_LEVEL)
            .eq(lit(state_level))
            .and(col(GEO).str().len_chars().eq(lit(2u32)))
    }

    /// Sorted two-letter state codes present at the state geo level.
    pub fn state_list(df: &DataFrame, state_level: &str) -> Result<Vec<String>, ProcessorError> {
        let states = df
            .clone()
            .lazy()
            .filter(Self::state_rows(state_level))
            .select([col(GEO)])
            .collect()?;

        let mut states = Self::distinct_strings(&states, GEO)?;
        states.sort();
        Ok(states)
    }

    /// Average CPI per year. Output columns: [year, value]
    pub fn cpi_annual(
        df: &DataFrame,
        national_level: &str,
        cpi_series: &str,
    ) -> Result<DataFrame, ProcessorError> {
        let annual = df
            .clone()
            .lazy()
            .filter(
                col(GEO_LEVEL)
                    .eq(lit(national_level))
                    .and(col(SERIES).eq(lit(cpi_series))),
            )
            .group_by([col(YEAR)])
            .agg([col(VALUE).mean()])
            .sort([YEAR], SortMultipleOptions::default())
            .collect()?;

        debug!(years = annual.height(), cpi_series, "computed annual CPI");
        Ok(annual)
    }

    /// Annual CPI average of the base year. Missing, NaN or zero is invalid.
    pub fn base_cpi(cpi_annual: &DataFrame, base_year: i32) -> Result<f64, ProcessorError> {
        let base = cpi_annual
            .clone()
            .lazy()
            .filter(col(YEAR).eq(lit(base_year)))
            .select([col(VALUE).mean()])
            .collect()?;

        let value = base.column(VALUE)?.f64()?.get(0);
        match value {
            Some(v) if v.is_finite() && v != 0.0 => Ok(v),
            _ => Err(ProcessorError::InvalidBaseYear(base_year)),
        }
    }

    /// CPI normalized to 100 in the base year. Output columns: [year, cpi_index]
    pub fn cpi_index(cpi_annual: &DataFrame, base_cpi: f64) -> Result<DataFrame, ProcessorError> {
        let index = cpi_annual
            .clone()
            .lazy()
            .with_column((col(VALUE) / lit(base_cpi) * lit(100.0)).alias(CPI_INDEX))
            .select([col(YEAR), col(CPI_INDEX)])
            .collect()?;
        Ok(index)
    }

    /// The preferred income topic when present, otherwise the first topic
    /// whose name mentions "income".
    pub fn select_income_topic(topics: &[String], preferred: &str) -> Option<String> {
        if topics.iter().any(|t| t == preferred) {
            return Some(preferred.to_string());
        }
        topics
            .iter()
            .find(|t| t.to_lowercase().contains("income"))
            .cloned()
    }

    /// State-level rows of the income topic.
    pub fn income_frame(
        df: &DataFrame,
        topic: &str,
        state_level: &str,
    ) -> Result<DataFrame, ProcessorError> {
        let income = df
            .clone()
            .lazy()
            .filter(col(TOPIC).eq(lit(topic)).and(Self::state_rows(state_level)))
            .collect()?;
        Ok(income)
    }

    /// Attach the CPI index by year and compute
    /// `real_income = value / (cpi_index / 100)`. Years without CPI get nulls.
    pub fn deflate(income: &DataFrame, cpi_index: &DataFrame) -> Result<DataFrame, ProcessorError> {
        let real = income
            .clone()
            .lazy()
            .join(
                cpi_index.clone().lazy(),
                [col(YEAR)],
                [col(YEAR)],
                JoinArgs::new(JoinType::Left),
            )
            .with_column((col(VALUE) / (col(CPI_INDEX) / lit(100.0))).alias(REAL_INCOME))
            .sort([GEO, DATE], SortMultipleOptions::default())
            .collect()?;
        Ok(real)
    }

    /// Rows for one state within an inclusive year range, ordered by date.
    pub fn state_series(
        real: &DataFrame,
        state: &str,
        (start, end): (i32, i32),
    ) -> Result<DataFrame, ProcessorError> {
        let series = real
            .clone()
            .lazy()
            .filter(
                col(GEO)
                    .eq(lit(state))
                    .and(col(YEAR).gt_eq(lit(start)))
                    .and(col(YEAR).lt_eq(lit(end))),
            )
            .sort([DATE], SortMultipleOptions::default())
            .collect()?;
        Ok(series)
    }
}
