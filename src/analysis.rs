//! Real income pipeline.
//!
//! One run takes the observation frame and the current control values and
//! produces everything the dashboard shows: the selected state's nominal and
//! real series, the export frame, and the growth ranking over every state's
//! full history. Results are memoized on the control values so an unchanged
//! frame does not recompute.

use crate::charts::ChartData;
use crate::config::DataConfig;
use crate::data::{DataProcessor, ProcessorError, TOPIC};
use crate::stats::{GrowthCalculator, GrowthSummary, StateGrowth};
use polars::prelude::*;
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("No {series} observations at the '{level}' geo level; cannot build a CPI deflator.")]
    MissingCpi { series: String, level: String },
    #[error("This dataset doesn't include income data. Choose a different view or rebuild with BEA enabled.")]
    NoIncomeData,
    #[error(transparent)]
    Processing(#[from] ProcessorError),
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
}

/// Control values that drive one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisParams {
    pub state: String,
    /// Inclusive year range
    pub year_range: (i32, i32),
    pub base_year: i32,
}

#[derive(Debug, Clone)]
pub struct AnalysisResult {
    pub params: AnalysisParams,
    pub income_topic: String,
    /// Selected state's rows with `cpi_index` and `real_income`
    pub state_series: DataFrame,
    pub chart: ChartData,
    /// Every state with a defined growth, highest first
    pub ranking: Vec<StateGrowth>,
    pub top: Vec<StateGrowth>,
    pub bottom: Vec<StateGrowth>,
    pub summary: Option<GrowthSummary>,
}

impl AnalysisResult {
    pub fn has_state_data(&self) -> bool {
        self.state_series.height() > 0
    }
}

/// Runs the pipeline and remembers the last outcome.
#[derive(Default)]
pub struct RealIncomeAnalysis {
    last: Option<(AnalysisParams, Result<AnalysisResult, AnalysisError>)>,
}

impl RealIncomeAnalysis {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget the memoized result, e.g. after a new file is loaded.
    pub fn reset(&mut self) {
        self.last = None;
    }

    pub fn is_cached(&self, params: &AnalysisParams) -> bool {
        matches!(&self.last, Some((cached, _)) if cached == params)
    }

    /// Result for `params`, recomputing only when they changed.
    pub fn update(
        &mut self,
        df: &DataFrame,
        config: &DataConfig,
        ranking_size: usize,
        params: &AnalysisParams,
    ) -> &Result<AnalysisResult, AnalysisError> {
        let (_, outcome) = match self.last.take() {
            Some(entry) if entry.0 == *params => self.last.insert(entry),
            _ => {
                let outcome = Self::run(df, config, ranking_size, params);
                if let Err(e) = &outcome {
                    warn!(error = %e, ?params, "analysis aborted");
                }
                self.last.insert((params.clone(), outcome))
            }
        };
        outcome
    }

    /// Execute the full pipeline once.
    pub fn run(
        df: &DataFrame,
        config: &DataConfig,
        ranking_size: usize,
        params: &AnalysisParams,
    ) -> Result<AnalysisResult, AnalysisError> {
        let cpi_annual = DataProcessor::cpi_annual(df, &config.national_level, &config.cpi_series)?;
        if cpi_annual.height() == 0 {
            return Err(AnalysisError::MissingCpi {
                series: config.cpi_series.clone(),
                level: config.national_level.clone(),
            });
        }
        let base_cpi = DataProcessor::base_cpi(&cpi_annual, params.base_year)?;
        let cpi_index = DataProcessor::cpi_index(&cpi_annual, base_cpi)?;

        let topics = DataProcessor::distinct_strings(df, TOPIC)?;
        let income_topic =
            DataProcessor::select_income_topic(&topics, &config.preferred_income_topic)
                .ok_or(AnalysisError::NoIncomeData)?;
        if income_topic != config.preferred_income_topic {
            info!(topic = %income_topic, "preferred income topic missing, using fallback");
        }

        let income = DataProcessor::income_frame(df, &income_topic, &config.state_level)?;
        let real = DataProcessor::deflate(&income, &cpi_index)?;

        let state_series = DataProcessor::state_series(&real, &params.state, params.year_range)?;
        let chart = ChartData::from_series(&state_series, &params.state, params.base_year)?;

        let ranking = GrowthCalculator::rank(&real)?;
        let top = GrowthCalculator::top(&ranking, ranking_size);
        let bottom = GrowthCalculator::bottom(&ranking, ranking_size);
        let summary = GrowthCalculator::summary(&ranking);

        debug!(
            state = %params.state,
            base_cpi,
            rows = state_series.height(),
            ranked = ranking.len(),
            "analysis complete"
        );

        Ok(AnalysisResult {
            params: params.clone(),
            income_topic,
            state_series,
            chart,
            ranking,
            top,
            bottom,
            summary,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::fixtures::sample_dataset;

    fn params(state: &str, year_range: (i32, i32), base_year: i32) -> AnalysisParams {
        AnalysisParams {
            state: state.to_string(),
            year_range,
            base_year,
        }
    }

    fn run(df: &DataFrame, p: &AnalysisParams) -> Result<AnalysisResult, AnalysisError> {
        RealIncomeAnalysis::run(df, &DataConfig::default(), 10, p)
    }

    fn states(growth: &[StateGrowth]) -> Vec<&str> {
        growth.iter().map(|g| g.state.as_str()).collect()
    }

    #[test]
    fn builds_series_and_rankings() {
        let df = sample_dataset().df;
        let result = run(&df, &params("MD", (2016, 2019), 2017)).unwrap();

        assert_eq!(result.income_topic, "income_per_capita");
        assert_eq!(result.state_series.height(), 4);
        assert_eq!(result.chart.nominal.len(), 4);
        assert_eq!(result.chart.real.len(), 3);

        // MD's last year (2019) has no CPI, so it is left out of the ranking
        assert_eq!(states(&result.ranking), vec!["VA", "TX"]);
        assert!((result.ranking[0].growth_pct - 20.0).abs() < 1e-6);
        assert!((result.ranking[1].growth_pct + 100.0 / 6.0).abs() < 1e-6);

        assert_eq!(states(&result.top), vec!["VA", "TX"]);
        assert_eq!(states(&result.bottom), vec!["TX", "VA"]);
        assert_eq!(result.summary.as_ref().map(|s| s.count), Some(2));
    }

    #[test]
    fn year_range_limits_series_but_not_rankings() {
        let df = sample_dataset().df;
        let full = run(&df, &params("MD", (2016, 2019), 2017)).unwrap();
        let narrow = run(&df, &params("MD", (2017, 2018), 2017)).unwrap();

        assert_eq!(narrow.state_series.height(), 2);
        assert_eq!(narrow.chart.nominal.len(), 2);
        assert_eq!(states(&narrow.ranking), vec!["VA", "TX"]);
        assert_eq!(narrow.ranking, full.ranking);
    }

    #[test]
    fn unknown_state_yields_empty_series() {
        let df = sample_dataset().df;
        let result = run(&df, &params("CA", (2016, 2019), 2017)).unwrap();

        assert!(!result.has_state_data());
        assert!(result.chart.is_empty());
        assert_eq!(result.ranking.len(), 2);
    }

    #[test]
    fn base_year_without_cpi_aborts() {
        let df = sample_dataset().df;
        let err = run(&df, &params("MD", (2016, 2019), 1990)).unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::Processing(ProcessorError::InvalidBaseYear(1990))
        ));
    }

    #[test]
    fn missing_cpi_series_aborts() {
        let df = sample_dataset()
            .df
            .lazy()
            .filter(col("series").neq(lit("CPIAUCSL")))
            .collect()
            .unwrap();
        assert!(matches!(
            run(&df, &params("MD", (2016, 2019), 2017)),
            Err(AnalysisError::MissingCpi { .. })
        ));
    }

    #[test]
    fn missing_income_topic_aborts() {
        let df = sample_dataset()
            .df
            .lazy()
            .filter(col(TOPIC).neq(lit("income_per_capita")))
            .collect()
            .unwrap();
        assert!(matches!(
            run(&df, &params("MD", (2016, 2019), 2017)),
            Err(AnalysisError::NoIncomeData)
        ));
    }

    #[test]
    fn memoizes_on_params() {
        let df = sample_dataset().df;
        let config = DataConfig::default();
        let mut analysis = RealIncomeAnalysis::new();
        let md = params("MD", (2016, 2019), 2017);

        assert!(!analysis.is_cached(&md));
        assert!(analysis.update(&df, &config, 10, &md).is_ok());
        assert!(analysis.is_cached(&md));

        let va = params("VA", (2016, 2019), 2017);
        assert!(!analysis.is_cached(&va));
        let result = analysis.update(&df, &config, 10, &va).as_ref().unwrap();
        assert_eq!(result.params.state, "VA");

        analysis.reset();
        assert!(!analysis.is_cached(&va));
    }
}
