//! Growth Calculator Module
//! Real income growth per state and the cross-state ranking.

use crate::data::{GEO, REAL_INCOME, YEAR};
use polars::prelude::*;
use rayon::prelude::*;
use statrs::statistics::{Data, Median, Statistics};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Growth of one state's real income between its first and last observation.
#[derive(Debug, Clone, PartialEq)]
pub struct StateGrowth {
    pub state: String,
    pub first_year: i32,
    pub last_year: i32,
    pub first_real: f64,
    pub last_real: f64,
    /// `(last / first - 1) * 100`
    pub growth_pct: f64,
    /// Compound annual growth rate in percent; None when both ends share a year
    pub cagr_pct: Option<f64>,
    pub observations: usize,
}

/// Distribution of growth across all ranked states.
#[derive(Debug, Clone, PartialEq)]
pub struct GrowthSummary {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    /// Sample standard deviation; NaN with fewer than two states
    pub std_dev: f64,
}

pub struct GrowthCalculator;

impl GrowthCalculator {
    /// Real income observations per state, ordered by year. Rows of the same
    /// year keep their input order. Years without a deflator stay in the
    /// series as `None`.
    pub fn observations_by_state(
        real: &DataFrame,
    ) -> Result<BTreeMap<String, Vec<(i32, Option<f64>)>>, PolarsError> {
        let geos = real.column(GEO)?.str()?;
        let years = real.column(YEAR)?.i32()?;
        let values = real.column(REAL_INCOME)?.f64()?;

        let mut by_state: BTreeMap<String, Vec<(i32, Option<f64>)>> = BTreeMap::new();
        for ((geo, year), value) in geos.into_iter().zip(years).zip(values) {
            if let (Some(geo), Some(year)) = (geo, year) {
                let value = value.filter(|v| v.is_finite());
                by_state.entry(geo.to_string()).or_default().push((year, value));
            }
        }

        for series in by_state.values_mut() {
            series.sort_by_key(|&(year, _)| year);
        }
        Ok(by_state)
    }

    /// Growth for one state's ordered series. A single observation, a missing
    /// real value at either end or a zero starting value means no growth.
    pub fn state_growth(state: &str, series: &[(i32, Option<f64>)]) -> Option<StateGrowth> {
        if series.len() < 2 {
            return None;
        }
        let (first_year, first_real) = series.first().and_then(|&(y, v)| Some((y, v?)))?;
        let (last_year, last_real) = series.last().and_then(|&(y, v)| Some((y, v?)))?;
        if first_real == 0.0 {
            return None;
        }

        let ratio = last_real / first_real;
        let span = last_year - first_year;
        let cagr_pct = (span > 0 && ratio > 0.0)
            .then(|| (ratio.powf(1.0 / span as f64) - 1.0) * 100.0);

        Some(StateGrowth {
            state: state.to_string(),
            first_year,
            last_year,
            first_real,
            last_real,
            growth_pct: (ratio - 1.0) * 100.0,
            cagr_pct,
            observations: series.len(),
        })
    }

    /// All states with a defined growth, highest growth first.
    pub fn rank(real: &DataFrame) -> Result<Vec<StateGrowth>, PolarsError> {
        let by_state = Self::observations_by_state(real)?;

        let mut ranking: Vec<StateGrowth> = by_state
            .par_iter()
            .filter_map(|(state, series)| Self::state_growth(state, series))
            .collect();

        ranking.sort_by(|a, b| {
            b.growth_pct
                .partial_cmp(&a.growth_pct)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.state.cmp(&b.state))
        });
        Ok(ranking)
    }

    /// The first `n` entries of a ranking.
    pub fn top(ranking: &[StateGrowth], n: usize) -> Vec<StateGrowth> {
        ranking.iter().take(n).cloned().collect()
    }

    /// The last `n` entries of a ranking, lowest growth first.
    pub fn bottom(ranking: &[StateGrowth], n: usize) -> Vec<StateGrowth> {
        ranking.iter().rev().take(n).cloned().collect()
    }

    pub fn summary(ranking: &[StateGrowth]) -> Option<GrowthSummary> {
        if ranking.is_empty() {
            return None;
        }
        let values: Vec<f64> = ranking.iter().map(|g| g.growth_pct).collect();

        Some(GrowthSummary {
            count: values.len(),
            mean: values.iter().mean(),
            std_dev: values.iter().std_dev(),
            median: Data::new(values).median(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn growth(state: &str, growth_pct: f64) -> StateGrowth {
        StateGrowth {
            state: state.to_string(),
            first_year: 2000,
            last_year: 2020,
            first_real: 100.0,
            last_real: 100.0 + growth_pct,
            growth_pct,
            cagr_pct: None,
            observations: 2,
        }
    }

    fn real_frame() -> DataFrame {
        df!(
            GEO => ["TX", "MD", "MD", "TX", "MD", "VA", "OH", "OH"],
            YEAR => [2018i32, 2010, 2020, 2010, 2015, 2012, 2010, 2011],
            REAL_INCOME => [Some(45.0f64), Some(100.0), Some(110.0), Some(50.0), None, Some(70.0), Some(0.0), Some(10.0)],
        )
        .unwrap()
    }

    #[test]
    fn orders_each_state_by_year_keeping_gaps() {
        let by_state = GrowthCalculator::observations_by_state(&real_frame()).unwrap();

        assert_eq!(
            by_state["MD"],
            vec![(2010, Some(100.0)), (2015, None), (2020, Some(110.0))]
        );
        assert_eq!(by_state["TX"], vec![(2010, Some(50.0)), (2018, Some(45.0))]);
        assert_eq!(by_state["VA"], vec![(2012, Some(70.0))]);
    }

    #[test]
    fn growth_is_percent_change_between_first_and_last() {
        let md = GrowthCalculator::state_growth(
            "MD",
            &[(2010, Some(100.0)), (2015, Some(90.0)), (2020, Some(110.0))],
        )
        .unwrap();

        assert!((md.growth_pct - 10.0).abs() < 1e-9);
        assert_eq!((md.first_year, md.last_year), (2010, 2020));
        assert_eq!(md.observations, 3);
        let cagr = md.cagr_pct.unwrap();
        assert!((cagr - (1.1f64.powf(0.1) - 1.0) * 100.0).abs() < 1e-9);
    }

    #[test]
    fn single_observation_or_zero_start_has_no_growth() {
        assert!(GrowthCalculator::state_growth("VA", &[(2012, Some(70.0))]).is_none());
        assert!(
            GrowthCalculator::state_growth("OH", &[(2010, Some(0.0)), (2011, Some(10.0))]).is_none()
        );
    }

    #[test]
    fn missing_real_value_at_either_end_has_no_growth() {
        let last_missing = [(2016, Some(50.0)), (2017, Some(55.0)), (2019, None)];
        assert!(GrowthCalculator::state_growth("MD", &last_missing).is_none());

        let first_missing = [(2015, None), (2016, Some(50.0)), (2018, Some(60.0))];
        assert!(GrowthCalculator::state_growth("VA", &first_missing).is_none());

        let interior_missing = [(2016, Some(50.0)), (2017, None), (2018, Some(60.0))];
        let g = GrowthCalculator::state_growth("TX", &interior_missing).unwrap();
        assert!((g.growth_pct - 20.0).abs() < 1e-9);
        assert_eq!(g.observations, 3);
    }

    #[test]
    fn same_year_endpoints_have_no_cagr() {
        let g = GrowthCalculator::state_growth("MD", &[(2010, Some(100.0)), (2010, Some(120.0))])
            .unwrap();
        assert!((g.growth_pct - 20.0).abs() < 1e-9);
        assert_eq!(g.cagr_pct, None);
    }

    #[test]
    fn ranking_sorts_descending_and_drops_undefined() {
        let ranking = GrowthCalculator::rank(&real_frame()).unwrap();
        let states: Vec<&str> = ranking.iter().map(|g| g.state.as_str()).collect();

        assert_eq!(states, vec!["MD", "TX"]);
        assert!((ranking[1].growth_pct + 10.0).abs() < 1e-9);
    }

    #[test]
    fn top_and_bottom_slices() {
        let ranking: Vec<StateGrowth> = (0..12)
            .map(|i| growth(&format!("S{i:02}"), 12.0 - i as f64))
            .collect();

        let top = GrowthCalculator::top(&ranking, 10);
        assert_eq!(top.len(), 10);
        assert_eq!(top[0].state, "S00");
        assert_eq!(top[9].state, "S09");

        let bottom = GrowthCalculator::bottom(&ranking, 10);
        assert_eq!(bottom.len(), 10);
        assert_eq!(bottom[0].state, "S11");
        assert_eq!(bottom[9].state, "S02");
    }

    #[test]
    fn short_ranking_fills_both_tables() {
        let ranking = vec![growth("AA", 5.0), growth("BB", -1.0)];

        assert_eq!(GrowthCalculator::top(&ranking, 10).len(), 2);
        let bottom = GrowthCalculator::bottom(&ranking, 10);
        assert_eq!(bottom[0].state, "BB");
        assert_eq!(bottom[1].state, "AA");
    }

    #[test]
    fn summary_describes_distribution() {
        let ranking = vec![growth("AA", 30.0), growth("BB", 10.0), growth("CC", -10.0)];
        let summary = GrowthCalculator::summary(&ranking).unwrap();

        assert_eq!(summary.count, 3);
        assert!((summary.mean - 10.0).abs() < 1e-9);
        assert!((summary.median - 10.0).abs() < 1e-9);
        assert!((summary.std_dev - 20.0).abs() < 1e-9);
        assert!(GrowthCalculator::summary(&[]).is_none());
    }
}
