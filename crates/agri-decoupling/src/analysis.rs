//! Classified country-year decoupling table.
//!
//! For each country, emissions growth is derived from the emission levels,
//! paired with the reported value-added growth, and classified. Countries
//! are independent and processed in parallel; the combined table is ordered
//! by country, then year.

use rayon::prelude::*;
use tracing::{debug, info};

use agri_core::constants::DEFAULT_MIN_YEAR;
use agri_core::error::DecouplingError;
use agri_core::types::{check_years, CountrySeries, DecouplingRow, GapPolicy};

use crate::growth::{elasticity, percent_change};
use crate::tapio::classify;

/// Builds [`DecouplingRow`] tables from per-country inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecouplingAnalysis {
    /// First year kept in the output. Earlier rows still feed the growth
    /// rate of the first kept year.
    pub min_year: Option<i32>,
    /// Pairing rule for non-consecutive years.
    pub gap_policy: GapPolicy,
}

impl Default for DecouplingAnalysis {
    fn default() -> Self {
        Self {
            min_year: Some(DEFAULT_MIN_YEAR),
            gap_policy: GapPolicy::Adjacent,
        }
    }
}

impl DecouplingAnalysis {
    pub fn new(min_year: Option<i32>, gap_policy: GapPolicy) -> Self {
        Self { min_year, gap_policy }
    }

    /// Classify every year of one country.
    pub fn country_rows(&self, series: &CountrySeries) -> Result<Vec<DecouplingRow>, DecouplingError> {
        if series.rows.is_empty() {
            return Err(DecouplingError::EmptyCountry(series.country.clone()));
        }
        check_years(series.rows.iter().map(|r| r.year), self.gap_policy).map_err(|source| {
            DecouplingError::Series {
                country: series.country.clone(),
                source,
            }
        })?;

        let levels: Vec<Option<f64>> = series.rows.iter().map(|r| r.emissions).collect();
        let em_growth = percent_change(&levels);

        let rows: Vec<DecouplingRow> = series
            .rows
            .iter()
            .zip(em_growth)
            .filter(|(row, _)| self.min_year.is_none_or(|min| row.year >= min))
            .map(|(row, em_growth)| DecouplingRow {
                country: series.country.clone(),
                year: row.year,
                gva_growth: row.gva_growth,
                em_growth,
                elasticity: elasticity(row.gva_growth, em_growth),
                status: classify(row.gva_growth, em_growth),
            })
            .collect();

        debug!(country = %series.country, rows = rows.len(), "classified country");
        Ok(rows)
    }

    /// Classify all countries and return one table ordered by country, then
    /// year. The first failing country (in input order) determines the error.
    pub fn run(&self, countries: &[CountrySeries]) -> Result<Vec<DecouplingRow>, DecouplingError> {
        let per_country: Vec<Result<Vec<DecouplingRow>, DecouplingError>> =
            countries.par_iter().map(|c| self.country_rows(c)).collect();

        let mut table = Vec::new();
        for rows in per_country {
            table.extend(rows?);
        }
        table.sort_by(|a, b| a.country.cmp(&b.country).then(a.year.cmp(&b.year)));

        info!(
            countries = countries.len(),
            rows = table.len(),
            min_year = ?self.min_year,
            "decoupling analysis complete"
        );
        Ok(table)
    }
}
