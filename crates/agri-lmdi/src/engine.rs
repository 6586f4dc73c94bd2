//! LMDI decomposition engine implementing the [`Decomposer`] trait.
//!
//! For every pair of adjacent rows `(t-1, t)` and every tracked sector `i`:
//!
//! ```text
//! W_i        = L(E_i(t), E_i(t-1))
//! activity  += W_i * ln(A_total(t) / A_total(t-1))
//! structure += W_i * ln(S_i(t) / S_i(t-1))
//! intensity += W_i * ln(I_i(t) / I_i(t-1))
//! ```
//!
//! An undefined log-ratio makes the corresponding effect `None` for the
//! pair. The observed change is taken from the aggregate `E_total` column,
//! independently of the sector sums.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use agri_core::constants::{emissions_column, DEFAULT_RECONCILE_TOLERANCE};
use agri_core::error::LmdiError;
use agri_core::traits::Decomposer;
use agri_core::types::{
    check_years, finite, DecompositionRow, FactorRow, GapPolicy, Series, YearRecord,
};

use crate::factors::{factor_table, ratio};
use crate::weight::log_mean_weight;

/// Engine settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LmdiConfig {
    /// Pairing rule for rows whose years are not consecutive.
    pub gap_policy: GapPolicy,
    /// Relative tolerance above which a reconciliation residual is logged.
    pub reconcile_tolerance: f64,
}

impl Default for LmdiConfig {
    fn default() -> Self {
        Self {
            gap_policy: GapPolicy::Adjacent,
            reconcile_tolerance: DEFAULT_RECONCILE_TOLERANCE,
        }
    }
}

/// The production LMDI decomposer.
#[derive(Debug, Clone, Default)]
pub struct LmdiEngine {
    config: LmdiConfig,
}

/// `ln(now / base)`, undefined unless the ratio is finite and positive.
fn log_ratio(now: Option<f64>, base: Option<f64>) -> Option<f64> {
    finite(ratio(now, base).map(f64::ln))
}

/// Add one sector's weighted term to a running effect.
fn accumulate(acc: Option<f64>, weight: f64, log_ratio: Option<f64>) -> Option<f64> {
    finite(Some(acc? + weight * log_ratio?))
}

fn difference(now: Option<f64>, base: Option<f64>) -> Option<f64> {
    finite(Some(finite(now)? - finite(base)?))
}

fn total(activity: Option<f64>, structure: Option<f64>, intensity: Option<f64>) -> Option<f64> {
    finite(Some(activity? + structure? + intensity?))
}

/// Trace one decomposed pair and flag rows whose effects do not close.
fn trace_row(row: &DecompositionRow, base_year: i32, tolerance: f64) {
    if row.year - base_year > 1 {
        debug!(from = base_year, to = row.year, "pairing non-consecutive years");
    }
    match row.residual() {
        Some(residual) if !row.is_reconciled(tolerance) => warn!(
            year = row.year,
            residual,
            actual = ?row.delta_actual,
            "LMDI effects do not reconcile with observed change"
        ),
        Some(_) => debug!(year = row.year, "LMDI pair reconciled"),
        None => debug!(year = row.year, ?row, "LMDI pair has undefined components"),
    }
}

impl LmdiEngine {
    /// Create an engine with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: LmdiConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LmdiConfig {
        &self.config
    }

    /// Check the structural invariants of `series` without computing anything.
    ///
    /// Fails on an empty sector list, on years that are not strictly
    /// increasing (or contiguous, under [`GapPolicy::Reject`]), and on any
    /// tracked sector absent from a record.
    pub fn validate(&self, series: &Series) -> Result<(), LmdiError> {
        if series.sectors.is_empty() {
            return Err(LmdiError::NoSectors);
        }
        check_years(series.years(), self.config.gap_policy)?;

        for record in &series.records {
            for sector in &series.sectors {
                if record.sector(sector).is_none() {
                    // The whole sector is absent, so both of its columns are.
                    return Err(LmdiError::MissingColumn {
                        year: record.year,
                        column: emissions_column(sector),
                    });
                }
            }
        }
        Ok(())
    }

    /// Validated per-year structure shares and intensities.
    pub fn factors(&self, series: &Series) -> Result<Vec<FactorRow>, LmdiError> {
        self.validate(series)?;
        Ok(factor_table(series))
    }

    /// Decompose the change between two adjacent rows.
    fn decompose_pair(
        &self,
        sectors: &[String],
        (prev, prev_factors): (&YearRecord, &FactorRow),
        (curr, curr_factors): (&YearRecord, &FactorRow),
    ) -> DecompositionRow {
        let activity_log = log_ratio(curr.activity_total, prev.activity_total);

        let mut activity = Some(0.0);
        let mut structure = Some(0.0);
        let mut intensity = Some(0.0);

        for sector in sectors {
            let e_t = curr.sector(sector).and_then(|l| l.emissions);
            let e_0 = prev.sector(sector).and_then(|l| l.emissions);
            let w = log_mean_weight(e_t, e_0);

            activity = accumulate(activity, w, activity_log);
            structure = accumulate(
                structure,
                w,
                log_ratio(curr_factors.share(sector), prev_factors.share(sector)),
            );
            intensity = accumulate(
                intensity,
                w,
                log_ratio(curr_factors.intensity(sector), prev_factors.intensity(sector)),
            );
        }

        let row = DecompositionRow {
            year: curr.year,
            delta_actual: difference(curr.emissions_total, prev.emissions_total),
            activity,
            structure,
            intensity,
            delta_calculated: total(activity, structure, intensity),
        };
        trace_row(&row, prev.year, self.config.reconcile_tolerance);
        row
    }

    /// Decompose independent entities in parallel.
    ///
    /// Results are returned entity by entity in input order, each entity's
    /// rows in ascending year order. The first failing entity (in input
    /// order) determines the error.
    pub fn decompose_many<K>(
        &self,
        entities: &[(K, Series)],
    ) -> Result<Vec<(K, DecompositionRow)>, LmdiError>
    where
        K: Clone + Send + Sync,
    {
        let per_entity: Vec<Result<Vec<DecompositionRow>, LmdiError>> = entities
            .par_iter()
            .map(|(_, series)| self.decompose(series))
            .collect();

        let mut out = Vec::new();
        for ((key, _), rows) in entities.iter().zip(per_entity) {
            out.extend(rows?.into_iter().map(|row| (key.clone(), row)));
        }
        Ok(out)
    }
}

impl Decomposer for LmdiEngine {
    fn decompose(&self, series: &Series) -> Result<Vec<DecompositionRow>, LmdiError> {
        let factors = self.factors(series)?;

        let rows: Vec<DecompositionRow> = series
            .records
            .iter()
            .zip(&factors)
            .collect::<Vec<_>>()
            .windows(2)
            .map(|pair| self.decompose_pair(&series.sectors, pair[0], pair[1]))
            .collect();

        info!(
            years = series.len(),
            rows = rows.len(),
            sectors = series.sectors.len(),
            "LMDI decomposition complete"
        );
        Ok(rows)
    }
}
