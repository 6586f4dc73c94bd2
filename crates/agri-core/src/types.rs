//! Core data types: year records, derived factor rows, decomposition and
//! decoupling results.
//!
//! Every level and rate is an `Option<f64>`. `None` marks a value that is
//! missing or undefined; it is never coerced to zero.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::{COUPLING_LOWER, COUPLING_UPPER};
use crate::error::SeriesError;

/// Name of a tracked sector (e.g. `crops`, `livestock`).
pub type Sector = String;

/// Keep a value only if it is present and finite.
///
/// NaN and infinities produced by upstream arithmetic are treated as missing.
pub fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

// ------------------------------------------------------------------
// Input series
// ------------------------------------------------------------------

/// Emissions (`E_i`) and economic output (`A_i`) of one sector in one year.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SectorLevels {
    pub emissions: Option<f64>,
    pub activity: Option<f64>,
}

impl SectorLevels {
    pub fn new(emissions: f64, activity: f64) -> Self {
        Self {
            emissions: Some(emissions),
            activity: Some(activity),
        }
    }
}

/// One year of a cleaned input table.
///
/// A tracked sector missing from `sectors` means the whole column is absent
/// for that year, which the decomposition engine rejects. A sector that is
/// present with `None` levels is merely missing data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearRecord {
    pub year: i32,
    pub emissions_total: Option<f64>,
    pub activity_total: Option<f64>,
    pub sectors: BTreeMap<Sector, SectorLevels>,
}

impl YearRecord {
    pub fn new(year: i32, emissions_total: Option<f64>, activity_total: Option<f64>) -> Self {
        Self {
            year,
            emissions_total,
            activity_total,
            sectors: BTreeMap::new(),
        }
    }

    /// Builder-style helper to attach a sector's levels.
    pub fn with_sector(mut self, sector: impl Into<Sector>, levels: SectorLevels) -> Self {
        self.sectors.insert(sector.into(), levels);
        self
    }

    pub fn sector(&self, sector: &str) -> Option<&SectorLevels> {
        self.sectors.get(sector)
    }
}

/// How consecutive rows whose years differ by more than one are treated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GapPolicy {
    /// Pair rows that are adjacent in the sequence, whatever the numeric gap.
    #[default]
    Adjacent,
    /// A numeric gap between adjacent rows is a structural error.
    Reject,
}

/// Check that `years` is strictly increasing and, under
/// [`GapPolicy::Reject`], contiguous.
pub fn check_years<I>(years: I, policy: GapPolicy) -> Result<(), SeriesError>
where
    I: IntoIterator<Item = i32>,
{
    let mut previous: Option<i32> = None;
    for current in years {
        if let Some(prev) = previous {
            if current == prev {
                return Err(SeriesError::DuplicateYear(current));
            }
            if current < prev {
                return Err(SeriesError::NonIncreasingYears { previous: prev, current });
            }
            if policy == GapPolicy::Reject && current - prev > 1 {
                return Err(SeriesError::YearGap { from: prev, to: current });
            }
        }
        previous = Some(current);
    }
    Ok(())
}

/// One entity's ordered input table plus the sectors to decompose over.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub sectors: Vec<Sector>,
    pub records: Vec<YearRecord>,
}

impl Series {
    /// Wrap records that are already in ascending year order.
    pub fn new(sectors: Vec<Sector>, records: Vec<YearRecord>) -> Self {
        Self { sectors, records }
    }

    /// Sort records by year (gaps allowed) and reject duplicate years.
    pub fn sorted(sectors: Vec<Sector>, mut records: Vec<YearRecord>) -> Result<Self, SeriesError> {
        records.sort_by_key(|r| r.year);
        check_years(records.iter().map(|r| r.year), GapPolicy::Adjacent)?;
        Ok(Self { sectors, records })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn years(&self) -> impl Iterator<Item = i32> + '_ {
        self.records.iter().map(|r| r.year)
    }
}

// ------------------------------------------------------------------
// LMDI outputs
// ------------------------------------------------------------------

/// Derived structure shares `S_i = A_i / A_total` and intensities
/// `I_i = E_i / A_i` for one year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactorRow {
    pub year: i32,
    pub shares: BTreeMap<Sector, Option<f64>>,
    pub intensities: BTreeMap<Sector, Option<f64>>,
}

impl FactorRow {
    pub fn share(&self, sector: &str) -> Option<f64> {
        self.shares.get(sector).copied().flatten()
    }

    pub fn intensity(&self, sector: &str) -> Option<f64> {
        self.intensities.get(sector).copied().flatten()
    }
}

/// Additive decomposition of the change in total emissions between the
/// previous row and `year`.
///
/// Field order and serialized names form the export schema.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DecompositionRow {
    #[serde(rename = "Year")]
    pub year: i32,
    #[serde(rename = "Delta_E_Total_Actual")]
    pub delta_actual: Option<f64>,
    #[serde(rename = "Effect_Activity")]
    pub activity: Option<f64>,
    #[serde(rename = "Effect_Structure")]
    pub structure: Option<f64>,
    #[serde(rename = "Effect_Intensity")]
    pub intensity: Option<f64>,
    #[serde(rename = "Delta_E_Total_Calculated")]
    pub delta_calculated: Option<f64>,
}

impl DecompositionRow {
    /// Column headers in export order.
    pub const COLUMNS: [&'static str; 6] = [
        "Year",
        "Delta_E_Total_Actual",
        "Effect_Activity",
        "Effect_Structure",
        "Effect_Intensity",
        "Delta_E_Total_Calculated",
    ];

    /// `actual - calculated`, undefined if either side is.
    pub fn residual(&self) -> Option<f64> {
        Some(self.delta_actual? - self.delta_calculated?)
    }

    /// Whether the effects close against the observed change.
    ///
    /// The tolerance is relative to `max(|actual|, 1.0)`. Rows with an
    /// undefined side are never reconciled.
    pub fn is_reconciled(&self, tolerance: f64) -> bool {
        match (self.residual(), self.delta_actual) {
            (Some(residual), Some(actual)) => residual.abs() <= tolerance * actual.abs().max(1.0),
            _ => false,
        }
    }
}

// ------------------------------------------------------------------
// Decoupling
// ------------------------------------------------------------------

/// Tapio decoupling regime. Closed vocabulary; the serialized and displayed
/// form is the label text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DecouplingState {
    #[serde(rename = "No Data")]
    NoData,
    #[serde(rename = "Strong Decoupling")]
    StrongDecoupling,
    #[serde(rename = "Weak Decoupling")]
    WeakDecoupling,
    #[serde(rename = "Coupling")]
    Coupling,
    #[serde(rename = "Strong Coupling")]
    StrongCoupling,
    #[serde(rename = "Weak Recession")]
    WeakRecession,
    #[serde(rename = "Coupled Recession")]
    CoupledRecession,
    #[serde(rename = "Strong Recession")]
    StrongRecession,
    #[serde(rename = "Strong Negative Coupling")]
    StrongNegativeCoupling,
    #[serde(rename = "Not Classified")]
    NotClassified,
}

impl DecouplingState {
    pub const ALL: [DecouplingState; 10] = [
        Self::NoData,
        Self::StrongDecoupling,
        Self::WeakDecoupling,
        Self::Coupling,
        Self::StrongCoupling,
        Self::WeakRecession,
        Self::CoupledRecession,
        Self::StrongRecession,
        Self::StrongNegativeCoupling,
        Self::NotClassified,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::NoData => "No Data",
            Self::StrongDecoupling => "Strong Decoupling",
            Self::WeakDecoupling => "Weak Decoupling",
            Self::Coupling => "Coupling",
            Self::StrongCoupling => "Strong Coupling",
            Self::WeakRecession => "Weak Recession",
            Self::CoupledRecession => "Coupled Recession",
            Self::StrongRecession => "Strong Recession",
            Self::StrongNegativeCoupling => "Strong Negative Coupling",
            Self::NotClassified => "Not Classified",
        }
    }

    /// Elasticity band of the expansion branch (`gdp > 0`, `em > 0`).
    pub fn expansion_band(elasticity: f64) -> Self {
        if elasticity < COUPLING_LOWER {
            Self::WeakDecoupling
        } else if elasticity <= COUPLING_UPPER {
            Self::Coupling
        } else {
            Self::StrongCoupling
        }
    }

    /// Elasticity band of the recession branch (`gdp < 0`, `em < 0`).
    pub fn recession_band(elasticity: f64) -> Self {
        if elasticity > COUPLING_UPPER {
            Self::WeakRecession
        } else if elasticity >= COUPLING_LOWER {
            Self::CoupledRecession
        } else {
            Self::StrongRecession
        }
    }
}

impl fmt::Display for DecouplingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One year of a country's decoupling input: value-added growth in percent
/// and the absolute emissions level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CountryYear {
    pub year: i32,
    pub gva_growth: Option<f64>,
    pub emissions: Option<f64>,
}

/// A country's decoupling input rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountrySeries {
    pub country: String,
    pub rows: Vec<CountryYear>,
}

/// One classified country-year. Field order and names form the export schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecouplingRow {
    #[serde(rename = "Country")]
    pub country: String,
    #[serde(rename = "Year")]
    pub year: i32,
    #[serde(rename = "GVA Growth (%)")]
    pub gva_growth: Option<f64>,
    #[serde(rename = "Emissions Growth (%)")]
    pub em_growth: Option<f64>,
    #[serde(rename = "Elasticity Coeff.")]
    pub elasticity: Option<f64>,
    #[serde(rename = "Status")]
    pub status: DecouplingState,
}

impl DecouplingRow {
    pub const COLUMNS: [&'static str; 6] = [
        "Country",
        "Year",
        "GVA Growth (%)",
        "Emissions Growth (%)",
        "Elasticity Coeff.",
        "Status",
    ];
}
