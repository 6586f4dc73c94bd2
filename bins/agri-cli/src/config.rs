//! Runner configuration loaded from environment variables.
//!
//! Command-line flags override these values in `main`.

use anyhow::{bail, Context, Result};

use agri_core::constants::{DEFAULT_MIN_YEAR, DEFAULT_RECONCILE_TOLERANCE};
use agri_core::types::GapPolicy;
use agri_lmdi::LmdiConfig;

#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    /// First year kept in the analysis (`None` keeps every year).
    pub min_year: Option<i32>,
    /// Field delimiter for delimited exports.
    pub delimiter: char,
    /// Relative tolerance for the LMDI reconciliation check.
    pub reconcile_tolerance: f64,
    /// Pairing rule for non-consecutive years.
    pub gap_policy: GapPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            min_year: Some(DEFAULT_MIN_YEAR),
            delimiter: ';',
            reconcile_tolerance: DEFAULT_RECONCILE_TOLERANCE,
            gap_policy: GapPolicy::Adjacent,
        }
    }
}

impl Config {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_vars<F>(var: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let min_year = match var("AGRI_MIN_YEAR") {
            Some(v) => parse_min_year(&v).context("AGRI_MIN_YEAR must be a year or 'none'")?,
            None => defaults.min_year,
        };

        let delimiter = match var("AGRI_DELIMITER") {
            Some(v) => parse_delimiter(&v).context("AGRI_DELIMITER must be a single character")?,
            None => defaults.delimiter,
        };

        let reconcile_tolerance = match var("AGRI_RECONCILE_TOLERANCE") {
            Some(v) => v
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|t| t.is_finite() && *t >= 0.0)
                .context("AGRI_RECONCILE_TOLERANCE must be a non-negative number")?,
            None => defaults.reconcile_tolerance,
        };

        let gap_policy = match var("AGRI_GAP_POLICY") {
            Some(v) => parse_gap_policy(&v)?,
            None => defaults.gap_policy,
        };

        Ok(Config {
            min_year,
            delimiter,
            reconcile_tolerance,
            gap_policy,
        })
    }

    /// Engine settings derived from this configuration.
    pub fn lmdi(&self) -> LmdiConfig {
        LmdiConfig {
            gap_policy: self.gap_policy,
            reconcile_tolerance: self.reconcile_tolerance,
        }
    }
}

/// First-year filter; `None` keeps every year.
pub type MinYear = Option<i32>;

pub fn parse_min_year(value: &str) -> Result<MinYear> {
    let value = value.trim();
    if value.eq_ignore_ascii_case("none") || value.is_empty() {
        return Ok(None);
    }
    let year = value
        .parse::<i32>()
        .with_context(|| format!("expected a year or 'none', got {value:?}"))?;
    Ok(Some(year))
}

pub fn parse_delimiter(value: &str) -> Result<char> {
    let mut chars = value.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(c),
        _ if value == "\\t" => Ok('\t'),
        _ => bail!("expected one character, got {value:?}"),
    }
}

pub fn parse_gap_policy(value: &str) -> Result<GapPolicy> {
    match value.trim().to_ascii_lowercase().as_str() {
        "adjacent" => Ok(GapPolicy::Adjacent),
        "reject" => Ok(GapPolicy::Reject),
        other => bail!("unknown gap policy {other:?} (expected 'adjacent' or 'reject')"),
    }
}
