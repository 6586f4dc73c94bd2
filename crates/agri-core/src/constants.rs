//! Analysis constants shared by the decomposition engine and the classifier.

/// Substitute for zero or missing levels inside the logarithmic mean weight.
///
/// `ln(0)` is undefined, so a sector with zero (or unreported) emissions in
/// one of the two periods is treated as having `LMDI_EPSILON` emissions. The
/// resulting weight stays finite and close to zero. This is an approximation
/// of true-zero emissions, not an exact treatment, and it is applied nowhere
/// except the weight function.
pub const LMDI_EPSILON: f64 = 1e-9;

/// Lower elasticity bound of the Tapio coupling band (inclusive).
pub const COUPLING_LOWER: f64 = 0.8;

/// Upper elasticity bound of the Tapio coupling band (inclusive).
pub const COUPLING_UPPER: f64 = 1.2;

/// Default relative tolerance for the LMDI reconciliation check.
pub const DEFAULT_RECONCILE_TOLERANCE: f64 = 1e-6;

/// First year kept in exported decoupling tables by default.
///
/// Sector value-added growth series start in 2003; earlier emission levels
/// are still used to derive the 2003 emissions growth rate.
pub const DEFAULT_MIN_YEAR: i32 = 2003;

/// Sectors tracked in the source agricultural dataset.
pub const DEFAULT_SECTORS: [&str; 2] = ["crops", "livestock"];

/// Column name of the aggregate emissions level.
pub const COLUMN_EMISSIONS_TOTAL: &str = "E_total";

/// Column name of the aggregate activity (output) level.
pub const COLUMN_ACTIVITY_TOTAL: &str = "A_total";

/// Column name of a sector's emissions level, e.g. `E_crops`.
pub fn emissions_column(sector: &str) -> String {
    format!("E_{sector}")
}

/// Column name of a sector's activity level, e.g. `A_livestock`.
pub fn activity_column(sector: &str) -> String {
    format!("A_{sector}")
}
