//! Error types for the analysis workspace.
//!
//! Missing values are never errors; they travel as `None` through the
//! arithmetic. Only structural problems with an input series end up here.
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SeriesError {
    #[error("duplicate year: {0}")] DuplicateYear(i32),
    #[error("years not strictly increasing: {current} follows {previous}")] NonIncreasingYears { previous: i32, current: i32 },
    #[error("year gap between {from} and {to}")] YearGap { from: i32, to: i32 },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LmdiError {
    #[error("no sectors tracked")] NoSectors,
    #[error("missing column {column} for year {year}")] MissingColumn { year: i32, column: String },
    #[error(transparent)] Series(#[from] SeriesError),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecouplingError {
    #[error("country {0} has no rows")] EmptyCountry(String),
    #[error("country {country}: {source}")] Series { country: String, source: SeriesError },
}

#[derive(Error, Debug)]
pub enum AgriError {
    #[error(transparent)] Series(#[from] SeriesError),
    #[error(transparent)] Lmdi(#[from] LmdiError),
    #[error(transparent)] Decoupling(#[from] DecouplingError),
}
