//! # agri-core
//! Foundation types and traits for the agricultural emissions analysis workspace.

pub mod constants;
pub mod error;
pub mod traits;
pub mod types;
