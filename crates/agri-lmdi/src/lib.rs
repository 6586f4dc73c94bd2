//! # agri-lmdi: Logarithmic Mean Divisia Index decomposition.
//!
//! Splits the year-over-year change in total emissions into three additive
//! effects:
//! - **Activity**: change in total economic output.
//! - **Structure**: change in the output mix across sectors.
//! - **Intensity**: change in emissions per unit of output within a sector.
//!
//! Effects are weighted by the logarithmic mean of each sector's emissions in
//! the two periods, so they sum exactly to the observed change when sector
//! emissions add up to the total. Each row carries that sum for reconciliation.

pub mod engine;
pub mod factors;
pub mod weight;

pub use engine::{LmdiConfig, LmdiEngine};
pub use factors::factor_table;
pub use weight::log_mean_weight;
