//! # agri-decoupling: Tapio decoupling analysis.
//!
//! - **Classifier**: maps paired growth rates (economic output, emissions)
//!   to one of the closed set of decoupling regimes.
//! - **Growth**: derives percentage growth and elasticity from level series.
//! - **Analysis**: builds the classified country-year table for several
//!   countries at once.

pub mod analysis;
pub mod growth;
pub mod tapio;

pub use analysis::DecouplingAnalysis;
pub use growth::{elasticity, percent_change};
pub use tapio::{classify, TapioClassifier};
