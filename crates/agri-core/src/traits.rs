//! Trait interfaces between crates.
//!
//! - [`Decomposer`]: additive decomposition of emissions change (agri-lmdi implements)
//! - [`DecouplingClassifier`]: growth-rate regime labelling (agri-decoupling implements)

use crate::error::LmdiError;
use crate::types::{DecompositionRow, DecouplingState, Series};

/// Year-over-year decomposition of total emissions change.
///
/// Implementations are pure: the same series always yields the same rows,
/// and no state is carried between calls.
pub trait Decomposer: Send + Sync {
    /// Decompose every consecutive pair of rows in `series`.
    ///
    /// Returns one row per pair, keyed by the later year, in ascending order.
    /// Structural problems fail the whole call; no partial output is returned.
    fn decompose(&self, series: &Series) -> Result<Vec<DecompositionRow>, LmdiError>;
}

/// Maps paired growth rates (percent) to a decoupling regime.
pub trait DecouplingClassifier: Send + Sync {
    /// Classify one observation. Missing inputs yield
    /// [`DecouplingState::NoData`], never an error.
    fn classify(&self, gdp_growth: Option<f64>, em_growth: Option<f64>) -> DecouplingState;

    /// Classify a sequence of observations in order.
    ///
    /// Default implementation maps [`classify`](Self::classify) over the pairs.
    fn classify_all(&self, pairs: &[(Option<f64>, Option<f64>)]) -> Vec<DecouplingState> {
        pairs.iter().map(|&(g, e)| self.classify(g, e)).collect()
    }
}
