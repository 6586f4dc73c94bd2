//! Tapio decoupling classifier.
//!
//! Rules are evaluated in order, first match wins:
//!
//! | gdp | em | regime |
//! |-----|----|--------|
//! | missing | any | No Data |
//! | any | missing | No Data |
//! | > 0 | < 0 | Strong Decoupling |
//! | > 0 | > 0 | by elasticity: < 0.8 Weak Decoupling, 0.8..=1.2 Coupling, > 1.2 Strong Coupling |
//! | < 0 | < 0 | by elasticity: > 1.2 Weak Recession, 0.8..=1.2 Coupled Recession, < 0.8 Strong Recession |
//! | < 0 | > 0 | Strong Negative Coupling |
//! | otherwise | | Not Classified |
//!
//! Elasticity is `em / gdp`. Both band edges are inclusive in the coupling
//! band.

use std::cmp::Ordering;

use agri_core::traits::DecouplingClassifier;
use agri_core::types::DecouplingState;

fn sign(v: f64) -> Ordering {
    if v > 0.0 {
        Ordering::Greater
    } else if v < 0.0 {
        Ordering::Less
    } else {
        Ordering::Equal
    }
}

/// Classify one year of paired growth rates, both in percent.
///
/// `None` and NaN are missing values. An exactly-zero rate on either side
/// falls through to [`DecouplingState::NotClassified`].
pub fn classify(gdp_growth: Option<f64>, em_growth: Option<f64>) -> DecouplingState {
    let present = |v: Option<f64>| v.filter(|x| !x.is_nan());
    let (Some(gdp), Some(em)) = (present(gdp_growth), present(em_growth)) else {
        return DecouplingState::NoData;
    };

    match (sign(gdp), sign(em)) {
        (Ordering::Greater, Ordering::Less) => DecouplingState::StrongDecoupling,
        (Ordering::Greater, Ordering::Greater) => DecouplingState::expansion_band(em / gdp),
        (Ordering::Less, Ordering::Less) => DecouplingState::recession_band(em / gdp),
        (Ordering::Less, Ordering::Greater) => DecouplingState::StrongNegativeCoupling,
        _ => DecouplingState::NotClassified,
    }
}

/// Stateless [`DecouplingClassifier`] using the fixed Tapio bands.
#[derive(Debug, Clone, Copy, Default)]
pub struct TapioClassifier;

impl TapioClassifier {
    pub fn new() -> Self {
        Self
    }
}

impl DecouplingClassifier for TapioClassifier {
    fn classify(&self, gdp_growth: Option<f64>, em_growth: Option<f64>) -> DecouplingState {
        classify(gdp_growth, em_growth)
    }
}
