//! Growth rates and elasticities derived from level series.

use agri_core::types::finite;

/// Year-over-year percentage change of `levels`, over positionally adjacent
/// entries.
///
/// The first entry has no predecessor and is `None`. A missing value on
/// either side, or a zero base, leaves the rate undefined.
///
/// A zero base therefore labels the year `No Data` downstream rather than
/// an infinite rate classified as Strong Coupling or Strong Negative Coupling.
pub fn percent_change(levels: &[Option<f64>]) -> Vec<Option<f64>> {
    let mut rates = Vec::with_capacity(levels.len());
    if levels.is_empty() {
        return rates;
    }
    rates.push(None);
    rates.extend(levels.windows(2).map(|w| rate(w[1], w[0])));
    rates
}

fn rate(now: Option<f64>, base: Option<f64>) -> Option<f64> {
    finite(Some((finite(now)? / finite(base)? - 1.0) * 100.0))
}

/// Decoupling elasticity `em_growth / gdp_growth`.
///
/// Undefined when either rate is missing or the quotient is not finite
/// (zero economic growth).
pub fn elasticity(gdp_growth: Option<f64>, em_growth: Option<f64>) -> Option<f64> {
    finite(Some(finite(em_growth)? / finite(gdp_growth)?))
}
