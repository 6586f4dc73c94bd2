//! Per-year structure shares and emission intensities.
//!
//! `S_i = A_i / A_total`, `I_i = E_i / A_i`. A zero or missing denominator
//! leaves the factor undefined (`None`).

use std::collections::BTreeMap;

use agri_core::types::{finite, FactorRow, Series, YearRecord};

/// `num / den`, or `None` when either side is missing or the quotient is
/// not finite.
pub(crate) fn ratio(num: Option<f64>, den: Option<f64>) -> Option<f64> {
    finite(Some(finite(num)? / finite(den)?))
}

/// Factors of a single record for the given sectors.
pub fn factor_row(record: &YearRecord, sectors: &[String]) -> FactorRow {
    let mut shares = BTreeMap::new();
    let mut intensities = BTreeMap::new();

    for sector in sectors {
        let levels = record.sector(sector).copied().unwrap_or_default();
        shares.insert(sector.clone(), ratio(levels.activity, record.activity_total));
        intensities.insert(sector.clone(), ratio(levels.emissions, levels.activity));
    }

    FactorRow {
        year: record.year,
        shares,
        intensities,
    }
}

/// Factor rows for every record of `series`, in input order.
///
/// Sectors absent from a record get undefined factors; use
/// [`LmdiEngine::factors`](crate::engine::LmdiEngine::factors) to reject
/// such series instead.
pub fn factor_table(series: &Series) -> Vec<FactorRow> {
    series
        .records
        .iter()
        .map(|record| factor_row(record, &series.sectors))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use agri_core::types::SectorLevels;

    fn sectors() -> Vec<String> {
        vec!["crops".into(), "livestock".into()]
    }

    #[test]
    fn ratio_handles_degenerate_inputs() {
        assert_eq!(ratio(Some(6.0), Some(3.0)), Some(2.0));
        assert_eq!(ratio(Some(6.0), Some(0.0)), None);
        assert_eq!(ratio(Some(0.0), Some(0.0)), None);
        assert_eq!(ratio(None, Some(3.0)), None);
        assert_eq!(ratio(Some(3.0), Some(f64::NAN)), None);
    }

    #[test]
    fn shares_and_intensities() {
        let record = YearRecord::new(2010, Some(300.0), Some(1000.0))
            .with_sector("crops", SectorLevels::new(100.0, 400.0))
            .with_sector("livestock", SectorLevels::new(200.0, 600.0));
        let row = factor_row(&record, &sectors());

        assert_eq!(row.year, 2010);
        assert_eq!(row.share("crops"), Some(0.4));
        assert_eq!(row.share("livestock"), Some(0.6));
        assert_eq!(row.intensity("crops"), Some(0.25));
        assert!((row.intensity("livestock").unwrap() - 1.0 / 3.0).abs() < 1e-15);
    }

    #[test]
    fn zero_activity_leaves_intensity_undefined() {
        let record = YearRecord::new(2010, Some(10.0), Some(500.0))
            .with_sector("crops", SectorLevels::new(10.0, 0.0))
            .with_sector("livestock", SectorLevels::new(0.0, 500.0));
        let row = factor_row(&record, &sectors());

        assert_eq!(row.share("crops"), Some(0.0));
        assert_eq!(row.intensity("crops"), None);
        assert_eq!(row.intensity("livestock"), Some(0.0));
    }

    #[test]
    fn absent_sector_is_undefined() {
        let record = YearRecord::new(2010, Some(10.0), Some(500.0))
            .with_sector("crops", SectorLevels::new(10.0, 500.0));
        let row = factor_row(&record, &sectors());
        assert_eq!(row.share("livestock"), None);
        assert_eq!(row.intensity("livestock"), None);
    }

    #[test]
    fn table_keeps_input_order() {
        let series = Series::new(
            sectors(),
            vec![
                YearRecord::new(2003, Some(1.0), Some(1.0)),
                YearRecord::new(2007, Some(1.0), Some(1.0)),
            ],
        );
        let years: Vec<i32> = factor_table(&series).iter().map(|r| r.year).collect();
        assert_eq!(years, vec![2003, 2007]);
    }
}
