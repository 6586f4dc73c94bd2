//! Loading and cleaning of JSON table exports.
//!
//! Spreadsheet exports arrive with numbers stored as text (`"1 234,5"`,
//! `"12.3?"`). Each cell is normalised by removing `?` and whitespace and
//! replacing the decimal comma; anything that still fails to parse is a
//! missing value.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::{info, warn};

use agri_core::constants::{
    activity_column, emissions_column, COLUMN_ACTIVITY_TOTAL, COLUMN_EMISSIONS_TOTAL,
    DEFAULT_SECTORS,
};
use agri_core::error::{AgriError, LmdiError};
use agri_core::types::{CountrySeries, CountryYear, SectorLevels, Series, YearRecord};

/// Name of the year column in every input table.
pub const COLUMN_YEAR: &str = "Year";

/// A cell as exported: a number, text, or null.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Number(f64),
    Text(String),
}

impl RawValue {
    /// Cleaned numeric value, or `None` when the cell holds no number.
    pub fn clean(&self) -> Option<f64> {
        match self {
            RawValue::Number(n) => Some(*n).filter(|v| v.is_finite()),
            RawValue::Text(s) => clean_text(s),
        }
    }
}

/// Normalise a textual number: drop `?` and all whitespace (including
/// non-breaking spaces), turn a decimal comma into a point.
pub fn clean_text(text: &str) -> Option<f64> {
    let cleaned: String = text
        .chars()
        .filter(|c| *c != '?' && !c.is_whitespace())
        .map(|c| if c == ',' { '.' } else { c })
        .collect();
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

fn cell(value: Option<&Option<RawValue>>) -> Option<f64> {
    value.and_then(|v| v.as_ref()).and_then(RawValue::clean)
}

/// Whole-number year from a cell; fractional or missing years are `None`.
fn year_of(value: Option<&Option<RawValue>>) -> Option<i32> {
    cell(value)
        .filter(|y| y.fract() == 0.0 && *y >= i32::MIN as f64 && *y <= i32::MAX as f64)
        .map(|y| y as i32)
}

fn default_sectors() -> Vec<String> {
    DEFAULT_SECTORS.iter().map(|s| s.to_string()).collect()
}

/// Wide LMDI table: `Year`, `E_total`, `A_total`, and `E_<sector>` /
/// `A_<sector>` for every tracked sector.
#[derive(Debug, Deserialize)]
pub struct LmdiInput {
    #[serde(default = "default_sectors")]
    pub sectors: Vec<String>,
    pub records: Vec<BTreeMap<String, Option<RawValue>>>,
}

impl LmdiInput {
    /// Convert the wide rows into a sorted [`Series`].
    ///
    /// Rows without a readable year are dropped, as are rows before
    /// `min_year`. A column absent from a kept row is an error.
    pub fn into_series(self, min_year: Option<i32>) -> Result<Series, AgriError> {
        let mut records = Vec::with_capacity(self.records.len());

        for (index, row) in self.records.iter().enumerate() {
            let Some(year) = year_of(row.get(COLUMN_YEAR)) else {
                warn!(row = index, "dropping row without a readable year");
                continue;
            };
            if min_year.is_some_and(|min| year < min) {
                continue;
            }

            let required = |column: String| -> Result<Option<f64>, LmdiError> {
                match row.get(&column) {
                    Some(value) => Ok(cell(Some(value))),
                    None => Err(LmdiError::MissingColumn { year, column }),
                }
            };

            let mut record = YearRecord::new(
                year,
                required(COLUMN_EMISSIONS_TOTAL.to_string())?,
                required(COLUMN_ACTIVITY_TOTAL.to_string())?,
            );
            for sector in &self.sectors {
                let levels = SectorLevels {
                    emissions: required(emissions_column(sector))?,
                    activity: required(activity_column(sector))?,
                };
                record.sectors.insert(sector.clone(), levels);
            }
            records.push(record);
        }

        let series = Series::sorted(self.sectors, records)?;
        info!(years = series.len(), sectors = ?series.sectors, "loaded LMDI table");
        Ok(series)
    }
}

#[derive(Debug, Deserialize)]
pub struct CountryRowInput {
    #[serde(rename = "Year")]
    pub year: Option<RawValue>,
    #[serde(default)]
    pub gva_growth: Option<RawValue>,
    #[serde(default)]
    pub emissions: Option<RawValue>,
}

#[derive(Debug, Deserialize)]
pub struct CountryInput {
    pub country: String,
    pub rows: Vec<CountryRowInput>,
}

/// Merged per-country table: value-added growth (%) and emission levels.
#[derive(Debug, Deserialize)]
pub struct DecouplingInput {
    pub countries: Vec<CountryInput>,
}

impl DecouplingInput {
    /// Clean every country's rows and sort them by year.
    ///
    /// Rows without a readable year are dropped. Year filtering is left to
    /// the analysis so that the first kept year still has a growth base.
    pub fn into_countries(self) -> Vec<CountrySeries> {
        self.countries
            .into_iter()
            .map(|c| {
                let mut rows: Vec<CountryYear> = c
                    .rows
                    .iter()
                    .filter_map(|r| {
                        let year = year_of(Some(&r.year));
                        if year.is_none() {
                            warn!(country = %c.country, "dropping row without a readable year");
                        }
                        Some(CountryYear {
                            year: year?,
                            gva_growth: r.gva_growth.as_ref().and_then(RawValue::clean),
                            emissions: r.emissions.as_ref().and_then(RawValue::clean),
                        })
                    })
                    .collect();
                rows.sort_by_key(|r| r.year);
                CountrySeries {
                    country: c.country,
                    rows,
                }
            })
            .collect()
    }
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read input file: {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Malformed input table: {}", path.display()))
}

pub fn load_lmdi(path: &Path, min_year: Option<i32>) -> Result<Series> {
    let input: LmdiInput = read_json(path)?;
    Ok(input.into_series(min_year)?)
}

pub fn load_decoupling(path: &Path) -> Result<Vec<CountrySeries>> {
    let input: DecouplingInput = read_json(path)?;
    Ok(input.into_countries())
}

#[cfg(test)]
mod tests {
    use super::*;
    use agri_core::error::SeriesError;
    use std::io::Write;

    fn lmdi(json: &str) -> LmdiInput {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn clean_text_handles_export_noise() {
        assert_eq!(clean_text("1 234,5"), Some(1234.5));
        assert_eq!(clean_text("12.3?"), Some(12.3));
        assert_eq!(clean_text("\u{a0}42\u{a0}"), Some(42.0));
        assert_eq!(clean_text("?"), None);
        assert_eq!(clean_text(".."), None);
        assert_eq!(clean_text("n/a"), None);
    }

    #[test]
    fn raw_values_from_json() {
        let values: Vec<Option<RawValue>> = serde_json::from_str(r#"[1.5, "2,5", null, "x"]"#).unwrap();
        let cleaned: Vec<Option<f64>> = values.iter().map(|v| cell(Some(v))).collect();
        assert_eq!(cleaned, vec![Some(1.5), Some(2.5), None, None]);
    }

    #[test]
    fn wide_rows_become_sorted_records() {
        let input = lmdi(
            r#"{
                "records": [
                    {"Year": 2004, "E_total": "30", "A_total": 60, "E_crops": 10, "A_crops": 20, "E_livestock": 20, "A_livestock": 40},
                    {"Year": "2003", "E_total": 30, "A_total": 60, "E_crops": 10, "A_crops": 20, "E_livestock": 20, "A_livestock": null},
                    {"Year": "total", "E_total": 1, "A_total": 1}
                ]
            }"#,
        );
        let series = input.into_series(None).unwrap();
        assert_eq!(series.sectors, vec!["crops", "livestock"]);
        assert_eq!(series.years().collect::<Vec<_>>(), vec![2003, 2004]);
        assert_eq!(series.records[0].sector("livestock").unwrap().activity, None);
        assert_eq!(series.records[1].emissions_total, Some(30.0));
    }

    #[test]
    fn rows_before_min_year_are_dropped() {
        let input = lmdi(
            r#"{"sectors": ["crops"], "records": [
                {"Year": 2002, "E_total": 1, "A_total": 1, "E_crops": 1, "A_crops": 1},
                {"Year": 2003, "E_total": 1, "A_total": 1, "E_crops": 1, "A_crops": 1}
            ]}"#,
        );
        let series = input.into_series(Some(2003)).unwrap();
        assert_eq!(series.years().collect::<Vec<_>>(), vec![2003]);
    }

    #[test]
    fn absent_column_is_named() {
        let input = lmdi(
            r#"{"sectors": ["crops"], "records": [
                {"Year": 2003, "E_total": 1, "A_total": 1, "E_crops": 1}
            ]}"#,
        );
        let err = input.into_series(None).unwrap_err();
        assert_eq!(err.to_string(), "missing column A_crops for year 2003");
    }

    #[test]
    fn duplicate_years_rejected() {
        let input = lmdi(
            r#"{"sectors": ["crops"], "records": [
                {"Year": 2003, "E_total": 1, "A_total": 1, "E_crops": 1, "A_crops": 1},
                {"Year": 2003, "E_total": 1, "A_total": 1, "E_crops": 1, "A_crops": 1}
            ]}"#,
        );
        assert!(matches!(
            input.into_series(None),
            Err(AgriError::Series(SeriesError::DuplicateYear(2003)))
        ));
    }

    #[test]
    fn decoupling_rows_cleaned_and_sorted() {
        let input: DecouplingInput = serde_json::from_str(
            r#"{"countries": [{"country": "Kazakhstan", "rows": [
                {"Year": 2004, "gva_growth": "-1,2", "emissions": "20 800"},
                {"Year": 2003, "gva_growth": 3.5},
                {"Year": null, "gva_growth": 1}
            ]}]}"#,
        )
        .unwrap();
        let countries = input.into_countries();
        assert_eq!(countries.len(), 1);
        let rows = &countries[0].rows;
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].year, 2003);
        assert_eq!(rows[0].emissions, None);
        assert_eq!(rows[1].gva_growth, Some(-1.2));
        assert_eq!(rows[1].emissions, Some(20_800.0));
    }

    #[test]
    fn load_lmdi_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"sectors": ["crops"], "records": [
                {{"Year": 2003, "E_total": 1, "A_total": 2, "E_crops": 1, "A_crops": 2}},
                {{"Year": 2004, "E_total": 2, "A_total": 3, "E_crops": 2, "A_crops": 3}}
            ]}}"#
        )
        .unwrap();
        let series = load_lmdi(file.path(), None).unwrap();
        assert_eq!(series.len(), 2);
    }

    #[test]
    fn load_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_decoupling(&dir.path().join("absent.json")).unwrap_err();
        assert!(err.to_string().contains("Failed to read input file"));
    }
}
