//! Export of result tables: delimited text, JSON, and a Markdown summary.
//!
//! Rounding happens here only; the analysis crates keep full precision.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::Serialize;

use agri_core::types::{DecompositionRow, DecouplingRow, FactorRow};

/// Byte-order mark prefixed to delimited files so spreadsheet tools detect
/// UTF-8 and honour `;` separators.
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Export format for result tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    /// Delimited text with a header row.
    Csv,
    /// Pretty-printed JSON array.
    Json,
}

/// A result table ready for export: headers plus formatted cells, and the
/// rounded rows for JSON.
pub struct Table<T> {
    pub headers: Vec<String>,
    pub cells: Vec<Vec<String>>,
    pub rows: Vec<T>,
}

pub fn round(value: Option<f64>, places: i32) -> Option<f64> {
    let scale = 10f64.powi(places);
    value.map(|v| (v * scale).round() / scale)
}

fn fmt_cell(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

pub fn decomposition_table(rows: &[DecompositionRow]) -> Table<DecompositionRow> {
    let rows: Vec<DecompositionRow> = rows
        .iter()
        .map(|r| DecompositionRow {
            year: r.year,
            delta_actual: round(r.delta_actual, 2),
            activity: round(r.activity, 2),
            structure: round(r.structure, 2),
            intensity: round(r.intensity, 2),
            delta_calculated: round(r.delta_calculated, 2),
        })
        .collect();
    let cells = rows
        .iter()
        .map(|r| {
            vec![
                r.year.to_string(),
                fmt_cell(r.delta_actual),
                fmt_cell(r.activity),
                fmt_cell(r.structure),
                fmt_cell(r.intensity),
                fmt_cell(r.delta_calculated),
            ]
        })
        .collect();
    Table {
        headers: DecompositionRow::COLUMNS.iter().map(|c| c.to_string()).collect(),
        cells,
        rows,
    }
}

pub fn factor_table(rows: &[FactorRow], sectors: &[String]) -> Table<FactorRow> {
    let mut headers = vec!["Year".to_string()];
    headers.extend(sectors.iter().map(|s| format!("S_{s}")));
    headers.extend(sectors.iter().map(|s| format!("I_{s}")));

    let cells = rows
        .iter()
        .map(|r| {
            let mut line = vec![r.year.to_string()];
            line.extend(sectors.iter().map(|s| fmt_cell(r.share(s))));
            line.extend(sectors.iter().map(|s| fmt_cell(r.intensity(s))));
            line
        })
        .collect();
    Table {
        headers,
        cells,
        rows: rows.to_vec(),
    }
}

pub fn decoupling_table(rows: &[DecouplingRow]) -> Table<DecouplingRow> {
    let rows: Vec<DecouplingRow> = rows
        .iter()
        .map(|r| DecouplingRow {
            gva_growth: round(r.gva_growth, 2),
            em_growth: round(r.em_growth, 2),
            elasticity: round(r.elasticity, 3),
            ..r.clone()
        })
        .collect();
    let cells = rows
        .iter()
        .map(|r| {
            vec![
                r.country.clone(),
                r.year.to_string(),
                fmt_cell(r.gva_growth),
                fmt_cell(r.em_growth),
                fmt_cell(r.elasticity),
                r.status.to_string(),
            ]
        })
        .collect();
    Table {
        headers: DecouplingRow::COLUMNS.iter().map(|c| c.to_string()).collect(),
        cells,
        rows,
    }
}

fn quote(field: &str, delimiter: char) -> String {
    if field.contains(delimiter) || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

pub fn write_delimited<W: Write>(
    mut w: W,
    headers: &[String],
    cells: &[Vec<String>],
    delimiter: char,
) -> Result<()> {
    let sep = delimiter.to_string();
    let line = |fields: &[String]| {
        fields
            .iter()
            .map(|f| quote(f, delimiter))
            .collect::<Vec<_>>()
            .join(&sep)
    };
    writeln!(w, "{}", line(headers))?;
    for row in cells {
        writeln!(w, "{}", line(row))?;
    }
    w.flush()?;
    Ok(())
}

impl<T: Serialize> Table<T> {
    /// Write the table in `format` to `w`.
    pub fn write<W: Write>(&self, mut w: W, format: Format, delimiter: char) -> Result<()> {
        match format {
            Format::Csv => write_delimited(w, &self.headers, &self.cells, delimiter),
            Format::Json => {
                serde_json::to_writer_pretty(&mut w, &self.rows)?;
                writeln!(w)?;
                w.flush()?;
                Ok(())
            }
        }
    }

    /// Write the table to a file, creating parent directories as needed.
    pub fn save(&self, path: &Path, format: Format, delimiter: char) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
        let file = File::create(path)
            .with_context(|| format!("Failed to create output file: {}", path.display()))?;
        let mut w = BufWriter::new(file);
        if format == Format::Csv {
            w.write_all(UTF8_BOM)?;
        }
        self.write(w, format, delimiter)
    }

    /// Markdown rendering for console summaries.
    pub fn markdown(&self) -> String {
        let mut out = format!("| {} |\n", self.headers.join(" | "));
        out.push_str(&format!(
            "|{}|\n",
            self.headers.iter().map(|h| "-".repeat(h.len() + 2)).collect::<Vec<_>>().join("|")
        ));
        for row in &self.cells {
            out.push_str(&format!("| {} |\n", row.join(" | ")));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agri_core::types::DecouplingState;

    fn row() -> DecompositionRow {
        DecompositionRow {
            year: 2004,
            delta_actual: Some(-50.0),
            activity: Some(812.3456),
            structure: Some(-12.004),
            intensity: None,
            delta_calculated: None,
        }
    }

    #[test]
    fn rounding() {
        assert_eq!(round(Some(1.23456), 2), Some(1.23));
        assert_eq!(round(Some(-0.0006), 3), Some(-0.001));
        assert_eq!(round(None, 2), None);
    }

    #[test]
    fn decomposition_csv_uses_export_schema() {
        let table = decomposition_table(&[row()]);
        let mut buf = Vec::new();
        table.write(&mut buf, Format::Csv, ';').unwrap();
        let text = String::from_utf8(buf).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next().unwrap(),
            "Year;Delta_E_Total_Actual;Effect_Activity;Effect_Structure;Effect_Intensity;Delta_E_Total_Calculated"
        );
        assert_eq!(lines.next().unwrap(), "2004;-50;812.35;-12;;");
    }

    #[test]
    fn decomposition_json_keeps_nulls() {
        let table = decomposition_table(&[row()]);
        let mut buf = Vec::new();
        table.write(&mut buf, Format::Json, ';').unwrap();
        let json: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(json[0]["Effect_Activity"], 812.35);
        assert!(json[0]["Effect_Intensity"].is_null());
    }

    #[test]
    fn decoupling_cells_and_quoting() {
        let table = decoupling_table(&[DecouplingRow {
            country: "Kyrgyz Republic; North".into(),
            year: 2004,
            gva_growth: Some(2.1),
            em_growth: Some(0.98039),
            elasticity: Some(0.466852),
            status: DecouplingState::WeakDecoupling,
        }]);
        let mut buf = Vec::new();
        table.write(&mut buf, Format::Csv, ';').unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(
            text.lines().nth(1).unwrap(),
            "\"Kyrgyz Republic; North\";2004;2.1;0.98;0.467;Weak Decoupling"
        );
    }

    #[test]
    fn factor_headers_per_sector() {
        let table = factor_table(&[], &["crops".to_string(), "livestock".to_string()]);
        assert_eq!(table.headers, vec!["Year", "S_crops", "S_livestock", "I_crops", "I_livestock"]);
    }

    #[test]
    fn markdown_summary() {
        let md = decomposition_table(&[row()]).markdown();
        assert!(md.starts_with("| Year | Delta_E_Total_Actual |"));
        assert!(md.contains("| 2004 | -50 | 812.35 | -12 |  |  |"));
    }

    #[test]
    fn save_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("lmdi.csv");
        decomposition_table(&[row()]).save(&path, Format::Csv, ',').unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("\u{feff}Year,Delta_E_Total_Actual"));
    }

    #[test]
    fn bom_only_on_csv_files() {
        let dir = tempfile::tempdir().unwrap();
        let table = decomposition_table(&[row()]);

        let csv = dir.path().join("lmdi.csv");
        table.save(&csv, Format::Csv, ';').unwrap();
        assert!(std::fs::read(&csv).unwrap().starts_with(UTF8_BOM));

        let json = dir.path().join("lmdi.json");
        table.save(&json, Format::Json, ';').unwrap();
        let bytes = std::fs::read(&json).unwrap();
        assert!(!bytes.starts_with(UTF8_BOM));
        serde_json::from_slice::<serde_json::Value>(&bytes).unwrap();

        let mut stdout = Vec::new();
        table.write(&mut stdout, Format::Csv, ';').unwrap();
        assert!(stdout.starts_with(b"Year;"));
    }
}
