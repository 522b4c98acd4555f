//! `.DAT` scan and `.STA` summary readers

use std::path::Path;
use tracing::debug;

use crate::core::region::MeasurementRow;
use crate::core::summary::SummaryRow;
use crate::import::ImportError;

/// Numeric fields of a line, or `None` when any token is not a number
fn numeric_fields(line: &str) -> Option<Vec<f64>> {
    let fields: Option<Vec<f64>> = line
        .split(|c: char| c.is_whitespace() || c == ',' || c == ';')
        .filter(|t| !t.is_empty())
        .map(|t| t.parse::<f64>().ok())
        .collect();
    fields.filter(|f| !f.is_empty())
}

/// Parse scan rows; lines with fewer than three numbers are skipped
pub fn parse_scan(text: &str) -> Vec<MeasurementRow> {
    text.lines()
        .filter_map(numeric_fields)
        .filter(|f| f.len() >= 3)
        .map(|f| MeasurementRow::new(f[0], f[1], f[2]))
        .collect()
}

/// Parse summary rows; non-numeric lines are skipped
pub fn parse_summary(text: &str) -> Vec<SummaryRow> {
    text.lines().filter_map(numeric_fields).collect()
}

fn read_text(path: &Path) -> Result<String, ImportError> {
    std::fs::read_to_string(path).map_err(|source| ImportError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Read a `.DAT` scan file
pub fn read_scan(path: &Path) -> Result<Vec<MeasurementRow>, ImportError> {
    let rows = parse_scan(&read_text(path)?);
    debug!("Read {} scan rows from {}", rows.len(), path.display());
    Ok(rows)
}

/// Read a `.STA` summary file
pub fn read_summary(path: &Path) -> Result<Vec<SummaryRow>, ImportError> {
    let rows = parse_summary(&read_text(path)?);
    debug!("Read {} summary rows from {}", rows.len(), path.display());
    Ok(rows)
}
