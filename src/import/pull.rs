//! Pull-tester CSV log reader
//!
//! The tester writes a fixed-size preamble followed by one row per event;
//! only rows tagged `TEST` are wire pulls.

use csv::ReaderBuilder;
use std::io::Read;
use std::path::Path;
use tracing::debug;

use crate::entities::pull_test::PullTestRow;
use crate::import::ImportError;

/// Rows of tester preamble before the first event
pub const PULL_LOG_HEADER_ROWS: usize = 19;

const TEST_TAG: &str = "TEST";
const GRADE_COLUMN: usize = 2;
const STRENGTH_COLUMN: usize = 3;

fn field(record: &csv::StringRecord, column: usize, name: &'static str) -> Result<f64, ImportError> {
    let line = record.position().map(|p| p.line()).unwrap_or(0);
    let raw = record.get(column).unwrap_or("").trim();
    raw.parse::<f64>().map_err(|_| ImportError::InvalidValue {
        line,
        field: name,
        value: raw.to_string(),
    })
}

/// Parse a pull log from any reader
pub fn parse_pull_log<R: Read>(reader: R, source: &Path) -> Result<Vec<PullTestRow>, ImportError> {
    let mut csv = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let mut rows = Vec::new();
    for (i, record) in csv.records().enumerate() {
        let record = record.map_err(|source_err| ImportError::Csv {
            path: source.to_path_buf(),
            source: source_err,
        })?;
        if i < PULL_LOG_HEADER_ROWS {
            continue;
        }
        if record.get(0).map(str::trim) != Some(TEST_TAG) {
            continue;
        }
        rows.push(PullTestRow {
            raw_grade: field(&record, GRADE_COLUMN, "grade")?,
            strength: field(&record, STRENGTH_COLUMN, "strength")?,
            index: rows.len(),
        });
    }
    Ok(rows)
}

/// Read a pull log file
pub fn read_pull_log(path: &Path) -> Result<Vec<PullTestRow>, ImportError> {
    let file = std::fs::File::open(path).map_err(|source| ImportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let rows = parse_pull_log(std::io::BufReader::new(file), path)?;
    debug!("Read {} wire pulls from {}", rows.len(), path.display());
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn log(body: &str) -> String {
        let mut text = String::new();
        for i in 0..PULL_LOG_HEADER_ROWS {
            text.push_str(&format!("Header {},value\n", i));
        }
        text.push_str(body);
        text
    }

    #[test]
    fn test_only_test_rows_after_header() {
        let text = log("TEST,1,2,10.5\nINFO,x\nTEST,2,6,8.25,extra\n");
        let rows = parse_pull_log(text.as_bytes(), Path::new("log.csv")).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].raw_grade, 2.0);
        assert_eq!(rows[0].strength, 10.5);
        assert_eq!(rows[1].raw_grade, 6.0);
        assert_eq!(rows[1].index, 1);
    }

    #[test]
    fn test_test_rows_inside_header_are_ignored() {
        let mut text = String::from("TEST,0,2,1.0\n");
        for i in 1..PULL_LOG_HEADER_ROWS {
            text.push_str(&format!("Header {}\n", i));
        }
        text.push_str("TEST,1,2,9.0\n");
        let rows = parse_pull_log(text.as_bytes(), Path::new("log.csv")).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].strength, 9.0);
    }

    #[test]
    fn test_bad_strength_is_an_error() {
        let text = log("TEST,1,2,broken\n");
        let err = parse_pull_log(text.as_bytes(), Path::new("log.csv")).unwrap_err();
        assert!(matches!(err, ImportError::InvalidValue { field: "strength", .. }));
    }
}
