//! Summary-file trailer extraction
//!
//! A metrology summary file ends with a block of rows whose layout is fixed
//! per variant, whatever number of body rows precedes it. Fields are
//! therefore addressed by their offset from the end of the file (offset 1 is
//! the last row). Each variant's layout is a named schema table below.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::stats;

/// One row of a summary file
pub type SummaryRow = Vec<f64>;

/// Errors raised while reading trailer fields
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExtractionError {
    #[error("Cannot extract '{field}': expected exactly one candidate, found {}: {candidates:?}. Check the summary file", candidates.len())]
    Ambiguous {
        field: &'static str,
        candidates: Vec<f64>,
    },

    #[error("Summary trailer too short: need {needed} rows, have {available}")]
    TrailerTooShort { needed: usize, available: usize },

    #[error("Cannot extract '{field}': row {offset} from the end has no column {column}")]
    MissingColumn {
        field: &'static str,
        offset: usize,
        column: usize,
    },

    #[error("Cannot extract '{field}': no values passed the acceptance filter")]
    NoCandidates { field: &'static str },

    #[error("Cannot extract '{field}': row {offset} from the end has {width} values, expected 1")]
    UnexpectedRowWidth {
        field: &'static str,
        offset: usize,
        width: usize,
    },
}

/// Acceptance filter applied to a group of trailer values
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Accept {
    All,
    Below(f64),
    Above(f64),
    Between(f64, f64),
    /// Greater than another field of the same trailer
    AboveField(&'static str),
}

/// How the accepted values of a field are reduced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reduce {
    /// Keep every accepted value, in file order
    List,
    /// Exactly one value must be accepted
    Unique,
    /// First accepted value
    First,
}

/// Rows addressed by a field, as offsets from the end, farthest first
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rows {
    /// A single row
    At(usize),
    /// Rows `from` down to `to` inclusive, e.g. `Span(9, 6)` is the 9th- to
    /// the 6th-last rows
    Span(usize, usize),
}

/// Where a value lives within a row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Columns {
    /// One column
    Col(usize),
    /// Leading columns `0..n`
    Leading(usize),
    /// Every column of a row that must hold exactly one value
    Sole,
    /// Every column
    Each,
}

/// One named quantity of a trailer schema
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrailerField {
    pub name: &'static str,
    pub rows: Rows,
    pub columns: Columns,
    /// Unit conversion applied after filtering (1000.0 for mm to µm)
    pub scale: f64,
    pub accept: Accept,
    pub reduce: Reduce,
}

impl TrailerField {
    const fn scalar(name: &'static str, offset: usize, column: usize) -> Self {
        Self {
            name,
            rows: Rows::At(offset),
            columns: Columns::Col(column),
            scale: 1.0,
            accept: Accept::All,
            reduce: Reduce::Unique,
        }
    }

    const fn scaled(self, scale: f64) -> Self {
        Self { scale, ..self }
    }

    const fn group(
        name: &'static str,
        from: usize,
        to: usize,
        column: usize,
        accept: Accept,
        reduce: Reduce,
    ) -> Self {
        Self {
            name,
            rows: Rows::Span(from, to),
            columns: Columns::Col(column),
            scale: 1.0,
            accept,
            reduce,
        }
    }

    fn deepest_offset(&self) -> usize {
        match self.rows {
            Rows::At(offset) => offset,
            Rows::Span(from, to) => from.max(to),
        }
    }
}

pub const FLEX_TRAILER: &[TrailerField] = &[
    TrailerField::scalar("y_dimension", 1, 0),
    TrailerField::scalar("x_dimension", 2, 0),
    TrailerField::group("pickup_thickness", 9, 6, 2, Accept::Below(1.300), Reduce::List),
    TrailerField::scalar("ftm_thickness", 10, 2),
    TrailerField::group(
        "hv_thickness",
        13,
        11,
        2,
        Accept::AboveField("ftm_thickness"),
        Reduce::Unique,
    ),
];

pub const BARE_TRAILER: &[TrailerField] = &[
    TrailerField::scalar("bare_thickness", 1, 0).scaled(1000.0),
    TrailerField::scalar("fe_thickness", 3, 0).scaled(1000.0),
    TrailerField::scalar("fe_y", 5, 0),
    TrailerField::scalar("fe_x", 6, 0),
    TrailerField::scalar("sensor_y", 7, 0),
    TrailerField::scalar("sensor_x", 8, 0),
];

pub const ASSEMBLED_TRAILER: &[TrailerField] = &[
    TrailerField::scalar("ftm_thickness", 1, 0).scaled(1000.0),
    TrailerField::scalar("hv_thickness", 2, 0).scaled(1000.0),
    TrailerField {
        name: "fiducial_br",
        rows: Rows::At(3),
        columns: Columns::Leading(2),
        scale: 1.0,
        accept: Accept::All,
        reduce: Reduce::List,
    },
    TrailerField {
        name: "fiducial_tl",
        rows: Rows::At(4),
        columns: Columns::Leading(2),
        scale: 1.0,
        accept: Accept::All,
        reduce: Reduce::List,
    },
    TrailerField::group("pickup_thickness", 15, 12, 2, Accept::Below(0.800), Reduce::List)
        .scaled(1000.0),
    TrailerField {
        name: "x_value",
        rows: Rows::At(7),
        columns: Columns::Sole,
        scale: 1.0,
        accept: Accept::All,
        reduce: Reduce::Unique,
    },
    TrailerField {
        name: "y_value",
        rows: Rows::At(6),
        columns: Columns::Each,
        scale: 1.0,
        accept: Accept::Between(40.0, 42.0),
        reduce: Reduce::First,
    },
];

/// Read-only view of a summary file addressed from its end
#[derive(Debug, Clone, Copy)]
pub struct Trailer<'a> {
    rows: &'a [SummaryRow],
    schema: &'static [TrailerField],
}

impl<'a> Trailer<'a> {
    pub fn new(rows: &'a [SummaryRow], schema: &'static [TrailerField]) -> Self {
        Self { rows, schema }
    }

    /// Row `offset` from the end (1 = last row)
    fn row(&self, offset: usize) -> Result<&'a SummaryRow, ExtractionError> {
        if offset == 0 || offset > self.rows.len() {
            return Err(ExtractionError::TrailerTooShort {
                needed: offset,
                available: self.rows.len(),
            });
        }
        Ok(&self.rows[self.rows.len() - offset])
    }

    fn field(&self, name: &str) -> Option<&'static TrailerField> {
        self.schema.iter().find(|f| f.name == name)
    }

    /// Raw values of a field before filtering, in file order
    fn raw(&self, field: &TrailerField) -> Result<Vec<f64>, ExtractionError> {
        let offsets: Vec<usize> = match field.rows {
            Rows::At(offset) => vec![offset],
            Rows::Span(from, to) if from >= to => (to..=from).rev().collect(),
            Rows::Span(from, to) => (from..=to).collect(),
        };

        let mut values = Vec::new();
        for offset in offsets {
            let row = self.row(offset)?;
            let missing = |column| ExtractionError::MissingColumn {
                field: field.name,
                offset,
                column,
            };
            match field.columns {
                Columns::Col(column) => values.push(*row.get(column).ok_or_else(|| missing(column))?),
                Columns::Leading(n) => {
                    if row.len() < n {
                        return Err(missing(row.len()));
                    }
                    values.extend_from_slice(&row[..n]);
                }
                Columns::Sole => {
                    if row.len() != 1 {
                        return Err(ExtractionError::UnexpectedRowWidth {
                            field: field.name,
                            offset,
                            width: row.len(),
                        });
                    }
                    values.push(row[0]);
                }
                Columns::Each => values.extend_from_slice(row),
            }
        }
        Ok(values)
    }

    /// Filtered, reduced and scaled values of the named field
    pub fn values(&self, name: &str) -> Result<Vec<f64>, ExtractionError> {
        let field = self
            .field(name)
            .ok_or(ExtractionError::NoCandidates { field: "unknown" })?;
        let raw = self.raw(field)?;

        let accepted: Vec<f64> = match field.accept {
            Accept::All => raw,
            Accept::Below(limit) => raw.into_iter().filter(|v| *v < limit).collect(),
            Accept::Above(limit) => raw.into_iter().filter(|v| *v > limit).collect(),
            Accept::Between(lo, hi) => raw.into_iter().filter(|v| *v > lo && *v < hi).collect(),
            Accept::AboveField(reference) => {
                let limit = self.scalar(reference)?;
                raw.into_iter().filter(|v| *v > limit).collect()
            }
        };

        let reduced = match field.reduce {
            Reduce::List => accepted,
            Reduce::Unique if accepted.len() == 1 => accepted,
            Reduce::Unique => {
                return Err(ExtractionError::Ambiguous {
                    field: field.name,
                    candidates: accepted,
                })
            }
            Reduce::First => match accepted.first() {
                Some(v) => vec![*v],
                None => return Err(ExtractionError::NoCandidates { field: field.name }),
            },
        };

        Ok(reduced.into_iter().map(|v| v * field.scale).collect())
    }

    /// Single value of the named field
    pub fn scalar(&self, name: &str) -> Result<f64, ExtractionError> {
        let values = self.values(name)?;
        match values.as_slice() {
            [v] => Ok(*v),
            _ => Err(ExtractionError::Ambiguous {
                field: self.field(name).map(|f| f.name).unwrap_or("unknown"),
                candidates: values,
            }),
        }
    }

    /// Two leading values of the named field as (x, y)
    pub fn pair(&self, name: &str) -> Result<(f64, f64), ExtractionError> {
        let values = self.values(name)?;
        match values.as_slice() {
            [x, y] => Ok((*x, *y)),
            _ => Err(ExtractionError::Ambiguous {
                field: self.field(name).map(|f| f.name).unwrap_or("unknown"),
                candidates: values,
            }),
        }
    }

    /// Rows needed to read every field of the schema
    pub fn required_rows(&self) -> usize {
        self.schema
            .iter()
            .map(|f| f.deepest_offset())
            .max()
            .unwrap_or(0)
    }
}

/// Drop a final row carrying more than one value
///
/// Assembled-module summaries sometimes end with a stray multi-value row
/// that would shift every fixed offset by one.
pub fn normalize_assembled(rows: &[SummaryRow]) -> &[SummaryRow] {
    match rows.split_last() {
        Some((last, body)) if last.len() > 1 => body,
        _ => rows,
    }
}

fn check_length(trailer: &Trailer<'_>) -> Result<(), ExtractionError> {
    let needed = trailer.required_rows();
    if trailer.rows.len() < needed {
        return Err(ExtractionError::TrailerTooShort {
            needed,
            available: trailer.rows.len(),
        });
    }
    Ok(())
}

/// Bare flex summary quantities (mm)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlexSummary {
    pub x_dimension: f64,
    pub y_dimension: f64,
    pub pickup_thickness: Vec<f64>,
    pub avg_pickup_thickness: f64,
    pub ftm_thickness: f64,
    pub hv_thickness: f64,
}

impl FlexSummary {
    pub fn extract(rows: &[SummaryRow]) -> Result<Self, ExtractionError> {
        let trailer = Trailer::new(rows, FLEX_TRAILER);
        check_length(&trailer)?;

        let pickup_thickness = trailer.values("pickup_thickness")?;
        let avg_pickup_thickness = stats::mean(&pickup_thickness).ok_or(
            ExtractionError::NoCandidates {
                field: "pickup_thickness",
            },
        )?;

        Ok(Self {
            x_dimension: trailer.scalar("x_dimension")?,
            y_dimension: trailer.scalar("y_dimension")?,
            avg_pickup_thickness: stats::round_to(avg_pickup_thickness, 4),
            pickup_thickness,
            ftm_thickness: trailer.scalar("ftm_thickness")?,
            hv_thickness: trailer.scalar("hv_thickness")?,
        })
    }
}

/// Bare module summary quantities (dimensions in mm, thickness in µm)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BareSummary {
    pub bare_thickness: f64,
    pub fe_thickness: f64,
    pub fe_x: f64,
    pub fe_y: f64,
    pub sensor_x: f64,
    pub sensor_y: f64,
}

impl BareSummary {
    pub fn extract(rows: &[SummaryRow]) -> Result<Self, ExtractionError> {
        let trailer = Trailer::new(rows, BARE_TRAILER);
        check_length(&trailer)?;

        Ok(Self {
            bare_thickness: trailer.scalar("bare_thickness")?,
            fe_thickness: trailer.scalar("fe_thickness")?,
            fe_x: trailer.scalar("fe_x")?,
            fe_y: trailer.scalar("fe_y")?,
            sensor_x: trailer.scalar("sensor_x")?,
            sensor_y: trailer.scalar("sensor_y")?,
        })
    }
}

/// Assembled module summary quantities (thickness in µm, fiducials in mm)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssembledSummary {
    pub ftm_thickness: f64,
    pub hv_thickness: f64,
    pub fiducial_br: (f64, f64),
    pub fiducial_tl: (f64, f64),
    pub pickup_thickness: Vec<f64>,
    pub x_value: f64,
    pub y_value: f64,
}

impl AssembledSummary {
    pub fn extract(rows: &[SummaryRow]) -> Result<Self, ExtractionError> {
        let rows = normalize_assembled(rows);
        let trailer = Trailer::new(rows, ASSEMBLED_TRAILER);
        check_length(&trailer)?;

        Ok(Self {
            ftm_thickness: trailer.scalar("ftm_thickness")?,
            hv_thickness: trailer.scalar("hv_thickness")?,
            fiducial_br: trailer.pair("fiducial_br")?,
            fiducial_tl: trailer.pair("fiducial_tl")?,
            pickup_thickness: trailer.values("pickup_thickness")?,
            x_value: trailer.scalar("x_value")?,
            y_value: trailer.scalar("y_value")?,
        })
    }
}
