//! Region classification of CMM probe scans
//!
//! A region is a calibrated bounding box around a physical feature (pickup
//! pad, fiducial, sensor edge, chip footprint), optionally restricted to a
//! window of the scan sequence. Classification keeps the rows inside the box
//! and then rejects z-outliers with a Median Absolute Deviation filter.

use std::fmt;
use std::ops::Range;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::stats;

/// Multiplier applied to the MAD when rejecting outliers
pub const MAD_CUTOFF: f64 = 3.0;

/// One probe point (x, y, z) in millimeters, in scan order
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MeasurementRow {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl MeasurementRow {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

impl From<(f64, f64, f64)> for MeasurementRow {
    fn from((x, y, z): (f64, f64, f64)) -> Self {
        Self { x, y, z }
    }
}

/// One end of an interval
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Limit {
    Unbounded,
    /// Excludes the value itself
    Open(f64),
    /// Includes the value itself
    Closed(f64),
}

/// Interval on one axis, each end independently open/closed/unbounded
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interval {
    pub lower: Limit,
    pub upper: Limit,
}

impl Interval {
    pub const ANY: Interval = Interval {
        lower: Limit::Unbounded,
        upper: Limit::Unbounded,
    };

    /// `lo < v < hi`
    pub const fn open(lo: f64, hi: f64) -> Self {
        Self {
            lower: Limit::Open(lo),
            upper: Limit::Open(hi),
        }
    }

    /// `v >= lo`
    pub const fn at_least(lo: f64) -> Self {
        Self {
            lower: Limit::Closed(lo),
            upper: Limit::Unbounded,
        }
    }

    /// `v > lo`
    pub const fn above(lo: f64) -> Self {
        Self {
            lower: Limit::Open(lo),
            upper: Limit::Unbounded,
        }
    }

    /// `v < hi`
    pub const fn below(hi: f64) -> Self {
        Self {
            lower: Limit::Unbounded,
            upper: Limit::Open(hi),
        }
    }

    pub const fn new(lower: Limit, upper: Limit) -> Self {
        Self { lower, upper }
    }

    pub fn contains(&self, v: f64) -> bool {
        let lower_ok = match self.lower {
            Limit::Unbounded => true,
            Limit::Open(lo) => v > lo,
            Limit::Closed(lo) => v >= lo,
        };
        let upper_ok = match self.upper {
            Limit::Unbounded => true,
            Limit::Open(hi) => v < hi,
            Limit::Closed(hi) => v <= hi,
        };
        lower_ok && upper_ok
    }

    fn is_unbounded(&self) -> bool {
        matches!(
            (self.lower, self.upper),
            (Limit::Unbounded, Limit::Unbounded)
        )
    }

    fn describe(&self, axis: &str) -> String {
        let lower = match self.lower {
            Limit::Unbounded => None,
            Limit::Open(lo) => Some((lo, "<", ">")),
            Limit::Closed(lo) => Some((lo, "<=", ">=")),
        };
        let upper = match self.upper {
            Limit::Unbounded => None,
            Limit::Open(hi) => Some((hi, "<")),
            Limit::Closed(hi) => Some((hi, "<=")),
        };
        match (lower, upper) {
            (Some((lo, op, _)), Some((hi, op2))) => format!("{lo} {op} {axis} {op2} {hi}"),
            (Some((lo, _, op)), None) => format!("{axis} {op} {lo}"),
            (None, Some((hi, op))) => format!("{axis} {op} {hi}"),
            (None, None) => format!("any {axis}"),
        }
    }
}

/// Geometric predicate over the x/y plane
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegionPredicate {
    pub x: Interval,
    pub y: Interval,
}

impl RegionPredicate {
    pub const fn new(x: Interval, y: Interval) -> Self {
        Self { x, y }
    }

    pub fn matches(&self, row: &MeasurementRow) -> bool {
        self.x.contains(row.x) && self.y.contains(row.y)
    }
}

impl fmt::Display for RegionPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.x.is_unbounded(), self.y.is_unbounded()) {
            (false, false) => write!(f, "{} and {}", self.x.describe("x"), self.y.describe("y")),
            (false, true) => write!(f, "{}", self.x.describe("x")),
            (true, false) => write!(f, "{}", self.y.describe("y")),
            (true, true) => write!(f, "any point"),
        }
    }
}

/// Position in the scan sequence, counted from either end
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanOffset {
    FromStart(usize),
    FromEnd(usize),
}

impl ScanOffset {
    fn resolve(self, len: usize) -> usize {
        match self {
            ScanOffset::FromStart(i) => i.min(len),
            ScanOffset::FromEnd(i) => len.saturating_sub(i),
        }
    }
}

/// Contiguous half-open window `[start, end)` of the scan sequence
///
/// Offsets are clamped to the sequence; a window whose start lies past its
/// end selects nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanWindow {
    pub start: ScanOffset,
    pub end: ScanOffset,
}

impl ScanWindow {
    pub const fn new(start: ScanOffset, end: ScanOffset) -> Self {
        Self { start, end }
    }

    /// Window between two offsets counted from the end, e.g. `tail(308, 3)`
    /// selects `[len - 308, len - 3)`
    pub const fn tail(start: usize, end: usize) -> Self {
        Self {
            start: ScanOffset::FromEnd(start),
            end: ScanOffset::FromEnd(end),
        }
    }

    pub const fn head(start: usize, end: usize) -> Self {
        Self {
            start: ScanOffset::FromStart(start),
            end: ScanOffset::FromStart(end),
        }
    }

    pub fn resolve(&self, len: usize) -> Range<usize> {
        let start = self.start.resolve(len);
        let end = self.end.resolve(len);
        if start >= end {
            start..start
        } else {
            start..end
        }
    }
}

/// Physical feature a region samples
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegionGroup {
    /// Flex pickup quadrant
    Quad,
    /// Alignment jig reference
    Jig,
    /// Sensor surface
    Sensor,
    /// Front-end chip footprint
    FrontEnd,
    /// Pickup area on an assembled module
    Pickup,
}

impl fmt::Display for RegionGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegionGroup::Quad => write!(f, "quad"),
            RegionGroup::Jig => write!(f, "jig"),
            RegionGroup::Sensor => write!(f, "sensor"),
            RegionGroup::FrontEnd => write!(f, "front-end"),
            RegionGroup::Pickup => write!(f, "pickup"),
        }
    }
}

/// Calibrated region definition
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegionDefinition {
    pub name: &'static str,
    pub group: RegionGroup,
    pub predicate: RegionPredicate,
    pub window: Option<ScanWindow>,
}

impl RegionDefinition {
    pub const fn new(
        name: &'static str,
        group: RegionGroup,
        predicate: RegionPredicate,
        window: Option<ScanWindow>,
    ) -> Self {
        Self {
            name,
            group,
            predicate,
            window,
        }
    }
}

/// Which filter left a region empty
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterStage {
    Geometric,
    Outlier,
}

impl fmt::Display for FilterStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterStage::Geometric => write!(f, "geometric"),
            FilterStage::Outlier => write!(f, "outlier"),
        }
    }
}

/// A region retained no rows
#[derive(Debug, Clone, PartialEq, Error)]
#[error("No valid rows found with {predicate} in the given data range (region '{region}', {stage} filter)")]
pub struct EmptyRegionError {
    pub region: String,
    pub predicate: String,
    pub stage: FilterStage,
}

/// Rows retained for one region after both filters
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedRegion {
    pub name: String,
    pub group: RegionGroup,
    pub z_values: Vec<f64>,
    pub rows: Vec<MeasurementRow>,
}

impl ClassifiedRegion {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Count, mean and sample deviation of the retained z-values
    ///
    /// A single retained row reports a deviation of zero.
    pub fn spread(&self) -> stats::SubsetSpread {
        stats::SubsetSpread {
            count: self.z_values.len(),
            mean: stats::mean(&self.z_values).unwrap_or(0.0),
            stdev: stats::sample_stdev(&self.z_values).unwrap_or(0.0),
        }
    }
}

/// Keep rows whose z lies within `MAD_CUTOFF * mad` of the median z
///
/// With `mad == 0` only rows exactly at the median survive.
pub fn mad_filter(rows: Vec<MeasurementRow>) -> Vec<MeasurementRow> {
    let z_values: Vec<f64> = rows.iter().map(|r| r.z).collect();
    let Some((m, mad)) = stats::median_absolute_deviation(&z_values) else {
        return rows;
    };
    let cutoff = MAD_CUTOFF * mad;
    rows.into_iter()
        .filter(|r| (r.z - m).abs() <= cutoff)
        .collect()
}

/// Geometric filter followed by the MAD filter; reports the emptying stage
fn retain(
    rows: &[MeasurementRow],
    predicate: &RegionPredicate,
    window: Option<ScanWindow>,
) -> Result<Vec<MeasurementRow>, FilterStage> {
    let candidates = match window {
        Some(window) => &rows[window.resolve(rows.len())],
        None => rows,
    };

    let inside: Vec<MeasurementRow> = candidates
        .iter()
        .filter(|r| predicate.matches(r))
        .copied()
        .collect();
    if inside.is_empty() {
        return Err(FilterStage::Geometric);
    }

    let retained = mad_filter(inside);
    if retained.is_empty() {
        return Err(FilterStage::Outlier);
    }
    Ok(retained)
}

/// Classify `rows` against `predicate`, restricted to `window` if given
///
/// Returns the retained z-values and rows. The error names the region by
/// its predicate.
pub fn classify(
    rows: &[MeasurementRow],
    predicate: &RegionPredicate,
    window: Option<ScanWindow>,
) -> Result<(Vec<f64>, Vec<MeasurementRow>), EmptyRegionError> {
    let retained = retain(rows, predicate, window).map_err(|stage| EmptyRegionError {
        region: predicate.to_string(),
        predicate: predicate.to_string(),
        stage,
    })?;
    Ok((retained.iter().map(|r| r.z).collect(), retained))
}

/// Classify `rows` into the named region
pub fn classify_region(
    rows: &[MeasurementRow],
    region: &RegionDefinition,
) -> Result<ClassifiedRegion, EmptyRegionError> {
    let retained = retain(rows, &region.predicate, region.window).map_err(|stage| {
        EmptyRegionError {
            region: region.name.to_string(),
            predicate: region.predicate.to_string(),
            stage,
        }
    })?;

    Ok(ClassifiedRegion {
        name: region.name.to_string(),
        group: region.group,
        z_values: retained.iter().map(|r| r.z).collect(),
        rows: retained,
    })
}
