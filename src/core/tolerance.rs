//! Engineering tolerance bands per module variant
//!
//! Bands are inclusive on both ends. A missing bound makes the band
//! one-sided. Units are fixed per band and already match the derived metric.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::variant::ComponentVariant;

/// Unit of a toleranced quantity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Unit {
    #[serde(rename = "mm")]
    Millimeter,
    #[serde(rename = "um")]
    Micrometer,
}

impl std::fmt::Display for Unit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Unit::Millimeter => write!(f, "mm"),
            Unit::Micrometer => write!(f, "µm"),
        }
    }
}

/// Inclusive acceptance band for one metric
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToleranceBand {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lower: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upper: Option<f64>,
    pub unit: Unit,
}

impl ToleranceBand {
    pub fn new(name: &str, lower: f64, upper: f64, unit: Unit) -> Self {
        Self {
            name: name.to_string(),
            lower: Some(lower),
            upper: Some(upper),
            unit,
        }
    }

    pub fn at_most(name: &str, upper: f64, unit: Unit) -> Self {
        Self {
            name: name.to_string(),
            lower: None,
            upper: Some(upper),
            unit,
        }
    }

    /// Inclusive membership test; NaN never passes
    pub fn contains(&self, value: f64) -> bool {
        if value.is_nan() {
            return false;
        }
        self.lower.map_or(true, |lo| value >= lo) && self.upper.map_or(true, |hi| value <= hi)
    }
}

impl std::fmt::Display for ToleranceBand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self.lower, self.upper) {
            (Some(lo), Some(hi)) => write!(f, "[{}, {}] {}", lo, hi, self.unit),
            (None, Some(hi)) => write!(f, "<= {} {}", hi, self.unit),
            (Some(lo), None) => write!(f, ">= {} {}", lo, self.unit),
            (None, None) => write!(f, "any"),
        }
    }
}

/// Replacement bounds for a band, from configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BandOverride {
    #[serde(default)]
    pub lower: Option<f64>,
    #[serde(default)]
    pub upper: Option<f64>,
}

/// Named bands for one variant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToleranceTable {
    pub variant: ComponentVariant,
    pub bands: Vec<ToleranceBand>,
}

/// Band names used by the evaluator
pub mod bands {
    pub const FLEX_X: &str = "flex.x_dimension";
    pub const FLEX_Y: &str = "flex.y_dimension";
    pub const FLEX_HV: &str = "flex.hv_thickness";
    pub const FLEX_PICKUP: &str = "flex.pickup_thickness";
    pub const FLEX_FTM: &str = "flex.ftm_thickness";

    pub const BARE_FE_Y: &str = "bare.fe_y";
    pub const BARE_FE_X: &str = "bare.fe_x";
    pub const BARE_SENSOR_Y: &str = "bare.sensor_y";
    pub const BARE_SENSOR_X: &str = "bare.sensor_x";
    pub const BARE_THICKNESS: &str = "bare.module_thickness";
    pub const BARE_FE_THICKNESS: &str = "bare.fe_thickness";

    pub const ASSEMBLED_FTM: &str = "assembled.ftm_thickness";
    pub const ASSEMBLED_HV: &str = "assembled.hv_thickness";
    pub const ASSEMBLED_PICKUP: &str = "assembled.pickup_thickness";
    pub const ASSEMBLED_FIDUCIAL_X: &str = "assembled.fiducial_x";
    pub const ASSEMBLED_FIDUCIAL_Y: &str = "assembled.fiducial_y";
}

impl ToleranceTable {
    /// Built-in calibrated bands for `variant`
    pub fn for_variant(variant: ComponentVariant) -> Self {
        use Unit::{Micrometer as Um, Millimeter as Mm};

        let bands = match variant {
            ComponentVariant::Flex => vec![
                ToleranceBand::new(bands::FLEX_X, 39.50, 39.70, Mm),
                ToleranceBand::new(bands::FLEX_Y, 40.50, 40.70, Mm),
                ToleranceBand::new(bands::FLEX_HV, 1.701, 2.001, Mm),
                ToleranceBand::new(bands::FLEX_PICKUP, 0.201, 0.301, Mm),
                ToleranceBand::new(bands::FLEX_FTM, 1.521, 1.761, Mm),
            ],
            ComponentVariant::Bare => vec![
                ToleranceBand::new(bands::BARE_FE_Y, 40.200, 40.450, Mm),
                ToleranceBand::new(bands::BARE_FE_X, 42.00, 42.350, Mm),
                ToleranceBand::new(bands::BARE_SENSOR_Y, 41.00, 41.15, Mm),
                ToleranceBand::new(bands::BARE_SENSOR_X, 39.2, 39.80, Mm),
                ToleranceBand::new(bands::BARE_THICKNESS, 250.0, 415.0, Um),
                ToleranceBand::new(bands::BARE_FE_THICKNESS, 80.0, 250.0, Um),
            ],
            ComponentVariant::Assembled => vec![
                ToleranceBand::new(bands::ASSEMBLED_FTM, 1831.0, 2231.0, Um),
                ToleranceBand::new(bands::ASSEMBLED_HV, 2011.0, 2581.0, Um),
                ToleranceBand::at_most(bands::ASSEMBLED_PICKUP, 771.0, Um),
                ToleranceBand::new(bands::ASSEMBLED_FIDUCIAL_X, 2.119, 2.319, Mm),
                ToleranceBand::new(bands::ASSEMBLED_FIDUCIAL_Y, 0.650, 0.850, Mm),
            ],
        };
        Self { variant, bands }
    }

    /// Apply configured overrides; names not in this table are ignored
    pub fn with_overrides(mut self, overrides: &BTreeMap<String, BandOverride>) -> Self {
        for band in &mut self.bands {
            if let Some(o) = overrides.get(&band.name) {
                if o.lower.is_some() {
                    band.lower = o.lower;
                }
                if o.upper.is_some() {
                    band.upper = o.upper;
                }
            }
        }
        self
    }

    pub fn band(&self, name: &str) -> Option<&ToleranceBand> {
        self.bands.iter().find(|b| b.name == name)
    }

    /// Check `value` against the named band; unknown bands fail closed
    pub fn check(&self, name: &str, value: f64) -> bool {
        self.band(name).is_some_and(|b| b.contains(value))
    }
}
