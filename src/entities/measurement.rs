//! Metrology result records

use serde::{Deserialize, Serialize};

use crate::core::region::RegionGroup;
use crate::core::variant::ComponentVariant;

/// Outcome of one tolerance check
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Check {
    /// What was checked (e.g. "xy_envelope", "pickup_thickness[2]")
    pub name: String,

    /// Measured value(s) as displayed
    pub measured: String,

    /// Acceptance band as displayed
    pub band: String,

    pub passed: bool,
}

/// Per-region classification summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionSummary {
    pub name: String,
    pub group: RegionGroup,
    pub count: usize,
    pub mean_z: f64,
    pub stdev_z: f64,
}

/// Bare flex metrics (mm)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlexMetrics {
    /// Mean pickup-area thickness
    pub avg_thickness: f64,
    /// Thickness of each pickup area
    pub quad_thickness: Vec<f64>,
    /// Thickness including the power connector body, excluding pins
    pub ftm_flex_thickness: f64,
    pub hv_thickness: f64,
    pub hv_envelope: bool,
    /// Std deviation of the pickup-quadrant heights
    pub avg_stdev: f64,
    pub xy_envelope: bool,
    pub x_dimension: f64,
    pub y_dimension: f64,
}

/// Bare module metrics (dimensions in mm, thickness in µm)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BareMetrics {
    pub avg_bare_thickness: f64,
    pub avg_stdev_bare: f64,
    pub fe_x: f64,
    pub fe_y: f64,
    pub avg_fe_thickness: f64,
    pub avg_stdev_fe: f64,
    pub sensor_x: f64,
    pub sensor_y: f64,
}

/// Assembled module metrics (thickness in µm)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssembledMetrics {
    /// Thickness at each front-end chip pickup area
    pub avg_assem_thickness: Vec<f64>,
    /// PCB-to-bare-module fiducial offset, bottom right (x, y) in µm
    pub fiducial_br: [i64; 2],
    /// PCB-to-bare-module fiducial offset, top left (x, y) in µm
    pub fiducial_tl: [i64; 2],
    pub hv_assem_thickness: f64,
    pub ftm_thickness: f64,
    /// Thickness variation over the four pickup areas
    pub quad_stdev_all: f64,
    pub x_value: f64,
    pub y_value: f64,
}

/// Derived metrics of one variant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "variant", rename_all = "lowercase")]
pub enum VariantMetrics {
    Flex(FlexMetrics),
    Bare(BareMetrics),
    Assembled(AssembledMetrics),
}

impl VariantMetrics {
    pub fn variant(&self) -> ComponentVariant {
        match self {
            VariantMetrics::Flex(_) => ComponentVariant::Flex,
            VariantMetrics::Bare(_) => ComponentVariant::Bare,
            VariantMetrics::Assembled(_) => ComponentVariant::Assembled,
        }
    }
}

/// Evaluated metrology of one component
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementResult {
    pub variant: ComponentVariant,

    /// Checks in evaluation order
    pub checks: Vec<Check>,

    pub metrics: VariantMetrics,

    /// Height deviation over every retained scan row (mm)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub combined_stdev: Option<f64>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub regions: Vec<RegionSummary>,
}

impl MeasurementResult {
    /// Ordered pass/fail vector
    pub fn pass_fail(&self) -> Vec<bool> {
        self.checks.iter().map(|c| c.passed).collect()
    }

    /// Names of failed checks
    pub fn failures(&self) -> Vec<&str> {
        self.checks
            .iter()
            .filter(|c| !c.passed)
            .map(|c| c.name.as_str())
            .collect()
    }
}
