//! Tolerance evaluation of derived metrology metrics
//!
//! Evaluation is a pure function of the variant's scan regions, its summary
//! quantities and a tolerance table. Checks are appended in a fixed order
//! per variant; the order matters for display only.

use thiserror::Error;
use tracing::info;

use crate::core::processor::{VariantProcessor, VariantScan};
use crate::core::region::{EmptyRegionError, MeasurementRow, RegionGroup};
use crate::core::stats::{self, round_to, StatsError};
use crate::core::summary::{
    AssembledSummary, BareSummary, ExtractionError, FlexSummary, SummaryRow,
};
use crate::core::tolerance::{bands, ToleranceTable};
use crate::core::variant::ComponentVariant;
use crate::entities::measurement::{
    AssembledMetrics, BareMetrics, Check, FlexMetrics, MeasurementResult, RegionSummary,
    VariantMetrics,
};

/// Errors that abort evaluation of a component
#[derive(Debug, Error)]
pub enum EvaluationError {
    #[error(transparent)]
    EmptyRegion(#[from] EmptyRegionError),

    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error("Cannot compute spread of {group} regions: {source}")]
    Spread {
        group: RegionGroup,
        #[source]
        source: StatsError,
    },

    #[error("Tolerance table is for {table} modules, not {expected}")]
    TableMismatch {
        table: ComponentVariant,
        expected: ComponentVariant,
    },
}

fn group_stdev(scan: &VariantScan, group: RegionGroup) -> Result<f64, EvaluationError> {
    scan.group_stdev(group)
        .map_err(|source| EvaluationError::Spread { group, source })
}

fn band_label(table: &ToleranceTable, name: &str) -> String {
    table
        .band(name)
        .map(|b| b.to_string())
        .unwrap_or_else(|| "undefined".to_string())
}

/// Single-band check
fn check(table: &ToleranceTable, check_name: &str, band: &str, value: f64) -> Check {
    Check {
        name: check_name.to_string(),
        measured: format!("{}", value),
        band: band_label(table, band),
        passed: table.check(band, value),
    }
}

/// Two-axis check passing only when both axes are in band
fn check_xy(
    table: &ToleranceTable,
    check_name: &str,
    (x_band, x): (&str, f64),
    (y_band, y): (&str, f64),
) -> Check {
    Check {
        name: check_name.to_string(),
        measured: format!("x={}, y={}", x, y),
        band: format!(
            "x {}, y {}",
            band_label(table, x_band),
            band_label(table, y_band)
        ),
        passed: table.check(x_band, x) && table.check(y_band, y),
    }
}

fn region_summaries(scan: &VariantScan) -> Vec<RegionSummary> {
    scan.regions
        .iter()
        .map(|r| {
            let spread = r.spread();
            RegionSummary {
                name: r.name.clone(),
                group: r.group,
                count: spread.count,
                mean_z: spread.mean,
                stdev_z: spread.stdev,
            }
        })
        .collect()
}

fn ensure_table(table: &ToleranceTable, expected: ComponentVariant) -> Result<(), EvaluationError> {
    if table.variant != expected {
        return Err(EvaluationError::TableMismatch {
            table: table.variant,
            expected,
        });
    }
    Ok(())
}

/// Evaluate a bare flex
pub fn evaluate_flex(
    scan: &VariantScan,
    summary: &FlexSummary,
    table: &ToleranceTable,
) -> Result<MeasurementResult, EvaluationError> {
    ensure_table(table, ComponentVariant::Flex)?;
    let avg_stdev = group_stdev(scan, RegionGroup::Quad)?;

    let mut checks = Vec::new();
    let xy = check_xy(
        table,
        "xy_envelope",
        (bands::FLEX_X, summary.x_dimension),
        (bands::FLEX_Y, summary.y_dimension),
    );
    let xy_envelope = xy.passed;
    checks.push(xy);

    let hv = check(table, "hv_thickness", bands::FLEX_HV, summary.hv_thickness);
    let hv_envelope = hv.passed;
    checks.push(hv);

    for (i, thickness) in summary.pickup_thickness.iter().enumerate() {
        checks.push(check(
            table,
            &format!("pickup_thickness[{}]", i + 1),
            bands::FLEX_PICKUP,
            *thickness,
        ));
    }
    checks.push(check(
        table,
        "ftm_thickness",
        bands::FLEX_FTM,
        summary.ftm_thickness,
    ));

    info!(
        "Flex: avg pickup thickness {:.3}mm, pickup thickness {:?}, FTM {}mm, HV {}mm (in envelope: {}), pickup std deviation {:.4}mm, X {}mm Y {}mm (in envelope: {})",
        summary.avg_pickup_thickness,
        summary.pickup_thickness,
        summary.ftm_thickness,
        summary.hv_thickness,
        hv_envelope,
        avg_stdev,
        summary.x_dimension,
        summary.y_dimension,
        xy_envelope
    );

    Ok(MeasurementResult {
        variant: ComponentVariant::Flex,
        checks,
        metrics: VariantMetrics::Flex(FlexMetrics {
            avg_thickness: round_to(summary.avg_pickup_thickness, 3),
            quad_thickness: summary.pickup_thickness.clone(),
            ftm_flex_thickness: summary.ftm_thickness,
            hv_thickness: summary.hv_thickness,
            hv_envelope,
            avg_stdev: round_to(avg_stdev, 4),
            xy_envelope,
            x_dimension: summary.x_dimension,
            y_dimension: summary.y_dimension,
        }),
        combined_stdev: combined_stdev(scan).ok().map(|s| round_to(s, 4)),
        regions: region_summaries(scan),
    })
}

/// Evaluate a bare module
pub fn evaluate_bare(
    scan: &VariantScan,
    summary: &BareSummary,
    table: &ToleranceTable,
) -> Result<MeasurementResult, EvaluationError> {
    ensure_table(table, ComponentVariant::Bare)?;
    let stdev_fe = group_stdev(scan, RegionGroup::FrontEnd)?;
    let stdev_sensor = group_stdev(scan, RegionGroup::Sensor)?;

    let checks = vec![
        check_xy(
            table,
            "fe_footprint",
            (bands::BARE_FE_X, summary.fe_x),
            (bands::BARE_FE_Y, summary.fe_y),
        ),
        check_xy(
            table,
            "sensor_footprint",
            (bands::BARE_SENSOR_X, summary.sensor_x),
            (bands::BARE_SENSOR_Y, summary.sensor_y),
        ),
        check(
            table,
            "bare_thickness",
            bands::BARE_THICKNESS,
            summary.bare_thickness,
        ),
        check(
            table,
            "fe_thickness",
            bands::BARE_FE_THICKNESS,
            summary.fe_thickness,
        ),
    ];

    info!(
        "Bare: module thickness {}µm (std deviation {:.3}µm), FE chips {}mm x {}mm, FE thickness {}µm (std deviation {:.3}µm), sensor {}mm x {}mm",
        summary.bare_thickness.round_ties_even(),
        stdev_sensor * 1000.0,
        summary.fe_x,
        summary.fe_y,
        summary.fe_thickness.round_ties_even(),
        stdev_fe * 1000.0,
        summary.sensor_x,
        summary.sensor_y
    );

    Ok(MeasurementResult {
        variant: ComponentVariant::Bare,
        checks,
        metrics: VariantMetrics::Bare(BareMetrics {
            avg_bare_thickness: summary.bare_thickness.round_ties_even(),
            avg_stdev_bare: round_to(stdev_sensor * 1000.0, 3),
            fe_x: summary.fe_x,
            fe_y: summary.fe_y,
            avg_fe_thickness: summary.fe_thickness.round_ties_even(),
            avg_stdev_fe: round_to(stdev_fe * 1000.0, 3),
            sensor_x: summary.sensor_x,
            sensor_y: summary.sensor_y,
        }),
        combined_stdev: combined_stdev(scan).ok().map(|s| round_to(s, 4)),
        regions: region_summaries(scan),
    })
}

fn to_micrometers((x, y): (f64, f64)) -> [i64; 2] {
    [
        (x * 1000.0).round_ties_even() as i64,
        (y * 1000.0).round_ties_even() as i64,
    ]
}

/// Evaluate an assembled module
pub fn evaluate_assembled(
    scan: &VariantScan,
    summary: &AssembledSummary,
    table: &ToleranceTable,
) -> Result<MeasurementResult, EvaluationError> {
    ensure_table(table, ComponentVariant::Assembled)?;
    let pickup_stdev = round_to(group_stdev(scan, RegionGroup::Pickup)? * 1000.0, 2);

    let mut checks = vec![
        check(
            table,
            "ftm_thickness",
            bands::ASSEMBLED_FTM,
            summary.ftm_thickness,
        ),
        check(table, "hv_thickness", bands::ASSEMBLED_HV, summary.hv_thickness),
    ];
    for (i, thickness) in summary.pickup_thickness.iter().enumerate() {
        checks.push(check(
            table,
            &format!("pickup_thickness[{}]", i + 1),
            bands::ASSEMBLED_PICKUP,
            *thickness,
        ));
    }
    for (name, (x, y)) in [
        ("fiducial_br", summary.fiducial_br),
        ("fiducial_tl", summary.fiducial_tl),
    ] {
        checks.push(check_xy(
            table,
            name,
            (bands::ASSEMBLED_FIDUCIAL_X, x),
            (bands::ASSEMBLED_FIDUCIAL_Y, y),
        ));
    }

    let fiducial_br = to_micrometers(summary.fiducial_br);
    let fiducial_tl = to_micrometers(summary.fiducial_tl);

    info!(
        "Assembled: pickup thickness {:?}µm, fiducial offset BR {:?}µm TL {:?}µm, HV {}µm, FTM {}µm, pickup variation {}µm",
        summary.pickup_thickness,
        fiducial_br,
        fiducial_tl,
        summary.hv_thickness,
        summary.ftm_thickness,
        pickup_stdev
    );

    Ok(MeasurementResult {
        variant: ComponentVariant::Assembled,
        checks,
        metrics: VariantMetrics::Assembled(AssembledMetrics {
            avg_assem_thickness: summary.pickup_thickness.clone(),
            fiducial_br,
            fiducial_tl,
            hv_assem_thickness: summary.hv_thickness,
            ftm_thickness: summary.ftm_thickness,
            quad_stdev_all: pickup_stdev,
            x_value: summary.x_value,
            y_value: summary.y_value,
        }),
        combined_stdev: combined_stdev(scan).ok().map(|s| round_to(s, 4)),
        regions: region_summaries(scan),
    })
}

/// Classify, extract and evaluate one component's scan and summary
pub fn evaluate(
    variant: ComponentVariant,
    scan_rows: &[MeasurementRow],
    summary_rows: &[SummaryRow],
    table: &ToleranceTable,
) -> Result<MeasurementResult, EvaluationError> {
    let scan = VariantProcessor::for_variant(variant).process_all(scan_rows)?;
    match variant {
        ComponentVariant::Flex => evaluate_flex(&scan, &FlexSummary::extract(summary_rows)?, table),
        ComponentVariant::Bare => evaluate_bare(&scan, &BareSummary::extract(summary_rows)?, table),
        ComponentVariant::Assembled => {
            evaluate_assembled(&scan, &AssembledSummary::extract(summary_rows)?, table)
        }
    }
}

/// Overall spread of every retained scan row, in millimeters
pub fn combined_stdev(scan: &VariantScan) -> Result<f64, StatsError> {
    let z: Vec<f64> = scan.combined_rows().iter().map(|r| r.z).collect();
    stats::sample_stdev(&z)
}
