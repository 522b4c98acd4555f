//! Wire-bond pull-test analysis
//!
//! Each pulled wire carries a strength and a failure grade. Grades are
//! remapped from the tester's scheme to the reporting scheme, wires are
//! assigned to one of three physical zones, and the module is judged on
//! aggregate strength statistics.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::core::stats::{self, round_to};
use crate::entities::measurement::Check;
use crate::entities::pull_test::{PullTestResult, PullTestRow, PullTestStats, WireRecord, Zone};

/// Nominal wire count of the first zone
pub const FIRST_ZONE_WIRES: usize = 10;

/// Nominal wire count of the first two zones together
pub const FIRST_TWO_ZONES_WIRES: usize = 15;

/// Reporting grade of exempted wires (raw grade 6)
pub const EXEMPT_GRADE: i64 = 5;

/// Errors raised by pull-test analysis
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PullTestError {
    #[error("Pull-test log contains no wires")]
    NoWires,

    #[error("Pull-test log needs at least 2 wires for a standard deviation, found {count}")]
    InsufficientWires { count: usize },
}

/// Acceptance criteria for a module's pull test
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PullCriteria {
    /// Minimum mean strength (g), inclusive
    pub min_mean: f64,
    /// Maximum standard deviation (g), inclusive
    pub max_stdev: f64,
    /// Wires below this strength (g) count as early breaks
    pub early_break: f64,
    /// Bond-peel percentage must stay strictly below this
    pub max_bond_peel_percent: f64,
    /// Bond peels below this strength (g) are reported separately
    pub weak_peel: f64,
}

impl Default for PullCriteria {
    fn default() -> Self {
        Self {
            min_mean: 8.00,
            max_stdev: 1.50,
            early_break: 5.0,
            max_bond_peel_percent: 10.00,
            weak_peel: 7.0,
        }
    }
}

/// Partial criteria from one configuration layer
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PullCriteriaOverride {
    pub min_mean: Option<f64>,
    pub max_stdev: Option<f64>,
    pub early_break: Option<f64>,
    pub max_bond_peel_percent: Option<f64>,
    pub weak_peel: Option<f64>,
}

impl PullCriteriaOverride {
    /// Overlay `other` onto this override, field by field
    pub fn merge(&mut self, other: PullCriteriaOverride) {
        self.min_mean = other.min_mean.or(self.min_mean);
        self.max_stdev = other.max_stdev.or(self.max_stdev);
        self.early_break = other.early_break.or(self.early_break);
        self.max_bond_peel_percent = other.max_bond_peel_percent.or(self.max_bond_peel_percent);
        self.weak_peel = other.weak_peel.or(self.weak_peel);
    }

    /// Criteria with the set fields replacing the defaults
    pub fn apply(&self, base: PullCriteria) -> PullCriteria {
        PullCriteria {
            min_mean: self.min_mean.unwrap_or(base.min_mean),
            max_stdev: self.max_stdev.unwrap_or(base.max_stdev),
            early_break: self.early_break.unwrap_or(base.early_break),
            max_bond_peel_percent: self.max_bond_peel_percent.unwrap_or(base.max_bond_peel_percent),
            weak_peel: self.weak_peel.unwrap_or(base.weak_peel),
        }
    }
}

/// Map a raw tester grade to the reporting grade
///
/// `raw >= 4` shifts down by one, `3` becomes `0`, everything else is kept.
/// Fractional codes are truncated after the shift.
pub fn remap_grade(raw: f64) -> i64 {
    if raw >= 4.0 {
        (raw - 1.0) as i64
    } else if raw == 3.0 {
        0
    } else {
        raw as i64
    }
}

/// Zone label of every wire, in log order
///
/// Zones nominally hold 10, 5 and the remaining wires. Exempted wires inside
/// the first 10 shrink the first zone by their count; exempted wires inside
/// the next five-wire window (shifted by the first count) shrink the second
/// zone likewise. The number of labels always equals the number of wires.
pub fn assign_zones(grades: &[i64]) -> Vec<Zone> {
    let n = grades.len();
    let exempt_in = |range: std::ops::Range<usize>| {
        let start = range.start.min(n);
        let end = range.end.min(n).max(start);
        grades[start..end]
            .iter()
            .filter(|g| **g == EXEMPT_GRADE)
            .count()
    };

    let first_exempt = exempt_in(0..FIRST_ZONE_WIRES);
    let first_end = FIRST_ZONE_WIRES - first_exempt;
    let second_exempt = exempt_in(first_end..FIRST_TWO_ZONES_WIRES - first_exempt);
    let second_end = FIRST_TWO_ZONES_WIRES - first_exempt - second_exempt;

    (0..n)
        .map(|i| {
            if i < first_end {
                Zone::First
            } else if i < second_end {
                Zone::Second
            } else {
                Zone::Third
            }
        })
        .collect()
}

fn percent(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64 * 100.0
    }
}

/// Analyze one module's pull-test log
pub fn analyze(rows: &[PullTestRow], criteria: &PullCriteria) -> Result<PullTestResult, PullTestError> {
    if rows.is_empty() {
        return Err(PullTestError::NoWires);
    }
    let strengths: Vec<f64> = rows.iter().map(|r| r.strength).collect();
    let grades: Vec<i64> = rows.iter().map(|r| remap_grade(r.raw_grade)).collect();
    let n = rows.len();

    let mean_pull = stats::mean(&strengths).ok_or(PullTestError::NoWires)?;
    let standard_deviation = stats::sample_stdev(&strengths)
        .map_err(|_| PullTestError::InsufficientWires { count: n })?;
    let before5g_wires = strengths.iter().filter(|s| **s < criteria.early_break).count();
    let minimum_pull = strengths.iter().copied().fold(f64::INFINITY, f64::min);
    let maximum_pull = strengths.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    let is_peel = |g: i64| g == 3 || g == 4;
    let percentage_2 = percent(grades.iter().filter(|g| **g == 2).count(), n);
    let percentage_1 = percent(grades.iter().filter(|g| **g == 1).count(), n);
    let peels = grades.iter().filter(|g| is_peel(**g)).count();
    let percentage_3or4 = percent(peels, n);
    let weak_peels = strengths
        .iter()
        .zip(&grades)
        .filter(|(s, g)| is_peel(**g) && **s < criteria.weak_peel)
        .count();
    let percentage_less7 = percent(weak_peels, n);

    let checks = vec![
        Check {
            name: "mean_pull".to_string(),
            measured: format!("{:.3} g", mean_pull),
            band: format!(">= {:.2} g", criteria.min_mean),
            passed: mean_pull >= criteria.min_mean,
        },
        Check {
            name: "standard_deviation".to_string(),
            measured: format!("{:.3} g", standard_deviation),
            band: format!("<= {:.2} g", criteria.max_stdev),
            passed: standard_deviation <= criteria.max_stdev,
        },
        Check {
            name: "before5g_wires".to_string(),
            measured: before5g_wires.to_string(),
            band: "0".to_string(),
            passed: before5g_wires == 0,
        },
        Check {
            name: "percentage_3or4".to_string(),
            measured: format!("{:.2} %", percentage_3or4),
            band: format!("< {:.2} %", criteria.max_bond_peel_percent),
            passed: percentage_3or4 < criteria.max_bond_peel_percent,
        },
    ];

    let wires: Vec<WireRecord> = strengths
        .iter()
        .zip(&grades)
        .zip(assign_zones(&grades))
        .map(|((strength, grade), location)| WireRecord {
            strength: *strength,
            grade: *grade,
            location,
        })
        .collect();

    info!(
        "Pull test: mean {:.3}g, std deviation {:.3}g, {} wire(s) below {}g, min {}g, max {}g, heel breaks chip {:.2}% PCB {:.2}%, bond peels {:.2}% ({:.2}% below {}g), {} wire(s)",
        mean_pull,
        standard_deviation,
        before5g_wires,
        criteria.early_break,
        minimum_pull,
        maximum_pull,
        percentage_2,
        percentage_1,
        percentage_3or4,
        percentage_less7,
        criteria.weak_peel,
        n
    );

    Ok(PullTestResult {
        checks,
        stats: PullTestStats {
            mean_pull: round_to(mean_pull, 3),
            standard_deviation: round_to(standard_deviation, 3),
            before5g_wires,
            minimum_pull: round_to(minimum_pull, 3),
            maximum_pull: round_to(maximum_pull, 3),
            percentage_2: round_to(percentage_2, 2),
            percentage_1: round_to(percentage_1, 2),
            percentage_3or4: round_to(percentage_3or4, 2),
            percentage_less7: round_to(percentage_less7, 2),
            number_of_wires: n,
        },
        wires,
    })
}
