//! Report aggregation
//!
//! Combines evaluated results with component metadata. Metadata lookups are
//! best-effort: a failed mass or carrier lookup is recorded as unavailable
//! and never aborts the report.

use chrono::Utc;
use thiserror::Error;
use tracing::{info, warn};

use crate::core::variant::ComponentVariant;
use crate::entities::component::{ComponentRecord, TestRun};
use crate::entities::measurement::MeasurementResult;
use crate::entities::pull_test::PullTestResult;
use crate::entities::report::{ComponentIdentity, Lookup, ModuleReport, ReportOutcome};

/// Child type code of a module carrier
pub const CARRIER_CHILD_TYPE: &str = "CARRIER";

/// Errors raised by a component directory
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Malformed record {id}: {reason}")]
    Malformed { id: String, reason: String },

    #[error("Ambiguous identifier {id}: {count} matches")]
    Ambiguous { id: String, count: usize },
}

/// Read access to the production database
pub trait ComponentDirectory {
    /// Component by serial number or alternative identifier
    fn component(&self, id: &str) -> Result<ComponentRecord, LookupError>;

    /// Test run by id
    fn test_run(&self, id: &str) -> Result<TestRun, LookupError>;
}

/// Resolve a component's identity for a report
pub fn resolve_identity<D: ComponentDirectory + ?Sized>(
    directory: &D,
    component_id: &str,
    token: Option<String>,
) -> Result<ComponentIdentity, LookupError> {
    let component = directory.component(component_id)?;
    info!(
        "Component {}: serial {}, alt id {}, stage {}, type {}, location {}",
        component.code,
        component.serial_number,
        component.alternative_identifier.as_deref().unwrap_or("-"),
        component.current_stage.code,
        component.component_type.code,
        component.current_location.code
    );
    Ok(ComponentIdentity {
        component_id: component_id.to_string(),
        component,
        token,
    })
}

/// Mass recorded by the variant's mass test (first run, first value)
pub fn lookup_mass<D: ComponentDirectory + ?Sized>(
    directory: &D,
    component: &ComponentRecord,
    variant: ComponentVariant,
) -> Lookup<f64> {
    let code = variant.mass_test_code();
    let Some(run) = component.test_runs(code).into_iter().next() else {
        warn!("No {} test run for {}", code, component.serial_number);
        return Lookup::unavailable(format!("no {} test run", code));
    };

    match directory.test_run(&run.id) {
        Ok(test_run) => match test_run.results.first().and_then(|r| r.value) {
            Some(value) => Lookup::Found { value },
            None => {
                warn!("Test run {} has no mass value", run.id);
                Lookup::unavailable(format!("test run {} has no value", run.id))
            }
        },
        Err(e) => {
            warn!("Mass lookup failed for {}: {}", component.serial_number, e);
            Lookup::unavailable(e.to_string())
        }
    }
}

/// Serial number of the component's carrier
pub fn lookup_carrier(component: &ComponentRecord) -> Lookup<String> {
    match component.child_serial(CARRIER_CHILD_TYPE) {
        Some(serial) => Lookup::Found {
            value: serial.to_string(),
        },
        None => {
            warn!("No carrier recorded for {}", component.serial_number);
            Lookup::unavailable("no carrier child")
        }
    }
}

/// Build the report of an evaluated metrology measurement
pub fn aggregate_metrology<D: ComponentDirectory + ?Sized>(
    identity: ComponentIdentity,
    result: MeasurementResult,
    directory: &D,
) -> ModuleReport {
    let variant = result.variant;
    let mass = lookup_mass(directory, &identity.component, variant);
    let carrier = match variant {
        ComponentVariant::Assembled => Some(lookup_carrier(&identity.component)),
        ComponentVariant::Flex | ComponentVariant::Bare => None,
    };

    ModuleReport {
        identity,
        evaluated_at: Utc::now(),
        outcome: ReportOutcome::Metrology(result),
        mass: Some(mass),
        carrier,
    }
}

/// Build the report of an evaluated pull test
pub fn aggregate_pull_test(identity: ComponentIdentity, result: PullTestResult) -> ModuleReport {
    ModuleReport {
        identity,
        evaluated_at: Utc::now(),
        outcome: ReportOutcome::PullTest(result),
        mass: None,
        carrier: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::component::{
        ChildSummary, CodeRef, ComponentChild, ComponentTest, TestResultValue, TestRunRef,
    };
    use crate::entities::measurement::{BareMetrics, VariantMetrics};
    use crate::entities::pull_test::PullTestStats;
    use std::collections::HashMap;

    #[derive(Default)]
    struct MemoryDirectory {
        components: Vec<ComponentRecord>,
        runs: HashMap<String, TestRun>,
    }

    impl ComponentDirectory for MemoryDirectory {
        fn component(&self, id: &str) -> Result<ComponentRecord, LookupError> {
            self.components
                .iter()
                .find(|c| c.serial_number == id || c.alternative_identifier.as_deref() == Some(id))
                .cloned()
                .ok_or_else(|| LookupError::NotFound(id.to_string()))
        }

        fn test_run(&self, id: &str) -> Result<TestRun, LookupError> {
            self.runs
                .get(id)
                .cloned()
                .ok_or_else(|| LookupError::NotFound(id.to_string()))
        }
    }

    fn record(tests: Vec<ComponentTest>, children: Vec<ComponentChild>) -> ComponentRecord {
        ComponentRecord {
            code: "obj-1".to_string(),
            serial_number: "20UPGM24220370".to_string(),
            alternative_identifier: Some("MOD-7".to_string()),
            current_stage: CodeRef {
                code: "MODULE/ASSEMBLY".to_string(),
            },
            component_type: CodeRef {
                code: "MODULE".to_string(),
            },
            current_location: CodeRef {
                code: "GL".to_string(),
            },
            tests,
            children,
        }
    }

    fn mass_test(code: &str, run: &str) -> ComponentTest {
        ComponentTest {
            code: code.to_string(),
            test_runs: vec![TestRunRef { id: run.to_string() }],
        }
    }

    fn run(id: &str, value: Option<f64>) -> TestRun {
        TestRun {
            id: id.to_string(),
            results: vec![TestResultValue {
                code: Some("MASS".to_string()),
                value,
            }],
        }
    }

    fn bare_result() -> MeasurementResult {
        MeasurementResult {
            variant: ComponentVariant::Bare,
            checks: Vec::new(),
            metrics: VariantMetrics::Bare(BareMetrics {
                avg_bare_thickness: 500.0,
                avg_stdev_bare: 0.01,
                fe_x: 42.2,
                fe_y: 40.4,
                avg_fe_thickness: 150.0,
                avg_stdev_fe: 0.01,
                sensor_x: 39.5,
                sensor_y: 41.1,
            }),
            combined_stdev: None,
            regions: Vec::new(),
        }
    }

    #[test]
    fn test_resolve_identity_by_alternative_id() {
        let dir = MemoryDirectory {
            components: vec![record(Vec::new(), Vec::new())],
            ..Default::default()
        };
        let identity = resolve_identity(&dir, "MOD-7", Some("t0k".to_string())).unwrap();
        assert_eq!(identity.component.serial_number, "20UPGM24220370");
        assert_eq!(identity.token.as_deref(), Some("t0k"));
        assert!(matches!(
            resolve_identity(&dir, "missing", None),
            Err(LookupError::NotFound(_))
        ));
    }

    #[test]
    fn test_mass_uses_variant_test_code() {
        let mut dir = MemoryDirectory::default();
        dir.runs.insert("r1".to_string(), run("r1", Some(1.234)));
        let component = record(vec![mass_test("MASS_MEASUREMENT", "r1")], Vec::new());

        let mass = lookup_mass(&dir, &component, ComponentVariant::Assembled);
        assert_eq!(mass.value(), Some(&1.234));

        // Flex modules record their mass under a different code
        let mass = lookup_mass(&dir, &component, ComponentVariant::Flex);
        assert!(!mass.is_available());
    }

    #[test]
    fn test_mass_unavailable_when_run_missing_or_empty() {
        let mut dir = MemoryDirectory::default();
        dir.runs.insert("r2".to_string(), run("r2", None));
        let missing = record(vec![mass_test("MASS", "r1")], Vec::new());
        assert!(!lookup_mass(&dir, &missing, ComponentVariant::Flex).is_available());

        let empty = record(vec![mass_test("MASS", "r2")], Vec::new());
        assert!(!lookup_mass(&dir, &empty, ComponentVariant::Flex).is_available());
    }

    #[test]
    fn test_metrology_report_carrier_only_for_assembled() {
        let mut dir = MemoryDirectory::default();
        dir.runs.insert("r1".to_string(), run("r1", Some(2.5)));
        let component = record(
            vec![mass_test("MASS_MEASUREMENT", "r1")],
            vec![ComponentChild {
                child_type: CodeRef {
                    code: CARRIER_CHILD_TYPE.to_string(),
                },
                component: Some(ChildSummary {
                    serial_number: Some("20UPGMC0000042".to_string()),
                }),
            }],
        );
        let identity = ComponentIdentity {
            component_id: "20UPGM24220370".to_string(),
            component,
            token: None,
        };

        let report = aggregate_metrology(identity.clone(), bare_result(), &dir);
        assert_eq!(report.mass.as_ref().and_then(|m| m.value()), Some(&2.5));
        assert!(report.carrier.is_none());

        let mut assembled = bare_result();
        assembled.variant = ComponentVariant::Assembled;
        let report = aggregate_metrology(identity, assembled, &dir);
        assert_eq!(
            report.carrier.as_ref().and_then(|c| c.value()).map(String::as_str),
            Some("20UPGMC0000042")
        );
    }

    #[test]
    fn test_missing_carrier_does_not_abort_report() {
        let dir = MemoryDirectory::default();
        let identity = ComponentIdentity {
            component_id: "x".to_string(),
            component: record(Vec::new(), Vec::new()),
            token: None,
        };
        let mut result = bare_result();
        result.variant = ComponentVariant::Assembled;
        let report = aggregate_metrology(identity, result, &dir);
        assert!(matches!(report.carrier, Some(Lookup::Unavailable { .. })));
        assert!(matches!(report.mass, Some(Lookup::Unavailable { .. })));
    }

    #[test]
    fn test_pull_test_report_has_no_mass() {
        let identity = ComponentIdentity {
            component_id: "x".to_string(),
            component: record(Vec::new(), Vec::new()),
            token: Some("t".to_string()),
        };
        let result = PullTestResult {
            checks: Vec::new(),
            stats: PullTestStats {
                mean_pull: 9.0,
                standard_deviation: 0.5,
                before5g_wires: 0,
                minimum_pull: 8.0,
                maximum_pull: 10.0,
                percentage_2: 100.0,
                percentage_1: 0.0,
                percentage_3or4: 0.0,
                percentage_less7: 0.0,
                number_of_wires: 20,
            },
            wires: Vec::new(),
        };
        let report = aggregate_pull_test(identity, result);
        assert!(report.mass.is_none());
        assert!(report.carrier.is_none());
        assert!(matches!(report.outcome, ReportOutcome::PullTest(_)));
    }
}
