//! Aggregated per-component report handed to reporting/upload tools

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entities::component::ComponentRecord;
use crate::entities::measurement::MeasurementResult;
use crate::entities::pull_test::PullTestResult;

/// Optional field whose lookup may have failed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Lookup<T> {
    Found { value: T },
    Unavailable { reason: String },
}

impl<T> Lookup<T> {
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Lookup::Unavailable {
            reason: reason.into(),
        }
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            Lookup::Found { value } => Some(value),
            Lookup::Unavailable { .. } => None,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Lookup::Found { .. })
    }
}

/// Identity fields supplied by the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentIdentity {
    /// Serial number the component was looked up by
    pub component_id: String,
    pub component: ComponentRecord,
    /// Upload token placeholder, filled in by the upload step
    #[serde(default)]
    pub token: Option<String>,
}

/// Evaluated data of a report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReportOutcome {
    Metrology(MeasurementResult),
    PullTest(PullTestResult),
}

/// Final record of one processed component
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleReport {
    #[serde(flatten)]
    pub identity: ComponentIdentity,

    pub evaluated_at: DateTime<Utc>,

    pub outcome: ReportOutcome,

    /// Module mass; absent for pull tests
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mass: Option<Lookup<f64>>,

    /// Carrier serial number; assembled modules only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub carrier: Option<Lookup<String>>,
}

impl ModuleReport {
    /// Ordered pass/fail vector of the outcome
    pub fn pass_fail(&self) -> Vec<bool> {
        match &self.outcome {
            ReportOutcome::Metrology(m) => m.pass_fail(),
            ReportOutcome::PullTest(p) => p.pass_fail(),
        }
    }
}
