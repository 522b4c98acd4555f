//! Component metadata as supplied by the production database
//!
//! Field names follow the database's camelCase JSON. Only the fields the
//! toolkit reads are modelled; everything else is ignored on load.

use serde::{Deserialize, Serialize};

/// `{ "code": ... }` reference used throughout the database schema
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeRef {
    pub code: String,
}

/// Reference to a recorded test run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestRunRef {
    pub id: String,
}

/// Test type attached to a component, with its runs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentTest {
    pub code: String,
    #[serde(default)]
    pub test_runs: Vec<TestRunRef>,
}

/// Child component summary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChildSummary {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serial_number: Option<String>,
}

/// Child slot of a component (e.g. its carrier)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentChild {
    #[serde(rename = "type")]
    pub child_type: CodeRef,
    /// Empty when the slot is not yet filled
    #[serde(default)]
    pub component: Option<ChildSummary>,
}

/// Component record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentRecord {
    /// Database object id
    pub code: String,
    pub serial_number: String,
    #[serde(default)]
    pub alternative_identifier: Option<String>,
    pub current_stage: CodeRef,
    pub component_type: CodeRef,
    pub current_location: CodeRef,
    #[serde(default)]
    pub tests: Vec<ComponentTest>,
    #[serde(default)]
    pub children: Vec<ComponentChild>,
}

impl ComponentRecord {
    /// Runs of the test with `code`, in database order
    pub fn test_runs(&self, code: &str) -> Vec<&TestRunRef> {
        self.tests
            .iter()
            .filter(|t| t.code == code)
            .flat_map(|t| t.test_runs.iter())
            .collect()
    }

    /// Serial number of the first child whose type code is `type_code`
    pub fn child_serial(&self, type_code: &str) -> Option<&str> {
        self.children
            .iter()
            .filter(|c| c.child_type.code == type_code)
            .find_map(|c| c.component.as_ref())
            .and_then(|c| c.serial_number.as_deref())
    }
}

/// One result value of a test run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestResultValue {
    #[serde(default)]
    pub code: Option<String>,
    /// Missing or null values deserialize as `None`
    #[serde(default)]
    pub value: Option<f64>,
}

/// Test run record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestRun {
    pub id: String,
    #[serde(default)]
    pub results: Vec<TestResultValue>,
}
