//! Serializable record types

pub mod component;
pub mod measurement;
pub mod report;

pub use component::{ComponentRecord, TestRun};
pub use measurement::{Check, MeasurementResult, VariantMetrics};
pub use pull_test::{PullTestResult, PullTestRow, PullTestStats, WireRecord, Zone};
pub use report::{ComponentIdentity, Lookup, ModuleReport, ReportOutcome};
