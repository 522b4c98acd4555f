//! modqc: module quality-control toolkit
//!
//! Turns raw metrology scans and wire-bond pull-test logs of detector module
//! components into pass/fail reports against calibrated tolerances.

pub mod cli;
pub mod core;
pub mod entities;
pub mod import;
