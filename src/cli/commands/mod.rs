//! CLI command implementations

pub mod completions;
pub mod metrology;
pub mod pull;
pub mod tolerances;

use console::style;
use miette::{IntoDiagnostic, Result};
use std::fmt::Display;
use std::path::Path;

use crate::cli::directory::FileDirectory;
use crate::core::aggregate::resolve_identity;
use crate::entities::report::{ComponentIdentity, Lookup, ModuleReport};

/// Load the database export and resolve the component identity
fn load_identity(
    db: &Path,
    component_id: &str,
    token: Option<String>,
) -> Result<(FileDirectory, ComponentIdentity)> {
    let directory = FileDirectory::load(db).into_diagnostic()?;
    let identity = resolve_identity(&directory, component_id, token)
        .map_err(|e| miette::miette!("Component lookup failed: {}", e))?;
    Ok((directory, identity))
}

fn lookup_line<T: Display>(label: &str, lookup: Option<&Lookup<T>>) {
    match lookup {
        Some(Lookup::Found { value }) => println!("{}: {}", label, style(value).cyan()),
        Some(Lookup::Unavailable { reason }) => {
            println!("{}: {}", label, style(format!("unavailable ({})", reason)).yellow())
        }
        None => {}
    }
}

/// Print the identity header of a report
fn print_report_header(report: &ModuleReport) {
    let component = &report.identity.component;
    println!(
        "{} {} ({}) at {}",
        style("→").blue(),
        style(&component.serial_number).cyan(),
        component.component_type.code,
        component.current_stage.code
    );
    lookup_line("Mass", report.mass.as_ref());
    lookup_line("Carrier", report.carrier.as_ref());
}

/// Exit with status 2 when `--strict` is set and a check failed
fn enforce_strict(strict: bool, pass_fail: &[bool]) {
    if strict && pass_fail.contains(&false) {
        std::process::exit(2);
    }
}
