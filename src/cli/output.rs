//! Output formatting utilities

use console::style;
use miette::{IntoDiagnostic, Result};
use serde::Serialize;
use tabled::{builder::Builder, settings::Style};

use crate::cli::OutputFormat;
use crate::core::Config;
use crate::entities::measurement::Check;

/// Determine the effective output format from the flag and configuration
///
/// `Auto` defers to the configured `default_format`; `Auto` is returned when
/// neither picks a serialized format, meaning a human-readable table.
pub fn effective_format(format: OutputFormat, config: &Config) -> OutputFormat {
    match format {
        OutputFormat::Auto => config
            .default_format
            .as_deref()
            .and_then(|f| f.parse().ok())
            .unwrap_or(OutputFormat::Auto),
        other => other,
    }
}

/// Print a value as YAML or JSON; returns false for the table format
pub fn print_serialized<T: Serialize>(value: &T, format: OutputFormat) -> Result<bool> {
    match format {
        OutputFormat::Yaml => {
            print!("{}", serde_yml::to_string(value).into_diagnostic()?);
            Ok(true)
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(value).into_diagnostic()?);
            Ok(true)
        }
        OutputFormat::Auto => Ok(false),
    }
}

/// Styled PASS/FAIL marker
pub fn verdict(passed: bool) -> String {
    if passed {
        style("PASS").green().bold().to_string()
    } else {
        style("FAIL").red().bold().to_string()
    }
}

/// Checks as a markdown-style table
pub fn checks_table(checks: &[Check]) -> String {
    let mut builder = Builder::default();
    builder.push_record(["Check", "Measured", "Band", "Result"]);
    for check in checks {
        builder.push_record([
            check.name.clone(),
            check.measured.clone(),
            check.band.clone(),
            verdict(check.passed),
        ]);
    }
    builder.build().with(Style::markdown()).to_string()
}

/// One-line summary of a pass/fail vector
pub fn summary_line(pass_fail: &[bool]) -> String {
    let failed = pass_fail.iter().filter(|p| !**p).count();
    if failed == 0 {
        format!(
            "{} All {} check(s) passed",
            style("✓").green(),
            pass_fail.len()
        )
    } else {
        format!(
            "{} {} of {} check(s) failed",
            style("✗").red(),
            failed,
            pass_fail.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_overrides_config() {
        let config = Config {
            default_format: Some("json".to_string()),
            ..Default::default()
        };
        assert_eq!(effective_format(OutputFormat::Yaml, &config), OutputFormat::Yaml);
        assert_eq!(effective_format(OutputFormat::Auto, &config), OutputFormat::Json);
        assert_eq!(
            effective_format(OutputFormat::Auto, &Config::default()),
            OutputFormat::Auto
        );
    }

    #[test]
    fn test_unknown_config_format_falls_back_to_table() {
        let config = Config {
            default_format: Some("xml".to_string()),
            ..Default::default()
        };
        assert_eq!(effective_format(OutputFormat::Auto, &config), OutputFormat::Auto);
    }

    #[test]
    fn test_checks_table_lists_each_check() {
        let checks = vec![
            Check {
                name: "xy_envelope".to_string(),
                measured: "(39.600, 40.500)".to_string(),
                band: "[39.500, 39.700] mm".to_string(),
                passed: true,
            },
            Check {
                name: "hv_thickness".to_string(),
                measured: "2.100".to_string(),
                band: "[1.701, 2.001] mm".to_string(),
                passed: false,
            },
        ];
        let table = checks_table(&checks);
        assert!(table.contains("xy_envelope"));
        assert!(table.contains("hv_thickness"));
        assert!(summary_line(&[true, false]).contains("1 of 2"));
    }
}
