//! `modqc metrology` command - evaluate a metrology scan and summary

use console::style;
use miette::{IntoDiagnostic, Result};
use std::path::PathBuf;
use tabled::{builder::Builder, settings::Style};

use crate::cli::output::{checks_table, effective_format, print_serialized, summary_line};
use crate::cli::GlobalOpts;
use crate::core::aggregate::aggregate_metrology;
use crate::core::evaluate::evaluate;
use crate::core::Config;
use crate::entities::measurement::MeasurementResult;
use crate::entities::report::ReportOutcome;
use crate::import::{read_scan, read_summary, MetrologyPair};

use super::{enforce_strict, load_identity, print_report_header};

#[derive(clap::Args, Debug)]
pub struct MetrologyArgs {
    /// Scan file (<serial>_vc3_<kind>_metrology.DAT)
    pub dat: PathBuf,

    /// Summary file (<serial>_vc3_<kind>_metrology.STA)
    pub sta: PathBuf,

    /// Component database export (YAML or JSON) for mass and carrier lookup
    #[arg(long)]
    pub db: Option<PathBuf>,

    /// Upload token recorded in the report (with --db)
    #[arg(long, env = "MODQC_TOKEN")]
    pub token: Option<String>,

    /// Exit with status 2 when any check fails
    #[arg(long)]
    pub strict: bool,
}

pub fn run(args: MetrologyArgs, global: &GlobalOpts, config: &Config) -> Result<()> {
    let pair = MetrologyPair::from_paths(&args.dat, &args.sta).into_diagnostic()?;
    let scan = read_scan(&pair.dat).into_diagnostic()?;
    let summary = read_summary(&pair.sta).into_diagnostic()?;
    let table = config.tolerance_table(pair.variant);

    let result = evaluate(pair.variant, &scan, &summary, &table)
        .map_err(|e| miette::miette!("Evaluation of {} failed: {}", pair.serial, e))?;
    let pass_fail = result.pass_fail();
    let format = effective_format(global.format, config);

    match &args.db {
        Some(db) => {
            let (directory, identity) = load_identity(db, &pair.serial, args.token.clone())?;
            let report = aggregate_metrology(identity, result, &directory);
            if !print_serialized(&report, format)? {
                if !global.quiet {
                    print_report_header(&report);
                }
                if let ReportOutcome::Metrology(m) = &report.outcome {
                    print_measurement(m, global);
                }
            }
        }
        None => {
            if !print_serialized(&result, format)? {
                if !global.quiet {
                    println!(
                        "{} {} ({})",
                        style("→").blue(),
                        style(&pair.serial).cyan(),
                        pair.variant
                    );
                }
                print_measurement(&result, global);
            }
        }
    }

    enforce_strict(args.strict, &pass_fail);
    Ok(())
}

fn print_measurement(result: &MeasurementResult, global: &GlobalOpts) {
    if !global.quiet {
        println!("{}", checks_table(&result.checks));
        if let Some(stdev) = result.combined_stdev {
            println!("Combined height deviation: {} mm", stdev);
        }
        if global.verbose && !result.regions.is_empty() {
            let mut builder = Builder::default();
            builder.push_record(["Region", "Group", "Points", "Mean z", "Std dev z"]);
            for r in &result.regions {
                builder.push_record([
                    r.name.clone(),
                    r.group.to_string(),
                    r.count.to_string(),
                    format!("{:.4}", r.mean_z),
                    format!("{:.4}", r.stdev_z),
                ]);
            }
            println!("{}", builder.build().with(Style::markdown()));
        }
    }
    println!("{}", summary_line(&result.pass_fail()));
}
