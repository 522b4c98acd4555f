//! `modqc pull` command - evaluate a wire-bond pull-test log

use console::style;
use miette::{IntoDiagnostic, Result};
use std::path::PathBuf;

use crate::cli::output::{checks_table, effective_format, print_serialized, summary_line};
use crate::cli::GlobalOpts;
use crate::core::aggregate::aggregate_pull_test;
use crate::core::pulltest::analyze;
use crate::core::Config;
use crate::entities::pull_test::PullTestResult;
use crate::entities::report::ReportOutcome;
use crate::import::read_pull_log;

use super::{enforce_strict, load_identity, print_report_header};

/// Wires shown per row of the grade grid
const GRID_WIRES_PER_ROW: usize = 5;

#[derive(clap::Args, Debug)]
pub struct PullArgs {
    /// Pull-tester CSV log
    pub log: PathBuf,

    /// Component serial or alternative identifier (default: log file stem)
    #[arg(long, short = 'c')]
    pub component: Option<String>,

    /// Component database export (YAML or JSON)
    #[arg(long)]
    pub db: Option<PathBuf>,

    /// Upload token recorded in the report (with --db)
    #[arg(long, env = "MODQC_TOKEN")]
    pub token: Option<String>,

    /// Exit with status 2 when any check fails
    #[arg(long)]
    pub strict: bool,
}

pub fn run(args: PullArgs, global: &GlobalOpts, config: &Config) -> Result<()> {
    let rows = read_pull_log(&args.log).into_diagnostic()?;
    let result = analyze(&rows, &config.pull_criteria())
        .map_err(|e| miette::miette!("Pull test of {} failed: {}", args.log.display(), e))?;
    let pass_fail = result.pass_fail();
    let format = effective_format(global.format, config);

    match &args.db {
        Some(db) => {
            let component_id = match &args.component {
                Some(id) => id.clone(),
                None => args
                    .log
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .ok_or_else(|| miette::miette!("Cannot derive a component id from {}", args.log.display()))?,
            };
            let (_, identity) = load_identity(db, &component_id, args.token.clone())?;
            let report = aggregate_pull_test(identity, result);
            if !print_serialized(&report, format)? {
                if !global.quiet {
                    print_report_header(&report);
                }
                if let ReportOutcome::PullTest(p) = &report.outcome {
                    print_pull_test(p, global);
                }
            }
        }
        None => {
            if !print_serialized(&result, format)? {
                if !global.quiet {
                    println!("{} {}", style("→").blue(), style(args.log.display()).cyan());
                }
                print_pull_test(&result, global);
            }
        }
    }

    enforce_strict(args.strict, &pass_fail);
    Ok(())
}

fn print_pull_test(result: &PullTestResult, global: &GlobalOpts) {
    if !global.quiet {
        let s = &result.stats;
        println!("{}", checks_table(&result.checks));
        println!(
            "Wires: {}  min {} g  max {} g",
            s.number_of_wires, s.minimum_pull, s.maximum_pull
        );
        println!(
            "Heel breaks: chip {}%  PCB {}%   Bond peels: {}% ({}% under 7 g)",
            s.percentage_2, s.percentage_1, s.percentage_3or4, s.percentage_less7
        );
        println!("{}", style("(grade, zone)").dim());
        println!("{}", result.grade_grid(GRID_WIRES_PER_ROW));
    }
    println!("{}", summary_line(&result.pass_fail()));
}
