//! `modqc tolerances` command - show effective tolerance tables

use miette::Result;
use tabled::{builder::Builder, settings::Style};

use crate::cli::output::{effective_format, print_serialized};
use crate::cli::GlobalOpts;
use crate::core::tolerance::ToleranceTable;
use crate::core::variant::ComponentVariant;
use crate::core::Config;

#[derive(clap::Args, Debug)]
pub struct TolerancesArgs {
    /// Only this variant (flex, bare, assembled)
    #[arg(long)]
    pub variant: Option<ComponentVariant>,
}

pub fn run(args: TolerancesArgs, global: &GlobalOpts, config: &Config) -> Result<()> {
    let variants = match args.variant {
        Some(v) => vec![v],
        None => ComponentVariant::ALL.to_vec(),
    };
    let tables: Vec<ToleranceTable> = variants
        .into_iter()
        .map(|v| config.tolerance_table(v))
        .collect();

    if print_serialized(&tables, effective_format(global.format, config))? {
        return Ok(());
    }

    let mut builder = Builder::default();
    builder.push_record(["Variant", "Band", "Lower", "Upper", "Unit"]);
    for table in &tables {
        for band in &table.bands {
            builder.push_record([
                table.variant.to_string(),
                band.name.clone(),
                band.lower.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string()),
                band.upper.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string()),
                band.unit.to_string(),
            ]);
        }
    }
    println!("{}", builder.build().with(Style::markdown()));
    Ok(())
}
