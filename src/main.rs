use clap::Parser;
use std::io::IsTerminal;
use miette::Result;
use modqc::cli::{Cli, Commands, GlobalOpts};
use modqc::core::Config;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

fn main() -> Result<()> {
    // Install miette's fancy error handler for beautiful diagnostics
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .tab_width(4)
                .build(),
        )
    }))?;

    let cli = Cli::parse();
    let config = Config::load();
    init_logging(&cli.global, &config)?;
    config.warn_skipped();

    match cli.command {
        Commands::Metrology(args) => modqc::cli::commands::metrology::run(args, &cli.global, &config),
        Commands::Pull(args) => modqc::cli::commands::pull::run(args, &cli.global, &config),
        Commands::Tolerances(args) => modqc::cli::commands::tolerances::run(args, &cli.global, &config),
        Commands::Completions(args) => modqc::cli::commands::completions::run(args),
    }
}

/// Flags win over `MODQC_LOG` and the config file; default is warnings only
fn init_logging(global: &GlobalOpts, config: &Config) -> Result<()> {
    let directive = if global.verbose {
        "debug".to_string()
    } else if global.quiet {
        "error".to_string()
    } else {
        config.log_level.clone().unwrap_or_else(|| "warn".to_string())
    };

    let filter = EnvFilter::try_new(&directive)
        .map_err(|e| miette::miette!("Invalid log level '{}': {}", directive, e))?;

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| miette::miette!("Failed to set tracing subscriber: {}", e))
}
