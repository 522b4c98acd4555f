//! `modqc completions` - shell completion scripts
//!
//! Completes the subcommands and their flags. File arguments (`.DAT`/`.STA`
//! pairs, pull logs, `--db` exports) fall back to the shell's own path
//! completion.
//!
//! ```bash
//! source <(modqc completions bash)
//! modqc completions zsh > "${fpath[1]}/_modqc"
//! ```

use clap::CommandFactory;
use clap_complete::{generate, Shell};
use miette::Result;

use crate::cli::Cli;

#[derive(clap::Args, Debug)]
pub struct CompletionsArgs {
    /// Target shell
    #[arg(value_enum)]
    pub shell: Shell,
}

pub fn run(args: CompletionsArgs) -> Result<()> {
    let mut cmd = Cli::command();
    let bin_name = cmd.get_name().to_string();
    generate(args.shell, &mut cmd, bin_name, &mut std::io::stdout().lock());
    Ok(())
}
