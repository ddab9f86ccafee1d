//! # Completions Command Implementation
//!
//! Implements `completions <shell>`, which prints a completion script for
//! bash, zsh, fish, powershell or elvish to stdout.
//!
//! ```bash
//! git-vendor completions bash > ~/.local/share/bash-completion/completions/git-vendor
//! git-vendor completions zsh > ~/.zfunc/_git-vendor
//! ```

use anyhow::Result;
use clap::{Args, CommandFactory};
use clap_complete::Shell;

use crate::cli::Cli;

/// Generate shell completion scripts
#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// The shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

/// Execute the `completions` command.
pub fn execute(args: CompletionsArgs) -> Result<()> {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    clap_complete::generate(args.shell, &mut cmd, name, &mut std::io::stdout());
    Ok(())
}
