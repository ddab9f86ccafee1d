//! # Init Command Implementation
//!
//! This module implements the `init` subcommand, which creates an empty
//! `.git-vendor/vendor.yml` under the project root. An existing configuration
//! is never overwritten.

use anyhow::Result;
use clap::Args;

use git_vendor::output::emoji;

use super::Context;

/// Create an empty vendor configuration
#[derive(Args, Debug)]
pub struct InitArgs {}

/// Execute the `init` command.
pub fn execute(_args: InitArgs, ctx: &Context) -> Result<()> {
    let store = ctx.project.config_store();
    store.init()?;
    println!(
        "{} Created {}",
        emoji(&ctx.out, "✅", "[OK]"),
        store.path().display()
    );
    println!(
        "{} Run `git-vendor add <name> <url> --map FROM:TO` to add a vendor",
        emoji(&ctx.out, "💡", "[HINT]")
    );
    Ok(())
}
