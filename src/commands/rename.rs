//! # Rename Command Implementation
//!
//! Implements `rename <old> <new>`. The lock entry moves with the vendor so
//! the next pull does not refetch it.

use anyhow::Result;
use clap::Args;

use git_vendor::output::emoji;

use super::{explain, Context};

/// Rename a vendor
#[derive(Args, Debug)]
pub struct RenameArgs {
    /// Current name
    #[arg(value_name = "OLD")]
    pub old: String,

    /// New name
    #[arg(value_name = "NEW")]
    pub new: String,
}

/// Execute the `rename` command.
pub fn execute(args: RenameArgs, ctx: &Context) -> Result<()> {
    let config = ctx.project.config_store().load()?;
    ctx.project
        .rename_vendor(&args.old, &args.new)
        .map_err(|e| explain(e, &config))?;
    println!(
        "{} Renamed {} -> {}",
        emoji(&ctx.out, "✅", "[OK]"),
        args.old,
        args.new
    );
    Ok(())
}
