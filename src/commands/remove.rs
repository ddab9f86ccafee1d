//! # Remove Command Implementation
//!
//! Implements `remove` (alias `delete`): drops a vendor from the
//! configuration together with its lock entry. Vendored files stay on disk
//! unless `--purge` is given.

use anyhow::Result;
use clap::Args;

use git_vendor::output::emoji;

use super::{explain, Context};

/// Remove a vendor and its lock entry
#[derive(Args, Debug)]
pub struct RemoveArgs {
    /// Vendor to remove
    #[arg(value_name = "NAME")]
    pub name: String,

    /// Also delete the vendor's destination paths
    #[arg(long)]
    pub purge: bool,
}

/// Execute the `remove` command.
pub fn execute(args: RemoveArgs, ctx: &Context) -> Result<()> {
    let config = ctx.project.config_store().load()?;
    let removed = ctx
        .project
        .remove_vendor(&args.name, args.purge)
        .map_err(|e| explain(e, &config))?;

    println!("{} Removed {}", emoji(&ctx.out, "🗑️", "[DEL]"), removed.name);
    if args.purge {
        for mapping in &removed.mappings {
            println!("   deleted {}", mapping.to);
        }
    }
    Ok(())
}
