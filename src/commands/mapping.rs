//! # Mapping Command Implementations
//!
//! Implements `add-mapping`, `remove-mapping` and `update-mapping`, which edit
//! the path mappings of one vendor. Mappings are addressed by their
//! destination path; every change is validated against all other vendors
//! before the configuration is written.

use anyhow::Result;
use clap::Args;

use git_vendor::config::PathMapping;
use git_vendor::output::emoji;

use super::{explain, parse_mapping, Context};

/// Add a path mapping to a vendor
#[derive(Args, Debug)]
pub struct AddMappingArgs {
    /// Vendor to change
    #[arg(value_name = "NAME")]
    pub name: String,

    /// New mapping
    #[arg(value_name = "FROM:TO", value_parser = parse_mapping)]
    pub mapping: PathMapping,
}

/// Remove a path mapping from a vendor
#[derive(Args, Debug)]
pub struct RemoveMappingArgs {
    /// Vendor to change
    #[arg(value_name = "NAME")]
    pub name: String,

    /// Destination of the mapping to remove
    #[arg(value_name = "TO")]
    pub to: String,
}

/// Replace a path mapping of a vendor
#[derive(Args, Debug)]
pub struct UpdateMappingArgs {
    /// Vendor to change
    #[arg(value_name = "NAME")]
    pub name: String,

    /// Destination of the mapping to replace
    #[arg(value_name = "TO")]
    pub to: String,

    /// Replacement mapping
    #[arg(value_name = "FROM:TO", value_parser = parse_mapping)]
    pub mapping: PathMapping,
}

/// Execute the `add-mapping` command.
pub fn execute_add(args: AddMappingArgs, ctx: &Context) -> Result<()> {
    let store = ctx.project.config_store();
    let mut vendors = store.load()?;
    let shown = args.mapping.to_string();
    vendors
        .add_mapping(&args.name, args.mapping)
        .map_err(|e| explain(e, &vendors))?;
    store.save(&vendors)?;
    println!(
        "{} Added mapping {} to {}",
        emoji(&ctx.out, "✅", "[OK]"),
        shown,
        args.name
    );
    Ok(())
}

/// Execute the `remove-mapping` command.
pub fn execute_remove(args: RemoveMappingArgs, ctx: &Context) -> Result<()> {
    let store = ctx.project.config_store();
    let mut vendors = store.load()?;
    let removed = vendors
        .remove_mapping(&args.name, &args.to)
        .map_err(|e| explain(e, &vendors))?;
    store.save(&vendors)?;
    println!(
        "{} Removed mapping {} from {}",
        emoji(&ctx.out, "🗑️", "[DEL]"),
        removed,
        args.name
    );
    println!("   files under {} were left in place", removed.to);
    Ok(())
}

/// Execute the `update-mapping` command.
pub fn execute_update(args: UpdateMappingArgs, ctx: &Context) -> Result<()> {
    let store = ctx.project.config_store();
    let mut vendors = store.load()?;
    let shown = args.mapping.to_string();
    vendors
        .update_mapping(&args.name, &args.to, args.mapping)
        .map_err(|e| explain(e, &vendors))?;
    store.save(&vendors)?;
    println!(
        "{} Updated mapping of {}: {}",
        emoji(&ctx.out, "✅", "[OK]"),
        args.name,
        shown
    );
    Ok(())
}
