//! # Add Command Implementation
//!
//! This module implements the `add` subcommand (alias `create`), which adds a
//! vendor definition to `.git-vendor/vendor.yml`.
//!
//! The new definition is validated against every existing vendor before the
//! file is written: a duplicate name or a destination that overlaps another
//! mapping leaves the configuration untouched. Nothing is fetched; run
//! `git-vendor pull` afterwards to lock and write the vendor.

use anyhow::Result;
use clap::Args;

use git_vendor::config::{self, ComplianceLevel, PathMapping, VendorDefinition};
use git_vendor::output::emoji;

use super::{parse_mapping, Context};

/// Add a vendor
#[derive(Args, Debug)]
pub struct AddArgs {
    /// Unique vendor name
    #[arg(value_name = "NAME")]
    pub name: String,

    /// Repository URL (https, ssh, git or a local path)
    #[arg(value_name = "URL")]
    pub url: String,

    /// Branch, tag or commit to track
    #[arg(long = "ref", value_name = "REF", default_value = "main")]
    pub r#ref: String,

    /// Path mapping FROM:TO; repeat for several mappings
    #[arg(long = "map", value_name = "FROM:TO", required = true, value_parser = parse_mapping)]
    pub mappings: Vec<PathMapping>,

    /// Declared SPDX license identifier
    #[arg(long, value_name = "SPDX")]
    pub license: Option<String>,

    /// Group used by `pull --group`
    #[arg(long, value_name = "GROUP")]
    pub group: Option<String>,

    /// Compliance level
    #[arg(long, value_name = "LEVEL", default_value_t = ComplianceLevel::Lenient)]
    pub compliance: ComplianceLevel,
}

/// Execute the `add` command.
pub fn execute(args: AddArgs, ctx: &Context) -> Result<()> {
    config::check_repository_url(&args.url)?;

    let store = ctx.project.config_store();
    let mut vendors = store.load()?;

    let mut vendor = VendorDefinition::new(&args.name, &args.url, &args.r#ref, args.mappings);
    vendor.license = args.license;
    vendor.group = args.group;
    vendor.compliance = args.compliance;
    let mappings = vendor.mappings.len();

    vendors.add_vendor(vendor)?;
    store.save(&vendors)?;

    println!(
        "{} Added {} @ {} ({} mapping(s))",
        emoji(&ctx.out, "✅", "[OK]"),
        args.name,
        args.r#ref,
        mappings
    );
    println!(
        "{} Run `git-vendor pull` to fetch and lock it",
        emoji(&ctx.out, "💡", "[HINT]")
    );
    Ok(())
}
