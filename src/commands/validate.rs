//! # Validate Command Implementation
//!
//! This module implements the `validate` subcommand, which checks
//! `.git-vendor/vendor.yml` and `.git-vendor/vendor.lock` without fetching or
//! writing anything.
//!
//! ## Functionality
//!
//! - **Configuration Validation**: Reports every structural problem at once:
//!   invalid names, empty fields, bad paths and overlapping destinations.
//! - **Lock Validation**: Loads the lock file and warns about entries that
//!   belong to no configured vendor, and vendors that are not locked yet.

use anyhow::Result;
use clap::Args;

use git_vendor::output::emoji;

use super::Context;

/// Check the configuration without touching anything
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Treat warnings as errors
    #[arg(long)]
    pub strict: bool,
}

/// Execute the `validate` command.
pub fn execute(args: ValidateArgs, ctx: &Context) -> Result<()> {
    let out = &ctx.out;
    let store = ctx.project.config_store();
    println!(
        "{} Validating configuration: {}",
        emoji(out, "🔍", "[SCAN]"),
        store.path().display()
    );

    let config = match store.load() {
        Ok(config) => {
            println!(
                "{} Configuration file parsed successfully",
                emoji(out, "✅", "[OK]")
            );
            config
        }
        Err(e) => {
            println!(
                "{} Configuration parsing failed: {}",
                emoji(out, "❌", "[ERR]"),
                e
            );
            return Err(anyhow::anyhow!("Configuration parsing failed: {}", e));
        }
    };

    println!("\n{} Configuration Summary:", emoji(out, "📊", "[INFO]"));
    println!("   Vendors: {}", config.vendors.len());
    println!(
        "   Mappings: {}",
        config.vendors.iter().map(|v| v.mappings.len()).sum::<usize>()
    );

    let problems = config.validate();
    for problem in &problems {
        println!("{} {}", emoji(out, "❌", "[ERR]"), problem);
    }

    let mut warnings = Vec::new();
    match ctx.project.lock_store().load() {
        Ok(lock) => {
            for name in lock.vendors.keys() {
                if config.get(name).is_none() {
                    warnings.push(format!("lock entry '{}' has no configured vendor", name));
                }
            }
            for vendor in &config.vendors {
                if lock.get(&vendor.name).is_none() {
                    warnings.push(format!("vendor '{}' is not locked yet", vendor.name));
                }
            }
        }
        Err(e) => {
            println!("{} {}", emoji(out, "❌", "[ERR]"), e);
            return Err(anyhow::anyhow!("Lock file validation failed"));
        }
    }
    for warning in &warnings {
        println!("{} {}", emoji(out, "⚠️", "[WARN]"), warning);
    }

    if !problems.is_empty() {
        return Err(anyhow::anyhow!(
            "Validation failed with {} problem(s)",
            problems.len()
        ));
    }
    if args.strict && !warnings.is_empty() {
        return Err(anyhow::anyhow!(
            "Validation failed with {} warning(s) in strict mode",
            warnings.len()
        ));
    }

    println!("\n{} Configuration is valid", emoji(out, "✅", "[OK]"));
    Ok(())
}
