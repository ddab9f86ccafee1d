//! # List Command Implementation
//!
//! Implements `list`, which prints every configured vendor with its ref, its
//! mappings and the commit it is locked to. `--json` emits the same data for
//! scripts.

use anyhow::Result;
use clap::Args;
use serde::Serialize;

use git_vendor::config::{ComplianceLevel, VendorConfig};
use git_vendor::lock::Lockfile;
use git_vendor::output::short_commit;

use super::Context;

/// List configured vendors
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct Row<'a> {
    name: &'a str,
    url: &'a str,
    #[serde(rename = "ref")]
    r#ref: &'a str,
    compliance: ComplianceLevel,
    license: Option<&'a str>,
    group: Option<&'a str>,
    mappings: Vec<String>,
    locked_commit: Option<&'a str>,
}

fn rows<'a>(config: &'a VendorConfig, lock: &'a Lockfile) -> Vec<Row<'a>> {
    config
        .vendors
        .iter()
        .map(|v| Row {
            name: &v.name,
            url: &v.url,
            r#ref: &v.r#ref,
            compliance: v.compliance,
            license: v.license.as_deref(),
            group: v.group.as_deref(),
            mappings: v.mappings.iter().map(|m| m.to_string()).collect(),
            locked_commit: lock.get(&v.name).map(|e| e.commit.as_str()),
        })
        .collect()
}

/// Execute the `list` command.
pub fn execute(args: ListArgs, ctx: &Context) -> Result<()> {
    let config = ctx.project.config_store().load()?;
    let lock = ctx.project.lock_store().load()?;
    let rows = rows(&config, &lock);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    if rows.is_empty() {
        println!("No vendors configured.");
        return Ok(());
    }

    println!(
        "{:<20} {:<16} {:<10} {:<9} URL",
        "NAME", "REF", "LOCKED", "LEVEL"
    );
    for row in &rows {
        println!(
            "{:<20} {:<16} {:<10} {:<9} {}",
            row.name,
            row.r#ref,
            row.locked_commit.map(short_commit).unwrap_or("-"),
            row.compliance.to_string(),
            row.url
        );
        for mapping in &row.mappings {
            println!("    {}", mapping);
        }
    }
    println!("\nTotal: {} vendor(s)", rows.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use git_vendor::lock::LockEntry;

    #[test]
    fn test_rows_include_locked_commit() {
        let config = git_vendor::config::parse(
            "vendors:\n  - name: left-pad\n    url: https://example.com/l.git\n    ref: v1.0.0\n    mappings:\n      - from: src\n        to: vendor/left-pad\n",
        )
        .unwrap();
        let mut lock = Lockfile::new();
        lock.vendors.insert(
            "left-pad".to_string(),
            LockEntry::new("aaaa111000000000000000000000000000000000"),
        );

        let rows = rows(&config, &lock);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].mappings, vec!["src -> vendor/left-pad".to_string()]);
        assert_eq!(
            rows[0].locked_commit,
            Some("aaaa111000000000000000000000000000000000")
        );

        let json = serde_json::to_value(&rows).unwrap();
        assert_eq!(json[0]["ref"], "v1.0.0");
        assert_eq!(json[0]["compliance"], "lenient");
    }
}
