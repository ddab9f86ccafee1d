//! # Cache Command Implementation
//!
//! This module implements the `cache` subcommand, which manages the
//! incremental cache of fetched commits.
//!
//! ## Subcommands
//!
//! - **`list`**: Display every cached commit with its size and file count
//! - **`clean`**: Remove cached commits by hash, or by filter (`--all`,
//!   `--unused`, `--older-than`)
//!
//! A sync never evicts cache entries; this command is the only way they go.

use anyhow::{Context as _, Result};
use clap::{Args, Subcommand};
use dialoguer::{theme::ColorfulTheme, Confirm};
use serde::Serialize;
use std::path::PathBuf;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use git_vendor::cache::{CacheEntryInfo, DiskCache};
use git_vendor::defaults::default_cache_root;
use git_vendor::output::{emoji, short_commit};
use git_vendor::suggestions;

use super::Context;

/// Manage the cache of fetched commits
#[derive(Args, Debug)]
pub struct CacheArgs {
    /// The root directory of the cache.
    ///
    /// Defaults to the system's cache directory
    /// (e.g., `~/.cache/git-vendor` on Linux).
    #[arg(long, value_name = "DIR", env = "GIT_VENDOR_CACHE")]
    pub cache_root: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: CacheSubcommand,
}

#[derive(Subcommand, Debug)]
pub enum CacheSubcommand {
    /// List cached commits
    List(ListArgs),
    /// Remove cached commits
    Clean(CleanArgs),
}

/// Arguments for `cache list`
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Show last modified time and file count
    #[arg(long)]
    pub detailed: bool,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Arguments for `cache clean`
#[derive(Args, Debug)]
pub struct CleanArgs {
    /// Commit hashes to remove
    #[arg(value_name = "COMMIT")]
    pub commits: Vec<String>,

    /// Show what would be deleted without deleting anything
    #[arg(long)]
    pub dry_run: bool,

    /// Delete every cached commit
    #[arg(long)]
    pub all: bool,

    /// Delete commits no vendor in this project is locked to
    #[arg(long)]
    pub unused: bool,

    /// Delete entries older than the given duration (e.g. 30d, 12h, 2w)
    #[arg(long, value_name = "DURATION", value_parser = parse_duration)]
    pub older_than: Option<Duration>,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

/// Execute the `cache` command.
pub fn execute(args: CacheArgs, ctx: &Context) -> Result<()> {
    let cache = DiskCache::new(args.cache_root.unwrap_or_else(default_cache_root));
    match args.command {
        CacheSubcommand::List(list_args) => execute_list(&cache, list_args),
        CacheSubcommand::Clean(clean_args) => execute_clean(&cache, clean_args, ctx),
    }
}

fn execute_list(cache: &DiskCache, args: ListArgs) -> Result<()> {
    let entries = cache.entries()?;

    if args.json {
        display_json(&entries)?;
    } else if entries.is_empty() {
        println!("No cached commits found in: {}", cache.root().display());
    } else if args.detailed {
        display_detailed(&entries);
    } else {
        display_table(&entries);
    }
    Ok(())
}

fn execute_clean(cache: &DiskCache, args: CleanArgs, ctx: &Context) -> Result<()> {
    if !args.all && !args.unused && args.older_than.is_none() && args.commits.is_empty() {
        return Err(suggestions::cache_clean_no_filter());
    }

    let locked: Vec<String> = if args.unused {
        ctx.project
            .lock_store()
            .load()?
            .vendors
            .into_values()
            .map(|e| e.commit)
            .collect()
    } else {
        Vec::new()
    };

    let entries = cache.entries()?;
    let selected = select_for_cleanup(&entries, &args, &locked, SystemTime::now());
    if selected.is_empty() {
        println!("No cache entries match the specified criteria.");
        return Ok(());
    }

    println!("Cache entries to be deleted:\n");
    for entry in &selected {
        println!("  {} ({})", entry.commit, format_size(entry.size));
    }
    let total: u64 = selected.iter().map(|e| e.size).sum();
    println!(
        "\nTotal: {} entries ({})",
        selected.len(),
        format_size(total)
    );

    if args.dry_run {
        println!("\n{} Dry run mode - no changes were made.", emoji(&ctx.out, "🔎", "[DRY]"));
        return Ok(());
    }

    if !args.yes {
        let confirmed = Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt("Delete these cache entries?")
            .default(false)
            .interact()?;
        if !confirmed {
            println!("Clean cancelled.");
            return Ok(());
        }
    }

    let mut deleted = 0;
    let mut failed = 0;
    for entry in &selected {
        match cache.remove(&entry.commit) {
            Ok(_) => deleted += 1,
            Err(e) => {
                failed += 1;
                eprintln!(
                    "  {} Failed to delete {}: {}",
                    emoji(&ctx.out, "❌", "[ERR]"),
                    entry.commit,
                    e
                );
            }
        }
    }

    println!(
        "\n{} Deleted {} cache entries.",
        emoji(&ctx.out, "✅", "[OK]"),
        deleted
    );
    if failed > 0 {
        anyhow::bail!("Failed to delete {} cache entries", failed);
    }
    Ok(())
}

/// Entries matched by any of the clean filters.
fn select_for_cleanup<'a>(
    entries: &'a [CacheEntryInfo],
    args: &CleanArgs,
    locked: &[String],
    now: SystemTime,
) -> Vec<&'a CacheEntryInfo> {
    entries
        .iter()
        .filter(|entry| {
            if args.all {
                return true;
            }
            if args
                .commits
                .iter()
                .any(|c| !c.is_empty() && entry.commit.starts_with(c.as_str()))
            {
                return true;
            }
            if args.unused && !locked.contains(&entry.commit) {
                return true;
            }
            match (args.older_than, entry.last_modified) {
                (Some(threshold), Some(modified)) => now
                    .duration_since(modified)
                    .map_or(false, |age| age >= threshold),
                (Some(_), None) => true,
                (None, _) => false,
            }
        })
        .collect()
}

/// Parse a duration such as `30d`, `1.5h` or `2w`.
fn parse_duration(raw: &str) -> Result<Duration> {
    let raw = raw.trim().to_lowercase();
    let split = raw
        .find(|c: char| !c.is_ascii_digit() && c != '.')
        .unwrap_or(raw.len());
    if split == 0 {
        anyhow::bail!("Duration must start with a number: '{}'", raw);
    }

    let (number, unit) = raw.split_at(split);
    let number: f64 = number
        .parse()
        .with_context(|| format!("Invalid number in duration: '{}'", number))?;
    let seconds = match unit {
        "s" | "sec" | "secs" => 1.0,
        "m" | "min" | "mins" => 60.0,
        "h" | "hr" | "hours" => 3600.0,
        "d" | "day" | "days" => 86400.0,
        "w" | "week" | "weeks" => 604800.0,
        _ => anyhow::bail!("Invalid duration unit: '{}'. Valid units: s, m, h, d, w", unit),
    };
    Duration::try_from_secs_f64(number * seconds)
        .with_context(|| format!("Duration out of range: '{}'", raw))
}

fn display_table(entries: &[CacheEntryInfo]) {
    println!("Cached commits:\n");
    println!("{:<42} {:>8} {:>12}", "COMMIT", "FILES", "SIZE");
    println!("{}", "-".repeat(64));
    for entry in entries {
        println!(
            "{:<42} {:>8} {:>12}",
            entry.commit,
            entry.file_count,
            format_size(entry.size)
        );
    }
    println!("\nTotal: {} cached commits", entries.len());
}

fn display_detailed(entries: &[CacheEntryInfo]) {
    println!("Cached commits:\n");
    for entry in entries {
        println!("{}:", short_commit(&entry.commit));
        println!("  Commit: {}", entry.commit);
        println!("  Path: {}", entry.path.display());
        println!("  Size: {}", format_size(entry.size));
        println!("  Files: {}", entry.file_count);
        match modified_secs(entry) {
            Some(secs) => println!("  Last Modified: {} (unix)", secs),
            None => println!("  Last Modified: (unknown)"),
        }
    }
    println!("\nTotal: {} cached commits", entries.len());
}

#[derive(Serialize)]
struct JsonEntry<'a> {
    commit: &'a str,
    path: String,
    size: u64,
    file_count: usize,
    last_modified: Option<u64>,
}

fn display_json(entries: &[CacheEntryInfo]) -> Result<()> {
    let json: Vec<JsonEntry<'_>> = entries
        .iter()
        .map(|e| JsonEntry {
            commit: &e.commit,
            path: e.path.display().to_string(),
            size: e.size,
            file_count: e.file_count,
            last_modified: modified_secs(e),
        })
        .collect();
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}

fn modified_secs(entry: &CacheEntryInfo) -> Option<u64> {
    entry
        .last_modified
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map(|d| d.as_secs())
}

/// Format size in human-readable format
fn format_size(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes as f64;
    let mut unit_idx = 0;

    while size >= 1024.0 && unit_idx < UNITS.len() - 1 {
        size /= 1024.0;
        unit_idx += 1;
    }

    if unit_idx == 0 {
        format!("{} {}", bytes, UNITS[unit_idx])
    } else {
        format!("{:.2} {}", size, UNITS[unit_idx])
    }
}
