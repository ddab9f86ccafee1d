//! # Pull Command Implementation
//!
//! This module implements the `pull` subcommand, the main entry point of
//! `git-vendor`. It resolves every vendor's ref, fetches each distinct commit
//! once, writes the mapped paths into the project and records the result in
//! `.git-vendor/vendor.lock`.
//!
//! ## Modes
//!
//! - **Default**: resolve refs, refetch vendors whose commit changed or whose
//!   files drifted from the lock.
//! - **`--locked`**: reuse the commits in the lock file instead of resolving.
//! - **`--local`**: never touch the network; restore from the cache only.
//! - **`--dry-run`**: report what would change without writing anything.
//!
//! Vendors fail independently: one failing vendor never stops the others,
//! but any failure makes the command exit non-zero.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::Args;
use dialoguer::{theme::ColorfulTheme, Confirm};
use indicatif::{ProgressBar, ProgressStyle};

use git_vendor::cache::DiskCache;
use git_vendor::config::VendorDefinition;
use git_vendor::defaults::{default_cache_root, PARALLEL_WORKERS};
use git_vendor::git;
use git_vendor::output::{emoji, outcome_label, short_commit, OutputConfig};
use git_vendor::project::STATE_DIR;
use git_vendor::repository::SystemGit;
use git_vendor::suggestions;
use git_vendor::sync::{
    self, Approver, AutoApprove, SyncContext, SyncOptions, SyncOutcome, SyncReport,
};

use super::Context;

/// Fetch vendors and write them to their destinations
#[derive(Args, Debug)]
pub struct PullArgs {
    /// Show what would change without writing files or the lock
    #[arg(long)]
    pub dry_run: bool,

    /// Re-apply every vendor even when nothing changed
    #[arg(long)]
    pub force: bool,

    /// Ignore cached trees and fetch again
    #[arg(long)]
    pub no_cache: bool,

    /// Only pull vendors in this group
    #[arg(long, value_name = "GROUP")]
    pub group: Option<String>,

    /// Fetch vendors concurrently
    #[arg(long)]
    pub parallel: bool,

    /// Number of concurrent workers (implies --parallel)
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u16).range(1..))]
    pub workers: Option<u16>,

    /// Use the commits recorded in the lock file instead of resolving refs
    #[arg(long)]
    pub locked: bool,

    /// Remove destinations whose source path no longer exists upstream
    #[arg(long)]
    pub prune: bool,

    /// Leave vendors with local modifications untouched
    #[arg(long)]
    pub keep_local: bool,

    /// Ask before updating each vendor
    #[arg(short, long)]
    pub interactive: bool,

    /// Commit the updated destinations and lock file with git
    #[arg(long)]
    pub commit: bool,

    /// Work offline from the lock file and the cache
    #[arg(long)]
    pub local: bool,

    /// Show upstream diffs and debug logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Only print errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// The root directory of the cache.
    ///
    /// Defaults to the system's cache directory
    /// (e.g., `~/.cache/git-vendor` on Linux).
    #[arg(long, value_name = "DIR", env = "GIT_VENDOR_CACHE")]
    pub cache_root: Option<PathBuf>,
}

impl PullArgs {
    fn workers(&self) -> usize {
        match self.workers {
            Some(n) => usize::from(n),
            None if self.parallel => PARALLEL_WORKERS,
            None => 1,
        }
    }

    fn sync_options(&self) -> SyncOptions {
        SyncOptions {
            dry_run: self.dry_run,
            force: self.force,
            no_cache: self.no_cache,
            group: self.group.clone(),
            locked: self.locked || self.local,
            prune: self.prune,
            keep_local: self.keep_local,
            offline: self.local,
            workers: self.workers(),
            show_diff: self.verbose,
            ..SyncOptions::default()
        }
    }
}

/// Asks on the terminal before each vendor is updated.
struct PromptApprover;

impl Approver for PromptApprover {
    fn approve(&self, vendor: &VendorDefinition, commit: &str) -> bool {
        Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt(format!(
                "Update {} to {} ({})?",
                vendor.name,
                short_commit(commit),
                vendor.r#ref
            ))
            .default(true)
            .interact()
            .unwrap_or(false)
    }
}

fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

/// Execute the `pull` command.
pub fn execute(args: PullArgs, ctx: &Context) -> Result<()> {
    let project = &ctx.project;
    let config = project.config_store().load()?;
    let lock_store = project.lock_store();
    let lock = lock_store.load()?;

    let cache = DiskCache::new(args.cache_root.clone().unwrap_or_else(default_cache_root));
    let approver: &dyn Approver = if args.interactive {
        &PromptApprover
    } else {
        &AutoApprove
    };
    let sync_ctx = SyncContext {
        root: project.root(),
        git: &SystemGit,
        cache: &cache,
        approver,
    };
    let options = args.sync_options();

    let progress = (!args.quiet && !args.interactive)
        .then(|| spinner(&format!("Pulling {} vendor(s)...", config.vendors.len())));
    let report = sync::run(&sync_ctx, &config, &lock, &lock_store, &options);
    if let Some(pb) = progress {
        pb.finish_and_clear();
    }
    let report = report?;

    if !args.quiet {
        print_report(&ctx.out, &report);
    }

    if args.commit && report.lock_updated {
        let mut paths: Vec<String> = report
            .results
            .iter()
            .filter(|r| r.outcome == SyncOutcome::Synced)
            .filter_map(|r| config.get(&r.vendor))
            .flat_map(|v| v.mappings.iter().map(|m| m.to.clone()))
            .collect();
        paths.push(STATE_DIR.to_string());
        git::commit_paths(project.root(), &paths, &commit_message(&report))?;
        if !args.quiet {
            println!("{} Committed vendor updates", emoji(&ctx.out, "📝", "[GIT]"));
        }
    }

    if report.has_failures() {
        let failed: Vec<&str> = report
            .results
            .iter()
            .filter(|r| r.outcome == SyncOutcome::Failed)
            .map(|r| r.vendor.as_str())
            .collect();
        return Err(suggestions::vendors_failed(&failed));
    }
    Ok(())
}

fn print_report(out: &OutputConfig, report: &SyncReport) {
    if report.results.is_empty() {
        println!("No vendors to pull.");
        return;
    }

    for result in &report.results {
        let commit = result.commit.as_deref().map(short_commit).unwrap_or("-");
        let mut line = format!(
            "{:<20} {:<12} {}",
            result.vendor,
            outcome_label(out, result.outcome, report.dry_run),
            commit
        );
        if result.outcome == SyncOutcome::Synced {
            line.push_str(&format!(" ({} file(s))", result.files_written));
        }
        println!("{}", line);

        if let Some(error) = &result.error {
            println!("    {}", error.replace('\n', "\n    "));
        }
        for path in &result.modified {
            println!("    modified locally: {}", path);
        }
        for path in &result.pruned {
            println!("    pruned: {}", path);
        }
        if let Some(diff) = &result.diff {
            for line in diff.lines() {
                println!("    {}", line);
            }
        }
    }

    println!(
        "\n{} synced, {} unchanged, {} skipped, {} modified, {} failed",
        report.count(SyncOutcome::Synced),
        report.count(SyncOutcome::Unchanged),
        report.count(SyncOutcome::Skipped),
        report.count(SyncOutcome::Modified),
        report.count(SyncOutcome::Failed)
    );
    if report.dry_run {
        println!("{} Dry run mode - no changes were made.", emoji(out, "🔎", "[DRY]"));
    }
}

fn commit_message(report: &SyncReport) -> String {
    let mut message = String::from("Update vendored dependencies\n");
    for result in report
        .results
        .iter()
        .filter(|r| r.outcome == SyncOutcome::Synced)
    {
        let commit = result.commit.as_deref().map(short_commit).unwrap_or("-");
        match result.previous_commit.as_deref() {
            Some(previous) if Some(previous) != result.commit.as_deref() => message.push_str(
                &format!("\n{}: {} -> {}", result.vendor, short_commit(previous), commit),
            ),
            _ => message.push_str(&format!("\n{}: {}", result.vendor, commit)),
        }
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Wrapper {
        #[command(flatten)]
        args: PullArgs,
    }

    fn parse(argv: &[&str]) -> PullArgs {
        let mut full = vec!["pull"];
        full.extend_from_slice(argv);
        Wrapper::try_parse_from(full).unwrap().args
    }

    #[test]
    fn test_worker_count() {
        assert_eq!(parse(&[]).workers(), 1);
        assert_eq!(parse(&["--parallel"]).workers(), PARALLEL_WORKERS);
        assert_eq!(parse(&["--workers", "8"]).workers(), 8);
        assert!(Wrapper::try_parse_from(["pull", "--workers", "0"]).is_err());
    }

    #[test]
    fn test_local_implies_locked_offline() {
        let options = parse(&["--local"]).sync_options();
        assert!(options.offline);
        assert!(options.locked);
        assert!(!parse(&[]).sync_options().offline);
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        assert!(Wrapper::try_parse_from(["pull", "-q", "-v"]).is_err());
    }
}
