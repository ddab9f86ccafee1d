//! # Status Command Implementation
//!
//! Implements `status`, which reports for every vendor whether its files
//! drifted from the lock (local drift), whether its ref moved upstream
//! (remote drift) and the resulting compliance verdict.
//!
//! The command exits non-zero when any vendor fails its verdict or could not
//! be checked, which makes it usable as a CI gate.

use anyhow::Result;
use clap::{Args, ValueEnum};

use git_vendor::compliance::{FileLicenseDetector, Verdict};
use git_vendor::config::ComplianceLevel;
use git_vendor::defaults::PARALLEL_WORKERS;
use git_vendor::output::{drift_label, short_commit, verdict_label, OutputConfig};
use git_vendor::repository::SystemGit;
use git_vendor::status::{self, StatusOptions, StatusReport};
use git_vendor::suggestions;

use super::Context;

/// Output format for `status`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum StatusFormat {
    #[default]
    Table,
    Json,
}

/// Report drift and compliance for every vendor
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Skip the remote check
    #[arg(long, conflicts_with = "remote_only")]
    pub offline: bool,

    /// Only compare locked commits with the remote
    #[arg(long)]
    pub remote_only: bool,

    /// Only report strict vendors
    #[arg(long, conflicts_with = "compliance")]
    pub strict_only: bool,

    /// Only report vendors at this compliance level
    #[arg(long, value_name = "LEVEL")]
    pub compliance: Option<ComplianceLevel>,

    /// Output format
    #[arg(long, value_enum, default_value_t = StatusFormat::Table)]
    pub format: StatusFormat,

    /// Shorthand for --format json
    #[arg(long)]
    pub json: bool,

    /// Print nothing; only set the exit status
    #[arg(short, long)]
    pub quiet: bool,
}

impl StatusArgs {
    fn status_options(&self) -> StatusOptions {
        let compliance = if self.strict_only {
            Some(ComplianceLevel::Strict)
        } else {
            self.compliance
        };
        StatusOptions {
            offline: self.offline,
            remote_only: self.remote_only,
            compliance,
            workers: PARALLEL_WORKERS,
        }
    }

    fn format(&self) -> StatusFormat {
        if self.json {
            StatusFormat::Json
        } else {
            self.format
        }
    }
}

/// Execute the `status` command.
pub fn execute(args: StatusArgs, ctx: &Context) -> Result<()> {
    let config = ctx.project.config_store().load()?;
    let lock = ctx.project.lock_store().load()?;

    let report = status::run(
        &config,
        &lock,
        ctx.project.root(),
        &SystemGit,
        &FileLicenseDetector,
        &args.status_options(),
    )?;

    if !args.quiet {
        match args.format() {
            StatusFormat::Json => println!("{}", report.to_json()?),
            StatusFormat::Table => print_table(&ctx.out, &report),
        }
    }

    if report.has_failures() {
        let failed = report
            .vendors
            .iter()
            .filter(|e| e.verdict == Verdict::Fail || e.error.is_some())
            .count();
        return Err(suggestions::status_failed(failed));
    }
    Ok(())
}

fn print_table(out: &OutputConfig, report: &StatusReport) {
    if report.vendors.is_empty() {
        println!("No vendors to check.");
        return;
    }

    println!(
        "{:<20} {:<9} {:<9} {:<6} {:<7} {:<14} VERDICT",
        "VENDOR", "LEVEL", "LOCKED", "LOCAL", "REMOTE", "LICENSE"
    );
    for entry in &report.vendors {
        println!(
            "{:<20} {:<9} {:<9} {:<6} {:<7} {:<14} {}",
            entry.vendor,
            entry.compliance.to_string(),
            entry.locked_commit.as_deref().map(short_commit).unwrap_or("-"),
            drift_label(entry.local_drift),
            drift_label(entry.remote_drift),
            entry.license.as_deref().unwrap_or("-"),
            verdict_label(out, entry.verdict)
        );
        for path in &entry.drifted {
            println!("    drifted: {}", path);
        }
        if let Some(error) = &entry.error {
            println!("    error: {}", error.replace('\n', "\n    "));
        }
    }

    println!(
        "\n{} pass, {} fail, {} unknown, {} info",
        report.count(Verdict::Pass),
        report.count(Verdict::Fail),
        report.count(Verdict::Unknown),
        report.count(Verdict::Info)
    );
}
