//! # Sync Scheduler
//!
//! This module turns the vendor configuration into an on-disk, lock-pinned
//! tree. A run is split into phases, each fanned out over a bounded rayon
//! pool:
//!
//! 1.  **Resolve** (`plan`): pick the target commit of every selected vendor,
//!     reusing the lock under `--locked` and calling `resolve_ref` otherwise.
//! 2.  **Decide** (`plan`): vendors whose lock already matches the target and
//!     whose files show no drift are `Unchanged`; under `--keep-local`,
//!     vendors with local edits are `Modified` and left alone.
//! 3.  **Fetch** (`worker`): every distinct `(url, commit)` still needed is
//!     fetched exactly once, cache first, retrying network errors.
//! 4.  **Apply** (`worker`, `write`): mappings are written atomically and new
//!     lock entries computed.
//! 5.  **Commit**: after every worker has joined, one lock update carries all
//!     new entries.
//!
//! A failure in one vendor never cancels the others. Only a broken config or
//! lock aborts the run, and that happens before any worker starts.

mod plan;
mod worker;
mod write;

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use log::{debug, info, warn};
use rayon::prelude::*;
use serde::Serialize;

use crate::cache::{CacheView, TreeCache};
use crate::config::{VendorConfig, VendorDefinition};
use crate::error::{Error, Result};
use crate::lock::{LockEntry, LockStore, Lockfile};
use crate::repository::GitOperations;

use plan::Decision;

/// How network failures are retried.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: usize,
    /// Delay before the first retry; later delays grow exponentially.
    pub initial_interval: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_interval: Duration::from_millis(500),
        }
    }
}

/// Flags controlling a sync run.
#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Compute everything, write nothing.
    pub dry_run: bool,
    /// Re-apply vendors even when nothing changed.
    pub force: bool,
    /// Ignore cache hits for this run.
    pub no_cache: bool,
    /// Only sync vendors in this group.
    pub group: Option<String>,
    /// Reuse locked commits instead of resolving refs.
    pub locked: bool,
    /// Remove destinations whose source disappeared upstream.
    pub prune: bool,
    /// Leave locally modified vendors untouched.
    pub keep_local: bool,
    /// Never touch the network; implies `locked` and requires cached trees.
    pub offline: bool,
    /// Worker pool size.
    pub workers: usize,
    /// Attach upstream diffs to dry-run results.
    pub show_diff: bool,
    pub retry: RetryPolicy,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            force: false,
            no_cache: false,
            group: None,
            locked: false,
            prune: false,
            keep_local: false,
            offline: false,
            workers: 1,
            show_diff: false,
            retry: RetryPolicy::default(),
        }
    }
}

/// Outcome of one vendor in a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncOutcome {
    /// Files were (or in a dry run, would be) written.
    Synced,
    /// Lock and files already match the target.
    Unchanged,
    /// Declined interactively.
    Skipped,
    /// Local edits found under `--keep-local`; nothing written.
    Modified,
    Failed,
}

impl std::fmt::Display for SyncOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SyncOutcome::Synced => "synced",
            SyncOutcome::Unchanged => "unchanged",
            SyncOutcome::Skipped => "skipped",
            SyncOutcome::Modified => "modified",
            SyncOutcome::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Per-vendor result of a run.
#[derive(Debug, Clone, Serialize)]
pub struct SyncResult {
    pub vendor: String,
    pub outcome: SyncOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub files_written: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub pruned: Vec<String>,
    /// Destinations with local edits (`Modified` only).
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub modified: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub commit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_commit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diff: Option<String>,
}

impl SyncResult {
    fn new(vendor: &str, outcome: SyncOutcome) -> Self {
        Self {
            vendor: vendor.to_string(),
            outcome,
            error: None,
            files_written: 0,
            pruned: Vec::new(),
            modified: Vec::new(),
            commit: None,
            previous_commit: None,
            diff: None,
        }
    }

    fn failed(vendor: &str, error: impl ToString) -> Self {
        Self {
            error: Some(error.to_string()),
            ..Self::new(vendor, SyncOutcome::Failed)
        }
    }
}

/// Everything a run produced.
#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    pub dry_run: bool,
    /// Whether the lock file was rewritten.
    pub lock_updated: bool,
    pub results: Vec<SyncResult>,
}

impl SyncReport {
    /// Whether the run should exit non-zero.
    pub fn has_failures(&self) -> bool {
        !self.dry_run && self.results.iter().any(|r| r.outcome == SyncOutcome::Failed)
    }

    pub fn count(&self, outcome: SyncOutcome) -> usize {
        self.results.iter().filter(|r| r.outcome == outcome).count()
    }

    pub fn get(&self, vendor: &str) -> Option<&SyncResult> {
        self.results.iter().find(|r| r.vendor == vendor)
    }
}

/// Decides whether a vendor with pending changes should be synced.
pub trait Approver: Send + Sync {
    fn approve(&self, vendor: &VendorDefinition, commit: &str) -> bool;
}

/// Approves everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct AutoApprove;

impl Approver for AutoApprove {
    fn approve(&self, _vendor: &VendorDefinition, _commit: &str) -> bool {
        true
    }
}

/// Capabilities a run drives.
pub struct SyncContext<'a> {
    /// Project root that mapping destinations are relative to.
    pub root: &'a Path,
    pub git: &'a dyn GitOperations,
    pub cache: &'a dyn TreeCache,
    pub approver: &'a dyn Approver,
}

/// Run a sync over `config`, starting from the `lock` snapshot, and write the
/// resulting entries to `lock_store` in a single update.
pub fn run(
    ctx: &SyncContext<'_>,
    config: &VendorConfig,
    lock: &Lockfile,
    lock_store: &LockStore,
    options: &SyncOptions,
) -> Result<SyncReport> {
    config.check()?;

    let vendors: Vec<&VendorDefinition> = config
        .vendors
        .iter()
        .filter(|v| match &options.group {
            Some(group) => v.group.as_deref() == Some(group.as_str()),
            None => true,
        })
        .collect();
    debug!("{} vendor(s) selected", vendors.len());

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(options.workers.max(1))
        .build()
        .map_err(|e| Error::Io(std::io::Error::new(std::io::ErrorKind::Other, e)))?;

    let results: Mutex<BTreeMap<String, (SyncResult, Option<LockEntry>)>> =
        Mutex::new(BTreeMap::new());
    let record = |result: SyncResult, entry: Option<LockEntry>| -> Result<()> {
        info!("{}: {}", result.vendor, result.outcome);
        let mut slots = results.lock().map_err(|_| Error::LockPoisoned {
            context: "sync results".to_string(),
        })?;
        slots.insert(result.vendor.clone(), (result, entry));
        Ok(())
    };

    // Resolve and decide.
    let decisions: Vec<(&VendorDefinition, Result<(String, Decision)>)> = pool.install(|| {
        vendors
            .par_iter()
            .map(|vendor| {
                let previous = lock.get(&vendor.name);
                let decision = plan::resolve_target(ctx.git, vendor, previous, options).and_then(
                    |target| {
                        plan::decide(ctx.root, vendor, previous, &target, options)
                            .map(|d| (target, d))
                    },
                );
                (*vendor, decision)
            })
            .collect()
    });

    let mut pending = Vec::new();
    for (vendor, decision) in decisions {
        let previous = lock.get(&vendor.name);
        match decision {
            Err(e) => record(SyncResult::failed(&vendor.name, e), None)?,
            Ok((target, Decision::Unchanged)) => {
                let mut result = SyncResult::new(&vendor.name, SyncOutcome::Unchanged);
                result.commit = Some(target);
                record(result, None)?;
            }
            Ok((_, Decision::Modified(paths))) => {
                warn!(
                    "{}: local modifications in {}; keeping local files",
                    vendor.name,
                    paths.join(", ")
                );
                let mut result = SyncResult::new(&vendor.name, SyncOutcome::Modified);
                result.commit = previous.map(|p| p.commit.clone());
                result.previous_commit = previous.map(|p| p.commit.clone());
                result.modified = paths;
                record(result, None)?;
            }
            Ok((target, Decision::Fetch)) => {
                if ctx.approver.approve(vendor, &target) {
                    pending.push((vendor, target));
                } else {
                    let mut result = SyncResult::new(&vendor.name, SyncOutcome::Skipped);
                    result.commit = Some(target);
                    record(result, None)?;
                }
            }
        }
    }

    // Fetch every distinct (url, commit) once.
    let view = CacheView::new(ctx.cache, options.no_cache);
    let mut keys: Vec<(String, String)> = pending
        .iter()
        .map(|(vendor, commit)| (vendor.url.clone(), commit.clone()))
        .collect();
    keys.sort();
    keys.dedup();
    debug!("{} distinct tree(s) to fetch", keys.len());

    let trees: BTreeMap<(String, String), std::result::Result<_, String>> = pool.install(|| {
        keys.par_iter()
            .map(|(url, commit)| {
                let tree = worker::fetch(ctx.git, &view, url, commit, options)
                    .map_err(|e| e.to_string());
                ((url.clone(), commit.clone()), tree)
            })
            .collect()
    });

    // Apply.
    pool.install(|| {
        pending.par_iter().try_for_each(|(vendor, commit)| {
            let previous = lock.get(&vendor.name);
            let key = (vendor.url.clone(), commit.clone());
            match trees.get(&key) {
                Some(Ok(tree)) => {
                    let (result, entry) =
                        worker::apply(ctx, vendor, previous, commit, tree, options);
                    record(result, entry)
                }
                Some(Err(message)) => record(SyncResult::failed(&vendor.name, message), None),
                None => record(
                    SyncResult::failed(&vendor.name, "tree was not fetched"),
                    None,
                ),
            }
        })
    })?;

    let mut slots = results.into_inner().map_err(|_| Error::LockPoisoned {
        context: "sync results".to_string(),
    })?;

    let new_entries: BTreeMap<String, LockEntry> = slots
        .iter_mut()
        .filter_map(|(name, (_, entry))| entry.take().map(|e| (name.clone(), e)))
        .collect();

    let lock_updated = !options.dry_run && !new_entries.is_empty();
    if lock_updated {
        lock_store.update(new_entries)?;
        debug!("lock written to {}", lock_store.path().display());
    }

    let results = vendors
        .iter()
        .filter_map(|v| slots.remove(&v.name).map(|(result, _)| result))
        .collect();

    Ok(SyncReport {
        dry_run: options.dry_run,
        lock_updated,
        results,
    })
}

/// Run `op`, retrying retryable errors with exponential backoff.
pub(crate) fn with_retry<T, F>(policy: &RetryPolicy, what: &str, mut op: F) -> Result<T>
where
    F: FnMut() -> Result<T>,
{
    let backoff = backoff::ExponentialBackoff {
        initial_interval: policy.initial_interval,
        current_interval: policy.initial_interval,
        max_elapsed_time: None,
        ..backoff::ExponentialBackoff::default()
    };

    let mut attempt = 0;
    backoff::retry(backoff, || {
        attempt += 1;
        match op() {
            Ok(value) => Ok(value),
            Err(e) if e.is_retryable() && attempt < policy.max_attempts => {
                warn!(
                    "{} failed (attempt {}/{}): {}",
                    what, attempt, policy.max_attempts, e
                );
                Err(backoff::Error::transient(e))
            }
            Err(e) => Err(backoff::Error::permanent(e)),
        }
    })
    .map_err(|e| match e {
        backoff::Error::Permanent(err) => err,
        backoff::Error::Transient { err, .. } => err,
    })
}
