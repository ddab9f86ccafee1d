//! Per-vendor work run on the pool: fetching trees and applying mappings.

use log::{debug, warn};

use super::{with_retry, write, SyncContext, SyncOptions, SyncOutcome, SyncResult};
use crate::cache::CacheView;
use crate::checksum;
use crate::config::{PathMapping, VendorDefinition};
use crate::error::{Error, Result};
use crate::filesystem::MemoryFS;
use crate::lock::LockEntry;
use crate::repository::GitOperations;

/// Get the tree of `commit`, from the cache when possible.
///
/// Fetched trees are stored back into the cache unless this is a dry run.
/// A broken cache only costs a refetch.
pub(crate) fn fetch(
    git: &dyn GitOperations,
    view: &CacheView<'_>,
    url: &str,
    commit: &str,
    options: &SyncOptions,
) -> Result<MemoryFS> {
    match view.get(commit) {
        Ok(Some(tree)) => {
            debug!("{}: served from cache", commit);
            return Ok(tree);
        }
        Ok(None) => {}
        Err(e) => warn!("cache lookup for {} failed: {}", commit, e),
    }

    if options.offline {
        return Err(Error::Cache {
            message: format!(
                "commit {} of {} is not cached and --local forbids fetching",
                commit, url
            ),
        });
    }

    let what = format!("fetch {}@{}", url, commit);
    let tree = with_retry(&options.retry, &what, || git.fetch_tree(url, commit))?;

    if !options.dry_run {
        if let Err(e) = view.put(commit, &tree) {
            warn!("failed to cache {}: {}", commit, e);
        }
    }
    Ok(tree)
}

/// Apply every mapping of `vendor` from `tree`, returning the result and the
/// lock entry to record. A failed vendor records nothing.
pub(crate) fn apply(
    ctx: &SyncContext<'_>,
    vendor: &VendorDefinition,
    previous: Option<&LockEntry>,
    commit: &str,
    tree: &MemoryFS,
    options: &SyncOptions,
) -> (SyncResult, Option<LockEntry>) {
    match try_apply(ctx, vendor, previous, commit, tree, options) {
        Ok((result, entry)) => (result, Some(entry)),
        Err(e) => {
            let mut result = SyncResult::failed(&vendor.name, e);
            result.commit = Some(commit.to_string());
            result.previous_commit = previous.map(|p| p.commit.clone());
            (result, None)
        }
    }
}

fn try_apply(
    ctx: &SyncContext<'_>,
    vendor: &VendorDefinition,
    previous: Option<&LockEntry>,
    commit: &str,
    tree: &MemoryFS,
    options: &SyncOptions,
) -> Result<(SyncResult, LockEntry)> {
    // Select everything first so a missing source fails before any write.
    let mut selections: Vec<(&PathMapping, Option<MemoryFS>)> = Vec::new();
    for mapping in &vendor.mappings {
        match tree.select(&mapping.from) {
            Some(subtree) => selections.push((mapping, Some(subtree))),
            None if options.prune => selections.push((mapping, None)),
            None => {
                return Err(Error::SourcePathMissing {
                    vendor: vendor.name.clone(),
                    path: mapping.from.clone(),
                    commit: commit.to_string(),
                })
            }
        }
    }

    let mut entry = LockEntry::new(commit);
    let mut result = SyncResult::new(&vendor.name, SyncOutcome::Synced);
    result.commit = Some(commit.to_string());
    result.previous_commit = previous.map(|p| p.commit.clone());

    let mut staged = Vec::new();
    for (mapping, subtree) in &selections {
        entry
            .sources
            .insert(mapping.to.clone(), mapping.from.clone());
        match subtree {
            Some(subtree) => {
                result.files_written += subtree.len();
                entry
                    .checksums
                    .insert(mapping.to.clone(), checksum::tree_checksum(subtree));
            }
            None => {
                warn!(
                    "{}: '{}' no longer exists upstream; pruning {}",
                    vendor.name, mapping.from, mapping.to
                );
                result.pruned.push(mapping.to.clone());
                entry.pruned.insert(mapping.to.clone());
            }
        }
        if !options.dry_run {
            staged.push(write::stage(ctx.root, &mapping.to, subtree.as_ref())?);
        }
    }
    write::commit_all(staged)?;

    if options.show_diff {
        result.diff = upstream_diff(ctx.git, vendor, previous, commit);
    }

    Ok((result, entry))
}

/// Upstream changes of every mapped source path since the previous pin.
fn upstream_diff(
    git: &dyn GitOperations,
    vendor: &VendorDefinition,
    previous: Option<&LockEntry>,
    commit: &str,
) -> Option<String> {
    let previous = previous.filter(|p| p.commit != commit)?;

    let mut combined = String::new();
    for mapping in &vendor.mappings {
        match git.diff(&vendor.url, &previous.commit, commit, &mapping.from) {
            Ok(diff) => combined.push_str(&diff),
            Err(e) => warn!("{}: diff of '{}' failed: {}", vendor.name, mapping.from, e),
        }
    }
    Some(combined)
}
