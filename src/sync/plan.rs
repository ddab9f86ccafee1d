//! Target resolution and the per-vendor decision made before any fetch.

use std::path::Path;

use log::debug;

use super::{with_retry, SyncOptions};
use crate::checksum;
use crate::config::VendorDefinition;
use crate::error::{Error, Result};
use crate::lock::LockEntry;
use crate::repository::GitOperations;

/// What to do with a vendor once its target commit is known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Decision {
    /// Lock and disk already match the target.
    Unchanged,
    /// `--keep-local` found these destinations edited.
    Modified(Vec<String>),
    Fetch,
}

/// Pick the commit `vendor` should end up at.
///
/// `--locked` and `--local` reuse the existing pin without touching the
/// network. Without a pin, `--local` cannot proceed and `--locked` falls back
/// to resolving the ref.
pub(crate) fn resolve_target(
    git: &dyn GitOperations,
    vendor: &VendorDefinition,
    previous: Option<&LockEntry>,
    options: &SyncOptions,
) -> Result<String> {
    if options.locked || options.offline {
        if let Some(entry) = previous {
            debug!("{}: using locked commit {}", vendor.name, entry.commit);
            return Ok(entry.commit.clone());
        }
    }

    if options.offline {
        return Err(Error::Cache {
            message: format!(
                "vendor '{}' has no lock entry, so it cannot be synced with --local",
                vendor.name
            ),
        });
    }

    let what = format!("resolve {}@{}", vendor.url, vendor.r#ref);
    let commit = with_retry(&options.retry, &what, || {
        git.resolve_ref(&vendor.url, &vendor.r#ref)
    })?;
    debug!("{}: {} resolved to {}", vendor.name, vendor.r#ref, commit);
    Ok(commit)
}

/// Decide whether `vendor` needs fetching at `target`.
pub(crate) fn decide(
    root: &Path,
    vendor: &VendorDefinition,
    previous: Option<&LockEntry>,
    target: &str,
    options: &SyncOptions,
) -> Result<Decision> {
    let entry = match previous {
        Some(entry) => entry,
        None => return Ok(Decision::Fetch),
    };

    if !options.force && entry.commit == target && entry.drifted(root, vendor)?.is_empty() {
        return Ok(Decision::Unchanged);
    }

    if options.keep_local {
        let modified = local_modifications(root, vendor, entry)?;
        if !modified.is_empty() {
            return Ok(Decision::Modified(modified));
        }
    }

    Ok(Decision::Fetch)
}

/// Existing destinations whose contents differ from what `entry` recorded.
/// Missing destinations are not modifications.
fn local_modifications(
    root: &Path,
    vendor: &VendorDefinition,
    entry: &LockEntry,
) -> Result<Vec<String>> {
    let mut modified = Vec::new();
    for mapping in &vendor.mappings {
        let expected = match entry.checksums.get(&mapping.to) {
            Some(sum) => sum,
            None => continue,
        };
        if let Some(actual) = checksum::path_checksum(&root.join(&mapping.to))? {
            if &actual != expected {
                modified.push(mapping.to.clone());
            }
        }
    }
    Ok(modified)
}
