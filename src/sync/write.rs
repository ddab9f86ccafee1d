//! Writing mapping subtrees to the destination tree
//!
//! Each destination is replaced as a unit: a single-file source becomes one
//! file, a directory source becomes a directory, both staged beside the
//! destination and swapped in with a rename. Files that vanished upstream do
//! not survive the swap.
//!
//! A vendor's destinations are all staged before any of them is swapped in,
//! and the swaps already made are rolled back if a later one fails. A vendor
//! is therefore either fully at its new commit or fully at its old one.

use std::path::Path;

use log::{debug, warn};

use crate::error::{Error, Result};
use crate::filesystem::{self, MemoryFS, StagedReplacement};

/// Stage `tree` for the destination `to` under `root`. `None` stages the
/// removal of a pruned destination.
pub(crate) fn stage(root: &Path, to: &str, tree: Option<&MemoryFS>) -> Result<StagedReplacement> {
    let dest = root.join(to);
    match tree {
        Some(tree) => debug!("staging {} file(s) for {}", tree.len(), dest.display()),
        None => debug!("staging removal of {}", dest.display()),
    }
    filesystem::stage_replacement(&dest, tree).map_err(|e| Error::Filesystem {
        message: format!("Failed to write '{}': {}", to, e),
    })
}

/// Swap every staged destination in, or none of them.
pub(crate) fn commit_all(staged: Vec<StagedReplacement>) -> Result<()> {
    let mut done = Vec::with_capacity(staged.len());
    for replacement in staged {
        match replacement.commit() {
            Ok(replaced) => done.push(replaced),
            Err(e) => {
                for replaced in done.into_iter().rev() {
                    let dest = replaced.dest().to_path_buf();
                    if let Err(revert) = replaced.rollback() {
                        warn!("failed to roll back {}: {}", dest.display(), revert);
                    }
                }
                return Err(e);
            }
        }
    }
    Ok(())
}
