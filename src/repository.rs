//! # Git Operations Capability
//!
//! The sync scheduler and the status engine never run git themselves. They
//! are written against the [`GitOperations`] trait, which describes the four
//! things they need from a remote repository:
//!
//! - **`resolve_ref`**: turn a branch, tag or commit into a full commit hash
//!   before syncing.
//! - **`fetch_tree`**: retrieve every file of one commit.
//! - **`list_remote_commit`**: cheaply ask where a ref points now, used by
//!   staleness checks without fetching anything.
//! - **`diff`**: a textual diff of one path between two commits.
//!
//! Implementations report failures as `RefNotFound`, `Network` (which the
//! caller may retry) or `AuthRequired`. [`SystemGit`] shells out to the `git`
//! binary; tests substitute mocks that count calls.

use crate::error::Result;
use crate::filesystem::MemoryFS;

/// Trait for git operations - allows mocking in tests
pub trait GitOperations: Send + Sync {
    /// Resolve `r#ref` in `url` to a full commit hash.
    fn resolve_ref(&self, url: &str, r#ref: &str) -> Result<String>;

    /// Fetch every file of `commit` from `url`.
    fn fetch_tree(&self, url: &str, commit: &str) -> Result<MemoryFS>;

    /// The commit `r#ref` currently points at on the remote, without fetching.
    fn list_remote_commit(&self, url: &str, r#ref: &str) -> Result<String>;

    /// Textual diff of `path` between `commit_a` and `commit_b`.
    fn diff(&self, url: &str, commit_a: &str, commit_b: &str, path: &str) -> Result<String>;
}

/// The default implementation of `GitOperations`, which uses the system's
/// `git` command.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemGit;

impl GitOperations for SystemGit {
    fn resolve_ref(&self, url: &str, r#ref: &str) -> Result<String> {
        crate::git::ls_remote(url, r#ref)
    }

    fn fetch_tree(&self, url: &str, commit: &str) -> Result<MemoryFS> {
        crate::git::fetch_tree(url, commit)
    }

    fn list_remote_commit(&self, url: &str, r#ref: &str) -> Result<String> {
        crate::git::ls_remote(url, r#ref)
    }

    fn diff(&self, url: &str, commit_a: &str, commit_b: &str, path: &str) -> Result<String> {
        crate::git::diff(url, commit_a, commit_b, path)
    }
}
