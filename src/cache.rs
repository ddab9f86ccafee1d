//! Incremental cache of fetched commit trees
//!
//! Commits are immutable, so a tree fetched once for a given hash never needs
//! fetching again. Entries are keyed by the full commit hash and their mere
//! presence means they are complete: [`DiskCache`] builds each entry in a
//! temporary sibling directory and publishes it with a single rename.
//!
//! `--no-cache` is a bypass, not an eviction. [`CacheView`] makes every lookup
//! miss for one run while still storing what that run fetched.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::SystemTime;

use log::debug;

use crate::error::{Error, Result};
use crate::filesystem::{self, MemoryFS};
use crate::git;

/// Storage for fetched trees, keyed by commit hash.
pub trait TreeCache: Send + Sync {
    /// The cached tree for `commit`, if present.
    fn get(&self, commit: &str) -> Result<Option<MemoryFS>>;

    /// Store the tree for `commit`. Storing an existing hash is a no-op.
    fn put(&self, commit: &str, tree: &MemoryFS) -> Result<()>;
}

/// On-disk cache under `<root>/<commit>/`.
#[derive(Debug, Clone)]
pub struct DiskCache {
    root: PathBuf,
}

/// Summary of one on-disk cache entry.
#[derive(Debug, Clone)]
pub struct CacheEntryInfo {
    pub commit: String,
    pub path: PathBuf,
    pub size: u64,
    pub file_count: usize,
    pub last_modified: Option<SystemTime>,
}

impl DiskCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn entry_path(&self, commit: &str) -> Result<PathBuf> {
        if !git::is_full_commit(commit) {
            return Err(Error::Cache {
                message: format!("refusing to cache non-commit key '{}'", commit),
            });
        }
        Ok(self.root.join(commit))
    }

    /// List every complete entry in the cache.
    pub fn entries(&self) -> Result<Vec<CacheEntryInfo>> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }

        let mut entries = Vec::new();
        for dir_entry in fs::read_dir(&self.root)? {
            let dir_entry = dir_entry?;
            let name = dir_entry.file_name().to_string_lossy().into_owned();
            if !git::is_full_commit(&name) || !dir_entry.file_type()?.is_dir() {
                continue;
            }

            let mut size = 0;
            let mut file_count = 0;
            for file in walkdir::WalkDir::new(dir_entry.path())
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().is_file())
            {
                file_count += 1;
                size += file.metadata().map(|m| m.len()).unwrap_or(0);
            }

            entries.push(CacheEntryInfo {
                commit: name,
                path: dir_entry.path(),
                size,
                file_count,
                last_modified: dir_entry.metadata().and_then(|m| m.modified()).ok(),
            });
        }
        entries.sort_by(|a, b| a.commit.cmp(&b.commit));
        Ok(entries)
    }

    /// Delete the entry for `commit`. Returns whether it existed.
    pub fn remove(&self, commit: &str) -> Result<bool> {
        let path = self.entry_path(commit)?;
        if !path.exists() {
            return Ok(false);
        }
        fs::remove_dir_all(&path)?;
        Ok(true)
    }
}

impl TreeCache for DiskCache {
    fn get(&self, commit: &str) -> Result<Option<MemoryFS>> {
        let path = self.entry_path(commit)?;
        if !path.is_dir() {
            return Ok(None);
        }
        debug!("cache hit for {}", commit);
        filesystem::load_dir(&path).map(Some)
    }

    fn put(&self, commit: &str, tree: &MemoryFS) -> Result<()> {
        let path = self.entry_path(commit)?;
        if path.is_dir() {
            return Ok(());
        }
        fs::create_dir_all(&self.root)?;

        let staging = tempfile::Builder::new()
            .prefix(".incoming-")
            .tempdir_in(&self.root)?;
        filesystem::write_tree(tree, staging.path())?;

        match fs::rename(staging.path(), &path) {
            Ok(()) => Ok(()),
            // Another worker published the same commit first.
            Err(_) if path.is_dir() => Ok(()),
            Err(e) => Err(Error::Cache {
                message: format!("failed to publish {}: {}", path.display(), e),
            }),
        }
    }
}

/// In-process cache, shared between clones.
#[derive(Debug, Clone, Default)]
pub struct MemoryCache {
    cache: Arc<Mutex<HashMap<String, MemoryFS>>>,
}

impl MemoryCache {
    /// Create a new empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the number of cached entries
    pub fn len(&self) -> Result<usize> {
        Ok(self.lock()?.len())
    }

    /// Check if cache is empty
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.lock()?.is_empty())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, MemoryFS>>> {
        self.cache.lock().map_err(|_| Error::LockPoisoned {
            context: "memory cache".to_string(),
        })
    }
}

impl TreeCache for MemoryCache {
    fn get(&self, commit: &str) -> Result<Option<MemoryFS>> {
        Ok(self.lock()?.get(commit).cloned())
    }

    fn put(&self, commit: &str, tree: &MemoryFS) -> Result<()> {
        self.lock()?
            .entry(commit.to_string())
            .or_insert_with(|| tree.clone());
        Ok(())
    }
}

/// A cache as seen by one run: lookups miss when `bypass` is set, stores
/// always go through.
pub struct CacheView<'a> {
    cache: &'a dyn TreeCache,
    bypass: bool,
}

impl<'a> CacheView<'a> {
    pub fn new(cache: &'a dyn TreeCache, bypass: bool) -> Self {
        Self { cache, bypass }
    }

    pub fn get(&self, commit: &str) -> Result<Option<MemoryFS>> {
        if self.bypass {
            return Ok(None);
        }
        self.cache.get(commit)
    }

    pub fn put(&self, commit: &str, tree: &MemoryFS) -> Result<()> {
        self.cache.put(commit, tree)
    }
}
