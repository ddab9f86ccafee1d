//! # Lock Store
//!
//! The lock pins every successfully synced vendor to a full commit hash and
//! records a checksum per mapping destination. It is keyed by vendor name and
//! lives in `.git-vendor/vendor.lock`.
//!
//! Every write is a read-merge-replace cycle: the current file is re-read,
//! the changed entries are merged in, and the whole document replaces the old
//! one through a temp-file rename. A crash mid-write therefore leaves either
//! the previous lock or the new one, never a mixture.

use crate::checksum;
use crate::config::VendorDefinition;
use crate::error::{Error, Result};
use crate::filesystem;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

/// Resolved pin for one vendor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockEntry {
    /// Full commit hash the vendor is pinned to.
    pub commit: String,
    /// Checksum of each mapping destination, keyed by destination path.
    #[serde(default)]
    pub checksums: BTreeMap<String, String>,
    /// Source path each destination was vendored from, keyed by destination.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub sources: BTreeMap<String, String>,
    /// Destinations removed by `--prune` because their source disappeared.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub pruned: BTreeSet<String>,
    /// When this entry was written.
    pub locked_at: DateTime<Utc>,
}

impl LockEntry {
    pub fn new(commit: &str) -> Self {
        Self {
            commit: commit.to_string(),
            checksums: BTreeMap::new(),
            sources: BTreeMap::new(),
            pruned: BTreeSet::new(),
            locked_at: Utc::now(),
        }
    }

    /// Destinations of `vendor` under `root` whose disk contents no longer
    /// match this entry.
    ///
    /// A checksummed destination drifts when it is missing or its digest
    /// differs. A pruned destination drifts when it exists again. A mapping
    /// this entry knows nothing about always drifts, and so does one whose
    /// recorded source is not the configured one.
    pub fn drifted(&self, root: &Path, vendor: &VendorDefinition) -> Result<Vec<String>> {
        let mut drifted = Vec::new();
        for mapping in &vendor.mappings {
            let dest = root.join(&mapping.to);
            let moved = self
                .sources
                .get(&mapping.to)
                .is_some_and(|from| from != &mapping.from);
            let clean = if moved {
                false
            } else if self.pruned.contains(&mapping.to) {
                std::fs::symlink_metadata(&dest).is_err()
            } else {
                match self.checksums.get(&mapping.to) {
                    Some(expected) => {
                        checksum::path_checksum(&dest)?.as_deref() == Some(expected.as_str())
                    }
                    None => false,
                }
            };
            if !clean {
                drifted.push(mapping.to.clone());
            }
        }
        Ok(drifted)
    }
}

/// All lock entries, keyed by vendor name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lockfile {
    #[serde(default)]
    pub vendors: BTreeMap<String, LockEntry>,
}

impl Lockfile {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&LockEntry> {
        self.vendors.get(name)
    }
}

/// Reads and atomically replaces the lock file.
#[derive(Debug, Clone)]
pub struct LockStore {
    path: PathBuf,
}

impl LockStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the lock. A missing file is an empty lock; an unreadable one is
    /// [`Error::LockCorrupt`].
    pub fn load(&self) -> Result<Lockfile> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Lockfile::new()),
            Err(e) => {
                return Err(Error::LockCorrupt {
                    path: self.path.display().to_string(),
                    message: e.to_string(),
                })
            }
        };
        if content.trim().is_empty() {
            return Ok(Lockfile::new());
        }
        serde_yaml::from_str(&content).map_err(|e| Error::LockCorrupt {
            path: self.path.display().to_string(),
            message: e.to_string(),
        })
    }

    /// Merge `entries` into the current lock and replace the file.
    pub fn update(&self, entries: BTreeMap<String, LockEntry>) -> Result<Lockfile> {
        self.modify(|lock| {
            lock.vendors.extend(entries);
            Ok(())
        })
    }

    /// Move the entry for `old` to `new`. A vendor that was never synced has
    /// no entry, which is not an error.
    pub fn rename_entry(&self, old: &str, new: &str) -> Result<()> {
        self.modify(|lock| {
            if let Some(entry) = lock.vendors.remove(old) {
                lock.vendors.insert(new.to_string(), entry);
            }
            Ok(())
        })
        .map(|_| ())
    }

    /// Drop the entry for `name`, returning it if present.
    pub fn remove_entry(&self, name: &str) -> Result<Option<LockEntry>> {
        let mut removed = None;
        self.modify(|lock| {
            removed = lock.vendors.remove(name);
            Ok(())
        })?;
        Ok(removed)
    }

    fn modify<F>(&self, change: F) -> Result<Lockfile>
    where
        F: FnOnce(&mut Lockfile) -> Result<()>,
    {
        let mut lock = self.load()?;
        change(&mut lock)?;
        self.write(&lock)?;
        Ok(lock)
    }

    fn write(&self, lock: &Lockfile) -> Result<()> {
        let yaml = serde_yaml::to_string(lock)?;
        filesystem::write_atomic(&self.path, yaml.as_bytes())
    }
}
