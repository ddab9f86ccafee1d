//! Project layout and edits that span both stores
//!
//! A project keeps its state under `<root>/.git-vendor/`: the vendor
//! definitions in `vendor.yml` and the pins in `vendor.lock`. Lock entries
//! refer to vendors by name, so renaming or removing a vendor has to touch
//! both files. The lock is changed first and restored if the config cannot
//! be saved afterwards.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use log::{debug, warn};

use crate::config::{ConfigStore, VendorDefinition};
use crate::error::Result;
use crate::filesystem;
use crate::lock::LockStore;

/// Directory holding the config and lock files.
pub const STATE_DIR: &str = ".git-vendor";
pub const CONFIG_FILE: &str = "vendor.yml";
pub const LOCK_FILE: &str = "vendor.lock";

/// A project rooted at a directory.
#[derive(Debug, Clone)]
pub struct Project {
    root: PathBuf,
}

impl Project {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn state_dir(&self) -> PathBuf {
        self.root.join(STATE_DIR)
    }

    pub fn config_store(&self) -> ConfigStore {
        ConfigStore::new(self.state_dir().join(CONFIG_FILE))
    }

    pub fn lock_store(&self) -> LockStore {
        LockStore::new(self.state_dir().join(LOCK_FILE))
    }

    /// Rename a vendor in the config and move its lock entry along.
    pub fn rename_vendor(&self, old: &str, new: &str) -> Result<()> {
        let configs = self.config_store();
        let locks = self.lock_store();

        let mut config = configs.load()?;
        config.rename_vendor(old, new)?;

        locks.rename_entry(old, new)?;
        if let Err(e) = configs.save(&config) {
            if let Err(revert) = locks.rename_entry(new, old) {
                warn!("failed to restore lock entry '{}': {}", old, revert);
            }
            return Err(e);
        }
        debug!("renamed vendor {} -> {}", old, new);
        Ok(())
    }

    /// Remove a vendor and its lock entry, optionally deleting its
    /// destinations.
    pub fn remove_vendor(&self, name: &str, purge: bool) -> Result<VendorDefinition> {
        let configs = self.config_store();
        let locks = self.lock_store();

        let mut config = configs.load()?;
        let removed = config.remove_vendor(name)?;

        let entry = locks.remove_entry(name)?;
        if let Err(e) = configs.save(&config) {
            if let Some(entry) = entry {
                if let Err(revert) = locks.update(BTreeMap::from([(name.to_string(), entry)])) {
                    warn!("failed to restore lock entry '{}': {}", name, revert);
                }
            }
            return Err(e);
        }

        if purge {
            for mapping in &removed.mappings {
                debug!("purging {}", mapping.to);
                filesystem::remove_path(&self.root.join(&mapping.to))?;
            }
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{PathMapping, VendorConfig};
    use crate::lock::LockEntry;
    use tempfile::TempDir;

    fn project_with_vendor() -> (TempDir, Project) {
        let temp = TempDir::new().unwrap();
        let project = Project::new(temp.path());

        let mut config = VendorConfig::new();
        config
            .add_vendor(VendorDefinition::new(
                "left-pad",
                "https://github.com/left-pad/left-pad.git",
                "v1.0.0",
                vec![PathMapping::new("src", "vendor/left-pad").unwrap()],
            ))
            .unwrap();
        project.config_store().save(&config).unwrap();
        project
            .lock_store()
            .update(BTreeMap::from([(
                "left-pad".to_string(),
                LockEntry::new("aaaa111000000000000000000000000000000000"),
            )]))
            .unwrap();

        std::fs::create_dir_all(temp.path().join("vendor/left-pad")).unwrap();
        std::fs::write(temp.path().join("vendor/left-pad/index.js"), "pad").unwrap();
        (temp, project)
    }

    #[test]
    fn test_layout() {
        let project = Project::new("/work");
        assert_eq!(
            project.config_store().path(),
            Path::new("/work/.git-vendor/vendor.yml")
        );
        assert_eq!(
            project.lock_store().path(),
            Path::new("/work/.git-vendor/vendor.lock")
        );
    }

    #[test]
    fn test_rename_moves_lock_entry() {
        let (_temp, project) = project_with_vendor();
        project.rename_vendor("left-pad", "pad").unwrap();

        let config = project.config_store().load().unwrap();
        assert!(config.get("pad").is_some());
        assert!(config.get("left-pad").is_none());
        let lock = project.lock_store().load().unwrap();
        assert!(lock.get("pad").is_some());
        assert!(lock.get("left-pad").is_none());
    }

    #[test]
    fn test_rename_unknown_vendor_touches_nothing() {
        let (_temp, project) = project_with_vendor();
        let before = std::fs::read(project.lock_store().path()).unwrap();
        assert!(project.rename_vendor("nope", "other").is_err());
        assert_eq!(std::fs::read(project.lock_store().path()).unwrap(), before);
    }

    #[test]
    fn test_remove_keeps_files_unless_purged() {
        let (temp, project) = project_with_vendor();
        project.remove_vendor("left-pad", false).unwrap();
        assert!(temp.path().join("vendor/left-pad/index.js").exists());
        assert!(project.lock_store().load().unwrap().vendors.is_empty());
        assert!(project.config_store().load().unwrap().vendors.is_empty());
    }

    #[test]
    fn test_remove_with_purge() {
        let (temp, project) = project_with_vendor();
        let removed = project.remove_vendor("left-pad", true).unwrap();
        assert_eq!(removed.name, "left-pad");
        assert!(!temp.path().join("vendor/left-pad").exists());
    }
}
