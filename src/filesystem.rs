//! In-memory file trees and atomic writes to disk
//!
//! A fetched upstream commit is held as a [`MemoryFS`]: a sorted map from
//! forward-slash relative paths to file contents. Mappings select subtrees of
//! it, checksums are computed over it, and the cache persists it.
//!
//! Everything that lands on disk goes through the atomic helpers at the
//! bottom of this module so an interrupted run never leaves a torn file.

use crate::error::{Error, Result};
use crate::path;
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Represents a file with content and metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct File {
    /// File content as bytes
    pub content: Vec<u8>,
    /// Unix permission bits
    pub permissions: u32,
}

impl File {
    /// Create a new file with content
    pub fn new(content: Vec<u8>) -> Self {
        Self {
            content,
            permissions: 0o644,
        }
    }

    /// Create a new file from string content
    pub fn from_string(content: &str) -> Self {
        Self::new(content.as_bytes().to_vec())
    }

    /// Get file size in bytes
    pub fn size(&self) -> usize {
        self.content.len()
    }
}

/// In-memory snapshot of a file tree
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryFS {
    files: BTreeMap<String, File>,
}

impl MemoryFS {
    /// Create a new empty filesystem
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or update a file. The path is normalized first.
    pub fn add_file(&mut self, path: &str, file: File) -> Result<()> {
        let path = path::normalize(path, true)?;
        self.files.insert(path, file);
        Ok(())
    }

    /// Add a file with string content
    pub fn add_file_string(&mut self, path: &str, content: &str) -> Result<()> {
        self.add_file(path, File::from_string(content))
    }

    /// Get a file by path
    pub fn get_file(&self, path: &str) -> Option<&File> {
        self.files.get(path)
    }

    /// Check if a file exists
    pub fn exists(&self, path: &str) -> bool {
        self.files.contains_key(path)
    }

    /// Get the number of files
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Check if filesystem is empty
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Iterate over all files in path order
    pub fn files(&self) -> impl Iterator<Item = (&String, &File)> {
        self.files.iter()
    }

    /// Whether `base` names a file or a directory containing files.
    pub fn contains_path(&self, base: &str) -> bool {
        self.files.keys().any(|p| path::is_within(p, base))
    }

    /// Extract the subtree at `base`, re-rooted so paths are relative to it.
    ///
    /// A `base` naming a single file yields a tree with one entry keyed by
    /// the empty string. Returns `None` if nothing exists at `base`.
    pub fn select(&self, base: &str) -> Option<MemoryFS> {
        if let Some(file) = self.files.get(base) {
            if !base.is_empty() {
                let mut single = MemoryFS::new();
                single.files.insert(String::new(), file.clone());
                return Some(single);
            }
        }

        let mut selected = MemoryFS::new();
        for (file_path, file) in &self.files {
            if let Some(rest) = path::strip_base(file_path, base) {
                if !rest.is_empty() {
                    selected.files.insert(rest.to_string(), file.clone());
                }
            }
        }

        if selected.is_empty() {
            None
        } else {
            Some(selected)
        }
    }

    /// Whether this tree represents a single file selected by [`select`].
    ///
    /// [`select`]: MemoryFS::select
    pub fn is_single_file(&self) -> bool {
        self.files.len() == 1 && self.files.contains_key("")
    }
}

/// Load a directory tree into a `MemoryFS`, skipping any `.git` directory.
pub fn load_dir(dir: &Path) -> Result<MemoryFS> {
    let mut tree = MemoryFS::new();

    let walker = WalkDir::new(dir)
        .follow_links(false)
        .into_iter()
        .filter_entry(|e| e.file_name() != ".git");

    for entry in walker {
        let entry = entry.map_err(|e| Error::Filesystem {
            message: format!("Failed to walk '{}': {}", dir.display(), e),
        })?;
        if !entry.file_type().is_file() {
            continue;
        }

        let relative = entry
            .path()
            .strip_prefix(dir)
            .map_err(|e| Error::Filesystem {
                message: format!("Unexpected path '{}': {}", entry.path().display(), e),
            })?;
        let relative = relative.to_string_lossy().replace('\\', "/");

        let content = fs::read(entry.path())?;
        let file = File {
            content,
            permissions: file_mode(&entry.metadata().map_err(|e| Error::Filesystem {
                message: format!("Failed to stat '{}': {}", entry.path().display(), e),
            })?),
        };
        tree.add_file(&relative, file)?;
    }

    Ok(tree)
}

#[cfg(unix)]
fn file_mode(metadata: &fs::Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    metadata.permissions().mode() & 0o777
}

#[cfg(not(unix))]
fn file_mode(_metadata: &fs::Metadata) -> u32 {
    0o644
}

/// Write a tree below `dir`, creating parent directories as needed.
pub fn write_tree(tree: &MemoryFS, dir: &Path) -> Result<()> {
    for (relative_path, file) in tree.files() {
        let full_path = dir.join(relative_path);
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).map_err(|e| Error::Filesystem {
                message: format!("Failed to create directory '{}': {}", parent.display(), e),
            })?;
        }
        fs::write(&full_path, &file.content).map_err(|e| Error::Filesystem {
            message: format!("Failed to write file '{}': {}", full_path.display(), e),
        })?;
        set_permissions(&full_path, file.permissions)?;
    }
    Ok(())
}

#[cfg(unix)]
fn set_permissions(path: &Path, mode: u32) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode)).map_err(|e| Error::Filesystem {
        message: format!("Failed to set permissions on '{}': {}", path.display(), e),
    })
}

#[cfg(not(unix))]
fn set_permissions(_path: &Path, _mode: u32) -> Result<()> {
    Ok(())
}

/// Atomically replace `path` with whatever `write` produces.
///
/// The content goes to a temporary file in the same directory which is only
/// renamed over `path` once `write` succeeds. On failure the previous file,
/// if any, is untouched and the temporary file is removed.
pub fn write_atomic_with<F>(path: &Path, write: F) -> Result<()>
where
    F: FnOnce(&mut fs::File) -> std::io::Result<()>,
{
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent)?;

    let mut temp = tempfile::NamedTempFile::new_in(parent)?;
    write(temp.as_file_mut())?;
    temp.as_file_mut().sync_all()?;
    temp.persist(path).map_err(|e| Error::Filesystem {
        message: format!("Failed to replace '{}': {}", path.display(), e.error),
    })?;
    Ok(())
}

/// Atomically replace `path` with `content`.
pub fn write_atomic(path: &Path, content: &[u8]) -> Result<()> {
    write_atomic_with(path, |f| f.write_all(content))
}

/// A replacement for one path, written beside it but not yet swapped in.
///
/// A single-file tree (see [`MemoryFS::is_single_file`]) becomes a file and
/// anything else a directory. Committing swaps it in with a rename, so
/// readers see either the old or the new contents.
///
/// Several replacements can be staged first and committed afterwards, so a
/// write error surfaces before any destination has changed.
#[derive(Debug)]
pub struct StagedReplacement {
    dest: PathBuf,
    /// Holds `new` (the staged contents) and, once committed, `previous`.
    /// `None` when removing a path that does not exist.
    scratch: Option<tempfile::TempDir>,
    has_content: bool,
}

/// A committed replacement. Dropping it discards the previous contents;
/// [`Replaced::rollback`] puts them back.
#[derive(Debug)]
pub struct Replaced {
    dest: PathBuf,
    scratch: Option<tempfile::TempDir>,
    has_content: bool,
    had_previous: bool,
}

/// Stage `tree` for `dest`. `None` stages the removal of `dest`.
pub fn stage_replacement(dest: &Path, tree: Option<&MemoryFS>) -> Result<StagedReplacement> {
    let exists = fs::symlink_metadata(dest).is_ok();
    if tree.is_none() && !exists {
        return Ok(StagedReplacement {
            dest: dest.to_path_buf(),
            scratch: None,
            has_content: false,
        });
    }

    let parent = match dest.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent).map_err(|e| Error::Filesystem {
        message: format!("Failed to create directory '{}': {}", parent.display(), e),
    })?;
    let scratch = tempfile::Builder::new()
        .prefix(".git-vendor-stage")
        .tempdir_in(parent)?;

    if let Some(tree) = tree {
        let staged = scratch.path().join("new");
        if tree.is_single_file() {
            let file = &tree.files[""];
            fs::write(&staged, &file.content)?;
            fs::File::open(&staged)?.sync_all()?;
            set_permissions(&staged, file.permissions)?;
        } else {
            fs::create_dir(&staged)?;
            write_tree(tree, &staged)?;
            set_permissions(&staged, 0o755)?;
        }
    }

    Ok(StagedReplacement {
        dest: dest.to_path_buf(),
        scratch: Some(scratch),
        has_content: tree.is_some(),
    })
}

impl StagedReplacement {
    pub fn dest(&self) -> &Path {
        &self.dest
    }

    /// Move the current contents aside and swap the staged ones in. On
    /// failure the previous contents are restored.
    pub fn commit(self) -> Result<Replaced> {
        let scratch = match self.scratch {
            Some(scratch) => scratch,
            None => {
                return Ok(Replaced {
                    dest: self.dest,
                    scratch: None,
                    has_content: false,
                    had_previous: false,
                })
            }
        };

        let previous = scratch.path().join("previous");
        let had_previous = fs::symlink_metadata(&self.dest).is_ok();
        if had_previous {
            fs::rename(&self.dest, &previous).map_err(|e| Error::Filesystem {
                message: format!("Failed to move aside '{}': {}", self.dest.display(), e),
            })?;
        }

        if self.has_content {
            if let Err(e) = fs::rename(scratch.path().join("new"), &self.dest) {
                if had_previous {
                    let _ = fs::rename(&previous, &self.dest);
                }
                return Err(Error::Filesystem {
                    message: format!("Failed to install '{}': {}", self.dest.display(), e),
                });
            }
        }

        Ok(Replaced {
            dest: self.dest,
            scratch: Some(scratch),
            has_content: self.has_content,
            had_previous,
        })
    }
}

impl Replaced {
    pub fn dest(&self) -> &Path {
        &self.dest
    }

    /// Put the previous contents of the destination back.
    pub fn rollback(self) -> Result<()> {
        let scratch = match self.scratch {
            Some(scratch) => scratch,
            None => return Ok(()),
        };
        if self.has_content {
            remove_path(&self.dest)?;
        }
        if self.had_previous {
            fs::rename(scratch.path().join("previous"), &self.dest).map_err(|e| {
                Error::Filesystem {
                    message: format!("Failed to restore '{}': {}", self.dest.display(), e),
                }
            })?;
        }
        Ok(())
    }
}

/// Remove a file or directory, treating a missing path as success.
pub fn remove_path(path: &Path) -> Result<()> {
    match fs::symlink_metadata(path) {
        Ok(meta) if meta.is_dir() => fs::remove_dir_all(path)?,
        Ok(_) => fs::remove_file(path)?,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample() -> MemoryFS {
        let mut tree = MemoryFS::new();
        tree.add_file_string("README.md", "# readme").unwrap();
        tree.add_file_string("src/index.js", "module.exports = 1").unwrap();
        tree.add_file_string("src/lib/pad.js", "pad").unwrap();
        tree
    }

    #[test]
    fn test_select_directory() {
        let selected = sample().select("src").unwrap();
        assert_eq!(selected.len(), 2);
        assert!(selected.exists("index.js"));
        assert!(selected.exists("lib/pad.js"));
    }

    #[test]
    fn test_select_single_file() {
        let selected = sample().select("src/index.js").unwrap();
        assert!(selected.is_single_file());
        assert_eq!(selected.get_file("").unwrap().content, b"module.exports = 1");
    }

    #[test]
    fn test_select_root_and_missing() {
        assert_eq!(sample().select("").unwrap().len(), 3);
        assert!(sample().select("docs").is_none());
        assert!(!sample().contains_path("sr"));
    }

    #[test]
    fn test_load_dir_skips_git_directory() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path();
        fs::create_dir_all(dir.join(".git")).unwrap();
        fs::create_dir_all(dir.join("src")).unwrap();
        fs::write(dir.join("README.md"), b"readme").unwrap();
        fs::write(dir.join("src/main.rs"), b"code").unwrap();
        fs::write(dir.join(".git/config"), b"git config").unwrap();

        let tree = load_dir(dir).unwrap();
        assert_eq!(tree.len(), 2);
        assert!(tree.exists("README.md"));
        assert!(tree.exists("src/main.rs"));
        assert!(!tree.exists(".git/config"));
    }

    #[test]
    fn test_write_atomic_failure_keeps_previous_content() {
        let temp_dir = TempDir::new().unwrap();
        let target = temp_dir.path().join("vendor.lock");
        fs::write(&target, "old complete content").unwrap();

        let result = write_atomic_with(&target, |f| {
            f.write_all(b"new half")?;
            Err(std::io::Error::new(std::io::ErrorKind::Other, "disk full"))
        });

        assert!(result.is_err());
        assert_eq!(fs::read_to_string(&target).unwrap(), "old complete content");
        let leftovers: Vec<_> = fs::read_dir(temp_dir.path()).unwrap().collect();
        assert_eq!(leftovers.len(), 1, "temporary file should be cleaned up");
    }

    #[test]
    fn test_replacement_swaps_directory() {
        let temp_dir = TempDir::new().unwrap();
        let dest = temp_dir.path().join("vendor/left-pad");
        fs::create_dir_all(&dest).unwrap();
        fs::write(dest.join("stale.js"), "stale").unwrap();

        stage_replacement(&dest, Some(&sample().select("src").unwrap()))
            .unwrap()
            .commit()
            .unwrap();

        assert!(!dest.join("stale.js").exists());
        assert_eq!(fs::read_to_string(dest.join("lib/pad.js")).unwrap(), "pad");
        let siblings: Vec<_> = fs::read_dir(temp_dir.path().join("vendor"))
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(siblings.len(), 1, "staging directories must not linger");
    }

    #[test]
    fn test_replacement_with_single_file() {
        let temp_dir = TempDir::new().unwrap();
        let dest = temp_dir.path().join("third_party/index.js");

        stage_replacement(&dest, Some(&sample().select("src/index.js").unwrap()))
            .unwrap()
            .commit()
            .unwrap();
        assert_eq!(fs::read_to_string(&dest).unwrap(), "module.exports = 1");
    }

    #[test]
    fn test_staged_replacement_leaves_destination_until_commit() {
        let temp_dir = TempDir::new().unwrap();
        let dest = temp_dir.path().join("vendor/lib");
        fs::create_dir_all(&dest).unwrap();
        fs::write(dest.join("old.js"), "old").unwrap();

        let staged = stage_replacement(&dest, Some(&sample().select("src").unwrap())).unwrap();
        assert!(dest.join("old.js").exists());
        assert!(!dest.join("index.js").exists());

        staged.commit().unwrap();
        assert!(!dest.join("old.js").exists());
        assert!(dest.join("index.js").exists());
    }

    #[test]
    fn test_rollback_restores_previous_contents() {
        let temp_dir = TempDir::new().unwrap();
        let dest = temp_dir.path().join("vendor/lib");
        fs::create_dir_all(&dest).unwrap();
        fs::write(dest.join("old.js"), "old").unwrap();
        let fresh = temp_dir.path().join("vendor/fresh.js");

        let replaced = stage_replacement(&dest, Some(&sample().select("src").unwrap()))
            .unwrap()
            .commit()
            .unwrap();
        let created = stage_replacement(&fresh, Some(&sample().select("README.md").unwrap()))
            .unwrap()
            .commit()
            .unwrap();
        assert!(fresh.exists());

        created.rollback().unwrap();
        replaced.rollback().unwrap();
        assert!(!fresh.exists());
        assert_eq!(fs::read_to_string(dest.join("old.js")).unwrap(), "old");
        assert!(!dest.join("index.js").exists());

        let entries: Vec<_> = fs::read_dir(temp_dir.path().join("vendor"))
            .unwrap()
            .collect();
        assert_eq!(entries.len(), 1, "scratch directories must be cleaned up");
    }

    #[test]
    fn test_staged_removal() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("vendor/none");
        stage_replacement(&missing, None).unwrap().commit().unwrap();
        assert!(!temp_dir.path().join("vendor").exists());

        let dest = temp_dir.path().join("old");
        fs::create_dir_all(&dest).unwrap();
        let removed = stage_replacement(&dest, None).unwrap().commit().unwrap();
        assert!(!dest.exists());
        removed.rollback().unwrap();
        assert!(dest.is_dir());
    }

    #[test]
    fn test_remove_path_missing_is_ok() {
        let temp_dir = TempDir::new().unwrap();
        remove_path(&temp_dir.path().join("nope")).unwrap();
    }
}
