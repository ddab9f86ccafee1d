//! SHA-256 checksums of mapping contents
//!
//! A mapping's checksum covers every file below its destination: the sorted
//! relative paths, their sizes and their contents. The same digest is
//! produced from the in-memory subtree at sync time and from the files on
//! disk at status time, which is what makes drift detection a string
//! comparison. Checksums use the canonical form `sha256:<hex>`.

use crate::error::Result;
use crate::filesystem::{self, MemoryFS};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::Path;

/// Prefix for all checksums produced by this module
const PREFIX: &str = "sha256:";

/// Compute the checksum of an in-memory mapping subtree.
pub fn tree_checksum(tree: &MemoryFS) -> String {
    let mut hasher = Sha256::new();
    for (relative_path, file) in tree.files() {
        hasher.update(relative_path.as_bytes());
        hasher.update([0u8]);
        hasher.update((file.content.len() as u64).to_le_bytes());
        hasher.update(&file.content);
    }
    format!("{}{}", PREFIX, hex::encode(hasher.finalize()))
}

/// Compute the checksum of whatever currently sits at `path` on disk.
///
/// Returns `None` when nothing exists there. A regular file hashes like a
/// single-file subtree; a directory hashes all files beneath it.
pub fn path_checksum(path: &Path) -> Result<Option<String>> {
    let metadata = match fs::metadata(path) {
        Ok(m) => m,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    let tree = if metadata.is_dir() {
        filesystem::load_dir(path)?
    } else {
        let mut single = MemoryFS::new();
        single.add_file("", filesystem::File::new(fs::read(path)?))?;
        single
    };
    Ok(Some(tree_checksum(&tree)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn checksum_has_prefix_and_is_deterministic() {
        let mut tree = MemoryFS::new();
        tree.add_file_string("a.txt", "hello").unwrap();
        let a = tree_checksum(&tree);
        let b = tree_checksum(&tree.clone());
        assert!(a.starts_with("sha256:"));
        assert_eq!(a, b);
    }

    #[test]
    fn renaming_a_file_changes_checksum() {
        let mut one = MemoryFS::new();
        one.add_file_string("a.txt", "hello").unwrap();
        let mut two = MemoryFS::new();
        two.add_file_string("b.txt", "hello").unwrap();
        assert_ne!(tree_checksum(&one), tree_checksum(&two));
    }

    #[test]
    fn disk_checksum_matches_memory_checksum() {
        let temp = TempDir::new().unwrap();
        let dest = temp.path().join("vendor/lib");
        let mut tree = MemoryFS::new();
        tree.add_file_string("index.js", "module.exports = 1").unwrap();
        tree.add_file_string("lib/pad.js", "pad").unwrap();
        filesystem::write_tree(&tree, &dest).unwrap();

        assert_eq!(path_checksum(&dest).unwrap(), Some(tree_checksum(&tree)));
    }

    #[test]
    fn single_file_checksum_matches_selected_file() {
        let temp = TempDir::new().unwrap();
        let dest = temp.path().join("pad.js");
        fs::write(&dest, "pad").unwrap();

        let mut tree = MemoryFS::new();
        tree.add_file_string("src/pad.js", "pad").unwrap();
        let selected = tree.select("src/pad.js").unwrap();

        assert_eq!(path_checksum(&dest).unwrap(), Some(tree_checksum(&selected)));
    }

    #[test]
    fn missing_path_has_no_checksum() {
        let temp = TempDir::new().unwrap();
        assert_eq!(path_checksum(&temp.path().join("missing")).unwrap(), None);
    }
}
