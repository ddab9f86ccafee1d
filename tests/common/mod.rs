//! Shared test utilities for E2E tests.
//!
//! This module provides common fixtures and helpers to reduce duplication
//! across test files.
//!
//! ## Usage
//!
//! Add `mod common;` to your test file, then use the helpers:
//!
//! ```rust,ignore
//! mod common;
//! use common::prelude::*;
//!
//! #[test]
//! fn test_example() {
//!     let fixture = TestFixture::new().with_config(configs::LEFT_PAD);
//!     fixture.command().arg("list").assert().success();
//! }
//! ```

use assert_fs::prelude::*;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Command;

use git_vendor::checksum;
use git_vendor::lock::{LockEntry, LockStore};

/// Re-export commonly used test dependencies for convenience.
pub mod prelude {
    #[allow(unused_imports)]
    pub use assert_cmd::cargo::cargo_bin_cmd;
    #[allow(unused_imports)]
    pub use assert_fs::prelude::*;
    #[allow(unused_imports)]
    pub use assert_fs::TempDir;
    pub use predicates::prelude::*;

    #[allow(unused_imports)]
    pub use super::configs;
    #[allow(unused_imports)]
    pub use super::SourceRepo;
    pub use super::TestFixture;
}

/// Common configuration YAML snippets for testing.
#[allow(dead_code)]
pub mod configs {
    /// One lenient vendor mapping `src` to `vendor/left-pad`.
    pub const LEFT_PAD: &str = r#"vendors:
  - name: left-pad
    url: https://github.com/left-pad/left-pad.git
    ref: v1.0.0
    mappings:
      - from: src
        to: vendor/left-pad
"#;

    /// Two vendors, one strict with a declared license.
    pub const TWO_VENDORS: &str = r#"vendors:
  - name: left-pad
    url: https://github.com/left-pad/left-pad.git
    ref: v1.0.0
    mappings:
      - from: src
        to: vendor/left-pad
  - name: right-pad
    url: https://github.com/right-pad/right-pad.git
    ref: main
    compliance: strict
    license: MIT
    group: js
    mappings:
      - from: lib
        to: vendor/right-pad
"#;

    /// Two vendors writing into overlapping destinations.
    pub const OVERLAPPING: &str = r#"vendors:
  - name: left-pad
    url: https://github.com/left-pad/left-pad.git
    ref: v1.0.0
    mappings:
      - from: src
        to: vendor/pad
  - name: right-pad
    url: https://github.com/right-pad/right-pad.git
    ref: main
    mappings:
      - from: lib
        to: vendor/pad/right
"#;

    /// Invalid YAML for error testing.
    pub const INVALID_YAML: &str = "vendors: [name: : oops";
}

/// A project directory with its own cache, isolated from the environment.
pub struct TestFixture {
    temp_dir: assert_fs::TempDir,
}

impl TestFixture {
    /// Create a new test fixture with an empty temporary directory.
    pub fn new() -> Self {
        Self {
            temp_dir: assert_fs::TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Write `.git-vendor/vendor.yml` with the given content.
    #[allow(dead_code)]
    pub fn with_config(self, content: &str) -> Self {
        self.temp_dir
            .child(".git-vendor/vendor.yml")
            .write_str(content)
            .expect("Failed to write config file");
        self
    }

    /// Add a file with the given path and content.
    #[allow(dead_code)]
    pub fn with_file(self, path: &str, content: &str) -> Self {
        self.temp_dir
            .child(path)
            .write_str(content)
            .expect("Failed to write file");
        self
    }

    /// Lock `vendor` to `commit`, checksumming the given destinations as
    /// they are on disk now.
    #[allow(dead_code)]
    pub fn with_lock(self, vendor: &str, commit: &str, destinations: &[&str]) -> Self {
        let mut entry = LockEntry::new(commit);
        for to in destinations {
            let sum = checksum::path_checksum(&self.path().join(to))
                .expect("Failed to checksum destination")
                .expect("Destination does not exist");
            entry.checksums.insert(to.to_string(), sum);
        }
        LockStore::new(self.lock_path())
            .update(BTreeMap::from([(vendor.to_string(), entry)]))
            .expect("Failed to write lock file");
        self
    }

    /// Get the path to the temporary directory.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    #[allow(dead_code)]
    pub fn config_path(&self) -> PathBuf {
        self.path().join(".git-vendor/vendor.yml")
    }

    #[allow(dead_code)]
    pub fn lock_path(&self) -> PathBuf {
        self.path().join(".git-vendor/vendor.lock")
    }

    #[allow(dead_code)]
    pub fn cache_path(&self) -> PathBuf {
        self.path().join(".cache")
    }

    /// Create a child path in the temp directory.
    #[allow(dead_code)]
    pub fn child(&self, path: &str) -> assert_fs::fixture::ChildPath {
        self.temp_dir.child(path)
    }

    /// Read the config file as a string.
    #[allow(dead_code)]
    pub fn config(&self) -> String {
        std::fs::read_to_string(self.config_path()).expect("Failed to read config file")
    }

    /// A command running in this fixture with its own cache and no colors.
    pub fn command(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("git-vendor");
        cmd.current_dir(self.path())
            .env_remove("GIT_VENDOR_ROOT")
            .env_remove("RUST_LOG")
            .env("GIT_VENDOR_CACHE", self.cache_path())
            .env("NO_COLOR", "1");
        cmd
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// A throwaway git repository used as a vendor source.
#[allow(dead_code)]
pub struct SourceRepo {
    temp_dir: assert_fs::TempDir,
}

#[allow(dead_code)]
impl SourceRepo {
    /// Initialize an empty repository on branch `main`.
    pub fn new() -> Self {
        let repo = Self {
            temp_dir: assert_fs::TempDir::new().expect("Failed to create temp directory"),
        };
        repo.git(&["init", "--quiet", "--initial-branch=main"]);
        repo.git(&["config", "user.name", "Test"]);
        repo.git(&["config", "user.email", "test@example.com"]);
        repo.git(&["config", "commit.gpgsign", "false"]);
        repo
    }

    /// Write a file and commit it, returning the new commit hash.
    pub fn commit_file(&self, path: &str, content: &str) -> String {
        self.temp_dir
            .child(path)
            .write_str(content)
            .expect("Failed to write file");
        self.git(&["add", "--all"]);
        self.git(&["commit", "--quiet", "-m", &format!("update {}", path)]);
        self.head()
    }

    /// Remove a path and commit, returning the new commit hash.
    pub fn remove(&self, path: &str) -> String {
        self.git(&["rm", "-r", "--quiet", path]);
        self.git(&["commit", "--quiet", "-m", &format!("remove {}", path)]);
        self.head()
    }

    pub fn head(&self) -> String {
        self.git(&["rev-parse", "HEAD"]).trim().to_string()
    }

    pub fn url(&self) -> String {
        self.temp_dir.path().display().to_string()
    }

    fn git(&self, args: &[&str]) -> String {
        let output = Command::new("git")
            .args(args)
            .current_dir(self.temp_dir.path())
            .output()
            .expect("Failed to run git");
        assert!(
            output.status.success(),
            "git {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
        String::from_utf8_lossy(&output.stdout).into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_with_config() {
        let fixture = TestFixture::new().with_config(configs::LEFT_PAD);
        assert!(fixture.config_path().exists());
    }

    #[test]
    fn test_configs_parse() {
        for config in [configs::LEFT_PAD, configs::TWO_VENDORS, configs::OVERLAPPING] {
            git_vendor::config::parse(config).expect("Config should parse");
        }
        assert!(git_vendor::config::parse(configs::INVALID_YAML).is_err());
    }
}
