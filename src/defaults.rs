//! Default values for git-vendor.
//!
//! This module provides centralized default values used across commands,
//! ensuring consistency and avoiding duplication.

use std::path::PathBuf;

/// Worker count used by `pull --parallel` when `--workers` is not given.
pub const PARALLEL_WORKERS: usize = 4;

/// Returns the default cache root directory.
///
/// Uses the platform-appropriate cache directory:
/// - Linux: `~/.cache/git-vendor` (XDG Base Directory)
/// - macOS: `~/Library/Caches/git-vendor`
/// - Windows: `{FOLDERID_LocalAppData}\git-vendor`
///
/// Falls back to `.git-vendor-cache` in the current directory if the
/// platform cache directory cannot be determined.
///
/// This can be overridden by the `--cache-root` CLI flag or the
/// `GIT_VENDOR_CACHE` environment variable.
pub fn default_cache_root() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from(".git-vendor-cache"))
        .join("git-vendor")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_cache_root_returns_path() {
        let cache_root = default_cache_root();
        assert!(cache_root.ends_with("git-vendor"));
    }

    #[test]
    fn test_default_cache_root_is_absolute_or_fallback() {
        let cache_root = default_cache_root();
        // Either absolute (normal case) or relative fallback
        assert!(
            cache_root.is_absolute() || cache_root.starts_with(".git-vendor-cache"),
            "Expected absolute path or fallback, got: {:?}",
            cache_root
        );
    }
}
