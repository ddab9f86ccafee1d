//! Mapping path normalization and overlap detection
//!
//! Mapping paths are stored as forward-slash separated strings relative to
//! either the upstream repository root (`from`) or the project root (`to`).
//! Everything that reaches the config or lock goes through [`normalize`] first
//! so two spellings of the same destination always compare equal.

use crate::error::{Error, Result};

/// Normalize a relative mapping path.
///
/// Backslashes are treated as separators, `.` and empty segments are dropped
/// and trailing slashes removed. Absolute paths and `..` segments are rejected
/// with [`Error::InvalidPath`]. An empty result is only accepted when
/// `allow_root` is set (a `from` of `""` or `"."` selects the whole upstream
/// tree).
pub fn normalize(path: &str, allow_root: bool) -> Result<String> {
    let trimmed = path.trim();
    let unified = trimmed.replace('\\', "/");

    if unified.starts_with('/') || has_drive_prefix(&unified) {
        return Err(Error::InvalidPath {
            path: path.to_string(),
            message: "path must be relative".to_string(),
        });
    }

    let mut segments = Vec::new();
    for segment in unified.split('/') {
        match segment {
            "" | "." => continue,
            ".." => {
                return Err(Error::InvalidPath {
                    path: path.to_string(),
                    message: "path must not contain '..' segments".to_string(),
                })
            }
            other => segments.push(other),
        }
    }

    if segments.is_empty() && !allow_root {
        return Err(Error::InvalidPath {
            path: path.to_string(),
            message: "destination must not be the project root".to_string(),
        });
    }

    Ok(segments.join("/"))
}

/// Top-level directories a destination may never touch: the tool's own state
/// and the project's git metadata.
const RESERVED: [&str; 2] = [crate::project::STATE_DIR, ".git"];

/// Normalize a mapping destination and reject one that is, or lies inside,
/// a reserved directory.
pub fn destination(path: &str) -> Result<String> {
    let normalized = normalize(path, false)?;
    let first = normalized.split('/').next().unwrap_or_default();
    if let Some(reserved) = RESERVED.iter().find(|r| first.eq_ignore_ascii_case(r)) {
        return Err(Error::InvalidPath {
            path: path.to_string(),
            message: format!("destination must not be inside '{}'", reserved),
        });
    }
    Ok(normalized)
}

fn has_drive_prefix(path: &str) -> bool {
    let bytes = path.as_bytes();
    bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

/// Whether two normalized paths are equal or one contains the other.
///
/// Comparison is per segment, so `vendor/a` and `vendor/ab` do not overlap.
pub fn paths_overlap(a: &str, b: &str) -> bool {
    is_within(a, b) || is_within(b, a)
}

/// Whether normalized `path` is `base` or lies underneath it.
pub fn is_within(path: &str, base: &str) -> bool {
    if base.is_empty() {
        return true;
    }
    path == base
        || (path.len() > base.len()
            && path.starts_with(base)
            && path.as_bytes()[base.len()] == b'/')
}

/// Strip `base` from normalized `path`, returning the remainder without a
/// leading slash, or `None` if `path` is not within `base`.
pub fn strip_base<'a>(path: &'a str, base: &str) -> Option<&'a str> {
    if base.is_empty() {
        return Some(path);
    }
    if path == base {
        return Some("");
    }
    if is_within(path, base) {
        Some(&path[base.len() + 1..])
    } else {
        None
    }
}
