//! Plumbing around the system `git` binary
//!
//! Using the system git command means authentication just works:
//! - SSH keys from ~/.ssh/
//! - Git credential helpers
//! - Personal access tokens
//! - Any authentication configured in ~/.gitconfig
//!
//! Failures are classified from git's stderr into the crate's error taxonomy
//! so the scheduler can tell a retryable network hiccup from a missing ref.

use std::path::Path;
use std::process::{Command, Output};
use std::sync::LazyLock;

use log::debug;
use regex::Regex;

use crate::error::{Error, Result};
use crate::filesystem::{self, MemoryFS};

static FULL_COMMIT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9a-f]{40}$").expect("valid regex"));

static ABBREVIATED_COMMIT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9a-f]{4,39}$").expect("valid regex"));

/// Whether `s` is a full, lowercase, 40-character commit hash.
pub fn is_full_commit(s: &str) -> bool {
    FULL_COMMIT.is_match(s)
}

/// Whether `s` could be an abbreviated commit hash.
pub fn is_abbreviated_commit(s: &str) -> bool {
    ABBREVIATED_COMMIT.is_match(s)
}

fn run_git(args: &[&str], cwd: Option<&Path>, url: &str) -> Result<Output> {
    debug!("git {}", args.join(" "));
    let mut command = Command::new("git");
    command.args(args).env("GIT_TERMINAL_PROMPT", "0");
    if let Some(dir) = cwd {
        command.current_dir(dir);
    }
    command.output().map_err(|e| Error::GitCommand {
        command: args.join(" "),
        url: url.to_string(),
        stderr: e.to_string(),
    })
}

fn run_git_checked(args: &[&str], cwd: Option<&Path>, url: &str, r#ref: &str) -> Result<Output> {
    let output = run_git(args, cwd, url)?;
    if output.status.success() {
        Ok(output)
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr);
        Err(classify_failure(&args.join(" "), url, r#ref, &stderr))
    }
}

/// Map git's stderr onto the error taxonomy.
pub fn classify_failure(command: &str, url: &str, r#ref: &str, stderr: &str) -> Error {
    let lower = stderr.to_lowercase();

    if lower.contains("authentication failed")
        || lower.contains("permission denied")
        || lower.contains("could not read username")
        || lower.contains("terminal prompts disabled")
        || lower.contains("access denied")
    {
        return Error::AuthRequired {
            url: url.to_string(),
            message: stderr.trim().to_string(),
        };
    }

    if lower.contains("couldn't find remote ref")
        || lower.contains("not our ref")
        || lower.contains("unadvertised object")
        || lower.contains("bad object")
        || lower.contains("unknown revision")
    {
        return Error::RefNotFound {
            url: url.to_string(),
            r#ref: r#ref.to_string(),
        };
    }

    if lower.contains("could not resolve host")
        || lower.contains("connection timed out")
        || lower.contains("connection refused")
        || lower.contains("connection reset")
        || lower.contains("operation timed out")
        || lower.contains("network is unreachable")
        || lower.contains("early eof")
        || lower.contains("the remote end hung up unexpectedly")
        || lower.contains("rpc failed")
    {
        return Error::Network {
            url: url.to_string(),
            message: stderr.trim().to_string(),
        };
    }

    Error::GitCommand {
        command: command.to_string(),
        url: url.to_string(),
        stderr: stderr.trim().to_string(),
    }
}

/// Pick the commit for `r#ref` out of `git ls-remote` output.
///
/// Peeled annotated tags win over the tag object, then tags over branches,
/// then any exact refname match such as `HEAD` or `refs/pull/1/head`.
pub fn parse_ls_remote(output: &str, r#ref: &str) -> Option<String> {
    let refs: Vec<(&str, &str)> = output
        .lines()
        .filter_map(|line| line.split_once('\t'))
        .map(|(hash, name)| (hash.trim(), name.trim()))
        .collect();

    let candidates = [
        format!("refs/tags/{}^{{}}", r#ref),
        format!("refs/tags/{}", r#ref),
        format!("refs/heads/{}", r#ref),
        r#ref.to_string(),
    ];

    candidates.iter().find_map(|wanted| {
        refs.iter()
            .find(|(_, name)| name == wanted)
            .map(|(hash, _)| hash.to_string())
    })
}

/// The single advertised commit starting with `prefix`, if exactly one does.
pub fn match_advertised_prefix(ls_remote_output: &str, prefix: &str) -> Option<String> {
    let mut matches: Vec<&str> = ls_remote_output
        .lines()
        .filter_map(|line| line.split_once('\t'))
        .map(|(hash, _)| hash.trim())
        .filter(|hash| hash.starts_with(prefix))
        .collect();
    matches.sort_unstable();
    matches.dedup();
    match matches.as_slice() {
        [only] => Some(only.to_string()),
        _ => None,
    }
}

/// Ask the remote which commit `r#ref` currently points at.
///
/// A full commit hash is returned as-is; it names itself. Named refs are
/// tried before treating `r#ref` as an abbreviated hash, which is matched
/// against the advertised tips first and otherwise resolved in a blob-less
/// fetch of the remote's branches and tags.
pub fn ls_remote(url: &str, r#ref: &str) -> Result<String> {
    if is_full_commit(r#ref) {
        return Ok(r#ref.to_string());
    }
    let output = run_git_checked(&["ls-remote", url], None, url, r#ref)?;
    let stdout = String::from_utf8_lossy(&output.stdout);
    if let Some(commit) = parse_ls_remote(&stdout, r#ref) {
        return Ok(commit);
    }
    if is_abbreviated_commit(r#ref) {
        if let Some(commit) = match_advertised_prefix(&stdout, r#ref) {
            return Ok(commit);
        }
        return resolve_abbreviated(url, r#ref);
    }
    Err(Error::RefNotFound {
        url: url.to_string(),
        r#ref: r#ref.to_string(),
    })
}

fn resolve_abbreviated(url: &str, short: &str) -> Result<String> {
    debug!("resolving abbreviated commit {} of {}", short, url);
    let scratch = init_scratch(url)?;
    run_git_checked(
        &[
            "fetch",
            "--quiet",
            "--filter=blob:none",
            url,
            "+refs/heads/*:refs/remotes/origin/*",
            "+refs/tags/*:refs/tags/*",
        ],
        Some(scratch.path()),
        url,
        short,
    )?;

    let spec = format!("{}^{{commit}}", short);
    let output = run_git(
        &["rev-parse", "--verify", "--quiet", &spec],
        Some(scratch.path()),
        url,
    )?;
    let commit = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if output.status.success() && is_full_commit(&commit) {
        Ok(commit)
    } else {
        Err(Error::RefNotFound {
            url: url.to_string(),
            r#ref: short.to_string(),
        })
    }
}

fn init_scratch(url: &str) -> Result<tempfile::TempDir> {
    let dir = tempfile::Builder::new().prefix("git-vendor-fetch").tempdir()?;
    run_git_checked(&["init", "--quiet"], Some(dir.path()), url, "")?;
    Ok(dir)
}

fn fetch_commit(dir: &Path, url: &str, commit: &str) -> Result<()> {
    run_git_checked(
        &["fetch", "--quiet", "--depth=1", url, commit],
        Some(dir),
        url,
        commit,
    )?;
    Ok(())
}

/// Fetch the tree of `commit` from `url` into memory.
pub fn fetch_tree(url: &str, commit: &str) -> Result<MemoryFS> {
    let scratch = init_scratch(url)?;
    fetch_commit(scratch.path(), url, commit)?;
    run_git_checked(
        &["-c", "advice.detachedHead=false", "checkout", "--quiet", "FETCH_HEAD"],
        Some(scratch.path()),
        url,
        commit,
    )?;
    filesystem::load_dir(scratch.path())
}

/// Textual diff of `path` between two commits of `url`.
pub fn diff(url: &str, commit_a: &str, commit_b: &str, path: &str) -> Result<String> {
    let scratch = init_scratch(url)?;
    fetch_commit(scratch.path(), url, commit_a)?;
    fetch_commit(scratch.path(), url, commit_b)?;

    let pathspec = if path.is_empty() { "." } else { path };
    let output = run_git_checked(
        &["diff", "--no-color", commit_a, commit_b, "--", pathspec],
        Some(scratch.path()),
        url,
        commit_b,
    )?;
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Stage `paths` in the repository at `root` and commit them.
pub fn commit_paths(root: &Path, paths: &[String], message: &str) -> Result<()> {
    let location = root.display().to_string();
    let mut add = vec!["add", "--all", "--"];
    add.extend(paths.iter().map(String::as_str));
    run_git_checked(&add, Some(root), &location, "")?;

    let staged = run_git(&["diff", "--cached", "--quiet"], Some(root), &location)?;
    if staged.status.success() {
        debug!("nothing to commit");
        return Ok(());
    }

    run_git_checked(&["commit", "--quiet", "-m", message], Some(root), &location, "")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const LS_REMOTE: &str = "\
1111111111111111111111111111111111111111\tHEAD
2222222222222222222222222222222222222222\trefs/heads/main
3333333333333333333333333333333333333333\trefs/tags/v1.0.0
4444444444444444444444444444444444444444\trefs/tags/v1.0.0^{}
5555555555555555555555555555555555555555\trefs/tags/v0.9.0
";

    #[test]
    fn test_parse_ls_remote_prefers_peeled_tag() {
        assert_eq!(
            parse_ls_remote(LS_REMOTE, "v1.0.0").as_deref(),
            Some("4444444444444444444444444444444444444444")
        );
    }

    #[test]
    fn test_parse_ls_remote_lightweight_tag_and_branch() {
        assert_eq!(
            parse_ls_remote(LS_REMOTE, "v0.9.0").as_deref(),
            Some("5555555555555555555555555555555555555555")
        );
        assert_eq!(
            parse_ls_remote(LS_REMOTE, "main").as_deref(),
            Some("2222222222222222222222222222222222222222")
        );
        assert_eq!(
            parse_ls_remote(LS_REMOTE, "HEAD").as_deref(),
            Some("1111111111111111111111111111111111111111")
        );
    }

    #[test]
    fn test_parse_ls_remote_missing() {
        assert_eq!(parse_ls_remote(LS_REMOTE, "v2.0.0"), None);
        assert_eq!(parse_ls_remote("", "main"), None);
    }

    #[test]
    fn test_is_full_commit() {
        assert!(is_full_commit("2222222222222222222222222222222222222222"));
        assert!(!is_full_commit("abc123"));
        assert!(!is_full_commit("main"));
    }

    #[test]
    fn test_abbreviated_commit_prefix() {
        assert!(is_abbreviated_commit("aaaa111"));
        assert!(!is_abbreviated_commit("abc"));
        assert!(!is_abbreviated_commit("v1.0.0"));
        assert!(!is_abbreviated_commit("2222222222222222222222222222222222222222"));

        assert_eq!(
            match_advertised_prefix(LS_REMOTE, "4444444").as_deref(),
            Some("4444444444444444444444444444444444444444")
        );
        assert_eq!(match_advertised_prefix(LS_REMOTE, "9999999"), None);

        let ambiguous = "abcd111111111111111111111111111111111111\trefs/heads/a
abcd222222222222222222222222222222222222\trefs/heads/b
";
        assert_eq!(match_advertised_prefix(ambiguous, "abcd"), None);
        assert_eq!(
            match_advertised_prefix(ambiguous, "abcd2").as_deref(),
            Some("abcd222222222222222222222222222222222222")
        );
    }

    #[test]
    fn test_classify_failure() {
        let url = "https://example.com/repo.git";
        assert!(matches!(
            classify_failure("fetch", url, "v1", "fatal: Authentication failed for 'x'"),
            Error::AuthRequired { .. }
        ));
        assert!(matches!(
            classify_failure("fetch", url, "v1", "fatal: couldn't find remote ref v1"),
            Error::RefNotFound { .. }
        ));
        assert!(matches!(
            classify_failure("fetch", url, "v1", "fatal: unable to access: Could not resolve host: example.com"),
            Error::Network { .. }
        ));
        assert!(matches!(
            classify_failure("fetch", url, "v1", "fatal: something odd"),
            Error::GitCommand { .. }
        ));
    }

    #[test]
    fn test_ls_remote_full_commit_needs_no_network() {
        let commit = "2222222222222222222222222222222222222222";
        assert_eq!(ls_remote("https://invalid.invalid/x.git", commit).unwrap(), commit);
    }
}
