//! End-to-end tests for the `cache` command.

mod common;
use common::prelude::*;

const A: &str = "aaaa111000000000000000000000000000000000";
const B: &str = "bbbb222000000000000000000000000000000000";

fn with_cached_commits() -> TestFixture {
    TestFixture::new()
        .with_config(configs::LEFT_PAD)
        .with_file(&format!(".cache/{}/src/index.js", A), "pad a\n")
        .with_file(&format!(".cache/{}/src/index.js", B), "pad b\n")
        .with_file(".cache/not-a-commit/junk.txt", "ignored\n")
}

#[test]
fn test_cache_list_empty() {
    let fixture = TestFixture::new();

    fixture
        .command()
        .args(["cache", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No cached commits found"));

    fixture
        .command()
        .args(["cache", "list", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("[]"));
}

#[test]
fn test_cache_list_entries() {
    let fixture = with_cached_commits();

    fixture
        .command()
        .args(["cache", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains(A))
        .stdout(predicate::str::contains(B))
        .stdout(predicate::str::contains("not-a-commit").not())
        .stdout(predicate::str::contains("Total: 2 cached commits"));

    let output = fixture
        .command()
        .args(["cache", "list", "--json"])
        .output()
        .unwrap();
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json.as_array().unwrap().len(), 2);
    assert_eq!(json[0]["file_count"], 1);
}

#[test]
fn test_cache_clean_requires_selection() {
    let fixture = with_cached_commits();

    fixture
        .command()
        .args(["cache", "clean", "--yes"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("hint: Use --all"));
}

#[test]
fn test_cache_clean_dry_run_keeps_entries() {
    let fixture = with_cached_commits();

    fixture
        .command()
        .args(["cache", "clean", "--all", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Dry run"));

    fixture.child(&format!(".cache/{}", A)).assert(predicate::path::exists());
}

#[test]
fn test_cache_clean_by_commit() {
    let fixture = with_cached_commits();

    fixture
        .command()
        .args(["cache", "clean", "bbbb222", "--yes"])
        .assert()
        .success();

    fixture.child(&format!(".cache/{}", A)).assert(predicate::path::exists());
    fixture.child(&format!(".cache/{}", B)).assert(predicate::path::missing());
}

#[test]
fn test_cache_clean_unused_keeps_locked_commit() {
    let fixture = with_cached_commits()
        .with_file("vendor/left-pad/index.js", "pad a\n")
        .with_lock("left-pad", A, &["vendor/left-pad"]);

    fixture
        .command()
        .args(["cache", "clean", "--unused", "--yes"])
        .assert()
        .success();

    fixture.child(&format!(".cache/{}", A)).assert(predicate::path::exists());
    fixture.child(&format!(".cache/{}", B)).assert(predicate::path::missing());
}

#[test]
fn test_cache_root_flag() {
    let fixture = with_cached_commits();

    fixture
        .command()
        .args(["cache", "--cache-root"])
        .arg(fixture.path().join("elsewhere"))
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("No cached commits found"));
}
