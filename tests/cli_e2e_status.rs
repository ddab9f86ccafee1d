//! End-to-end tests for the `status` command in offline mode, plus the
//! deprecated `verify` alias.

mod common;
use common::prelude::*;

const COMMIT: &str = "aaaa111000000000000000000000000000000000";

fn locked_left_pad() -> TestFixture {
    TestFixture::new()
        .with_config(configs::LEFT_PAD)
        .with_file("vendor/left-pad/index.js", "module.exports = pad;\n")
        .with_lock("left-pad", COMMIT, &["vendor/left-pad"])
}

#[test]
fn test_status_offline_clean() {
    let fixture = locked_left_pad();

    fixture
        .command()
        .args(["status", "--offline"])
        .assert()
        .success()
        .stdout(predicate::str::contains("left-pad"))
        .stdout(predicate::str::contains("aaaa111"))
        .stdout(predicate::str::contains("pass"));
}

#[test]
fn test_status_offline_json() {
    let fixture = locked_left_pad();

    let output = fixture
        .command()
        .args(["status", "--offline", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let vendor = &json["vendors"][0];
    assert_eq!(vendor["vendor"], "left-pad");
    assert_eq!(vendor["local_drift"], false);
    assert!(vendor["remote_drift"].is_null());
    assert_eq!(vendor["verdict"], "pass");
}

#[test]
fn test_status_lenient_ignores_local_drift() {
    let fixture = locked_left_pad().with_file("vendor/left-pad/index.js", "edited\n");

    let output = fixture
        .command()
        .args(["status", "--offline", "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["vendors"][0]["local_drift"], true);
    assert_eq!(json["vendors"][0]["drifted"][0], "vendor/left-pad");
}

#[test]
fn test_status_strict_fails_on_local_drift() {
    let fixture = TestFixture::new()
        .with_config(&configs::LEFT_PAD.replace("ref: v1.0.0", "ref: v1.0.0\n    compliance: strict\n    license: MIT"))
        .with_file("vendor/left-pad/index.js", "module.exports = pad;\n")
        .with_lock("left-pad", COMMIT, &["vendor/left-pad"])
        .with_file("vendor/left-pad/extra.js", "new file\n");

    fixture
        .command()
        .args(["status", "--offline"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("drifted: vendor/left-pad"))
        .stderr(predicate::str::contains("1 vendor(s) failed status checks"));
}

#[test]
fn test_status_unlocked_vendor_fails() {
    let fixture = TestFixture::new().with_config(configs::LEFT_PAD);

    fixture
        .command()
        .args(["status", "--offline"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("fail"));
}

#[test]
fn test_status_quiet_prints_nothing() {
    let fixture = locked_left_pad();

    fixture
        .command()
        .args(["status", "--offline", "-q"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

#[test]
fn test_status_compliance_filter() {
    let fixture = TestFixture::new()
        .with_config(configs::TWO_VENDORS)
        .with_file("vendor/left-pad/index.js", "pad\n")
        .with_lock("left-pad", COMMIT, &["vendor/left-pad"]);

    let output = fixture
        .command()
        .args(["status", "--offline", "--compliance", "lenient", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let vendors = json["vendors"].as_array().unwrap();
    assert_eq!(vendors.len(), 1);
    assert_eq!(vendors[0]["vendor"], "left-pad");
}

#[test]
fn test_status_strict_only_reports_strict_vendors() {
    let fixture = TestFixture::new().with_config(configs::TWO_VENDORS);

    fixture
        .command()
        .args(["status", "--offline", "--strict-only"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("right-pad"))
        .stdout(predicate::str::contains("left-pad").not());
}

#[test]
fn test_status_without_config() {
    let fixture = TestFixture::new();

    fixture
        .command()
        .arg("status")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("git-vendor init"));
}

#[test]
fn test_verify_is_deprecated_offline_status() {
    let fixture = locked_left_pad();

    fixture
        .command()
        .arg("verify")
        .assert()
        .success()
        .stdout(predicate::str::contains("pass"))
        .stderr(predicate::str::contains("deprecated"));
}
