//! 命令行二进制的集成测试

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::tempdir;

fn ddmsync_cmd() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("ddmsync"));
    cmd.env_remove("API_BASE_URL")
        .env_remove("API_USER")
        .env_remove("API_KEY")
        .env_remove("RUST_LOG");
    cmd
}

fn ideclr_cmd() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("ideclr"))
}

#[test]
fn test_help_mentions_set_files() {
    ddmsync_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("set.$SET.txt"));
}

#[test]
fn test_dry_run_streams_report() {
    let dir = tempdir().unwrap();
    fs::create_dir_all(dir.path().join("a")).unwrap();
    fs::write(dir.path().join("a/x.json"), r#"{"Identifier":"id1"}"#).unwrap();
    fs::write(dir.path().join("set.default.txt"), "# managed\nid1\n").unwrap();

    ddmsync_cmd()
        .arg("--dry-run")
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("changed declaration id1"))
        .stdout(predicate::str::contains(
            "associated declaration id1 with set default",
        ))
        .stdout(predicate::str::contains("sent notify"));
}

#[test]
fn test_dry_run_empty_directory() {
    let dir = tempdir().unwrap();
    ddmsync_cmd()
        .arg("--dry-run")
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("no changed declarations or sets"));
}

#[test]
fn test_json_report() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.json"), r#"{"Identifier":"a"}"#).unwrap();
    fs::write(dir.path().join("broken.json"), "{").unwrap();

    let output = ddmsync_cmd()
        .args(["--dry-run", "--json", "--concurrency", "4"])
        .arg(dir.path())
        .output()
        .unwrap();
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["changedDeclarations"], serde_json::json!(["a"]));
    assert_eq!(report["failures"], 1);
    assert_eq!(report["notify"]["status"], "sent");
}

#[test]
fn test_missing_directory_fails() {
    let dir = tempdir().unwrap();
    ddmsync_cmd()
        .arg("--dry-run")
        .arg(dir.path().join("missing"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("ERROR"));
}

#[test]
fn test_invalid_base_url_fails() {
    let dir = tempdir().unwrap();
    ddmsync_cmd()
        .args(["--apibaseurl", "ftp://example.com/v1"])
        .arg(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("creating API client"));
}

#[test]
fn test_ideclr_properties() {
    ideclr_cmd()
        .args(["-i", "id1", "properties"])
        .assert()
        .success()
        .stdout(
            "{\n    \"Type\": \"com.apple.management.properties\",\n    \"Payload\": {},\n    \"Identifier\": \"id1\"\n}\n",
        );
}

#[test]
fn test_ideclr_org_info() {
    let output = ideclr_cmd()
        .args(["-t", "v2", "org-info", "Example Inc", "-e", "it@example.com"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["Type"], "com.apple.management.organization-info");
    assert_eq!(
        value["Payload"],
        serde_json::json!({"Name": "Example Inc", "Email": "it@example.com"})
    );
    assert_eq!(value["ServerToken"], "v2");
    assert!(value["Identifier"].as_str().is_some_and(|id| !id.is_empty()));
}

#[test]
fn test_ideclr_without_subcommand() {
    ideclr_cmd()
        .assert()
        .code(2)
        .stdout(predicate::str::contains("Usage"));
}
