//! Command-line surface of the `relay` binary.

use assert_cmd::Command;
use predicates::prelude::*;

fn relay(data_dir: &std::path::Path) -> Command {
    let mut cmd = Command::cargo_bin("relay").expect("relay binary");
    cmd.arg("--data-dir")
        .arg(data_dir)
        .env_remove("RELAY_SITE")
        .env_remove("RELAY_SEARCH_TOKEN")
        .env_remove("RELAY_INGEST_URL")
        .env_remove("RELAY_INGEST_TOKEN")
        .env("RUST_LOG", "warn");
    cmd
}

#[test]
fn help_lists_subcommands() {
    let dir = tempfile::tempdir().unwrap();
    relay(dir.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("serve"))
        .stdout(predicate::str::contains("capture"))
        .stdout(predicate::str::contains("replay"))
        .stdout(predicate::str::contains("watch"));
}

#[test]
fn capture_without_site_fails_before_any_request() {
    let dir = tempfile::tempdir().unwrap();
    relay(dir.path())
        .args(["capture", "demo", "--start", "0", "--end", "1000", "--token", "t"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing site"));

    assert!(!dir.path().join("scenarios/demo.json").exists());
}

#[test]
fn capture_rejects_unsafe_names() {
    let dir = tempfile::tempdir().unwrap();
    relay(dir.path())
        .args(["capture", "../escape", "--start", "0", "--end", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid scenario name"));
}

#[test]
fn capture_rejects_unparseable_window() {
    let dir = tempfile::tempdir().unwrap();
    relay(dir.path())
        .args([
            "capture",
            "demo",
            "--start",
            "2024-01-01T00:00:00Z",
            "--end",
            "not-a-time",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--end"));
}

#[test]
fn replay_of_unknown_scenario_fails() {
    let dir = tempfile::tempdir().unwrap();
    relay(dir.path())
        .args(["replay", "ghost", "--endpoint", "http://127.0.0.1:9/collector"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn first_run_writes_example_config() {
    let dir = tempfile::tempdir().unwrap();
    relay(dir.path())
        .args(["replay", "ghost", "--endpoint", "http://127.0.0.1:9/collector"])
        .assert()
        .failure();

    let config = std::fs::read_to_string(dir.path().join("config.toml")).unwrap();
    assert!(config.contains("[replay]"));
}

#[test]
fn replay_of_empty_artifact_completes() {
    let dir = tempfile::tempdir().unwrap();
    let artifact = dir.path().join("empty.json");
    std::fs::write(&artifact, "[]").unwrap();

    relay(dir.path())
        .args(["replay"])
        .arg(&artifact)
        .args(["--endpoint", "http://127.0.0.1:9/collector"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"status\":\"completed\""));
}
