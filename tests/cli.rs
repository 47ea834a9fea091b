//! Integration tests for the CLI
//!
//! None of these reach a remote instance: they stop at argument parsing,
//! configuration, file loading, or a refused connection to a closed port.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

const ENV: [&str; 6] = [
    "LOOKPORT_HOST",
    "LOOKPORT_CLIENT_ID",
    "LOOKPORT_CLIENT_SECRET",
    "LOOKPORT_ACCESS_TOKEN",
    "LOOKPORT_API_VERSION",
    "LOOKPORT_TIMEOUT",
];

/// `lookport` with a clean environment and an empty config location.
fn lookport(config_dir: &TempDir) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("lookport"));
    for var in ENV {
        cmd.env_remove(var);
    }
    cmd.env_remove("RUST_LOG");
    cmd.arg("--config").arg(config_dir.path().join("config.json"));
    cmd
}

#[test]
fn test_cli_help() {
    let temp_dir = TempDir::new().unwrap();
    lookport(&temp_dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("look"))
        .stdout(predicate::str::contains("merge-query"))
        .stdout(predicate::str::contains("user"));
}

#[test]
fn test_version_json() {
    let temp_dir = TempDir::new().unwrap();
    lookport(&temp_dir)
        .args(["version", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"api_version\":\"4.0\""));
}

#[test]
fn test_missing_host_is_config_error() {
    let temp_dir = TempDir::new().unwrap();
    lookport(&temp_dir)
        .args(["look", "cat", "1"])
        .assert()
        .code(7)
        .stderr(predicate::str::contains("No host configured"))
        .stderr(predicate::str::contains("Hint:"));
}

#[test]
fn test_missing_host_json_error() {
    let temp_dir = TempDir::new().unwrap();
    lookport(&temp_dir)
        .args(["--json", "look", "rm", "1"])
        .assert()
        .code(7)
        .stderr(predicate::str::contains("\"code\":\"CONFIG_ERROR\""));
}

#[test]
fn test_host_from_config_file_without_credentials() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(
        temp_dir.path().join("config.json"),
        r#"{"host": "bi.example.com"}"#,
    )
    .unwrap();

    lookport(&temp_dir)
        .args(["user", "cat", "1"])
        .assert()
        .code(7)
        .stderr(predicate::str::contains("No credentials configured"));
}

#[test]
fn test_import_unreadable_file() {
    let temp_dir = TempDir::new().unwrap();
    lookport(&temp_dir)
        .args(["look", "import"])
        .arg(temp_dir.path().join("missing.json"))
        .arg("42")
        .assert()
        .code(8)
        .stderr(predicate::str::contains("Failed to read"));
}

#[test]
fn test_import_rejects_non_object_file() {
    let temp_dir = TempDir::new().unwrap();
    let file = temp_dir.path().join("look.json");
    fs::write(&file, "[1, 2, 3]").unwrap();

    lookport(&temp_dir)
        .args(["merge-query", "import"])
        .arg(&file)
        .assert()
        .code(8)
        .stderr(predicate::str::contains("expected a JSON object"));
}

#[test]
fn test_unknown_match_policy() {
    let temp_dir = TempDir::new().unwrap();
    lookport(&temp_dir)
        .args(["look", "import", "look.json", "42", "--match-policy", "oldest"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("oldest"));
}

/// `look import` of a valid file against a host that refuses connections.
fn import_unreachable(temp_dir: &TempDir) -> Command {
    let file = temp_dir.path().join("look.json");
    fs::write(
        &file,
        r#"{"title": "Sales", "slug": "abc", "query": {"model": "m", "view": "orders"}}"#,
    )
    .unwrap();

    let mut cmd = lookport(temp_dir);
    cmd.args(["--host", "http://127.0.0.1:1", "--access-token", "t", "--timeout", "5"])
        .args(["look", "import"])
        .arg(&file)
        .arg("7");
    cmd
}

#[test]
fn test_remote_failure_reported_once_per_channel() {
    let temp_dir = TempDir::new().unwrap();
    import_unreachable(&temp_dir)
        .assert()
        .code(6)
        .stdout(predicate::str::contains("Error querying current user"))
        .stderr(predicate::str::contains("Error: Error querying current user"))
        .stderr(predicate::str::contains("remote call failed").not())
        .stderr(predicate::str::contains("ERROR").not());
}

#[test]
fn test_quiet_still_reports_errors() {
    let temp_dir = TempDir::new().unwrap();
    import_unreachable(&temp_dir)
        .arg("--quiet")
        .assert()
        .code(6)
        .stdout(predicate::str::contains("Error querying current user"))
        .stderr(predicate::str::contains("Error: Error querying current user"));
}

#[test]
fn test_json_failure_carries_messages() {
    let temp_dir = TempDir::new().unwrap();
    import_unreachable(&temp_dir)
        .arg("--json")
        .assert()
        .code(6)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("\"code\":\"REMOTE_QUERY_ERROR\""))
        .stderr(predicate::str::contains("\"messages\":["))
        .stderr(predicate::str::contains("\"text\":\"Error querying current user\""));
}
