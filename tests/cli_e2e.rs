//! End-to-end tests for the catalog-ingest binary.

// `Command::cargo_bin` is deprecated in assert_cmd >=2.0.17 in favor of
// `cargo::cargo_bin_cmd!` macro. Suppressed until migration to the new API.
#![allow(deprecated)]

mod support;

use std::path::Path;

use assert_cmd::Command;
use catalog_ingest_core::{Database, DatasetRepository};
use predicates::prelude::*;
use support::socket_guard::start_mock_server_or_skip;
use support::{ALL_FORMATS, Served, mount_dataset};
use tempfile::TempDir;

/// Binary with an empty config home so a developer's own config is ignored.
fn command(tempdir: &TempDir) -> Command {
    let config_home = tempdir.path().join("xdg-config");
    std::fs::create_dir_all(&config_home).unwrap();
    let mut cmd = Command::cargo_bin("catalog-ingest").unwrap();
    cmd.env("XDG_CONFIG_HOME", &config_home).env_remove("RUST_LOG");
    cmd
}

fn write_ids(dir: &Path, ids: &[&str]) -> std::path::PathBuf {
    let path = dir.join("ids.txt");
    let mut body = String::from("# identifiers under test\n");
    for id in ids {
        body.push_str(id);
        body.push('\n');
    }
    std::fs::write(&path, body).unwrap();
    path
}

async fn stored_count(db_path: &Path) -> i64 {
    let repository = DatasetRepository::new(Database::new(db_path).await.unwrap());
    repository.count().await.unwrap()
}

// ==================== Usage ====================

#[test]
fn test_binary_help_shows_usage() {
    let tempdir = TempDir::new().unwrap();
    command(&tempdir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage: catalog-ingest"))
        .stdout(predicate::str::contains("--max-retries"));
}

#[test]
fn test_binary_requires_ids_file() {
    let tempdir = TempDir::new().unwrap();
    let assert = command(&tempdir)
        .assert()
        .failure()
        .stderr(predicate::str::contains("IDS_FILE"));
    // Usage errors must not look like a partial batch
    assert_eq!(assert.get_output().status.code(), Some(1));
}

#[test]
fn test_binary_missing_ids_file_exits_one() {
    let tempdir = TempDir::new().unwrap();
    let assert = command(&tempdir)
        .arg(tempdir.path().join("absent.txt"))
        .arg("--database")
        .arg(tempdir.path().join("catalog.db"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read identifier file"));
    assert_eq!(assert.get_output().status.code(), Some(1));
}

#[test]
fn test_binary_invalid_config_exits_one() {
    let tempdir = TempDir::new().unwrap();
    let ids = write_ids(tempdir.path(), &["eidc-001"]);
    let config = tempdir.path().join("bad.toml");
    std::fs::write(&config, "max_attempts = 0\n").unwrap();

    let assert = command(&tempdir)
        .arg(&ids)
        .arg("--config")
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("max_attempts"));
    assert_eq!(assert.get_output().status.code(), Some(1));
}

#[test]
fn test_binary_rejects_unknown_config_key_from_config_home() {
    let tempdir = TempDir::new().unwrap();
    let ids = write_ids(tempdir.path(), &["eidc-001"]);
    let config_dir = tempdir.path().join("xdg-config").join("catalog-ingest");
    std::fs::create_dir_all(&config_dir).unwrap();
    std::fs::write(config_dir.join("config.toml"), "concurrency = 4\n").unwrap();

    command(&tempdir)
        .arg(&ids)
        .assert()
        .failure()
        .stderr(predicate::str::contains("concurrency"));
}

// ==================== Batch Runs ====================

#[tokio::test]
async fn test_binary_all_succeeded_exits_zero() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    mount_dataset(&server, "eidc-001", &ALL_FORMATS).await;

    let tempdir = TempDir::new().unwrap();
    let ids = write_ids(tempdir.path(), &["eidc-001"]);
    let db_path = tempdir.path().join("catalog.db");

    command(&tempdir)
        .arg(&ids)
        .arg("--database")
        .arg(&db_path)
        .arg("--base-url")
        .arg(server.uri())
        .args(["--retry-delay", "0", "--pause", "0"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Succeeded: 1"))
        .stdout(predicate::str::contains("Failed:    0"));

    assert_eq!(stored_count(&db_path).await, 1);
}

#[tokio::test]
async fn test_binary_partial_success_exits_two() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    mount_dataset(&server, "eidc-001", &[Served::Json]).await;

    let tempdir = TempDir::new().unwrap();
    let ids = write_ids(tempdir.path(), &["eidc-001", "eidc-missing"]);
    let db_path = tempdir.path().join("catalog.db");

    let assert = command(&tempdir)
        .arg(&ids)
        .arg("--database")
        .arg(&db_path)
        .arg("--base-url")
        .arg(server.uri())
        .args(["-r", "1", "--pause", "0"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("Failed identifiers:"))
        .stdout(predicate::str::contains("eidc-missing [reconciling]"));
    assert_eq!(assert.get_output().status.code(), Some(2));
    assert_eq!(stored_count(&db_path).await, 1);
}

#[tokio::test]
async fn test_binary_all_failed_exits_one() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };

    let tempdir = TempDir::new().unwrap();
    let ids = write_ids(tempdir.path(), &["eidc-001"]);

    let assert = command(&tempdir)
        .arg(&ids)
        .arg("--database")
        .arg(tempdir.path().join("catalog.db"))
        .arg("--base-url")
        .arg(server.uri())
        .args(["-q", "-r", "1"])
        .assert()
        .failure()
        .stdout(predicate::str::is_empty());
    assert_eq!(assert.get_output().status.code(), Some(1));
}
