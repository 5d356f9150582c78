//! CLI end-to-end tests
//!
//! Tests for the hacksteader command-line interface against throwaway
//! database files.

use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::{tempdir, TempDir};

/// Get a command for the hacksteader binary
#[allow(deprecated)]
fn hacksteader_cmd() -> Command {
    Command::cargo_bin("hacksteader").unwrap()
}

fn temp_db() -> (TempDir, PathBuf) {
    let temp = tempdir().unwrap();
    let db = temp.path().join("steads.db");
    (temp, db)
}

fn with_db(db: &Path) -> Command {
    let mut cmd = hacksteader_cmd();
    cmd.arg("--database").arg(db);
    cmd
}

#[test]
fn test_cli_no_args_shows_help() {
    let mut cmd = hacksteader_cmd();
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn test_cli_help_flag() {
    let mut cmd = hacksteader_cmd();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("hacksteader"))
        .stdout(predicate::str::contains("Usage"));
}

#[test]
fn test_cli_version_command() {
    let mut cmd = hacksteader_cmd();
    cmd.arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains("hacksteader"))
        .stdout(predicate::str::contains("schema version 3"));
}

#[test]
fn test_cli_steader_help() {
    let mut cmd = hacksteader_cmd();
    cmd.args(["steader", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("new"))
        .stdout(predicate::str::contains("show"));
}

#[test]
fn test_cli_migrate_then_status() {
    let (_temp, db) = temp_db();

    with_db(&db)
        .arg("migrate")
        .assert()
        .success()
        .stdout(predicate::str::contains("Applied 3 migration(s)"));

    with_db(&db)
        .arg("migrate")
        .assert()
        .success()
        .stdout(predicate::str::contains("Applied 0 migration(s)"));

    with_db(&db)
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("Current version: 3"))
        .stdout(predicate::str::contains("Up to date"));
}

#[test]
fn test_cli_partial_migration_lists_pending() {
    let (_temp, db) = temp_db();

    with_db(&db)
        .args(["migrate", "--to", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("version 1"));

    with_db(&db)
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("Current version: 1"))
        .stdout(predicate::str::contains("Pending:"));

    // Only the tables of version 1 are expected at this point.
    with_db(&db).arg("check").assert().success();
}

#[test]
fn test_cli_migrate_past_latest_fails() {
    let (_temp, db) = temp_db();

    with_db(&db)
        .args(["migrate", "--to", "99"])
        .assert()
        .failure();
}

#[test]
fn test_cli_check_reports_drift() {
    let (_temp, db) = temp_db();

    with_db(&db).arg("migrate").assert().success();
    with_db(&db)
        .arg("check")
        .assert()
        .success()
        .stdout(predicate::str::contains("Schema OK"));

    let conn = rusqlite::Connection::open(&db).unwrap();
    conn.execute_batch("CREATE TABLE stray (id TEXT)").unwrap();
    drop(conn);

    with_db(&db)
        .arg("check")
        .assert()
        .failure()
        .stdout(predicate::str::contains("stray"));
}

#[test]
fn test_cli_check_unmigrated_database_fails() {
    let (_temp, db) = temp_db();

    with_db(&db)
        .arg("check")
        .assert()
        .failure()
        .stdout(predicate::str::contains("not migrated"))
        .stdout(predicate::str::contains("Schema OK").not())
        .stderr(predicate::str::contains("hacksteader migrate"));

    with_db(&db).arg("migrate").assert().success();
    with_db(&db).arg("check").assert().success();
}

#[test]
fn test_cli_schema_lists_tables_and_composite() {
    let mut cmd = hacksteader_cmd();
    cmd.arg("schema")
        .assert()
        .success()
        .stdout(predicate::str::contains("type seed_grower"))
        .stdout(predicate::str::contains("tiles_steaders"))
        .stdout(predicate::str::contains("-> crafts(id)"));
}

#[test]
fn test_cli_schema_json() {
    let output = hacksteader_cmd().args(["schema", "--json"]).output().unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let tables = json["tables"].as_array().unwrap();
    assert_eq!(tables.len(), 8);
    assert_eq!(json["composites"][0]["name"], "seed_grower");
}

#[test]
fn test_cli_steader_new_and_show() {
    let (_temp, db) = temp_db();

    with_db(&db)
        .args(["steader", "new", "U012ABCDEF", "--tiles", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("with 2 tile(s)"));

    with_db(&db)
        .args(["steader", "show", "U012ABCDEF"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Hacksteader: U012ABCDEF"))
        .stdout(predicate::str::contains("2 tile(s), 2 open"))
        .stdout(predicate::str::contains("0 item(s), 0 gotchi(s)"));

    let output = with_db(&db)
        .args(["steader", "show", "U012ABCDEF", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["user_id"], "U012ABCDEF");
    assert_eq!(json["land"].as_array().unwrap().len(), 2);
}

#[test]
fn test_cli_steader_new_twice_fails() {
    let (_temp, db) = temp_db();

    with_db(&db).args(["steader", "new", "U1"]).assert().success();
    with_db(&db)
        .args(["steader", "new", "U1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Hacksteader U1 already exists"));
}

#[test]
fn test_cli_steader_show_unknown() {
    let (_temp, db) = temp_db();

    with_db(&db)
        .args(["steader", "show", "nobody"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No hacksteader"));
}

#[test]
fn test_cli_config_starting_tiles() {
    let (temp, db) = temp_db();
    let config_file = temp.path().join("hacksteader.toml");
    fs::write(
        &config_file,
        format!(
            "[database]\npath = {:?}\n\n[steaders]\nstarting_tiles = 4\n",
            db.to_string_lossy()
        ),
    )
    .unwrap();

    let mut cmd = hacksteader_cmd();
    cmd.arg("--config")
        .arg(&config_file)
        .args(["steader", "new", "U1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("with 4 tile(s)"));
    assert!(db.exists());
}

#[test]
fn test_cli_invalid_config_fails() {
    let temp = tempdir().unwrap();
    let config_file = temp.path().join("hacksteader.toml");
    fs::write(&config_file, "[database]\npool_size = 0\n").unwrap();

    let mut cmd = hacksteader_cmd();
    cmd.arg("--config")
        .arg(&config_file)
        .arg("status")
        .assert()
        .failure()
        .stderr(predicate::str::contains("pool_size"));
}
