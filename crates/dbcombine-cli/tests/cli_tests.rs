//! CLI integration tests for dbcombine.
//!
//! These tests verify command-line argument parsing, help output,
//! exit codes for various error conditions and one end-to-end run.

use assert_cmd::Command;
use predicates::prelude::*;
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection};
use sqlx::Connection;
use std::io::Write;
use std::path::Path;

/// Get a command for the dbcombine binary.
fn cmd() -> Command {
    Command::cargo_bin("dbcombine").unwrap()
}

/// Create a SQLite file and run the statements against it.
fn seed(path: &Path, statements: &[&str]) {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    runtime.block_on(async {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let mut conn = SqliteConnection::connect_with(&options).await.unwrap();
        for sql in statements {
            sqlx::query(sql).execute(&mut conn).await.unwrap();
        }
        conn.close().await.unwrap();
    });
}

fn seed_users(path: &Path) {
    seed(
        path,
        &[
            "CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT)",
            "INSERT INTO users VALUES (1, 'Alice'), (2, 'Bob')",
        ],
    );
}

fn write_config(dir: &Path, source: &Path, target: &Path) -> std::path::PathBuf {
    let path = dir.join("config.yaml");
    let mut file = std::fs::File::create(&path).unwrap();
    writeln!(file, "source:\n  location: {}", source.display()).unwrap();
    writeln!(file, "target:\n  location: {}", target.display()).unwrap();
    path
}

// =============================================================================
// Help and Version Tests
// =============================================================================

#[test]
fn test_help_shows_all_commands() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("plan"))
        .stdout(predicate::str::contains("validate"))
        .stdout(predicate::str::contains("health-check"));
}

#[test]
fn test_run_subcommand_help() {
    cmd()
        .args(["run", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--dry-run"))
        .stdout(predicate::str::contains("--source"))
        .stdout(predicate::str::contains("--target"))
        .stdout(predicate::str::contains("--batch-size"));
}

#[test]
fn test_version_flag() {
    cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("dbcombine"));
}

// =============================================================================
// Global Flags Tests
// =============================================================================

#[test]
fn test_output_json_flag_exists() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--output-json"));
}

#[test]
fn test_log_format_flag_exists() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--log-format"))
        .stdout(predicate::str::contains("[default: text]"));
}

#[test]
fn test_verbosity_flag_exists() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--verbosity"))
        .stdout(predicate::str::contains("[default: info]"));
}

#[test]
fn test_unknown_verbosity_exits_with_code_1() {
    cmd()
        .args(["--verbosity", "loud", "plan"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("unknown verbosity"));
}

// =============================================================================
// Exit Code Tests - Config Errors (Exit Code 1)
// =============================================================================

#[test]
fn test_missing_config_exits_with_code_7() {
    // Missing file is an IO error (code 7), not config error (code 1)
    cmd()
        .args(["--config", "nonexistent_config_file.yaml", "health-check"])
        .assert()
        .code(7);
}

#[test]
fn test_invalid_yaml_exits_with_code_1() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "invalid: yaml: content: [").unwrap();

    cmd()
        .args(["--config", file.path().to_str().unwrap(), "health-check"])
        .assert()
        .code(1);
}

#[test]
fn test_empty_config_exits_with_code_1() {
    let file = tempfile::NamedTempFile::new().unwrap();

    cmd()
        .args(["--config", file.path().to_str().unwrap(), "plan"])
        .assert()
        .code(1);
}

#[test]
fn test_same_source_and_target_exits_with_code_1() {
    cmd()
        .args(["run", "--source", "a.sqlite", "--target", "a.sqlite"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Configuration error"));
}

// =============================================================================
// Exit Code Tests - Database Errors
// =============================================================================

#[test]
fn test_missing_source_exits_with_code_2() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("missing.sqlite");
    let target = dir.path().join("target.sqlite");

    cmd()
        .args(["run", "--source", source.to_str().unwrap()])
        .args(["--target", target.to_str().unwrap()])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Source catalog unavailable"));

    assert!(!target.exists());
}

#[test]
fn test_health_check_with_missing_source_exits_with_code_2() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_config(
        dir.path(),
        &dir.path().join("missing.sqlite"),
        &dir.path().join("target.sqlite"),
    );

    cmd()
        .args(["--config", config.to_str().unwrap(), "health-check"])
        .assert()
        .code(2)
        .stdout(predicate::str::contains("UNHEALTHY"));
}

#[test]
fn test_failed_table_exits_with_code_4() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("source.sqlite");
    let target = dir.path().join("target.sqlite");
    seed(
        &source,
        &[
            "CREATE TABLE logs (id INTEGER PRIMARY KEY, msg TEXT, level TEXT)",
            "INSERT INTO logs VALUES (1, 'boot', 'info')",
        ],
    );
    seed(&target, &["CREATE TABLE logs (id INTEGER PRIMARY KEY, msg TEXT)"]);

    cmd()
        .args(["run", "--source", source.to_str().unwrap()])
        .args(["--target", target.to_str().unwrap()])
        .assert()
        .code(4)
        .stdout(predicate::str::contains("Failed tables"));
}

// =============================================================================
// End-to-End Tests
// =============================================================================

#[test]
fn test_run_with_locations_outputs_json_report() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("source.sqlite");
    let target = dir.path().join("target.sqlite");
    seed_users(&source);

    let output = cmd()
        .arg("--output-json")
        .args(["run", "--source", source.to_str().unwrap()])
        .args(["--target", target.to_str().unwrap()])
        .output()
        .unwrap();

    assert!(output.status.success());
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["status"], "completed");
    assert_eq!(report["rows_merged"], 2);
    assert_eq!(report["tables"][0]["state"], "rows_applied");
    assert!(target.exists());
}

#[test]
fn test_plan_from_config_does_not_create_target() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("source.sqlite");
    let target = dir.path().join("target.sqlite");
    seed_users(&source);
    let config = write_config(dir.path(), &source, &target);

    cmd()
        .args(["--config", config.to_str().unwrap(), "plan"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Dry run completed!"))
        .stdout(predicate::str::contains("users"));

    assert!(!target.exists());
}

#[test]
fn test_validate_after_run() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("source.sqlite");
    let target = dir.path().join("target.sqlite");
    seed_users(&source);
    let config = write_config(dir.path(), &source, &target);
    let config = config.to_str().unwrap();

    cmd()
        .args(["--config", config, "validate"])
        .assert()
        .code(4);

    cmd().args(["--config", config, "run"]).assert().success();

    cmd()
        .args(["--config", config, "validate"])
        .assert()
        .success()
        .stdout(predicate::str::contains("users: 2 / 2"));
}

// =============================================================================
// Subcommand Existence Tests
// =============================================================================

#[test]
fn test_health_check_command_exists() {
    cmd()
        .args(["health-check", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Test database connections"));
}

#[test]
fn test_validate_command_exists() {
    cmd()
        .args(["validate", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Validate row counts"));
}

// =============================================================================
// Config Path Tests
// =============================================================================

#[test]
fn test_config_default_path() {
    cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("[default: config.yaml]"));
}

#[test]
fn test_short_config_flag() {
    cmd()
        .args(["-c", "some_config.yaml", "--help"])
        .assert()
        .success();
}

// =============================================================================
// No Subcommand Tests
// =============================================================================

#[test]
fn test_no_subcommand_shows_help() {
    cmd()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage:"));
}
