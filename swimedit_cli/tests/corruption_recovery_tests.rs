//! Corruption recovery tests for swimedit.
//!
//! These tests verify the system can handle:
//! - A corrupted current snapshot (rebuilt from the edit journal)
//! - Corrupted journal lines
//! - Missing or corrupted original snapshot
//! - Malformed input workouts

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::io::Write as IoWrite;
use std::path::Path;
use tempfile::TempDir;

fn cli() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("swimedit"))
}

fn setup_test_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

fn fixture() -> std::path::PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/workout.json")
}

fn run(data_dir: &Path, args: &[&str]) -> assert_cmd::assert::Assert {
    cli().args(args).arg("--data-dir").arg(data_dir).assert()
}

fn imported() -> TempDir {
    let temp_dir = setup_test_dir();
    cli()
        .arg("import")
        .arg(fixture())
        .arg("--data-dir")
        .arg(temp_dir.path())
        .assert()
        .success();
    temp_dir
}

#[test]
fn test_corrupted_current_is_rebuilt_from_journal() {
    let temp_dir = imported();
    let data_dir = temp_dir.path();

    run(data_dir, &["merge", "0", "1"]).success();
    run(data_dir, &["delete", "1"]).success();

    fs::write(data_dir.join("current.json"), "{ invalid json }}}}").unwrap();

    run(data_dir, &["show"])
        .success()
        .stdout(predicate::str::contains("4 lengths"));

    // The rebuilt snapshot was written back
    let current = fs::read_to_string(data_dir.join("current.json")).unwrap();
    assert!(serde_json::from_str::<serde_json::Value>(&current).is_ok());
}

#[test]
fn test_missing_current_without_journal_restarts_from_original() {
    let temp_dir = imported();
    let data_dir = temp_dir.path();

    fs::remove_file(data_dir.join("current.json")).unwrap();

    run(data_dir, &["show"])
        .success()
        .stdout(predicate::str::contains("6 lengths"));
}

#[test]
fn test_current_with_wrong_shape_is_rebuilt() {
    let temp_dir = imported();
    let data_dir = temp_dir.path();

    run(data_dir, &["merge", "3", "4"]).success();

    // Valid JSON, but no session message
    fs::write(data_dir.join("current.json"), r#"{"lengthMesgs": []}"#).unwrap();

    run(data_dir, &["show"])
        .success()
        .stdout(predicate::str::contains("5 lengths"));
}

#[test]
fn test_corrupted_journal_lines_are_skipped() {
    let temp_dir = imported();
    let data_dir = temp_dir.path();

    run(data_dir, &["merge", "0", "1"]).success();
    {
        let mut file = fs::OpenOptions::new()
            .append(true)
            .open(data_dir.join("edits.jsonl"))
            .unwrap();
        writeln!(file, "{{ invalid json }}").unwrap();
        writeln!(file, "{{\"id\": \"not-a-uuid\"}}").unwrap();
    }
    run(data_dir, &["split", "0", "--parts", "3"]).success();

    run(data_dir, &["log"])
        .success()
        .stdout(predicate::str::contains("merge lengths [0, 1]"))
        .stdout(predicate::str::contains("split length [0] into 3 parts"));

    // Replay still works with the damaged journal
    fs::remove_file(data_dir.join("current.json")).unwrap();
    run(data_dir, &["show"])
        .success()
        .stdout(predicate::str::contains("7 lengths"));
}

#[test]
fn test_corrupted_original_requires_reimport() {
    let temp_dir = imported();
    let data_dir = temp_dir.path();

    fs::write(data_dir.join("original.json"), "garbage").unwrap();

    run(data_dir, &["show"])
        .failure()
        .stderr(predicate::str::contains("no workout has been imported"));

    // A fresh import recovers
    cli()
        .arg("import")
        .arg(fixture())
        .arg("--data-dir")
        .arg(data_dir)
        .assert()
        .success();
    run(data_dir, &["show"]).success();
}

#[test]
fn test_malformed_workout_is_rejected() {
    let temp_dir = setup_test_dir();
    let input = temp_dir.path().join("broken.json");
    fs::write(&input, r#"{"lengthMesgs": [{"lengthType": "sideways"}]}"#).unwrap();

    cli()
        .arg("import")
        .arg(&input)
        .arg("--data-dir")
        .arg(temp_dir.path().join("data"))
        .assert()
        .failure();

    assert!(!temp_dir.path().join("data").join("original.json").exists());
}

#[test]
fn test_missing_input_file() {
    let temp_dir = setup_test_dir();
    cli()
        .arg("import")
        .arg(temp_dir.path().join("nope.json"))
        .arg("--data-dir")
        .arg(temp_dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("IO error"));
}
