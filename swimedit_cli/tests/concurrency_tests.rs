//! Concurrency tests for swimedit.
//!
//! These tests verify that multiple processes can safely:
//! - Read snapshots while other readers hold shared locks
//! - Append to the edit journal one after another
//! - Export while the workout is being read

use assert_cmd::Command;
use std::path::Path;
use std::thread;
use std::time::Duration;
use tempfile::TempDir;

fn cli() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("swimedit"))
}

fn imported() -> TempDir {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    cli()
        .arg("import")
        .arg(Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/workout.json"))
        .arg("--data-dir")
        .arg(temp_dir.path())
        .assert()
        .success();
    temp_dir
}

#[test]
fn test_sequential_edits_are_all_journaled() {
    let temp_dir = imported();
    let data_dir = temp_dir.path().to_path_buf();

    for (i, ordinal) in ["0", "1", "3"].iter().enumerate() {
        thread::sleep(Duration::from_millis(i as u64 * 5));
        cli()
            .args(["stroke", "fly", ordinal])
            .arg("--data-dir")
            .arg(&data_dir)
            .assert()
            .success();
    }

    let journal = std::fs::read_to_string(data_dir.join("edits.jsonl")).expect("read journal");
    assert_eq!(journal.lines().count(), 3);
}

#[test]
fn test_concurrent_readers() {
    let temp_dir = imported();
    let data_dir = temp_dir.path().to_path_buf();

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let data_dir = data_dir.clone();
            thread::spawn(move || {
                let command = if i % 2 == 0 { "show" } else { "summary" };
                cli()
                    .arg(command)
                    .arg("--data-dir")
                    .arg(&data_dir)
                    .assert()
                    .success();
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("reader thread panicked");
    }
}

#[test]
fn test_exports_while_reading() {
    let temp_dir = imported();
    let data_dir = temp_dir.path().to_path_buf();

    let handles: Vec<_> = (0..3)
        .map(|i| {
            let data_dir = data_dir.clone();
            thread::spawn(move || {
                let out = data_dir.join(format!("export_{}.csv", i));
                cli()
                    .arg("export-csv")
                    .arg("--out")
                    .arg(&out)
                    .arg("--data-dir")
                    .arg(&data_dir)
                    .assert()
                    .success();
                out
            })
        })
        .collect();

    for handle in handles {
        let out = handle.join().expect("export thread panicked");
        let content = std::fs::read_to_string(out).expect("read export");
        assert_eq!(content.lines().count(), 7);
    }
}
