mod common;

use assert_cmd::cargo::cargo_bin_cmd;
use common::{descsync_cmd, workspace};
use predicates::prelude::*;
use std::fs;

fn mismatched_workspace() -> tempfile::TempDir {
    workspace(
        &[("LAB-PC01", Some("old")), ("LAB-PC02", Some("old"))],
        &[("LAB-PC01", Some("new"))],
    )
}

#[test]
fn warnings_shown_by_default() {
    let temp = mismatched_workspace();

    descsync_cmd(temp.path())
        .write_stdin("LAB\n\n\n\n")
        .assert()
        .success()
        .stderr(predicate::str::contains(
            "WARN: LAB-PC02: unable to contact host",
        ))
        .stderr(predicate::str::contains("WARN: LAB-PC01: needs update"));
}

#[test]
fn run_respects_rust_log_error() {
    let temp = mismatched_workspace();

    descsync_cmd(temp.path())
        .env("RUST_LOG", "error")
        .write_stdin("LAB\n\n\n\n")
        .assert()
        .success()
        .stderr(predicate::str::is_empty());
}

#[test]
fn verbose_overrides_rust_log_error() {
    let temp = mismatched_workspace();

    descsync_cmd(temp.path())
        .env("RUST_LOG", "error")
        .arg("-v")
        .write_stdin("LAB\n\n\n\n")
        .assert()
        .success()
        .stderr(predicate::str::contains("DEBUG: [1/2] Querying LAB-PC01"));
}

#[test]
fn log_level_overrides_rust_log() {
    let temp = mismatched_workspace();

    descsync_cmd(temp.path())
        .env("RUST_LOG", "error")
        .arg("--log-level")
        .arg("warn")
        .write_stdin("LAB\n\n\n\n")
        .assert()
        .success()
        .stderr(predicate::str::contains("needs update"))
        .stderr(predicate::str::contains("INFO:").not());
}

#[test]
fn log_level_conflicts_with_verbose() {
    cargo_bin_cmd!("descsync")
        .arg("--log-level")
        .arg("info")
        .arg("-v")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--log-level <LEVEL>"))
        .stderr(predicate::str::contains("--verbose"));
}

#[test]
fn help_mentions_rust_log_precedence_for_logging_flags() {
    cargo_bin_cmd!("descsync")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("-v, --verbose"))
        .stdout(predicate::str::contains("--log-level <LEVEL>"))
        .stdout(predicate::str::contains("Takes precedence over RUST_LOG."));
}

#[test]
fn prefixes_are_ascii_when_not_tty() {
    let temp = mismatched_workspace();

    // Captured output is never a TTY.
    let output = descsync_cmd(temp.path())
        .write_stdin("LAB\n\n\n\n")
        .assert()
        .success()
        .get_output()
        .clone();

    let stderr = String::from_utf8_lossy(&output.stderr);
    for ch in stderr.chars() {
        assert!(
            ch.is_ascii(),
            "stderr unexpectedly contains non-ASCII character: {ch:?}"
        );
    }
    assert!(stderr.contains("WARN:"), "stderr should include the warn prefix");
}

#[test]
fn transcript_captures_output_and_log_events() {
    let temp = mismatched_workspace();

    descsync_cmd(temp.path())
        .write_stdin("LAB\n\n\n\n")
        .assert()
        .success();

    let logs: Vec<_> = fs::read_dir(temp.path().join("logs"))
        .unwrap()
        .map(|e| e.unwrap().path())
        .collect();
    assert_eq!(logs.len(), 1);

    let name = logs[0].file_name().unwrap().to_string_lossy().to_string();
    assert!(name.starts_with("descsync-") && name.ends_with(".log"), "{name}");

    let content = fs::read_to_string(&logs[0]).unwrap();
    assert!(content.starts_with("Transcript started "));
    assert!(content.contains("Computer name search term: LAB"));
    assert!(content.contains("WARN: LAB-PC02: unable to contact host"));
    assert!(
        content.lines().any(|line| line.starts_with("| LAB-PC01 ")
            && line.contains("| old ")
            && line.contains("| new ")
            && line.ends_with("| mismatch |")),
        "comparison table row missing from transcript:\n{content}"
    );
}

#[test]
fn no_transcript_flag() {
    let temp = mismatched_workspace();

    descsync_cmd(temp.path())
        .arg("--no-transcript")
        .write_stdin("LAB\n\n\n\n")
        .assert()
        .success();

    assert!(!temp.path().join("logs").exists());
}
