//! Integration tests for the CLI binary.
//!
//! Runs the `packrank` binary against a temporary data directory.
//!
//! This test is registered as a [[test]] in the packrank-cli crate
//! so that CARGO_BIN_EXE_packrank is available.

use std::path::Path;
use std::process::{Command, Output};

fn packrank(data_dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_packrank"))
        .arg("--data-dir")
        .arg(data_dir)
        .args(args)
        .env_remove("PACKRANK_CONFIG")
        .output()
        .expect("failed to execute packrank")
}

fn stdout_json(output: &Output) -> serde_json::Value {
    assert!(
        output.status.success(),
        "command failed, stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).expect("stdout should be JSON")
}

#[test]
fn cli_responds_to_help() {
    let output = Command::new(env!("CARGO_BIN_EXE_packrank"))
        .arg("--help")
        .output()
        .expect("failed to execute packrank --help");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Usage"), "got: {stdout}");
    assert!(stdout.contains("award"), "got: {stdout}");
}

#[test]
fn cli_responds_to_version() {
    let output = Command::new(env!("CARGO_BIN_EXE_packrank"))
        .arg("--version")
        .output()
        .expect("failed to execute packrank --version");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("0.3"), "got: {stdout}");
}

#[test]
fn cli_exits_with_error_on_unknown_flag() {
    let output = Command::new(env!("CARGO_BIN_EXE_packrank"))
        .arg("--nonexistent-flag")
        .output()
        .expect("failed to execute packrank");
    assert!(!output.status.success());
}

#[test]
fn award_spend_and_balance() {
    let dir = tempfile::tempdir().unwrap();

    let award = packrank(dir.path(), &["--json", "award", "biscuit", "120", "--source", "vote"]);
    let award = stdout_json(&award);
    assert_eq!(award["account"]["balance"], 120);

    let spend = packrank(
        dir.path(),
        &["--json", "spend", "biscuit", "20", "--item", "chew_toy"],
    );
    assert_eq!(stdout_json(&spend)["account"]["balance"], 100);

    let balance = stdout_json(&packrank(dir.path(), &["--json", "balance", "biscuit"]));
    assert_eq!(balance["balance"], 100);
    assert_eq!(balance["spent_total"], 20);
    assert_eq!(balance["transaction_count"], 2);

    let verify = packrank(dir.path(), &["verify-ledger", "biscuit"]);
    assert!(verify.status.success());
    assert!(String::from_utf8_lossy(&verify.stdout).contains("Result: VALID"));
}

#[test]
fn overdraw_fails_with_message() {
    let dir = tempfile::tempdir().unwrap();
    let output = packrank(dir.path(), &["spend", "biscuit", "5", "--item", "ball"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Insufficient balance"), "got: {stderr}");
}

#[test]
fn record_event_unlocks_first_question() {
    let dir = tempfile::tempdir().unwrap();
    let stats = dir.path().join("stats.json");
    std::fs::write(&stats, r#"{"questions_asked": 1}"#).unwrap();

    let output = packrank(
        dir.path(),
        &[
            "--json",
            "record",
            "biscuit",
            "--event",
            r#"{"event":"question_asked"}"#,
            "--stats",
            stats.to_str().unwrap(),
        ],
    );
    let outcome = stdout_json(&output);
    assert_eq!(
        outcome["evaluation"]["newly_unlocked"][0]["id"],
        "first_question"
    );

    let users = stdout_json(&packrank(dir.path(), &["--json", "users"]));
    assert_eq!(users, serde_json::json!(["biscuit"]));
}

#[test]
fn unknown_source_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let output = packrank(dir.path(), &["award", "biscuit", "5", "--source", "bribe"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("unknown point source"));
}
