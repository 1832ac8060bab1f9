//! Basic CLI E2E tests.
//!
//! Tests invoke CLI commands via cargo run against the dev data
//! directory and verify outputs.

use std::process::Command;

/// Run a CLI command and return (stdout, stderr, exit code).
fn run_cli(args: &[&str]) -> (String, String, i32) {
    let output = Command::new("cargo")
        .args(["run", "-p", "habitrack-cli", "--quiet", "--"])
        .args(args)
        .env("HABITRACK_ENV", "dev")
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

fn set_profile() {
    let (_, stderr, code) = run_cli(&[
        "profile",
        "set",
        "cli-test@example.com",
        "--name",
        "CLI Test",
    ]);
    assert_eq!(code, 0, "profile set failed: {stderr}");
}

#[test]
fn test_profile_show() {
    set_profile();
    let (stdout, stderr, code) = run_cli(&["profile", "show"]);
    assert_eq!(code, 0, "profile show failed: {stderr}");
    assert!(stdout.contains("cli-test@example.com"));
}

#[test]
fn test_habit_list() {
    let (_, stderr, code) = run_cli(&["habit", "list"]);
    assert_eq!(code, 0, "habit list failed: {stderr}");
}

#[test]
fn test_habit_list_json() {
    let (stdout, stderr, code) = run_cli(&["habit", "list", "--json"]);
    assert_eq!(code, 0, "habit list --json failed: {stderr}");
    assert!(serde_json::from_str::<serde_json::Value>(&stdout).is_ok());
}

#[test]
fn test_habit_add_complete_streak_delete() {
    set_profile();

    let (stdout, stderr, code) = run_cli(&["habit", "add", "E2E habit", "--category", "Testing"]);
    assert_eq!(code, 0, "habit add failed: {stderr}");
    let id = stdout
        .lines()
        .next()
        .and_then(|line| line.strip_prefix("Habit created: "))
        .expect("habit add should print the new id")
        .trim()
        .to_string();

    let (stdout, stderr, code) = run_cli(&["habit", "complete", &id]);
    assert_eq!(code, 0, "habit complete failed: {stderr}");
    assert!(
        stdout.contains("Current streak: 1") || stdout.contains("Already completed today"),
        "unexpected complete output: {stdout}"
    );

    // A second completion on the same day is the benign rejection.
    let (stdout, _, code) = run_cli(&["habit", "complete", &id]);
    assert_eq!(code, 0);
    assert!(stdout.contains("Already completed today"));

    let (stdout, stderr, code) = run_cli(&["habit", "streak", &id]);
    assert_eq!(code, 0, "habit streak failed: {stderr}");
    assert_eq!(stdout.trim(), "1");

    let (_, stderr, code) = run_cli(&["habit", "delete", &id]);
    assert_eq!(code, 0, "habit delete failed: {stderr}");
}

#[test]
fn test_habit_show_unknown_id_fails() {
    let (_, stderr, code) = run_cli(&["habit", "show", "00000000-0000-0000-0000-000000000000"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("error"));
}
