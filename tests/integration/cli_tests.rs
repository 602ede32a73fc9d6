//! Integration tests for the CLI binary.
//!
//! Verifies that the `lvb` binary exists, responds to basic flags, and can
//! drive a complete owner lifecycle against a throwaway store directory.
//!
//! This test is registered as a [[test]] in the levelbook-cli crate so
//! that CARGO_BIN_EXE_lvb is available.

use std::path::Path;
use std::process::Command;

/// Get a Command pointing to the `lvb` binary.
fn lvb_binary() -> Command {
    Command::new(env!("CARGO_BIN_EXE_lvb"))
}

/// Get an `lvb` Command wired to a throwaway store directory.
fn lvb_in(store: &Path) -> Command {
    let mut cmd = lvb_binary();
    cmd.env("LEVELBOOK_DIR", store);
    cmd
}

fn run_ok(cmd: &mut Command) -> String {
    let output = cmd.output().expect("failed to execute lvb");
    assert!(
        output.status.success(),
        "lvb should exit with success, stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn cli_responds_to_help() {
    let output = lvb_binary()
        .arg("--help")
        .output()
        .expect("failed to execute lvb --help");

    assert!(
        output.status.success(),
        "lvb --help should exit with success, stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("lvb") || stdout.contains("Levelbook") || stdout.contains("Usage"),
        "lvb --help output should contain usage information, got: {stdout}"
    );
}

#[test]
fn cli_responds_to_version() {
    let output = lvb_binary()
        .arg("--version")
        .output()
        .expect("failed to execute lvb --version");

    assert!(
        output.status.success(),
        "lvb --version should exit with success, stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("0.1") || stdout.contains("lvb"),
        "lvb --version should contain version info, got: {stdout}"
    );
}

#[test]
fn cli_exits_with_error_on_unknown_flag() {
    let output = lvb_binary()
        .arg("--nonexistent-flag")
        .output()
        .expect("failed to execute lvb");

    assert!(
        !output.status.success(),
        "lvb with unknown flag should exit with error"
    );
}

#[test]
fn cli_owner_lifecycle() {
    let tmp = tempfile::tempdir().unwrap();
    let store = tmp.path();

    // Create an owner and confirm it lists.
    let stdout = run_ok(lvb_in(store).args(["owner", "create", "--name", "Avery"]));
    assert!(stdout.contains("Avery"), "create should echo the name: {stdout}");
    assert!(stdout.contains("own_"), "create should print the owner ID: {stdout}");

    let stdout = run_ok(lvb_in(store).args(["owner", "list"]));
    assert!(stdout.contains("Avery"));

    // Build a small catalog.
    run_ok(lvb_in(store).args(["category", "add", "--name", "Body"]));
    run_ok(lvb_in(store).args([
        "category",
        "add-sub",
        "--category",
        "Body",
        "--name",
        "Cardio",
    ]));

    // Log XP by category name and watch the profile move.
    let stdout = run_ok(lvb_in(store).args([
        "xp", "append", "--category", "Body", "--amount", "150",
    ]));
    assert!(stdout.contains("150"), "append should report the new total: {stdout}");

    let stdout = run_ok(lvb_in(store).args([
        "xp",
        "append",
        "--category",
        "Body",
        "--sub-category",
        "Cardio",
        "--amount",
        "260",
        "--note",
        "long ride",
    ]));
    assert!(stdout.contains("410"), "total should be 410: {stdout}");
    assert!(stdout.contains("Level up!"), "410 XP should level up: {stdout}");

    let stdout = run_ok(lvb_in(store).arg("profile"));
    assert!(stdout.contains("410"));
    assert!(stdout.contains("Avery"));

    // The ledger lists the entries, newest first.
    let stdout = run_ok(lvb_in(store).args(["xp", "list"]));
    let pos_260 = stdout.find("+260").expect("260 entry should list");
    let pos_150 = stdout.find("+150").expect("150 entry should list");
    assert!(pos_260 < pos_150, "newest entry should print first: {stdout}");
    assert!(stdout.contains("long ride"));

    // Radar and streaks read back the same day of activity.
    let stdout = run_ok(lvb_in(store).args(["radar", "--range", "all"]));
    assert!(stdout.contains("Body"));
    assert!(stdout.contains("410"));

    let stdout = run_ok(lvb_in(store).args(["streak", "--category", "Body"]));
    assert!(stdout.contains('1'), "one day of activity is a 1-day streak: {stdout}");
}

#[test]
fn cli_habit_round_trip() {
    let tmp = tempfile::tempdir().unwrap();
    let store = tmp.path();

    run_ok(lvb_in(store).args(["owner", "create", "--name", "Robin"]));
    run_ok(lvb_in(store).args(["category", "add", "--name", "Body"]));
    run_ok(lvb_in(store).args([
        "habit", "add", "--name", "Run", "--kind", "binary", "--xp", "25", "--category", "Body",
    ]));

    let stdout = run_ok(lvb_in(store).args(["habit", "list"]));
    assert!(stdout.contains("Run"));

    let stdout = run_ok(lvb_in(store).args(["habit", "complete", "Run"]));
    assert!(stdout.contains("25"), "completing Run should award 25 XP: {stdout}");

    // A paused habit refuses completion.
    run_ok(lvb_in(store).args(["habit", "pause", "Run"]));
    let output = lvb_in(store)
        .args(["habit", "complete", "Run"])
        .output()
        .expect("failed to execute lvb");
    assert!(!output.status.success(), "completing a paused habit should fail");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("error"), "failure should print an error: {stderr}");

    // Resuming brings it back.
    run_ok(lvb_in(store).args(["habit", "resume", "Run"]));
    let stdout = run_ok(lvb_in(store).args(["habit", "complete", "Run"]));
    assert!(stdout.contains("50"), "second completion should reach 50 XP: {stdout}");
}

#[test]
fn cli_rulebook_show_and_reset() {
    let tmp = tempfile::tempdir().unwrap();
    let store = tmp.path();

    run_ok(lvb_in(store).args(["owner", "create", "--name", "Sam"]));

    let stdout = run_ok(lvb_in(store).args(["rulebook", "show"]));
    assert!(stdout.contains("floor(xp / 100) + 1"), "default formula should show: {stdout}");

    run_ok(lvb_in(store).args([
        "rulebook",
        "set",
        "--formula",
        "floor(xp / 200) + 1",
    ]));
    let stdout = run_ok(lvb_in(store).args(["rulebook", "show"]));
    assert!(stdout.contains("floor(xp / 200) + 1"));

    // A formula that fails validation leaves the config alone.
    let output = lvb_in(store)
        .args(["rulebook", "set", "--formula", "xp **"])
        .output()
        .expect("failed to execute lvb");
    assert!(!output.status.success(), "invalid formula should be rejected");
    let stdout = run_ok(lvb_in(store).args(["rulebook", "show"]));
    assert!(stdout.contains("floor(xp / 200) + 1"));

    run_ok(lvb_in(store).args(["rulebook", "reset"]));
    let stdout = run_ok(lvb_in(store).args(["rulebook", "show"]));
    assert!(stdout.contains("floor(xp / 100) + 1"));
}

#[test]
fn cli_requires_owner_when_ambiguous() {
    let tmp = tempfile::tempdir().unwrap();
    let store = tmp.path();

    // No owners yet: profile cannot resolve a default.
    let output = lvb_in(store)
        .arg("profile")
        .output()
        .expect("failed to execute lvb");
    assert!(!output.status.success(), "profile without owners should fail");

    run_ok(lvb_in(store).args(["owner", "create", "--name", "Avery"]));
    run_ok(lvb_in(store).args(["owner", "create", "--name", "Robin"]));

    // Two owners: the sole-owner default no longer applies.
    let output = lvb_in(store)
        .arg("profile")
        .output()
        .expect("failed to execute lvb");
    assert!(!output.status.success(), "ambiguous owner should fail");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("--owner"), "error should point at --owner: {stderr}");

    // Selecting by display name works, case-insensitively.
    let stdout = run_ok(lvb_in(store).args(["--owner", "avery", "profile"]));
    assert!(stdout.contains("Avery"));
}
