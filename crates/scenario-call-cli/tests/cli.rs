//! Smoke tests for the `scenario-call` binary.

use std::fs;
use std::path::Path;
use std::str;

use assert_cmd::Command;
use rstest::{fixture, rstest};
use tempfile::TempDir;

const SHARED: &str = concat!(
    "Feature: Shared\n",
    "  Scenario: Log in\n",
    "    Given I open the login page\n",
    "    When I submit my credentials\n",
);

const CALLER: &str = concat!(
    "Feature: Orders\n",
    "  Scenario: Order a book\n",
    "    Given I call scenario \"Log in\" from feature \"Shared\"\n",
    "    Then the order is placed\n",
);

#[expect(clippy::expect_used, reason = "behavioural tests use explicit panics")]
#[fixture]
fn project() -> TempDir {
    let dir = TempDir::new().expect("temp dir");
    fs::create_dir_all(dir.path().join("Specs")).expect("specs dir");
    fs::write(dir.path().join("Specs/shared.feature"), SHARED).expect("shared feature");
    fs::write(dir.path().join("orders.feature"), CALLER).expect("caller");
    dir
}

#[expect(clippy::expect_used, reason = "behavioural tests use explicit panics")]
fn command(root: &Path) -> Command {
    let mut command = Command::cargo_bin("scenario-call").expect("binary exists");
    command
        .env_remove("SCENARIO_CALL_LOG_LEVEL")
        .env_remove("SCENARIO_CALL_ROOT")
        .current_dir(root);
    command
}

#[expect(clippy::expect_used, reason = "behavioural tests use explicit panics")]
#[rstest]
fn expand_prints_expanded_feature(project: TempDir) {
    let output = command(project.path())
        .args(["expand", "orders.feature"])
        .output()
        .expect("runs");
    assert!(output.status.success());
    let stdout = str::from_utf8(&output.stdout).expect("utf8");
    assert_eq!(
        stdout,
        concat!(
            "Feature: Orders\n",
            "  Scenario: Order a book\n",
            "    # Expanded from scenario call: \"Log in\" from feature \"Shared\"\n",
            "    Given I open the login page\n",
            "    When I submit my credentials\n",
            "    Then the order is placed\n",
            "\n",
        )
    );
}

#[expect(clippy::expect_used, reason = "behavioural tests use explicit panics")]
#[rstest]
fn expand_honours_root_from_environment(project: TempDir) {
    let elsewhere = TempDir::new().expect("temp dir");
    let output = command(elsewhere.path())
        .env("SCENARIO_CALL_ROOT", project.path())
        .arg("expand")
        .arg(project.path().join("orders.feature"))
        .output()
        .expect("runs");
    assert!(output.status.success());
    let stdout = str::from_utf8(&output.stdout).expect("utf8");
    assert!(stdout.contains("    Given I open the login page\n"));
}

#[expect(clippy::expect_used, reason = "behavioural tests use explicit panics")]
#[rstest]
fn expand_writes_output_directory(project: TempDir) {
    let output = command(project.path())
        .args(["expand", "--output-dir", "build", "orders.feature"])
        .output()
        .expect("runs");
    assert!(output.status.success());
    assert!(output.stdout.is_empty());
    let written =
        fs::read_to_string(project.path().join("build/orders.feature")).expect("written file");
    assert!(written.contains("    When I submit my credentials\n"));
}

#[expect(clippy::expect_used, reason = "behavioural tests use explicit panics")]
#[rstest]
fn unresolved_calls_still_succeed(project: TempDir) {
    fs::write(
        project.path().join("broken.feature"),
        "Feature: B\n  Scenario: S\n    Given I call scenario \"Log in\" from feature \"Missing\"\n",
    )
    .expect("broken caller");
    let output = command(project.path())
        .args(["expand", "broken.feature"])
        .output()
        .expect("runs");
    assert!(output.status.success());
    let stdout = str::from_utf8(&output.stdout).expect("utf8");
    assert!(stdout.contains("    # Warning: Could not expand scenario call: "));
}

#[expect(clippy::expect_used, reason = "behavioural tests use explicit panics")]
#[test]
fn languages_lists_dialects() {
    let dir = TempDir::new().expect("temp dir");
    let output = command(dir.path()).arg("languages").output().expect("runs");
    assert!(output.status.success());
    let stdout = str::from_utf8(&output.stdout).expect("utf8");
    assert!(stdout.lines().any(|line| line == "fr\tfrançais\tyes"));
}

#[expect(clippy::expect_used, reason = "behavioural tests use explicit panics")]
#[rstest]
#[case::invalid_log_level(&["--log-level", "loud", "languages"], 2)]
#[case::missing_root(&["--root", "no-such-dir", "expand", "orders.feature"], 2)]
#[case::missing_input(&["expand", "absent.feature"], 1)]
fn failures_map_to_exit_codes(project: TempDir, #[case] args: &[&str], #[case] code: i32) {
    let output = command(project.path()).args(args).output().expect("runs");
    assert_eq!(output.status.code(), Some(code));
}

#[expect(clippy::expect_used, reason = "behavioural tests use explicit panics")]
#[rstest]
fn invalid_environment_exits_with_config_status(project: TempDir) {
    let output = command(project.path())
        .env("SCENARIO_CALL_LOG_LEVEL", "chatty")
        .args(["expand", "orders.feature"])
        .output()
        .expect("runs");
    assert_eq!(output.status.code(), Some(2));
    let stderr = str::from_utf8(&output.stderr).expect("utf8");
    assert!(stderr.contains("invalid configuration"), "{stderr}");
}
