//! Behavioural tests for expanding scenario calls across feature files.

mod support;

use rstest::{fixture, rstest};
use scenario_call::{ERROR_MARKER, EXPANSION_MARKER, WARNING_MARKER};
use support::{Project, line_index, lines};

const AUTHENTICATION: &str = concat!(
    "Feature: Authentication\n",
    "\n",
    "  @smoke @regression\n",
    "  Scenario: Login\n",
    "    Given I am on the login page\n",
    "    When I enter valid credentials\n",
    "    Then I should be logged in\n",
    "\n",
    "  Scenario: Logout\n",
    "    Given I am logged in\n",
    "    When I log out\n",
);

const USER_MANAGEMENT: &str = concat!(
    "Feature: UserManagement\n",
    "  Scenario: Create User\n",
    "    Given I have the following user data:\n",
    "      | Field    | Value            |\n",
    "      | Username | john.doe         |\n",
    "      | Email    | john@example.com |\n",
    "      | Role     | Administrator    |\n",
    "    When I create the user\n",
    "    Then the user should exist\n",
);

const API: &str = concat!(
    "Feature: Api\n",
    "  Scenario: Send payload\n",
    "    Given the request body\n",
    "      \"\"\"\n",
    "      {\"name\": \"x\"}\n",
    "      \"\"\"\n",
    "    When I send it\n",
);

const COMMON: &str = concat!(
    "Feature: Common\n",
    "  Scenario: Setup\n",
    "    Given I call scenario \"Login\" from feature \"Authentication\"\n",
    "    And the database is empty\n",
);

#[fixture]
fn project() -> Project {
    Project::empty()
        .with("Features/authentication.feature", AUTHENTICATION)
        .with("Specs/users/user_management.feature", USER_MANAGEMENT)
        .with("Tests/api.feature", API)
        .with("common.feature", COMMON)
}

#[rstest]
fn expands_call_in_place(project: Project) {
    let caller = concat!(
        "Feature: Checkout\n",
        "\n",
        "  Scenario: Buy as a member\n",
        "    Given I call scenario \"Login\" from feature \"Authentication\"\n",
        "    When I buy a book\n",
    );
    let expected = concat!(
        "Feature: Checkout\n",
        "\n",
        "  Scenario: Buy as a member\n",
        "    # Expanded from scenario call: \"Login\" from feature \"Authentication\"\n",
        "    Given I am on the login page\n",
        "    When I enter valid credentials\n",
        "    Then I should be logged in\n",
        "    When I buy a book\n",
        "\n",
    );
    assert_eq!(project.session().preprocess(caller), expected);
}

#[rstest]
fn tags_of_the_called_scenario_are_not_copied(project: Project) {
    let caller = "Feature: F\n  Scenario: S\n    Given I call scenario \"Login\" from feature \"Authentication\"\n";
    let output = project.session().preprocess(caller);
    assert!(!output.contains("@smoke"));
    assert!(!output.contains("@regression"));
}

#[rstest]
#[case::tabs("\t\t")]
#[case::two_spaces("  ")]
#[case::none("")]
fn block_takes_indentation_of_call(project: Project, #[case] indent: &str) {
    let caller = format!(
        "Feature: F\nScenario: S\n{indent}When I call scenario \"Logout\" from feature \"Authentication\"\n"
    );
    let output = project.session().preprocess(&caller);
    let header = format!("{indent}{EXPANSION_MARKER} \"Logout\" from feature \"Authentication\"");
    let first = line_index(&output, &header);
    let block: Vec<&str> = lines(&output).into_iter().skip(first + 1).take(2).collect();
    assert_eq!(
        block,
        [
            format!("{indent}Given I am logged in"),
            format!("{indent}When I log out"),
        ]
    );
}

#[rstest]
fn data_table_rows_are_nested_under_their_step(project: Project) {
    let caller = concat!(
        "Feature: Admin\n",
        "  Scenario: Provision\n",
        "    Given I call scenario \"Create User\" from feature \"UserManagement\"\n",
    );
    let output = project.session().preprocess(caller);
    let step = line_index(&output, "    Given I have the following user data:");
    let rows: Vec<&str> = lines(&output).into_iter().skip(step + 1).take(4).collect();
    assert_eq!(
        rows,
        [
            "        | Field    | Value            |",
            "        | Username | john.doe         |",
            "        | Email    | john@example.com |",
            "        | Role     | Administrator    |",
        ]
    );
    assert!(line_index(&output, "    When I create the user") > step + 4);
}

#[rstest]
fn doc_string_lines_are_copied(project: Project) {
    let caller = "Feature: Client\n  Scenario: Call api\n    Given I call scenario \"Send payload\" from feature \"Api\"\n";
    let output = project.session().preprocess(caller);
    let step = line_index(&output, "    Given the request body");
    let block: Vec<&str> = lines(&output).into_iter().skip(step + 1).take(4).collect();
    assert_eq!(
        block,
        [
            "    \"\"\"",
            "    {\"name\": \"x\"}",
            "    \"\"\"",
            "    When I send it",
        ]
    );
}

#[rstest]
fn nested_calls_are_expanded_one_level_only(project: Project) {
    let caller = "Feature: F\n  Scenario: S\n    Given I call scenario \"Setup\" from feature \"Common\"\n";
    let output = project.session().preprocess(caller);
    assert_eq!(output.matches(EXPANSION_MARKER).count(), 1);
    line_index(
        &output,
        "    Given I call scenario \"Login\" from feature \"Authentication\"",
    );
    line_index(&output, "    And the database is empty");
    assert!(!output.contains("I am on the login page"));
}

#[rstest]
fn background_calls_are_left_verbatim(project: Project) {
    let caller = concat!(
        "Feature: F\n",
        "  Background:\n",
        "    Given I call scenario \"Logout\" from feature \"Authentication\"\n",
        "  Scenario: S\n",
        "    Given I call scenario \"Login\" from feature \"Authentication\"\n",
    );
    let output = project.session().preprocess(caller);
    line_index(
        &output,
        "    Given I call scenario \"Logout\" from feature \"Authentication\"",
    );
    assert!(!output.contains("I log out"));
    line_index(&output, "    Given I am on the login page");
}

#[rstest]
fn outline_calls_are_expanded(project: Project) {
    let caller = concat!(
        "Feature: F\n",
        "  Scenario Outline: Buy <item>\n",
        "    Given I call scenario \"Login\" from feature \"Authentication\"\n",
        "    When I buy <item>\n",
        "\n",
        "    Examples:\n",
        "      | item |\n",
        "      | book |\n",
    );
    let output = project.session().preprocess(caller);
    let header = line_index(
        &output,
        "    # Expanded from scenario call: \"Login\" from feature \"Authentication\"",
    );
    assert!(header < line_index(&output, "    When I buy <item>"));
    line_index(&output, "      | book |");
}

#[rstest]
fn titles_match_without_regard_to_case(project: Project) {
    let caller = "Feature: F\n  Scenario: S\n    Given I call scenario \"login\" from feature \"AUTHENTICATION\"\n";
    let output = project.session().preprocess(caller);
    line_index(
        &output,
        "    # Expanded from scenario call: \"login\" from feature \"AUTHENTICATION\"",
    );
    line_index(&output, "    Given I am on the login page");
}

#[rstest]
#[case::missing_feature(
    "Given I call scenario \"Login\" from feature \"Billing\"",
    "feature \"Billing\" was not found"
)]
#[case::missing_scenario(
    "Given I call scenario \"Register\" from feature \"Authentication\"",
    "scenario \"Register\" was not found in feature \"Authentication\""
)]
fn unresolved_calls_leave_a_warning(
    project: Project,
    #[case] call: &str,
    #[case] reason: &str,
) {
    let caller = format!("Feature: F\n  Scenario: S\n    {call}\n    Then it still runs\n");
    let output = project.session().preprocess(&caller);
    let warning = lines(&output)
        .into_iter()
        .find(|line| line.trim_start().starts_with(WARNING_MARKER))
        .unwrap_or_else(|| panic!("no warning in:\n{output}"));
    assert!(warning.starts_with("    # Warning: Could not expand scenario call: "));
    assert!(warning.contains(reason), "{warning}");
    assert!(!output.contains(call));
    assert!(!output.contains("I am on the login page"));
    line_index(&output, "    Then it still runs");
}

#[rstest]
fn several_calls_share_the_session_cache(project: Project) {
    let caller = concat!(
        "Feature: F\n",
        "  Scenario: One\n",
        "    Given I call scenario \"Login\" from feature \"Authentication\"\n",
        "  Scenario: Two\n",
        "    Given I call scenario \"Logout\" from feature \"Authentication\"\n",
        "    And I call scenario \"Create User\" from feature \"UserManagement\"\n",
    );
    let mut session = project.session();
    let output = session.preprocess(caller);
    assert_eq!(output.matches(EXPANSION_MARKER).count(), 3);
    assert!(session.locator().cached("Authentication").is_some());
    assert!(session.locator().cached("UserManagement").is_some());
}

#[test]
fn crlf_documents_keep_crlf_terminators() {
    let project = Project::empty().with(
        "auth.feature",
        &AUTHENTICATION.replace('\n', "\r\n"),
    );
    let caller = "Feature: F\r\n  Scenario: S\r\n    Given I call scenario \"Login\" from feature \"Authentication\"\r\n    Then done\r\n";
    let output = project.session().preprocess(caller);
    assert!(output.contains("\r\n    Given I am on the login page\r\n"));
    assert!(!output.replace("\r\n", "").contains('\n'));
    assert!(output.ends_with("    Then done\r\n\r\n"));
}

#[test]
fn referenced_projects_are_searched() {
    let project = Project::empty()
        .with(
            "app/Cargo.toml",
            "[package]\nname = \"app\"\n\n[dev-dependencies]\nshared = { path = \"../shared\" }\n",
        )
        .with("shared/Features/authentication.feature", AUTHENTICATION);
    let caller = "Feature: F\n  Scenario: S\n    Given I call scenario \"Logout\" from feature \"Authentication\"\n";
    let output = project.session_at("app").preprocess(caller);
    line_index(&output, "    Given I am logged in");
}

#[test]
fn projects_are_not_followed_transitively() {
    let project = Project::empty()
        .with("app/Cargo.toml", "[dependencies]\nshared = { path = \"../shared\" }\n")
        .with("shared/Cargo.toml", "[dependencies]\nauth = { path = \"../auth\" }\n")
        .with("auth/authentication.feature", AUTHENTICATION);
    let caller = "Feature: F\n  Scenario: S\n    Given I call scenario \"Logout\" from feature \"Authentication\"\n";
    let output = project.session_at("app").preprocess(caller);
    assert!(output.contains("feature \"Authentication\" was not found"));
}

#[test]
fn called_features_may_start_with_a_byte_order_mark() {
    let project = Project::empty().with(
        "Features/authentication.feature",
        &format!("\u{feff}{AUTHENTICATION}"),
    );
    let caller = "Feature: F\n  Scenario: S\n    Given I call scenario \"Login\" from feature \"Authentication\"\n";
    let output = project.session().preprocess(caller);
    line_index(&output, "    Given I am on the login page");
    assert!(!output.contains(WARNING_MARKER));
    assert!(!output.contains('\u{feff}'));
}

#[cfg(unix)]
#[expect(clippy::expect_used, reason = "behavioural tests use explicit panics")]
#[test]
fn unreadable_search_directory_leaves_an_error_comment() {
    use std::fs::{self, Permissions};
    use std::os::unix::fs::PermissionsExt;

    let project = Project::empty().with("Features/locked/authentication.feature", AUTHENTICATION);
    let locked = project.root().join("Features/locked");
    fs::set_permissions(&locked, Permissions::from_mode(0o000)).expect("lock directory");
    let readable = fs::read_dir(&locked).is_ok();
    let caller = "Feature: F\n  Scenario: S\n    Given I call scenario \"Login\" from feature \"Authentication\"\n    Then it still runs\n";
    let output = (!readable).then(|| project.session().preprocess(caller));
    fs::set_permissions(&locked, Permissions::from_mode(0o755)).expect("unlock directory");

    // Privileged users read the directory regardless of its mode.
    let Some(output) = output else {
        return;
    };
    let error = lines(&output)
        .into_iter()
        .find(|line| line.trim_start().starts_with(ERROR_MARKER))
        .unwrap_or_else(|| panic!("no error comment in:\n{output}"));
    assert!(
        error.starts_with("    # ERROR: feature discovery failed: "),
        "{error}"
    );
    assert!(!output.contains("I call scenario"));
    assert!(!output.contains(WARNING_MARKER));
    line_index(&output, "  Scenario: S");
    line_index(&output, "    Then it still runs");
}
