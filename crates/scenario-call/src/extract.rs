//! Line-based extraction of a scenario's steps from feature text.
//!
//! The walk is a small state machine rather than a Gherkin parse: the
//! document being read may itself contain unexpanded calls, and only the
//! step lines (with their tables and doc-strings) are needed.

use std::ops::ControlFlow;

use scenario_call_patterns::{Dialect, Section};

use crate::error::ExpansionError;

/// Extra indentation given to data-table rows so they stay nested under the
/// step that owns them.
pub const TABLE_ROW_INDENT: &str = "    ";

/// Opening or closing fence of a doc-string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocStringDelimiter {
    /// `"""`
    Quotes,
    /// ```` ``` ````
    Backticks,
}

impl DocStringDelimiter {
    /// Recognise a fence at the start of a line. A content type may follow
    /// the fence, as in ```` ```json ````.
    #[must_use]
    pub fn at_start(line: &str) -> Option<Self> {
        let trimmed = line.trim_start();
        [Self::Quotes, Self::Backticks]
            .into_iter()
            .find(|delimiter| trimmed.starts_with(delimiter.fence()))
    }

    /// The fence text.
    #[must_use]
    pub const fn fence(self) -> &'static str {
        match self {
            Self::Quotes => "\"\"\"",
            Self::Backticks => "```",
        }
    }
}

/// Title declared by the first `Feature:` header of a document.
///
/// Both the dialect's own feature keywords and the English ones are
/// recognised. Returns `None` when the document has no feature header or the
/// title is empty.
///
/// # Examples
///
/// ```
/// use scenario_call::feature_title;
/// use scenario_call_patterns::DialectCache;
///
/// let mut dialects = DialectCache::default();
/// let text = "# language: de\nFunktionalität: Anmeldung\n";
/// assert_eq!(feature_title(text, &dialects.get("de")), Some("Anmeldung"));
/// ```
#[must_use]
pub fn feature_title<'a>(content: &'a str, dialect: &Dialect) -> Option<&'a str> {
    content.split('\n').find_map(|line| match dialect.section(line) {
        Some((Section::Feature, title)) if !title.is_empty() => Some(title),
        _ => None,
    })
}

fn same_title(found: &str, wanted: &str) -> bool {
    found.to_lowercase() == wanted.trim().to_lowercase()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WalkState {
    Outside,
    InFeature,
    InScenario,
    InDocString(DocStringDelimiter),
}

/// Walker collecting the steps of one scenario in one feature.
#[derive(Debug)]
struct ScenarioWalk<'a> {
    dialect: &'a Dialect,
    feature: &'a str,
    scenario: &'a str,
    state: WalkState,
    expecting_arguments: bool,
    feature_matched: bool,
    scenario_matched: bool,
    steps: Vec<String>,
}

impl<'a> ScenarioWalk<'a> {
    fn new(dialect: &'a Dialect, feature: &'a str, scenario: &'a str) -> Self {
        Self {
            dialect,
            feature,
            scenario,
            state: WalkState::Outside,
            expecting_arguments: false,
            feature_matched: false,
            scenario_matched: false,
            steps: Vec::new(),
        }
    }

    fn feed(&mut self, line: &str) -> ControlFlow<()> {
        let trimmed = line.trim();
        match self.state {
            WalkState::Outside => {
                if matches!(
                    self.dialect.section(trimmed),
                    Some((Section::Feature, title)) if same_title(title, self.feature)
                ) {
                    self.feature_matched = true;
                    self.state = WalkState::InFeature;
                }
            }
            WalkState::InFeature => match self.dialect.section(trimmed) {
                Some((section, title))
                    if section.is_scenario() && same_title(title, self.scenario) =>
                {
                    self.scenario_matched = true;
                    self.state = WalkState::InScenario;
                }
                Some((Section::Feature, title)) if !same_title(title, self.feature) => {
                    self.state = WalkState::Outside;
                }
                _ => {}
            },
            WalkState::InScenario => return self.feed_scenario_line(trimmed),
            WalkState::InDocString(delimiter) => {
                self.steps.push(trimmed.to_owned());
                if trimmed.starts_with(delimiter.fence()) {
                    self.state = WalkState::InScenario;
                }
            }
        }
        ControlFlow::Continue(())
    }

    fn feed_scenario_line(&mut self, trimmed: &str) -> ControlFlow<()> {
        if let Some(delimiter) = DocStringDelimiter::at_start(trimmed) {
            self.steps.push(trimmed.to_owned());
            self.state = WalkState::InDocString(delimiter);
            return ControlFlow::Continue(());
        }
        if trimmed.starts_with('|') {
            self.steps.push(format!("{TABLE_ROW_INDENT}{trimmed}"));
            self.expecting_arguments = true;
            return ControlFlow::Continue(());
        }
        if self.dialect.section(trimmed).is_some() {
            return ControlFlow::Break(());
        }
        if self.dialect.is_step_line(trimmed) {
            self.steps.push(trimmed.to_owned());
            self.expecting_arguments = false;
        } else if self.expecting_arguments && !trimmed.is_empty() {
            self.expecting_arguments = false;
        }
        ControlFlow::Continue(())
    }

    fn finish(self) -> Result<Vec<String>, ExpansionError> {
        if !self.feature_matched {
            return Err(ExpansionError::FeatureNotFound {
                feature: self.feature.to_owned(),
            });
        }
        if !self.scenario_matched {
            return Err(ExpansionError::ScenarioNotFound {
                scenario: self.scenario.to_owned(),
                feature: self.feature.to_owned(),
            });
        }
        if self.steps.is_empty() {
            return Err(ExpansionError::EmptyScenario {
                scenario: self.scenario.to_owned(),
                feature: self.feature.to_owned(),
            });
        }
        Ok(self.steps)
    }
}

/// Collect the step lines of `scenario` inside `feature` from `content`.
///
/// Steps are returned trimmed, in document order. Data-table rows carry
/// [`TABLE_ROW_INDENT`]; doc-string lines, fences included, are trimmed.
/// Tags, comments and description text are skipped. The walk stops at the
/// next section header after the scenario, so an outline's `Examples:` rows
/// are not collected. Titles match case-insensitively.
///
/// # Errors
///
/// Returns [`ExpansionError::FeatureNotFound`] if no feature header carries
/// the title, [`ExpansionError::ScenarioNotFound`] if the feature has no
/// such scenario and [`ExpansionError::EmptyScenario`] if the scenario has
/// no step lines.
///
/// # Examples
///
/// ```
/// use scenario_call::scenario_steps;
/// use scenario_call_patterns::Dialect;
///
/// let text = "Feature: Auth\n  Scenario: Login\n    Given a user\n    | name |\n    | bob  |\n";
/// let steps = scenario_steps(text, &Dialect::english(), "Login", "Auth").unwrap();
/// assert_eq!(steps, ["Given a user", "    | name |", "    | bob  |"]);
/// ```
pub fn scenario_steps(
    content: &str,
    dialect: &Dialect,
    scenario: &str,
    feature: &str,
) -> Result<Vec<String>, ExpansionError> {
    let mut walk = ScenarioWalk::new(dialect, feature, scenario);
    for line in content.split('\n') {
        if walk.feed(line).is_break() {
            break;
        }
    }
    walk.finish()
}

#[cfg(test)]
#[expect(
    clippy::expect_used,
    reason = "tests require explicit panic messages for debugging failures"
)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};
    use scenario_call_patterns::{DialectSource, EmbeddedDialects};

    #[fixture]
    fn english() -> Dialect {
        Dialect::english()
    }

    const AUTH: &str = "\
Feature: Authentication

  Background:
    Given the service is running

  @smoke @regression
  Scenario: Login
    A description line that is not a step.
    Given I am on the login page
    # a comment
    When I enter valid credentials
    Then I should be logged in

  Scenario: Logout
    Given I am logged in
    When I log out
";

    #[rstest]
    fn collects_only_the_named_scenario(english: Dialect) {
        let steps = scenario_steps(AUTH, &english, "Login", "Authentication")
            .expect("scenario should be found");
        assert_eq!(
            steps,
            [
                "Given I am on the login page",
                "When I enter valid credentials",
                "Then I should be logged in",
            ]
        );
        assert!(steps.iter().all(|step| !step.contains("@smoke")));
    }

    #[rstest]
    #[case::exact("Logout", "Authentication")]
    #[case::lower("logout", "authentication")]
    #[case::upper("LOGOUT", "AUTHENTICATION")]
    fn titles_match_case_insensitively(
        english: Dialect,
        #[case] scenario: &str,
        #[case] feature: &str,
    ) {
        let steps = scenario_steps(AUTH, &english, scenario, feature).expect("scenario");
        assert_eq!(steps, ["Given I am logged in", "When I log out"]);
    }

    #[rstest]
    fn reports_missing_feature(english: Dialect) {
        let err = scenario_steps(AUTH, &english, "Login", "Billing").expect_err("no such feature");
        assert!(matches!(err, ExpansionError::FeatureNotFound { feature } if feature == "Billing"));
    }

    #[rstest]
    fn reports_missing_scenario(english: Dialect) {
        let err = scenario_steps(AUTH, &english, "Register", "Authentication")
            .expect_err("no such scenario");
        assert!(matches!(
            err,
            ExpansionError::ScenarioNotFound { scenario, .. } if scenario == "Register"
        ));
    }

    #[rstest]
    fn background_is_not_a_scenario(english: Dialect) {
        let err = scenario_steps(AUTH, &english, "", "Authentication").expect_err("no match");
        assert!(matches!(err, ExpansionError::ScenarioNotFound { .. }));
    }

    #[rstest]
    fn reports_empty_scenario(english: Dialect) {
        let text = "Feature: F\n  Scenario: Empty\n    Just prose.\n  Scenario: Other\n    Given x\n";
        let err = scenario_steps(text, &english, "Empty", "F").expect_err("no steps");
        assert!(matches!(err, ExpansionError::EmptyScenario { .. }));
    }

    #[rstest]
    fn indents_table_rows(english: Dialect) {
        let text = "\
Feature: UserManagement
  Scenario: Create User
    Given I have the following user data:
      | Field | Value |
      | Name  | Ann   |
      | Email | a@b.c |
      | Role  | Admin |
    When I create the user
";
        let steps = scenario_steps(text, &english, "Create User", "UserManagement")
            .expect("scenario");
        assert_eq!(
            steps,
            [
                "Given I have the following user data:",
                "    | Field | Value |",
                "    | Name  | Ann   |",
                "    | Email | a@b.c |",
                "    | Role  | Admin |",
                "When I create the user",
            ]
        );
    }

    #[rstest]
    #[case::quotes("\"\"\"")]
    #[case::backticks("```")]
    fn keeps_doc_string_lines(english: Dialect, #[case] fence: &str) {
        let text = format!(
            "Feature: Api\n  Scenario: Post\n    Given the payload\n      {fence}json\n      \
             Scenario: not a header\n      Then not a step either\n      {fence}\n    \
             When I post it\n  Scenario: Next\n    Given nothing\n"
        );
        let steps = scenario_steps(&text, &english, "Post", "Api").expect("scenario");
        assert_eq!(
            steps,
            [
                "Given the payload".to_owned(),
                format!("{fence}json"),
                "Scenario: not a header".to_owned(),
                "Then not a step either".to_owned(),
                fence.to_owned(),
                "When I post it".to_owned(),
            ]
        );
    }

    #[rstest]
    fn doc_string_closes_only_on_its_own_fence(english: Dialect) {
        let text = "Feature: F\n  Scenario: S\n    Given text\n      \"\"\"\n      ```\n      \"\"\"\n    Then done\n";
        let steps = scenario_steps(text, &english, "S", "F").expect("scenario");
        assert_eq!(steps, ["Given text", "\"\"\"", "```", "\"\"\"", "Then done"]);
    }

    #[rstest]
    #[case::examples("Examples:")]
    #[case::rule("Rule: Another rule")]
    #[case::feature("Feature: Another")]
    #[case::background("Background:")]
    #[case::outline("Scenario Outline: Next")]
    fn any_section_header_ends_the_walk(english: Dialect, #[case] header: &str) {
        let text = format!(
            "Feature: F\n  Scenario Outline: S\n    Given <x>\n  {header}\n    Given leaked\n    | x |\n"
        );
        let steps = scenario_steps(&text, &english, "S", "F").expect("scenario");
        assert_eq!(steps, ["Given <x>"]);
    }

    #[rstest]
    fn nested_calls_are_copied_verbatim(english: Dialect) {
        let text = "Feature: F\n  Scenario: Outer\n    Given I call scenario \"Inner\" from feature \"G\"\n";
        let steps = scenario_steps(text, &english, "Outer", "F").expect("scenario");
        assert_eq!(steps, ["Given I call scenario \"Inner\" from feature \"G\""]);
    }

    #[rstest]
    fn tolerates_crlf(english: Dialect) {
        let text = "Feature: F\r\n  Scenario: S\r\n    Given a\r\n    | k |\r\n    Then b\r\n";
        let steps = scenario_steps(text, &english, "S", "F").expect("scenario");
        assert_eq!(steps, ["Given a", "    | k |", "Then b"]);
    }

    #[test]
    fn uses_target_dialect_keywords() {
        let german = EmbeddedDialects::bundled()
            .lookup("de")
            .expect("bundled dialect should exist");
        let text = "\
# language: de-DE
Funktionalität: Authentifizierung
  Szenario: Anmeldung
    Angenommen ich bin auf der Anmeldeseite
    Wenn ich die Anmeldedaten eingebe
    Dann sollte ich angemeldet sein
";
        let steps = scenario_steps(text, &german, "Anmeldung", "Authentifizierung")
            .expect("scenario");
        assert_eq!(
            steps,
            [
                "Angenommen ich bin auf der Anmeldeseite",
                "Wenn ich die Anmeldedaten eingebe",
                "Dann sollte ich angemeldet sein",
            ]
        );
    }

    #[test]
    fn english_headers_work_in_other_dialects() {
        let german = EmbeddedDialects::bundled()
            .lookup("de")
            .expect("bundled dialect should exist");
        let text = "# language: de-DE\nFeature: Konto\n  Scenario: Anlegen\n    Angenommen ein Konto\n";
        let steps = scenario_steps(text, &german, "Anlegen", "Konto").expect("scenario");
        assert_eq!(steps, ["Angenommen ein Konto"]);
    }

    #[rstest]
    #[case::english("Feature: Auth\nScenario: x", Some("Auth"))]
    #[case::after_comments("# language: en\n\n  Feature:   Spaced Title  \n", Some("Spaced Title"))]
    #[case::missing("Scenario: Lonely\n  Given x", None)]
    #[case::empty_title("Feature:\n", None)]
    #[case::first_wins("Feature: One\nFeature: Two\n", Some("One"))]
    fn reads_feature_title(english: Dialect, #[case] text: &str, #[case] expected: Option<&str>) {
        assert_eq!(feature_title(text, &english), expected);
    }

    #[rstest]
    #[case::quotes("  \"\"\"", Some(DocStringDelimiter::Quotes))]
    #[case::backticks("```markdown", Some(DocStringDelimiter::Backticks))]
    #[case::two_quotes("\"\"", None)]
    #[case::step("Given \"\"\"", None)]
    fn recognises_doc_string_fences(#[case] line: &str, #[case] expected: Option<DocStringDelimiter>) {
        assert_eq!(DocStringDelimiter::at_start(line), expected);
    }
}
