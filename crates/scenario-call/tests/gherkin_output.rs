//! Checks that expanded documents remain valid Gherkin.

mod support;

use gherkin::{GherkinEnv, StepType};
use support::Project;

const SHARED: &str = concat!(
    "Feature: Shared\n",
    "  Scenario: Prepare account\n",
    "    Given a user named \"ann\"\n",
    "    And the following roles:\n",
    "      | role   |\n",
    "      | admin  |\n",
    "    When the account is saved\n",
);

#[expect(clippy::expect_used, reason = "behavioural tests use explicit panics")]
#[test]
fn expanded_document_parses() {
    let project = Project::empty().with("Features/shared.feature", SHARED);
    let caller = concat!(
        "Feature: Billing\n",
        "\n",
        "  Scenario: Charge the account\n",
        "    Given I call scenario \"Prepare account\" from feature \"Shared\"\n",
        "    Then the account is charged\n",
    );

    let output = project.session().preprocess(caller);
    let feature = gherkin::Feature::parse(output.as_str(), GherkinEnv::default())
        .expect("expanded text should parse");

    let scenario = feature.scenarios.first().expect("one scenario");
    let steps: Vec<(StepType, &str)> = scenario
        .steps
        .iter()
        .map(|step| (step.ty, step.value.as_str()))
        .collect();
    assert_eq!(
        steps,
        [
            (StepType::Given, "a user named \"ann\""),
            (StepType::Given, "the following roles:"),
            (StepType::When, "the account is saved"),
            (StepType::Then, "the account is charged"),
        ]
    );
    let table = scenario
        .steps
        .get(1)
        .and_then(|step| step.table.as_ref())
        .expect("roles table");
    assert_eq!(table.rows.len(), 2);
}

#[expect(clippy::expect_used, reason = "behavioural tests use explicit panics")]
#[test]
fn unresolved_call_output_parses() {
    let project = Project::empty();
    let caller = concat!(
        "Feature: Billing\n",
        "  Scenario: Charge\n",
        "    Given I call scenario \"Missing\" from feature \"Nowhere\"\n",
        "    Then the account is charged\n",
    );

    let output = project.session().preprocess(caller);
    let feature = gherkin::Feature::parse(output.as_str(), GherkinEnv::default())
        .expect("expanded text should parse");
    let scenario = feature.scenarios.first().expect("one scenario");
    assert_eq!(scenario.steps.len(), 1);
}
