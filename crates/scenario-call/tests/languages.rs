//! Behavioural tests for scenario calls written in localised Gherkin.

mod support;

use rstest::{fixture, rstest};
use scenario_call::EXPANSION_MARKER;
use support::{Project, line_index};

const AUTHENTIFIZIERUNG: &str = concat!(
    "# language: de-DE\n",
    "Funktionalität: Authentifizierung\n",
    "\n",
    "  Szenario: Anmeldung\n",
    "    Angenommen ich bin auf der Anmeldeseite\n",
    "    Wenn ich die Anmeldedaten eingebe\n",
    "    Dann sollte ich angemeldet sein\n",
);

const AUTHENTIFICATION: &str = concat!(
    "# language: fr\n",
    "Fonctionnalité: Authentification\n",
    "  Scénario: Connexion\n",
    "    Soit je suis sur la page de connexion\n",
    "    Quand je saisis mes identifiants\n",
    "    Alors je suis connecté\n",
);

const AUTHENTICATIE: &str = concat!(
    "#language: nl\n",
    "Functionaliteit: Authenticatie\n",
    "  Scenario: Inloggen\n",
    "    Gegeven ik ben op de inlogpagina\n",
    "    Als ik mijn gegevens invoer\n",
    "    Dan ben ik ingelogd\n",
);

const AUTENTICACION: &str = concat!(
    "# language: es\n",
    "Característica: Autenticación\n",
    "  Escenario: Inicio de sesión\n",
    "    Dado que estoy en la página de inicio\n",
    "    Cuando introduzco mis credenciales\n",
    "    Entonces estoy dentro\n",
);

const KONTO: &str = concat!(
    "# language: de-DE\n",
    "Feature: Konto\n",
    "  Scenario: Anlegen\n",
    "    Angenommen ein neues Konto\n",
    "    Dann ist das Konto leer\n",
);

#[fixture]
fn project() -> Project {
    Project::empty()
        .with("Features/de/authentifizierung.feature", AUTHENTIFIZIERUNG)
        .with("Features/fr/authentification.feature", AUTHENTIFICATION)
        .with("Features/nl/authenticatie.feature", AUTHENTICATIE)
        .with("Features/es/autenticacion.feature", AUTENTICACION)
        .with("Features/de/konto.feature", KONTO)
}

#[rstest]
fn expands_german_call(project: Project) {
    let caller = concat!(
        "#language: de-DE\n",
        "Funktionalität: Einkauf\n",
        "  Szenario: Bestellen\n",
        "    Angenommen ich rufe Szenario \"Anmeldung\" aus Feature \"Authentifizierung\"\n",
        "    Wenn ich bestelle\n",
    );
    let output = project.session().preprocess(caller);
    line_index(
        &output,
        "    # Expanded from scenario call: \"Anmeldung\" from feature \"Authentifizierung\"",
    );
    let first = line_index(&output, "    Angenommen ich bin auf der Anmeldeseite");
    assert_eq!(line_index(&output, "    Wenn ich die Anmeldedaten eingebe"), first + 1);
    assert_eq!(line_index(&output, "    Dann sollte ich angemeldet sein"), first + 2);
    assert!(!output.contains("ich rufe Szenario"));
}

#[rstest]
#[case::german_canonical(
    "# language: de\nFunktionalität: X\n  Szenario: Y\n",
    "    Und ich rufe Szenario \"Anmeldung\" auf aus Funktionalität \"Authentifizierung\"",
    "Angenommen ich bin auf der Anmeldeseite"
)]
#[case::french(
    "# language: fr\nFonctionnalité: X\n  Scénario: Y\n",
    "    Soit j'appelle le scénario \"Connexion\" de la fonctionnalité \"Authentification\"",
    "Soit je suis sur la page de connexion"
)]
#[case::dutch(
    "# language: nl\nFunctionaliteit: X\n  Scenario: Y\n",
    "    Gegeven ik roep scenario \"Inloggen\" aan uit functionaliteit \"Authenticatie\"",
    "Gegeven ik ben op de inlogpagina"
)]
#[case::dutch_particle_first(
    "# language: nl\nFunctionaliteit: X\n  Scenario: Y\n",
    "    Gegeven ik roep scenario aan \"Inloggen\" uit functionaliteit \"Authenticatie\"",
    "Gegeven ik ben op de inlogpagina"
)]
#[case::spanish(
    "# language: es\nCaracterística: X\n  Escenario: Y\n",
    "    Dado llamo al escenario \"Inicio de sesión\" de la característica \"Autenticación\"",
    "Dado que estoy en la página de inicio"
)]
#[case::german_keyword_english_phrase(
    "# language: de\nFunktionalität: X\n  Szenario: Y\n",
    "    Angenommen I call scenario \"Anmeldung\" from feature \"Authentifizierung\"",
    "Angenommen ich bin auf der Anmeldeseite"
)]
#[case::italian_english_phrase(
    "# language: it\nFunzionalità: X\n  Scenario: Y\n",
    "    Dato I call scenario \"Connexion\" from feature \"Authentification\"",
    "Soit je suis sur la page de connexion"
)]
fn expands_localised_calls(
    project: Project,
    #[case] header: &str,
    #[case] call: &str,
    #[case] first_step: &str,
) {
    let caller = format!("{header}{call}\n");
    let output = project.session().preprocess(&caller);
    assert_eq!(output.matches(EXPANSION_MARKER).count(), 1, "{output}");
    line_index(&output, &format!("    {first_step}"));
}

#[rstest]
fn caller_and_callee_languages_are_independent(project: Project) {
    let caller = concat!(
        "# language: fr\n",
        "Fonctionnalité: Panier\n",
        "  Scénario: Commander\n",
        "    Soit j'appelle le scénario \"Anmeldung\" de la fonctionnalité \"Authentifizierung\"\n",
    );
    let output = project.session().preprocess(caller);
    line_index(&output, "    Angenommen ich bin auf der Anmeldeseite");
    line_index(&output, "    Dann sollte ich angemeldet sein");
}

#[rstest]
fn english_headers_in_localised_documents(project: Project) {
    let caller = concat!(
        "# language: de-DE\n",
        "Feature: Bank\n",
        "  Scenario: Überweisen\n",
        "    Angenommen ich rufe Szenario \"Anlegen\" aus Feature \"Konto\"\n",
    );
    let output = project.session().preprocess(caller);
    line_index(&output, "    Angenommen ein neues Konto");
    line_index(&output, "    Dann ist das Konto leer");
}

#[rstest]
fn wildcard_keyword_does_not_call(project: Project) {
    let caller = "Feature: F\n  Scenario: S\n    * I call scenario \"Anmeldung\" from feature \"Authentifizierung\"\n";
    let mut session = project.session();
    assert!(!session.has_scenario_calls(caller));
    assert_eq!(session.preprocess(caller), format!("{caller}\n"));
}

#[rstest]
fn unknown_language_reads_as_english(project: Project) {
    let caller = concat!(
        "# language: tlh\n",
        "Feature: F\n",
        "  Scenario: S\n",
        "    Given I call scenario \"Anlegen\" from feature \"Konto\"\n",
    );
    let output = project.session().preprocess(caller);
    line_index(&output, "    Angenommen ein neues Konto");
}

#[rstest]
fn phrases_of_other_languages_are_not_mixed(project: Project) {
    let caller = concat!(
        "# language: de\n",
        "Funktionalität: F\n",
        "  Szenario: S\n",
        "    Angenommen j'appelle le scénario \"Connexion\" de la fonctionnalité \"Authentification\"\n",
    );
    let mut session = project.session();
    assert!(!session.has_scenario_calls(caller));
}

#[rstest]
fn callers_may_start_with_a_byte_order_mark(project: Project) {
    let caller = concat!(
        "\u{feff}# language: de-DE\n",
        "Funktionalität: Einkauf\n",
        "  Szenario: Bestellen\n",
        "    Angenommen ich rufe Szenario \"Anmeldung\" aus Feature \"Authentifizierung\"\n",
    );
    let mut session = project.session();
    assert!(session.has_scenario_calls(caller));
    let output = session.preprocess(caller);
    assert!(output.starts_with("\u{feff}# language: de-DE\n"));
    line_index(&output, "    Angenommen ich bin auf der Anmeldeseite");
    assert!(!output.contains("ich rufe Szenario"));
}

#[test]
fn localised_callees_may_start_with_a_byte_order_mark() {
    let project = Project::empty().with(
        "Features/de/authentifizierung.feature",
        &format!("\u{feff}{AUTHENTIFIZIERUNG}"),
    );
    let caller = "Feature: F\n  Scenario: S\n    Given I call scenario \"Anmeldung\" from feature \"Authentifizierung\"\n";
    let output = project.session().preprocess(caller);
    line_index(&output, "    Dann sollte ich angemeldet sein");
}
