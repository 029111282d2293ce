//! Scenario-call phrase tables and the per-dialect call grammar.
//!
//! A call step has the shape
//! `<step keyword> <call phrase> "<scenario>" <from phrase> "<feature>"`,
//! for example `Angenommen ich rufe Szenario "Anmeldung" aus Feature "Auth"`.
//! Step keywords come from the caller's [`Dialect`]; the surrounding phrases
//! come from a [`CallPhraseTable`]. English phrases are always accepted so a
//! German document may still write `Angenommen I call scenario "…" from
//! feature "…"`.

use std::collections::BTreeMap;

use regex::Regex;
use serde::Deserialize;

use crate::dialect::Dialect;
use crate::errors::PatternError;
use crate::language::DEFAULT_LANGUAGE;

/// Literal phrases framing the scenario and feature names in one language.
///
/// Every `call` phrase combines with every `from` phrase.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CallPhrases {
    /// Phrases between the step keyword and the quoted scenario name.
    pub call: Vec<String>,
    /// Phrases between the quoted scenario name and the quoted feature name.
    pub from: Vec<String>,
}

impl CallPhrases {
    /// Build a phrase set from string slices.
    #[must_use]
    pub fn new(call: &[&str], from: &[&str]) -> Self {
        Self {
            call: call.iter().map(|phrase| (*phrase).to_owned()).collect(),
            from: from.iter().map(|phrase| (*phrase).to_owned()).collect(),
        }
    }

    fn extend(&mut self, other: &Self) {
        for phrase in &other.call {
            if !self.call.contains(phrase) {
                self.call.push(phrase.clone());
            }
        }
        for phrase in &other.from {
            if !self.from.contains(phrase) {
                self.from.push(phrase.clone());
            }
        }
    }
}

/// Call phrases keyed by dialect tag.
///
/// The table is configuration data: [`CallPhraseTable::builtin`] covers
/// English, German, French, Spanish and Dutch, and hosts may add further
/// languages with [`CallPhraseTable::with_language`] or by deserialising a
/// JSON object of the form `{"it": {"call": [...], "from": [...]}}`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct CallPhraseTable {
    languages: BTreeMap<String, CallPhrases>,
}

impl Default for CallPhraseTable {
    fn default() -> Self {
        Self::builtin()
    }
}

impl CallPhraseTable {
    /// An empty table. English phrases are still required for grammars to
    /// compile, so callers normally start from [`CallPhraseTable::builtin`].
    #[must_use]
    pub fn empty() -> Self {
        Self {
            languages: BTreeMap::new(),
        }
    }

    /// Phrases shipped with the crate.
    #[must_use]
    pub fn builtin() -> Self {
        Self::empty()
            .with_language("en", CallPhrases::new(&["I call scenario"], &["from feature"]))
            .with_language(
                "de",
                CallPhrases::new(
                    &["ich rufe Szenario"],
                    &[
                        "auf aus Funktionalität",
                        "auf von Funktionalität",
                        "aus Funktionalität",
                        "von Funktionalität",
                        "auf aus Feature",
                        "aus Feature",
                        "von Feature",
                    ],
                ),
            )
            .with_language(
                "fr",
                CallPhrases::new(
                    &["j'appelle le scénario", "j\u{2019}appelle le scénario"],
                    &["de la fonctionnalité"],
                ),
            )
            .with_language(
                "es",
                CallPhrases::new(&["llamo al escenario"], &["de la característica"]),
            )
            .with_language(
                "nl",
                CallPhrases::new(
                    &["ik roep scenario aan", "ik roep scenario"],
                    &[
                        "aan uit functionaliteit",
                        "aan van functionaliteit",
                        "uit functionaliteit",
                        "van functionaliteit",
                        "uit feature",
                        "van feature",
                    ],
                ),
            )
    }

    /// Add phrases for a dialect tag, merging with any already present.
    #[must_use]
    pub fn with_language(mut self, tag: &str, phrases: CallPhrases) -> Self {
        self.languages
            .entry(tag.to_owned())
            .or_default()
            .extend(&phrases);
        self
    }

    /// Merge every language of `other` into this table.
    #[must_use]
    pub fn merged(mut self, other: &Self) -> Self {
        for (tag, phrases) in &other.languages {
            self.languages.entry(tag.clone()).or_default().extend(phrases);
        }
        self
    }

    /// Phrases registered for exactly this tag.
    #[must_use]
    pub fn phrases(&self, tag: &str) -> Option<&CallPhrases> {
        self.languages.get(tag)
    }

    /// Tags with registered phrases.
    pub fn languages(&self) -> impl Iterator<Item = &str> {
        self.languages.keys().map(String::as_str)
    }

    /// Phrases a document in `tag` may use: its own plus the English ones.
    fn effective(&self, tag: &str) -> CallPhrases {
        let mut phrases = CallPhrases::default();
        if let Some(own) = self.languages.get(tag) {
            phrases.extend(own);
        }
        if let Some(english) = self.languages.get(DEFAULT_LANGUAGE) {
            phrases.extend(english);
        }
        phrases
    }
}

/// A scenario call parsed from one step line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScenarioCallReference {
    /// Quoted scenario name, verbatim.
    pub scenario: String,
    /// Quoted feature name, verbatim.
    pub feature: String,
    /// Step keyword the line starts with, as written.
    pub keyword: String,
}

/// Compiled matcher for scenario-call steps in one dialect.
///
/// # Examples
///
/// ```
/// use scenario_call_patterns::{CallGrammar, CallPhraseTable, DialectCache};
///
/// let mut dialects = DialectCache::default();
/// let grammar = CallGrammar::new(&dialects.get("de"), &CallPhraseTable::builtin()).unwrap();
/// let call = grammar
///     .parse(r#"  Angenommen ich rufe Szenario "Anmeldung" aus Feature "Auth""#)
///     .unwrap();
/// assert_eq!(call.scenario, "Anmeldung");
/// assert_eq!(call.feature, "Auth");
/// assert_eq!(call.keyword, "Angenommen");
/// ```
#[derive(Debug, Clone)]
pub struct CallGrammar {
    tag: String,
    regex: Regex,
}

impl CallGrammar {
    /// Compile the grammar for `dialect` using the phrases in `table`.
    ///
    /// # Errors
    ///
    /// Returns [`PatternError::NoKeywords`] when the dialect has no
    /// non-wildcard step keywords, [`PatternError::NoPhrases`] when neither
    /// the dialect nor English has phrases, and [`PatternError::Regex`] if
    /// the assembled expression is rejected.
    pub fn new(dialect: &Dialect, table: &CallPhraseTable) -> Result<Self, PatternError> {
        let keywords = alternation(dialect.call_keywords());
        if keywords.is_empty() {
            return Err(PatternError::NoKeywords(dialect.tag().to_owned()));
        }
        let phrases = table.effective(dialect.tag());
        let call = alternation(phrases.call.iter().map(String::as_str));
        let from = alternation(phrases.from.iter().map(String::as_str));
        if call.is_empty() || from.is_empty() {
            return Err(PatternError::NoPhrases(dialect.tag().to_owned()));
        }
        let source = format!(
            r#"(?i)^(?P<keyword>{keywords})\s+(?:{call})\s+"(?P<scenario>[^"]+)"\s+(?:{from})\s+"(?P<feature>[^"]+)""#
        );
        Ok(Self {
            tag: dialect.tag().to_owned(),
            regex: Regex::new(&source)?,
        })
    }

    /// Tag of the dialect the grammar was compiled for.
    #[must_use]
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Whether the line is a scenario call.
    #[must_use]
    pub fn is_call(&self, line: &str) -> bool {
        self.regex.is_match(line.trim())
    }

    /// Parse a scenario call from a step line.
    ///
    /// Returns `None` for ordinary steps and for lines that only resemble a
    /// call (missing quotes, missing keyword).
    #[must_use]
    pub fn parse(&self, line: &str) -> Option<ScenarioCallReference> {
        let captures = self.regex.captures(line.trim())?;
        Some(ScenarioCallReference {
            scenario: captures.name("scenario")?.as_str().to_owned(),
            feature: captures.name("feature")?.as_str().to_owned(),
            keyword: captures.name("keyword")?.as_str().to_owned(),
        })
    }
}

/// Join phrases into a regex alternation, longest first, letting each space
/// match any run of whitespace.
fn alternation<'a>(phrases: impl IntoIterator<Item = &'a str>) -> String {
    let mut words: Vec<&str> = phrases
        .into_iter()
        .map(str::trim)
        .filter(|phrase| !phrase.is_empty())
        .collect();
    words.sort_by_key(|phrase| std::cmp::Reverse(phrase.chars().count()));
    words.dedup();
    words
        .iter()
        .map(|phrase| {
            phrase
                .split_whitespace()
                .map(regex::escape)
                .collect::<Vec<_>>()
                .join(r"\s+")
        })
        .collect::<Vec<_>>()
        .join("|")
}

#[cfg(test)]
#[expect(
    clippy::expect_used,
    reason = "tests require explicit panic messages for debugging failures"
)]
mod tests {
    use super::*;
    use crate::dialect::{DialectSource, EmbeddedDialects};
    use rstest::rstest;

    fn grammar(tag: &str) -> CallGrammar {
        let dialect = EmbeddedDialects::bundled()
            .lookup(tag)
            .expect("bundled dialect should exist");
        CallGrammar::new(&dialect, &CallPhraseTable::builtin()).expect("grammar should compile")
    }

    #[rstest]
    #[case::given("en", r#"Given I call scenario "Login" from feature "Auth""#, "Login", "Auth")]
    #[case::when("en", r#"When I call scenario "Logout" from feature "Auth""#, "Logout", "Auth")]
    #[case::then("en", r#"Then I call scenario "Setup" from feature "Test""#, "Setup", "Test")]
    #[case::and("en", r#"And I call scenario "Cleanup" from feature "Test""#, "Cleanup", "Test")]
    #[case::but("en", r#"But I call scenario "Reset" from feature "Test""#, "Reset", "Test")]
    #[case::lowercase("en", r#"given i CALL scenario "Login" FROM feature "Auth""#, "Login", "Auth")]
    #[case::indented("en", "    Given I call scenario \"Login\" from feature \"Auth\"\r", "Login", "Auth")]
    #[case::wide_spacing("en", r#"Given  I  call scenario   "A b"  from   feature "C d""#, "A b", "C d")]
    #[case::german(
        "de",
        r#"Angenommen ich rufe Szenario "Anmeldung" aus Feature "Authentifizierung""#,
        "Anmeldung",
        "Authentifizierung"
    )]
    #[case::german_canonical(
        "de",
        r#"Und ich rufe Szenario "Login" auf aus Funktionalität "Auth""#,
        "Login",
        "Auth"
    )]
    #[case::german_keyword_english_phrase(
        "de",
        r#"Gegeben sei I call scenario "Setup" from feature "Common""#,
        "Setup",
        "Common"
    )]
    #[case::french(
        "fr",
        r#"Soit j'appelle le scénario "Connexion" de la fonctionnalité "Authentification""#,
        "Connexion",
        "Authentification"
    )]
    #[case::french_typographic(
        "fr",
        "Et j\u{2019}appelle le scénario \"Connexion\" de la fonctionnalité \"Auth\"",
        "Connexion",
        "Auth"
    )]
    #[case::spanish(
        "es",
        r#"Dado llamo al escenario "Inicio de sesión" de la característica "Autenticación""#,
        "Inicio de sesión",
        "Autenticación"
    )]
    #[case::dutch_particle_after_name(
        "nl",
        r#"Gegeven ik roep scenario "Inloggen" aan uit functionaliteit "Authenticatie""#,
        "Inloggen",
        "Authenticatie"
    )]
    #[case::dutch_particle_before_name(
        "nl",
        r#"Gegeven ik roep scenario aan "Inloggen" uit functionaliteit "Authenticatie""#,
        "Inloggen",
        "Authenticatie"
    )]
    #[case::dutch_feature(
        "nl",
        r#"Gegeven ik roep scenario "Inloggen" van feature "Authenticatie""#,
        "Inloggen",
        "Authenticatie"
    )]
    #[case::italian_english_phrase(
        "it",
        r#"Dato I call scenario "Accesso" from feature "Autenticazione""#,
        "Accesso",
        "Autenticazione"
    )]
    fn parses_calls(
        #[case] tag: &str,
        #[case] line: &str,
        #[case] scenario: &str,
        #[case] feature: &str,
    ) {
        let call = grammar(tag).parse(line).expect("line should be a call");
        assert_eq!(call.scenario, scenario);
        assert_eq!(call.feature, feature);
    }

    #[rstest]
    #[case::plain_step("en", "Given I have some data")]
    #[case::no_keyword("en", r#"I call scenario "Test" from feature "Test""#)]
    #[case::unquoted("en", "Given I call scenario Login from feature Auth")]
    #[case::wildcard("en", r#"* I call scenario "Login" from feature "Auth""#)]
    #[case::empty_name("en", r#"Given I call scenario "" from feature "Auth""#)]
    #[case::missing_feature("en", r#"Given I call scenario "Login""#)]
    #[case::foreign_keyword("en", r#"Angenommen I call scenario "Login" from feature "Auth""#)]
    #[case::foreign_phrase("en", r#"Given ich rufe Szenario "Login" aus Feature "Auth""#)]
    #[case::glued_keyword("en", r#"GivenI call scenario "Login" from feature "Auth""#)]
    fn rejects_non_calls(#[case] tag: &str, #[case] line: &str) {
        let grammar = grammar(tag);
        assert!(!grammar.is_call(line));
        assert!(grammar.parse(line).is_none());
    }

    #[test]
    fn embedded_quote_terminates_name() {
        let line = r#"Given I call scenario "Say "hi"" from feature "Greetings""#;
        assert!(grammar("en").parse(line).is_none());
    }

    #[test]
    fn reports_matched_keyword() {
        let call = grammar("de")
            .parse(r#"Gegeben sei ich rufe Szenario "A" aus Feature "B""#)
            .expect("line should be a call");
        assert_eq!(call.keyword, "Gegeben sei");
    }

    #[test]
    fn custom_phrases_extend_a_language() {
        let table = CallPhraseTable::builtin().with_language(
            "it",
            CallPhrases::new(&["chiamo lo scenario"], &["dalla funzionalità"]),
        );
        let dialect = EmbeddedDialects::bundled()
            .lookup("it")
            .expect("bundled dialect should exist");
        let grammar = CallGrammar::new(&dialect, &table).expect("grammar should compile");
        assert!(grammar.is_call(r#"Dato chiamo lo scenario "Accesso" dalla funzionalità "Auth""#));
        assert!(grammar.is_call(r#"Dato I call scenario "Accesso" from feature "Auth""#));
    }

    #[test]
    fn phrase_table_deserialises_from_json() {
        let table: CallPhraseTable =
            serde_json::from_str(r#"{"pt": {"call": ["chamo o cenário"], "from": ["da funcionalidade"]}}"#)
                .expect("phrase table should decode");
        assert_eq!(
            table.phrases("pt"),
            Some(&CallPhrases::new(&["chamo o cenário"], &["da funcionalidade"]))
        );
        let merged = CallPhraseTable::builtin().merged(&table);
        assert!(merged.languages().any(|tag| tag == "pt"));
        assert!(merged.languages().any(|tag| tag == "en"));
    }

    #[test]
    fn empty_table_has_no_phrases() {
        let dialect = EmbeddedDialects::bundled()
            .lookup("en")
            .expect("bundled dialect should exist");
        let result = CallGrammar::new(&dialect, &CallPhraseTable::empty());
        assert!(matches!(result, Err(PatternError::NoPhrases(tag)) if tag == "en"));
    }

    #[test]
    fn alternation_prefers_longer_phrases() {
        assert_eq!(alternation(["a", "a b", ""]), r"a\s+b|a");
    }
}
