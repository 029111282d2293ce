//! Gherkin keyword dialects and their per-session cache.
//!
//! A [`Dialect`] holds the localised keywords for one language. Dialects come
//! from a [`DialectSource`]; the bundled [`EmbeddedDialects`] decodes a subset
//! of the upstream `gherkin-languages.json` table. [`DialectCache`] memoises
//! lookups for the lifetime of one preprocessing session and silently falls
//! back to English for tags it cannot resolve.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, LazyLock};

use serde::Deserialize;
use tracing::debug;
use unic_langid::LanguageIdentifier;

use crate::errors::DialectError;
use crate::keyword::StepKeyword;
use crate::language::DEFAULT_LANGUAGE;

const BUNDLED_TABLE: &str = include_str!("../data/gherkin-languages.json");

static BUNDLED: LazyLock<Arc<HashMap<String, KeywordTable>>> = LazyLock::new(|| {
    let tables = serde_json::from_str(BUNDLED_TABLE)
        .unwrap_or_else(|error| panic!("bundled Gherkin dialect table is invalid: {error}"));
    Arc::new(tables)
});

const ENGLISH_FEATURE: &[&str] = &["Feature", "Business Need", "Ability"];
const ENGLISH_BACKGROUND: &[&str] = &["Background"];
const ENGLISH_RULE: &[&str] = &["Rule"];
const ENGLISH_SCENARIO: &[&str] = &["Example", "Scenario"];
const ENGLISH_SCENARIO_OUTLINE: &[&str] = &["Scenario Outline", "Scenario Template"];
const ENGLISH_EXAMPLES: &[&str] = &["Examples", "Scenarios"];
const ENGLISH_GIVEN: &[&str] = &["* ", "Given "];
const ENGLISH_WHEN: &[&str] = &["* ", "When "];
const ENGLISH_THEN: &[&str] = &["* ", "Then "];
const ENGLISH_AND: &[&str] = &["* ", "And "];
const ENGLISH_BUT: &[&str] = &["* ", "But "];

/// Structural section introduced by a `<keyword>:` header line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    /// `Feature:` and its synonyms.
    Feature,
    /// `Background:`.
    Background,
    /// `Rule:`.
    Rule,
    /// `Scenario:` / `Example:`.
    Scenario,
    /// `Scenario Outline:` / `Scenario Template:`.
    ScenarioOutline,
    /// `Examples:` / `Scenarios:`.
    Examples,
}

impl Section {
    /// Whether the section holds steps that belong to a single scenario.
    #[must_use]
    pub const fn is_scenario(self) -> bool {
        matches!(self, Self::Scenario | Self::ScenarioOutline)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
struct KeywordTable {
    #[serde(default)]
    name: String,
    #[serde(default)]
    native: String,
    feature: Vec<String>,
    background: Vec<String>,
    #[serde(default)]
    rule: Vec<String>,
    scenario: Vec<String>,
    scenario_outline: Vec<String>,
    examples: Vec<String>,
    given: Vec<String>,
    when: Vec<String>,
    then: Vec<String>,
    and: Vec<String>,
    but: Vec<String>,
}

impl KeywordTable {
    fn english() -> Self {
        let owned = |words: &[&str]| words.iter().map(|w| (*w).to_owned()).collect();
        Self {
            name: "English".to_owned(),
            native: "English".to_owned(),
            feature: owned(ENGLISH_FEATURE),
            background: owned(ENGLISH_BACKGROUND),
            rule: owned(ENGLISH_RULE),
            scenario: owned(ENGLISH_SCENARIO),
            scenario_outline: owned(ENGLISH_SCENARIO_OUTLINE),
            examples: owned(ENGLISH_EXAMPLES),
            given: owned(ENGLISH_GIVEN),
            when: owned(ENGLISH_WHEN),
            then: owned(ENGLISH_THEN),
            and: owned(ENGLISH_AND),
            but: owned(ENGLISH_BUT),
        }
    }

    fn section(&self, section: Section) -> &[String] {
        match section {
            Section::Feature => &self.feature,
            Section::Background => &self.background,
            Section::Rule => &self.rule,
            Section::Scenario => &self.scenario,
            Section::ScenarioOutline => &self.scenario_outline,
            Section::Examples => &self.examples,
        }
    }
}

/// Localised keywords for one Gherkin language.
///
/// Dialects are immutable once built and shared behind an [`Arc`] by the
/// [`DialectCache`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dialect {
    tag: String,
    table: KeywordTable,
    headers: Vec<(String, Section)>,
}

impl Dialect {
    fn new(tag: &str, table: KeywordTable) -> Self {
        let mut headers: Vec<(String, Section)> = Vec::new();
        let sections = [
            Section::Feature,
            Section::Background,
            Section::Rule,
            Section::Scenario,
            Section::ScenarioOutline,
            Section::Examples,
        ];
        for section in sections {
            let english = english_section(section).iter().copied();
            let localised = table.section(section).iter().map(String::as_str);
            for keyword in localised.chain(english) {
                let keyword = keyword.trim();
                if keyword.is_empty() || headers.iter().any(|(known, _)| known == keyword) {
                    continue;
                }
                headers.push((keyword.to_owned(), section));
            }
        }
        headers.sort_by_key(|(keyword, _)| std::cmp::Reverse(keyword.chars().count()));
        Self {
            tag: tag.to_owned(),
            table,
            headers,
        }
    }

    /// Built-in English dialect used when no source can supply one.
    ///
    /// # Examples
    ///
    /// ```
    /// use scenario_call_patterns::Dialect;
    ///
    /// let english = Dialect::english();
    /// assert_eq!(english.tag(), "en");
    /// assert!(english.is_step_line("Given a step"));
    /// ```
    #[must_use]
    pub fn english() -> Self {
        Self::new(DEFAULT_LANGUAGE, KeywordTable::english())
    }

    /// Tag of the table entry this dialect was built from, e.g. `de` for a
    /// document declaring `de-DE`.
    #[must_use]
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// English name of the language.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.table.name
    }

    /// Native name of the language.
    #[must_use]
    pub fn native(&self) -> &str {
        &self.table.native
    }

    /// Step keywords of one category, as listed in the dialect table.
    #[must_use]
    pub fn keywords(&self, kind: StepKeyword) -> &[String] {
        match kind {
            StepKeyword::Given => &self.table.given,
            StepKeyword::When => &self.table.when,
            StepKeyword::Then => &self.table.then,
            StepKeyword::And => &self.table.and,
            StepKeyword::But => &self.table.but,
        }
    }

    /// Section keywords defined by this dialect (without the English
    /// fallbacks accepted by [`Dialect::section`]).
    #[must_use]
    pub fn section_keywords(&self, section: Section) -> &[String] {
        self.table.section(section)
    }

    /// Distinct trimmed step keywords usable in a scenario call.
    ///
    /// The generic `*` keyword is excluded.
    #[must_use]
    pub fn call_keywords(&self) -> Vec<&str> {
        let mut keywords: Vec<&str> = Vec::new();
        for kind in StepKeyword::ALL {
            for keyword in self.keywords(kind) {
                let keyword = keyword.trim();
                if keyword.is_empty() || keyword == "*" || keywords.contains(&keyword) {
                    continue;
                }
                keywords.push(keyword);
            }
        }
        keywords
    }

    /// Classify a line as a step and report the keyword it starts with.
    ///
    /// The line is trimmed first. Keywords carrying a trailing space in the
    /// table must be followed by whitespace or end the line; keywords
    /// without one (as in Japanese) match as plain prefixes. Matching is
    /// case-insensitive.
    #[must_use]
    pub fn step_keyword(&self, line: &str) -> Option<(StepKeyword, &str)> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return None;
        }
        StepKeyword::ALL.into_iter().find_map(|kind| {
            self.keywords(kind)
                .iter()
                .find(|keyword| starts_with_keyword(trimmed, keyword))
                .map(|keyword| (kind, keyword.trim()))
        })
    }

    /// Whether the line is a step in this dialect.
    #[must_use]
    pub fn is_step_line(&self, line: &str) -> bool {
        self.step_keyword(line).is_some()
    }

    /// Classify a `<keyword>:` header line and return its title.
    ///
    /// English section keywords are accepted for every dialect. The longest
    /// matching keyword wins, so `Scenario Outline:` never reads as
    /// `Scenario:`.
    ///
    /// # Examples
    ///
    /// ```
    /// use scenario_call_patterns::{Dialect, Section};
    ///
    /// let english = Dialect::english();
    /// assert_eq!(
    ///     english.section("  Scenario Outline: Adding <a>"),
    ///     Some((Section::ScenarioOutline, "Adding <a>")),
    /// );
    /// assert_eq!(english.section("Given a step"), None);
    /// ```
    #[must_use]
    pub fn section<'l>(&self, line: &'l str) -> Option<(Section, &'l str)> {
        let trimmed = line.trim();
        self.headers.iter().find_map(|(keyword, section)| {
            let title = trimmed.strip_prefix(keyword.as_str())?.strip_prefix(':')?;
            Some((*section, title.trim()))
        })
    }
}

fn english_section(section: Section) -> &'static [&'static str] {
    match section {
        Section::Feature => ENGLISH_FEATURE,
        Section::Background => ENGLISH_BACKGROUND,
        Section::Rule => ENGLISH_RULE,
        Section::Scenario => ENGLISH_SCENARIO,
        Section::ScenarioOutline => ENGLISH_SCENARIO_OUTLINE,
        Section::Examples => ENGLISH_EXAMPLES,
    }
}

fn starts_with_keyword(line: &str, keyword: &str) -> bool {
    let word = keyword.trim();
    if word.is_empty() {
        return false;
    }
    let Some(rest) = strip_prefix_ignore_case(line, word) else {
        return false;
    };
    !keyword.ends_with(char::is_whitespace) || rest.is_empty() || rest.starts_with(char::is_whitespace)
}

fn strip_prefix_ignore_case<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    let mut chars = text.char_indices();
    for expected in prefix.chars() {
        let (_, actual) = chars.next()?;
        if !actual.to_lowercase().eq(expected.to_lowercase()) {
            return None;
        }
    }
    let offset = chars.next().map_or(text.len(), |(index, _)| index);
    text.get(offset..)
}

/// Supplier of keyword dialects keyed by language tag.
pub trait DialectSource {
    /// Resolve a language tag to its dialect.
    ///
    /// # Errors
    ///
    /// Returns [`DialectError::Unsupported`] when the tag is unknown.
    fn lookup(&self, tag: &str) -> Result<Dialect, DialectError>;
}

/// Dialects decoded from a `gherkin-languages.json` style table.
///
/// [`EmbeddedDialects::bundled`] serves the table shipped with the crate;
/// [`EmbeddedDialects::from_json`] accepts a caller-supplied one.
#[derive(Debug, Clone)]
pub struct EmbeddedDialects {
    tables: Arc<HashMap<String, KeywordTable>>,
}

impl Default for EmbeddedDialects {
    fn default() -> Self {
        Self::bundled()
    }
}

impl EmbeddedDialects {
    /// Dialects bundled with the crate.
    #[must_use]
    pub fn bundled() -> Self {
        Self {
            tables: Arc::clone(&BUNDLED),
        }
    }

    /// Decode dialects from JSON in the upstream `gherkin-languages.json`
    /// layout.
    ///
    /// # Errors
    ///
    /// Returns [`DialectError::Table`] when the JSON does not describe a
    /// dialect table.
    ///
    /// # Examples
    ///
    /// ```
    /// use scenario_call_patterns::{DialectSource, EmbeddedDialects};
    ///
    /// let json = r#"{"xx": {
    ///     "feature": ["Fonction"], "background": ["Fond"], "scenario": ["Cas"],
    ///     "scenarioOutline": ["Plan"], "examples": ["Exemples"],
    ///     "given": ["* ", "Si "], "when": ["* ", "Quand "], "then": ["* ", "Alors "],
    ///     "and": ["* ", "Et "], "but": ["* ", "Mais "]
    /// }}"#;
    /// let dialects = EmbeddedDialects::from_json(json).unwrap();
    /// assert!(dialects.lookup("xx").unwrap().is_step_line("Si rien"));
    /// ```
    pub fn from_json(json: &str) -> Result<Self, DialectError> {
        let tables = serde_json::from_str(json)?;
        Ok(Self {
            tables: Arc::new(tables),
        })
    }

    /// Language tags present in the table, sorted.
    #[must_use]
    pub fn languages(&self) -> Vec<&str> {
        let mut tags: Vec<&str> = self.tables.keys().map(String::as_str).collect();
        tags.sort_unstable();
        tags
    }

    fn resolve_key(&self, tag: &str) -> Option<&str> {
        if let Some((key, _)) = self.tables.get_key_value(tag) {
            return Some(key.as_str());
        }
        if let Some(key) = self.tables.keys().find(|key| key.eq_ignore_ascii_case(tag)) {
            return Some(key.as_str());
        }
        let langid: LanguageIdentifier = tag.replace('_', "-").parse().ok()?;
        self.tables
            .get_key_value(langid.language.as_str())
            .map(|(key, _)| key.as_str())
    }
}

impl DialectSource for EmbeddedDialects {
    fn lookup(&self, tag: &str) -> Result<Dialect, DialectError> {
        let key = self
            .resolve_key(tag.trim())
            .ok_or_else(|| DialectError::Unsupported(tag.to_owned()))?;
        let table = self
            .tables
            .get(key)
            .ok_or_else(|| DialectError::Unsupported(tag.to_owned()))?;
        Ok(Dialect::new(key, table.clone()))
    }
}

/// Session-scoped memo of dialect lookups.
///
/// Each tag is fetched from the source at most once; repeated requests
/// return the same [`Arc`]. Tags that resolve to the same table entry (for
/// example `de` and `de-DE`) share one instance. Unsupported tags resolve to
/// the default English dialect without reporting an error.
pub struct DialectCache {
    source: Box<dyn DialectSource>,
    cache: HashMap<String, Arc<Dialect>>,
}

impl fmt::Debug for DialectCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut tags: Vec<&String> = self.cache.keys().collect();
        tags.sort_unstable();
        f.debug_struct("DialectCache").field("cached", &tags).finish_non_exhaustive()
    }
}

impl Default for DialectCache {
    fn default() -> Self {
        Self::new(EmbeddedDialects::bundled())
    }
}

impl DialectCache {
    /// Create an empty cache backed by `source`.
    #[must_use]
    pub fn new(source: impl DialectSource + 'static) -> Self {
        Self {
            source: Box::new(source),
            cache: HashMap::new(),
        }
    }

    /// Return the dialect for `tag`, fetching it on first use.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::sync::Arc;
    /// use scenario_call_patterns::DialectCache;
    ///
    /// let mut cache = DialectCache::default();
    /// let first = cache.get("de-DE");
    /// assert_eq!(first.tag(), "de");
    /// assert!(Arc::ptr_eq(&first, &cache.get("de-DE")));
    /// assert_eq!(cache.get("tlh").tag(), "en");
    /// ```
    pub fn get(&mut self, tag: &str) -> Arc<Dialect> {
        if let Some(dialect) = self.cache.get(tag) {
            return Arc::clone(dialect);
        }
        let dialect = match self.source.lookup(tag) {
            Ok(dialect) => {
                let shared = match self.cache.get(dialect.tag()) {
                    Some(shared) if **shared == dialect => Arc::clone(shared),
                    _ => Arc::new(dialect),
                };
                // Later requests for the resolved tag itself reuse this entry.
                self.cache
                    .entry(shared.tag().to_owned())
                    .or_insert_with(|| Arc::clone(&shared));
                shared
            }
            Err(error) => {
                debug!(%tag, %error, "falling back to the default dialect");
                self.default_dialect()
            }
        };
        self.cache.insert(tag.to_owned(), Arc::clone(&dialect));
        dialect
    }

    fn default_dialect(&mut self) -> Arc<Dialect> {
        if let Some(dialect) = self.cache.get(DEFAULT_LANGUAGE) {
            return Arc::clone(dialect);
        }
        let dialect = Arc::new(
            self.source
                .lookup(DEFAULT_LANGUAGE)
                .unwrap_or_else(|_| Dialect::english()),
        );
        self.cache
            .insert(DEFAULT_LANGUAGE.to_owned(), Arc::clone(&dialect));
        dialect
    }
}

#[cfg(test)]
#[expect(
    clippy::expect_used,
    reason = "tests require explicit panic messages for debugging failures"
)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::cell::Cell;
    use std::rc::Rc;

    fn bundled(tag: &str) -> Dialect {
        EmbeddedDialects::bundled()
            .lookup(tag)
            .expect("bundled dialect should exist")
    }

    #[rstest]
    #[case("en", "en")]
    #[case("de", "de")]
    #[case("de-DE", "de")]
    #[case("DE-de", "de")]
    #[case("fr-FR", "fr")]
    #[case("pt_BR", "pt")]
    #[case("nl-BE", "nl")]
    #[case("ja-JP", "ja")]
    fn resolves_language_tags(#[case] tag: &str, #[case] expected: &str) {
        assert_eq!(bundled(tag).tag(), expected);
    }

    #[test]
    fn rejects_unknown_language() {
        let result = EmbeddedDialects::bundled().lookup("tlh");
        assert!(matches!(result, Err(DialectError::Unsupported(tag)) if tag == "tlh"));
    }

    #[test]
    fn bundled_table_lists_languages() {
        let dialects = EmbeddedDialects::bundled();
        let languages = dialects.languages();
        for tag in ["de", "en", "es", "fr", "it", "ja", "nl", "pt"] {
            assert!(languages.contains(&tag), "missing {tag}");
        }
    }

    #[test]
    fn bundled_english_matches_builtin() {
        let embedded = bundled("en");
        let builtin = Dialect::english();
        for kind in StepKeyword::ALL {
            assert_eq!(embedded.keywords(kind), builtin.keywords(kind));
        }
        assert_eq!(
            embedded.section_keywords(Section::Feature),
            builtin.section_keywords(Section::Feature)
        );
    }

    #[rstest]
    #[case::english("en", "Given I have a test", Some(StepKeyword::Given))]
    #[case::lowercase("en", "given I have a test", Some(StepKeyword::Given))]
    #[case::bare_keyword("en", "And", Some(StepKeyword::And))]
    #[case::wildcard("en", "* a generic step", Some(StepKeyword::Given))]
    #[case::glued("en", "Givenness is not a step", None)]
    #[case::description("en", "This is a description", None)]
    #[case::crlf("en", "    Then it passes\r", Some(StepKeyword::Then))]
    #[case::german_two_words("de", "Gegeben sei ein Konto", Some(StepKeyword::Given))]
    #[case::german_when("de", "Wenn ich zahle", Some(StepKeyword::When))]
    #[case::french_elided("fr", "Lorsqu'il pleut", Some(StepKeyword::When))]
    #[case::french_accented("fr", "Étant donné un compte", Some(StepKeyword::Given))]
    #[case::japanese("ja", "前提 口座がある", Some(StepKeyword::Given))]
    #[case::japanese_glued("ja", "もし入金する", Some(StepKeyword::When))]
    #[case::blank("en", "   ", None)]
    fn classifies_step_lines(
        #[case] tag: &str,
        #[case] line: &str,
        #[case] expected: Option<StepKeyword>,
    ) {
        let dialect = bundled(tag);
        assert_eq!(dialect.step_keyword(line).map(|(kind, _)| kind), expected);
        assert_eq!(dialect.is_step_line(line), expected.is_some());
    }

    #[test]
    fn call_keywords_exclude_wildcard_and_duplicates() {
        let dialect = bundled("en");
        let keywords = dialect.call_keywords();
        assert_eq!(keywords, vec!["Given", "When", "Then", "And", "But"]);
    }

    #[rstest]
    #[case("en", "Feature: Billing", Some((Section::Feature, "Billing")))]
    #[case("en", "  Scenario: Pay", Some((Section::Scenario, "Pay")))]
    #[case("en", "Example: Pay", Some((Section::Scenario, "Pay")))]
    #[case("en", "Scenario Outline: Pay <n>", Some((Section::ScenarioOutline, "Pay <n>")))]
    #[case("en", "Scenarios:", Some((Section::Examples, "")))]
    #[case("en", "Background:", Some((Section::Background, "")))]
    #[case("en", "Rule: Limits", Some((Section::Rule, "Limits")))]
    #[case("en", "Scenario without colon", None)]
    #[case("de", "Funktionalität: Konto", Some((Section::Feature, "Konto")))]
    #[case("de", "Szenario: Anmeldung", Some((Section::Scenario, "Anmeldung")))]
    #[case("de", "Feature: Authentifizierung", Some((Section::Feature, "Authentifizierung")))]
    #[case("pt", "Cenários:", Some((Section::Examples, "")))]
    #[case("pt", "Cenário: Entrar", Some((Section::Scenario, "Entrar")))]
    #[case("fr", "Plan du scénario: Ajout", Some((Section::ScenarioOutline, "Ajout")))]
    fn classifies_section_headers(
        #[case] tag: &str,
        #[case] line: &str,
        #[case] expected: Option<(Section, &str)>,
    ) {
        assert_eq!(bundled(tag).section(line), expected);
    }

    #[test]
    fn cache_returns_identical_instance() {
        let mut cache = DialectCache::default();
        let first = cache.get("fr");
        let second = cache.get("fr");
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[rstest]
    #[case::short_first("de", "de-AT")]
    #[case::regional_first("de-AT", "de")]
    #[case::two_regions("de-CH", "de-DE")]
    fn cache_shares_instance_across_equivalent_tags(#[case] first: &str, #[case] second: &str) {
        let mut cache = DialectCache::default();
        let earlier = cache.get(first);
        let later = cache.get(second);
        assert!(Arc::ptr_eq(&earlier, &later));
    }

    #[test]
    fn regional_tag_fetches_primary_entry_once() {
        let calls = Rc::new(Cell::new(0));
        let mut cache = DialectCache::new(CountingSource {
            calls: Rc::clone(&calls),
        });
        cache.get("nl-BE");
        cache.get("nl");
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn cache_falls_back_to_english() {
        let mut cache = DialectCache::default();
        let english = cache.get("en");
        let unknown = cache.get("klingon");
        assert!(Arc::ptr_eq(&english, &unknown));
    }

    struct CountingSource {
        calls: Rc<Cell<usize>>,
    }

    impl DialectSource for CountingSource {
        fn lookup(&self, tag: &str) -> Result<Dialect, DialectError> {
            self.calls.set(self.calls.get() + 1);
            EmbeddedDialects::bundled().lookup(tag)
        }
    }

    #[test]
    fn cache_fetches_each_tag_once() {
        let calls = Rc::new(Cell::new(0));
        let mut cache = DialectCache::new(CountingSource {
            calls: Rc::clone(&calls),
        });
        cache.get("es");
        cache.get("es");
        cache.get("es");
        assert_eq!(calls.get(), 1);
    }

    struct EmptySource;

    impl DialectSource for EmptySource {
        fn lookup(&self, tag: &str) -> Result<Dialect, DialectError> {
            Err(DialectError::Unsupported(tag.to_owned()))
        }
    }

    #[test]
    fn cache_uses_builtin_english_when_source_is_empty() {
        let mut cache = DialectCache::new(EmptySource);
        let dialect = cache.get("de");
        assert_eq!(dialect.tag(), "en");
        assert!(dialect.is_step_line("Given a step"));
    }
}
