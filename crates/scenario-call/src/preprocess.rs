//! Expansion of scenario calls in a feature document.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use scenario_call_patterns::{
    BYTE_ORDER_MARK, CallGrammar, CallPhraseTable, Dialect, DialectCache, PatternError,
    ScenarioCallReference, detect_language, strip_byte_order_mark,
};
use tracing::{debug, warn};

use crate::discovery::{FeatureLocator, SearchConfig};
use crate::error::ExpansionError;
use crate::extract::{DocStringDelimiter, scenario_steps};

/// Marker opening the comment that precedes an expanded call.
pub const EXPANSION_MARKER: &str = "# Expanded from scenario call:";

/// Line terminator used for lines the preprocessor generates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineTerminator {
    /// `\n`
    #[default]
    Lf,
    /// `\r\n`
    CrLf,
}

impl LineTerminator {
    /// `CrLf` when the text contains any `\r\n`, otherwise `Lf`.
    #[must_use]
    pub fn detect(text: &str) -> Self {
        if text.contains("\r\n") {
            Self::CrLf
        } else {
            Self::Lf
        }
    }

    /// The terminator's characters.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Lf => "\n",
            Self::CrLf => "\r\n",
        }
    }
}

impl fmt::Display for LineTerminator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of expanding one call: the block that replaces the call line.
#[derive(Debug)]
pub enum ExpansionResult {
    /// The called scenario was found.
    Expanded {
        /// Scenario title as written in the call.
        scenario: String,
        /// Feature title as written in the call.
        feature: String,
        /// Copied step lines, trimmed, table rows carrying their extra
        /// indentation.
        steps: Vec<String>,
    },
    /// The call could not be expanded.
    Failed(ExpansionError),
}

impl ExpansionResult {
    /// Render the block, prefixing every line with `indent`.
    ///
    /// # Examples
    ///
    /// ```
    /// use scenario_call::{ExpansionResult, LineTerminator};
    ///
    /// let result = ExpansionResult::Expanded {
    ///     scenario: "Login".into(),
    ///     feature: "Auth".into(),
    ///     steps: vec!["Given a user".into()],
    /// };
    /// assert_eq!(
    ///     result.render("  ", LineTerminator::Lf),
    ///     "  # Expanded from scenario call: \"Login\" from feature \"Auth\"\n  Given a user\n",
    /// );
    /// ```
    #[must_use]
    pub fn render(&self, indent: &str, terminator: LineTerminator) -> String {
        let mut block = String::new();
        let mut push = |text: &str| {
            block.push_str(indent);
            block.push_str(text);
            block.push_str(terminator.as_str());
        };
        match self {
            Self::Expanded {
                scenario,
                feature,
                steps,
            } => {
                push(&format!(
                    "{EXPANSION_MARKER} \"{scenario}\" from feature \"{feature}\""
                ));
                for step in steps {
                    push(step);
                }
            }
            Self::Failed(error) => push(&error.diagnostic()),
        }
        block
    }
}

/// Walks a caller document and reports the call lines that may be
/// expanded: those inside a `Scenario` or `Scenario Outline` section and
/// outside any doc-string.
#[derive(Debug, Default)]
struct CallScan {
    in_scenario: bool,
    doc_string: Option<DocStringDelimiter>,
}

impl CallScan {
    fn call_at(
        &mut self,
        line: &str,
        dialect: &Dialect,
        grammar: &CallGrammar,
    ) -> Option<ScenarioCallReference> {
        let trimmed = line.trim();
        if let Some(open) = self.doc_string {
            if trimmed.starts_with(open.fence()) {
                self.doc_string = None;
            }
            return None;
        }
        if let Some(delimiter) = DocStringDelimiter::at_start(trimmed) {
            self.doc_string = Some(delimiter);
            return None;
        }
        if let Some((section, _)) = dialect.section(trimmed) {
            self.in_scenario = section.is_scenario();
            return None;
        }
        if !self.in_scenario {
            return None;
        }
        grammar.parse(trimmed)
    }
}

fn leading_whitespace(line: &str) -> &str {
    line.strip_suffix(line.trim_start()).unwrap_or_default()
}

fn passthrough(text: &str, terminator: LineTerminator) -> String {
    format!("{text}{terminator}")
}

/// One preprocessing session.
///
/// A session owns its dialect cache, compiled call grammars and feature
/// cache. Create one per document, or per batch of documents that should
/// share cached feature files; sessions are not shared between threads.
///
/// # Examples
///
/// ```
/// use scenario_call::{Preprocessor, SearchConfig};
///
/// let mut session = Preprocessor::new(SearchConfig::new("."));
/// let text = "Feature: Plain\n  Scenario: S\n    Given a step";
/// assert_eq!(session.preprocess(text), format!("{text}\n"));
/// ```
pub struct Preprocessor {
    dialects: DialectCache,
    phrases: CallPhraseTable,
    grammars: HashMap<String, Arc<CallGrammar>>,
    locator: FeatureLocator,
}

impl fmt::Debug for Preprocessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Preprocessor")
            .field("dialects", &self.dialects)
            .field("grammars", &self.grammars.keys().collect::<Vec<_>>())
            .field("locator", &self.locator)
            .finish_non_exhaustive()
    }
}

impl Preprocessor {
    /// Session searching the given roots with the built-in phrases.
    #[must_use]
    pub fn new(config: SearchConfig) -> Self {
        Self::with_locator(FeatureLocator::new(config))
    }

    /// Session using a preconfigured locator.
    #[must_use]
    pub fn with_locator(locator: FeatureLocator) -> Self {
        Self {
            dialects: DialectCache::default(),
            phrases: CallPhraseTable::builtin(),
            grammars: HashMap::new(),
            locator,
        }
    }

    /// Replace the call-phrase table.
    #[must_use]
    pub fn with_phrases(mut self, phrases: CallPhraseTable) -> Self {
        self.phrases = phrases;
        self.grammars.clear();
        self
    }

    /// Replace the dialect cache, for example to use another data source.
    #[must_use]
    pub fn with_dialects(mut self, dialects: DialectCache) -> Self {
        self.dialects = dialects;
        self.grammars.clear();
        self
    }

    /// The session's feature locator.
    #[must_use]
    pub fn locator(&self) -> &FeatureLocator {
        &self.locator
    }

    fn grammar(&mut self, dialect: &Dialect) -> Result<Arc<CallGrammar>, PatternError> {
        if let Some(grammar) = self.grammars.get(dialect.tag()) {
            return Ok(Arc::clone(grammar));
        }
        let grammar = Arc::new(CallGrammar::new(dialect, &self.phrases)?);
        debug!(tag = dialect.tag(), "compiled call grammar");
        self.grammars
            .insert(dialect.tag().to_owned(), Arc::clone(&grammar));
        Ok(grammar)
    }

    /// Whether the document contains a call that [`Preprocessor::preprocess`]
    /// would expand.
    pub fn has_scenario_calls(&mut self, text: &str) -> bool {
        let text = strip_byte_order_mark(text);
        let dialect = self.dialects.get(detect_language(text));
        let Ok(grammar) = self.grammar(&dialect) else {
            return false;
        };
        let mut scan = CallScan::default();
        text.split('\n')
            .any(|line| scan.call_at(line, &dialect, &grammar).is_some())
    }

    /// Expand every scenario call in `text`.
    ///
    /// Lines are split on `\n`. Lines other than expandable calls are copied
    /// unchanged with the `\n` that followed them, and the result always
    /// ends with one extra line terminator, so a document without calls
    /// comes back as `text` plus a terminator. Each call inside a scenario
    /// is replaced by its [`ExpansionResult`] block, indented like the call.
    /// Calls in a `Background:` are left alone, as are the calls inside an
    /// expanded scenario.
    ///
    /// A leading byte-order mark is ignored while reading the document and
    /// kept at the start of the output.
    ///
    /// This never fails: problems become comment lines in the output.
    pub fn preprocess(&mut self, text: &str) -> String {
        let body = strip_byte_order_mark(text);
        let expanded = self.expand_document(body);
        if body.len() == text.len() {
            expanded
        } else {
            format!("{BYTE_ORDER_MARK}{expanded}")
        }
    }

    fn expand_document(&mut self, text: &str) -> String {
        let terminator = LineTerminator::detect(text);
        let dialect = self.dialects.get(detect_language(text));
        let grammar = match self.grammar(&dialect) {
            Ok(grammar) => grammar,
            Err(error) => {
                warn!(%error, tag = dialect.tag(), "call grammar unavailable; document left unchanged");
                return passthrough(text, terminator);
            }
        };

        let mut scan = CallScan::default();
        if !text
            .split('\n')
            .any(|line| scan.call_at(line, &dialect, &grammar).is_some())
        {
            return passthrough(text, terminator);
        }

        let mut output = String::with_capacity(text.len());
        let mut scan = CallScan::default();
        let mut lines = text.split('\n').peekable();
        while let Some(line) = lines.next() {
            if let Some(call) = scan.call_at(line, &dialect, &grammar) {
                let result = self.expand_call(&call);
                output.push_str(&result.render(leading_whitespace(line), terminator));
                continue;
            }
            output.push_str(line);
            output.push_str(if lines.peek().is_some() {
                "\n"
            } else {
                terminator.as_str()
            });
        }
        output
    }

    /// Resolve one call to the block that replaces it.
    pub fn expand_call(&mut self, call: &ScenarioCallReference) -> ExpansionResult {
        match self.find_scenario_steps(&call.scenario, &call.feature) {
            Ok(steps) => {
                debug!(
                    scenario = %call.scenario,
                    feature = %call.feature,
                    steps = steps.len(),
                    "expanded scenario call"
                );
                ExpansionResult::Expanded {
                    scenario: call.scenario.clone(),
                    feature: call.feature.clone(),
                    steps,
                }
            }
            Err(error) => {
                warn!(
                    scenario = %call.scenario,
                    feature = %call.feature,
                    %error,
                    "could not expand scenario call"
                );
                ExpansionResult::Failed(error)
            }
        }
    }

    /// Steps of `scenario` in the feature titled `feature`.
    ///
    /// The feature document's own language directive selects the dialect
    /// used to read it.
    ///
    /// # Errors
    ///
    /// Returns [`ExpansionError::FeatureNotFound`] when no file declares the
    /// feature, the errors of [`scenario_steps`] when the scenario cannot be
    /// read, and [`ExpansionError::Discovery`] when the search fails.
    pub fn find_scenario_steps(
        &mut self,
        scenario: &str,
        feature: &str,
    ) -> Result<Vec<String>, ExpansionError> {
        let content = self
            .locator
            .locate(feature, &mut self.dialects)?
            .ok_or_else(|| ExpansionError::FeatureNotFound {
                feature: feature.to_owned(),
            })?;
        let dialect = self.dialects.get(detect_language(&content));
        scenario_steps(&content, &dialect, scenario, feature)
    }
}

/// Expand `text` in a fresh session rooted at `config`.
#[must_use]
pub fn preprocess(text: &str, config: SearchConfig) -> String {
    Preprocessor::new(config).preprocess(text)
}

#[cfg(test)]
#[expect(
    clippy::expect_used,
    reason = "tests require explicit panic messages for debugging failures"
)]
mod tests {
    use super::*;
    use crate::discovery::NoProjectReferences;
    use rstest::rstest;
    use scenario_call_patterns::{CallPhrases, DialectError, DialectSource};
    use tempfile::TempDir;

    fn empty_session() -> (TempDir, Preprocessor) {
        let dir = TempDir::new().expect("temp dir");
        let locator =
            FeatureLocator::with_references(SearchConfig::new(dir.path()), NoProjectReferences);
        (dir, Preprocessor::with_locator(locator))
    }

    #[rstest]
    #[case::unix("a\nb\n", LineTerminator::Lf)]
    #[case::windows("a\r\nb\r\n", LineTerminator::CrLf)]
    #[case::mixed("a\nb\r\n", LineTerminator::CrLf)]
    #[case::single_line("a", LineTerminator::Lf)]
    #[case::bare_cr("a\rb", LineTerminator::Lf)]
    fn detects_terminator(#[case] text: &str, #[case] expected: LineTerminator) {
        assert_eq!(LineTerminator::detect(text), expected);
    }

    #[rstest]
    #[case::spaces("    Given x", "    ")]
    #[case::tabs("\t\tGiven x", "\t\t")]
    #[case::none("Given x", "")]
    #[case::blank("   ", "   ")]
    #[case::crlf("  Given x\r", "  ")]
    fn measures_leading_whitespace(#[case] line: &str, #[case] expected: &str) {
        assert_eq!(leading_whitespace(line), expected);
    }

    #[rstest]
    #[case::no_calls("Feature: F\n  Scenario: S\n    Given x\n")]
    #[case::no_trailing_newline("Feature: F\n  Scenario: S\n    Given x")]
    #[case::crlf("Feature: F\r\n  Scenario: S\r\n    Given x\r\n")]
    #[case::empty("")]
    #[case::call_in_background(
        "Feature: F\n  Background:\n    Given I call scenario \"S\" from feature \"G\"\n  Scenario: S\n    Given x\n"
    )]
    #[case::call_in_doc_string(
        "Feature: F\n  Scenario: S\n    Given text\n      \"\"\"\n      Given I call scenario \"S\" from feature \"G\"\n      \"\"\"\n"
    )]
    #[case::call_before_any_scenario("Given I call scenario \"S\" from feature \"G\"\n")]
    #[case::commented_call("Feature: F\n  Scenario: S\n    # Given I call scenario \"S\" from feature \"G\"\n")]
    #[case::byte_order_mark("\u{feff}Feature: F\n  Scenario: S\n    Given x\n")]
    fn passes_through_documents_without_expandable_calls(#[case] text: &str) {
        let (_dir, mut session) = empty_session();
        assert!(!session.has_scenario_calls(text));
        let expected = format!("{text}{}", LineTerminator::detect(text));
        assert_eq!(session.preprocess(text), expected);
    }

    #[test]
    fn unresolved_call_becomes_an_indented_warning() {
        let (_dir, mut session) = empty_session();
        let text = "Feature: F\n  Scenario: S\n    Given I call scenario \"Login\" from feature \"Auth\"\n    Then done\n";
        let output = session.preprocess(text);
        assert_eq!(
            output,
            "Feature: F\n  Scenario: S\n    # Warning: Could not expand scenario call: feature \"Auth\" \
             was not found (titles match case-insensitively; check the spelling)\n    Then done\n\n"
        );
    }

    #[test]
    fn byte_order_mark_is_kept_ahead_of_expanded_text() {
        let (_dir, mut session) = empty_session();
        let text = "\u{feff}# language: de\nFunktionalität: F\n  Szenario: S\n    Angenommen ich rufe Szenario \"X\" aus Feature \"Y\"\n";
        assert!(session.has_scenario_calls(text));
        let output = session.preprocess(text);
        assert!(output.starts_with("\u{feff}# language: de\n"));
        assert_eq!(output.matches(BYTE_ORDER_MARK).count(), 1);
        assert!(output.contains("    # Warning: Could not expand scenario call"));
    }

    #[test]
    fn call_on_last_line_gets_document_terminator() {
        let (_dir, mut session) = empty_session();
        let text = "Feature: F\r\n  Scenario: S\r\n\tGiven I call scenario \"X\" from feature \"Y\"";
        let output = session.preprocess(text);
        assert!(output.ends_with("\r\n"));
        assert!(output.contains("\r\n\t# Warning: Could not expand scenario call"));
        assert!(!output.contains("I call scenario"));
    }

    #[test]
    fn outline_calls_are_expanded() {
        let (_dir, mut session) = empty_session();
        let text = "Feature: F\n  Scenario Outline: O\n    Given I call scenario \"X\" from feature \"Y\"\n  Examples:\n    | a |\n";
        assert!(session.has_scenario_calls(text));
        assert!(session.preprocess(text).contains("# Warning"));
    }

    #[test]
    fn failed_result_renders_diagnostic() {
        let result = ExpansionResult::Failed(ExpansionError::FeatureNotFound {
            feature: "Auth".into(),
        });
        let block = result.render("\t", LineTerminator::CrLf);
        assert!(block.starts_with("\t# Warning: Could not expand scenario call: feature \"Auth\""));
        assert!(block.ends_with("\r\n"));
        assert_eq!(block.matches("\r\n").count(), 1);
    }

    struct NoDialects;

    impl DialectSource for NoDialects {
        fn lookup(&self, tag: &str) -> Result<Dialect, DialectError> {
            Err(DialectError::Unsupported(tag.to_owned()))
        }
    }

    #[test]
    fn grammar_failure_leaves_document_unchanged() {
        let (_dir, session) = empty_session();
        let mut session = session.with_phrases(CallPhraseTable::empty());
        let text = "Feature: F\n  Scenario: S\n    Given I call scenario \"X\" from feature \"Y\"";
        assert!(!session.has_scenario_calls(text));
        assert_eq!(session.preprocess(text), format!("{text}\n"));
    }

    #[test]
    fn unsupported_dialect_source_falls_back_to_english() {
        let (_dir, session) = empty_session();
        let mut session = session.with_dialects(DialectCache::new(NoDialects));
        let text = "# language: de\nFeature: F\n  Scenario: S\n    Given I call scenario \"X\" from feature \"Y\"\n";
        assert!(session.has_scenario_calls(text));
    }

    #[test]
    fn custom_phrases_are_recognised() {
        let (_dir, session) = empty_session();
        let phrases = CallPhraseTable::builtin().with_language(
            "it",
            CallPhrases::new(&["chiamo lo scenario"], &["dalla funzionalità"]),
        );
        let mut session = session.with_phrases(phrases);
        let text = "# language: it\nFunzionalità: F\n  Scenario: S\n    Dato chiamo lo scenario \"X\" dalla funzionalità \"Y\"\n";
        assert!(session.has_scenario_calls(text));
    }
}
