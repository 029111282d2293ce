//! Language-aware building blocks for scenario-call expansion.
//!
//! The crate bundles the Gherkin keyword dialects, detects the `# language:`
//! directive of a document and compiles the per-dialect grammar used to
//! recognise steps such as `Given I call scenario "Login" from feature "Auth"`.
//! The expansion engine in `scenario-call` composes these pieces; they are
//! kept separate so the matching rules can be exercised without touching the
//! filesystem.

mod call;
mod dialect;
mod errors;
mod keyword;
mod language;

pub use call::{CallGrammar, CallPhrases, CallPhraseTable, ScenarioCallReference};
pub use dialect::{Dialect, DialectCache, DialectSource, EmbeddedDialects, Section};
pub use errors::{DialectError, PatternError};
pub use keyword::StepKeyword;
pub use language::{
    BYTE_ORDER_MARK, DEFAULT_LANGUAGE, LANGUAGE_SCAN_LINES, detect_language, strip_byte_order_mark,
};
