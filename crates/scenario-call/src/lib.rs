//! Build-time expansion of scenario calls in Gherkin feature files.
//!
//! A step such as `Given I call scenario "Login" from feature "Auth"` is
//! replaced, before the document reaches a Gherkin parser, by the steps of
//! the named scenario:
//!
//! ```text
//!     # Expanded from scenario call: "Login" from feature "Auth"
//!     Given I am on the login page
//!     When I enter valid credentials
//! ```
//!
//! The [`Preprocessor`] detects the document's `# language:` directive,
//! matches call steps in that language, finds the called feature with a
//! [`FeatureLocator`] and copies the scenario's steps, data tables and
//! doc-strings into place. Failures never abort preprocessing; they appear
//! as comment lines where the call was.

pub mod discovery;
mod error;
mod extract;
mod preprocess;

pub use discovery::{FeatureLocator, SearchConfig};
pub use error::{ERROR_MARKER, ExpansionError, WARNING_MARKER};
pub use extract::{DocStringDelimiter, TABLE_ROW_INDENT, feature_title, scenario_steps};
pub use preprocess::{EXPANSION_MARKER, ExpansionResult, LineTerminator, Preprocessor, preprocess};
pub use scenario_call_patterns as patterns;
