//! Error types shared by the dialect and grammar modules.

use thiserror::Error;

/// Errors surfaced while resolving a language tag to a keyword dialect.
///
/// These never reach the preprocessor's caller: [`DialectCache`] recovers
/// from them by substituting the default dialect.
///
/// [`DialectCache`]: crate::DialectCache
///
/// # Examples
/// ```
/// use scenario_call_patterns::DialectError;
/// let err = DialectError::Unsupported("tlh".into());
/// assert_eq!(err.to_string(), "unsupported Gherkin language `tlh`");
/// ```
#[derive(Debug, Error)]
pub enum DialectError {
    /// No dialect is registered for the tag or its primary language subtag.
    #[error("unsupported Gherkin language `{0}`")]
    Unsupported(String),
    /// A dialect table could not be decoded.
    #[error("invalid dialect table: {0}")]
    Table(#[from] serde_json::Error),
}

/// Errors surfaced while compiling a dialect's call grammar.
///
/// # Examples
/// ```
/// use scenario_call_patterns::PatternError;
/// let err = PatternError::NoKeywords("xx".into());
/// assert!(err.to_string().contains("`xx`"));
/// ```
#[derive(Debug, Error)]
pub enum PatternError {
    /// The dialect has no non-wildcard step keywords to anchor a call on.
    #[error("dialect `{0}` has no step keywords usable in a scenario call")]
    NoKeywords(String),
    /// The phrase table for the dialect is empty.
    #[error("no call phrases configured for dialect `{0}`")]
    NoPhrases(String),
    /// The assembled expression was rejected by the regex engine.
    #[error(transparent)]
    Regex(#[from] regex::Error),
}
