//! Failures surfaced while expanding a scenario call.
//!
//! None of these escape [`Preprocessor::preprocess`]; each is rendered as a
//! comment line in place of the call that triggered it.
//!
//! [`Preprocessor::preprocess`]: crate::Preprocessor::preprocess

use thiserror::Error;

/// Marker opening the comment that replaces a call which could not be
/// resolved.
pub const WARNING_MARKER: &str = "# Warning: Could not expand scenario call";

/// Marker opening the comment that replaces a call whose expansion failed
/// unexpectedly.
pub const ERROR_MARKER: &str = "# ERROR:";

/// Errors that can occur while resolving and extracting a called scenario.
#[derive(Debug, Error)]
pub enum ExpansionError {
    /// No feature file in the search space declares the requested title.
    #[error(
        "feature \"{feature}\" was not found (titles match case-insensitively; check the spelling)"
    )]
    FeatureNotFound {
        /// Requested feature title.
        feature: String,
    },

    /// The feature exists but none of its scenarios carries the title.
    #[error(
        "scenario \"{scenario}\" was not found in feature \"{feature}\" (titles match case-insensitively; check the spelling)"
    )]
    ScenarioNotFound {
        /// Requested scenario title.
        scenario: String,
        /// Feature that was searched.
        feature: String,
    },

    /// The scenario exists but has no step lines to copy.
    #[error("scenario \"{scenario}\" in feature \"{feature}\" has no steps")]
    EmptyScenario {
        /// Requested scenario title.
        scenario: String,
        /// Feature that was searched.
        feature: String,
    },

    /// A search directory could not be enumerated.
    #[error("feature discovery failed: {0}")]
    Discovery(#[from] std::io::Error),
}

impl ExpansionError {
    /// Whether the failure means the call target does not exist, as opposed
    /// to an unexpected failure while looking for it.
    #[must_use]
    pub fn is_unresolved(&self) -> bool {
        !matches!(self, Self::Discovery(_))
    }

    /// Comment text that replaces the failed call, without indentation or
    /// line terminator.
    ///
    /// # Examples
    ///
    /// ```
    /// use scenario_call::ExpansionError;
    ///
    /// let err = ExpansionError::EmptyScenario {
    ///     scenario: "Setup".into(),
    ///     feature: "Common".into(),
    /// };
    /// assert_eq!(
    ///     err.diagnostic(),
    ///     "# Warning: Could not expand scenario call: scenario \"Setup\" in feature \"Common\" has no steps",
    /// );
    /// ```
    #[must_use]
    pub fn diagnostic(&self) -> String {
        if self.is_unresolved() {
            format!("{WARNING_MARKER}: {self}")
        } else {
            format!("{ERROR_MARKER} {self}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feature_not_found_names_feature() {
        let error = ExpansionError::FeatureNotFound {
            feature: "Auth".to_string(),
        };
        assert!(error.is_unresolved());
        assert_eq!(
            error.diagnostic(),
            "# Warning: Could not expand scenario call: feature \"Auth\" was not found \
             (titles match case-insensitively; check the spelling)"
        );
    }

    #[test]
    fn scenario_not_found_names_both_titles() {
        let error = ExpansionError::ScenarioNotFound {
            scenario: "Login".to_string(),
            feature: "Auth".to_string(),
        };
        let diagnostic = error.diagnostic();
        assert!(diagnostic.starts_with(WARNING_MARKER));
        assert!(diagnostic.contains("scenario \"Login\""));
        assert!(diagnostic.contains("feature \"Auth\""));
    }

    #[test]
    fn discovery_failure_renders_as_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let error: ExpansionError = io_err.into();
        assert!(!error.is_unresolved());
        assert_eq!(
            error.diagnostic(),
            "# ERROR: feature discovery failed: access denied"
        );
    }
}
