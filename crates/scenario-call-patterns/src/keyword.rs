//! Step keyword categories shared by dialect lookup and call matching.
//!
//! Every Gherkin dialect groups its localised step keywords into the same five
//! categories. [`StepKeyword`] names those categories independently of the
//! language so callers can ask a [`Dialect`](crate::Dialect) for "the `Given`
//! keywords" without caring whether they read `Given`, `Angenommen` or `前提`.

use std::fmt;

/// Category of a step keyword.
///
/// The generic `*` keyword belongs to every category in the upstream dialect
/// tables; it is kept there for step classification and filtered out when a
/// call grammar is compiled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepKeyword {
    /// Setup preconditions for a scenario.
    Given,
    /// Perform an action when testing behaviour.
    When,
    /// Assert the expected outcome of a scenario.
    Then,
    /// Additional conditions that share context with the previous step.
    And,
    /// Negative or contrasting conditions.
    But,
}

impl StepKeyword {
    /// All categories in the order dialect tables list them.
    pub const ALL: [Self; 5] = [Self::Given, Self::When, Self::Then, Self::And, Self::But];

    /// Return the English name of the category.
    ///
    /// # Examples
    ///
    /// ```
    /// use scenario_call_patterns::StepKeyword;
    ///
    /// assert_eq!(StepKeyword::Given.as_str(), "Given");
    /// assert_eq!(StepKeyword::But.as_str(), "But");
    /// ```
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Given => "Given",
            Self::When => "When",
            Self::Then => "Then",
            Self::And => "And",
            Self::But => "But",
        }
    }
}

impl fmt::Display for StepKeyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(StepKeyword::Given, "Given")]
    #[case(StepKeyword::When, "When")]
    #[case(StepKeyword::Then, "Then")]
    #[case(StepKeyword::And, "And")]
    #[case(StepKeyword::But, "But")]
    fn displays_canonical_name(#[case] keyword: StepKeyword, #[case] expected: &str) {
        assert_eq!(keyword.as_str(), expected);
        assert_eq!(keyword.to_string(), expected);
    }

    #[test]
    fn all_lists_each_category_once() {
        let mut seen = std::collections::HashSet::new();
        for keyword in StepKeyword::ALL {
            assert!(seen.insert(keyword));
        }
        assert_eq!(seen.len(), 5);
    }
}
