//! Command configuration read from the environment and the command line.
//!
//! Settings come from environment variables prefixed with `SCENARIO_CALL_`;
//! command-line flags take precedence over them.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use scenario_call::SearchConfig;

use crate::error::CliError;

/// Environment variable holding the log level.
pub const LOG_LEVEL_VAR: &str = "SCENARIO_CALL_LOG_LEVEL";

/// Environment variable holding the feature search root.
pub const ROOT_VAR: &str = "SCENARIO_CALL_ROOT";

/// Log level matching the `tracing` levels, plus `off`.
///
/// Defaults to `Warn` so expansion warnings reach stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    /// Every event, including per-file discovery.
    Trace,
    /// Cache and resolution decisions.
    Debug,
    /// Progress messages.
    Info,
    /// Calls that could not be expanded.
    #[default]
    Warn,
    /// Failures only.
    Error,
    /// No logging.
    Off,
}

impl FromStr for LogLevel {
    type Err = CliError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "trace" => Ok(Self::Trace),
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            "off" | "none" => Ok(Self::Off),
            _ => Err(CliError::InvalidConfig(format!(
                "unknown log level '{s}', expected one of: trace, debug, info, warn, error, off"
            ))),
        }
    }
}

impl LogLevel {
    /// Convert to a tracing filter directive string.
    #[must_use]
    pub fn as_filter_str(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
            Self::Off => "off",
        }
    }
}

/// Settings shared by every subcommand.
///
/// # Environment Variables
///
/// - `SCENARIO_CALL_LOG_LEVEL`: log level (trace, debug, info, warn, error,
///   off)
/// - `SCENARIO_CALL_ROOT`: directory searched for called features; the
///   working directory when unset
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CliConfig {
    /// Log level.
    pub log_level: LogLevel,
    /// Feature search root. `None` means the working directory.
    pub root: Option<PathBuf>,
}

impl CliConfig {
    /// Load configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns `CliError::InvalidConfig` if a variable holds an invalid value.
    pub fn from_env() -> Result<Self, CliError> {
        Self::from_vars(|name| env::var(name).ok())
    }

    /// Load configuration through a variable lookup function.
    ///
    /// Empty values count as unset.
    ///
    /// # Errors
    ///
    /// Returns `CliError::InvalidConfig` if a variable holds an invalid value.
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, CliError> {
        let value = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        let log_level = match value(LOG_LEVEL_VAR) {
            Some(level) => level.parse()?,
            None => LogLevel::default(),
        };
        Ok(Self {
            log_level,
            root: value(ROOT_VAR).map(PathBuf::from),
        })
    }

    /// Apply optional overrides to an existing configuration.
    ///
    /// This is intended for command-line flags that should take precedence
    /// over environment-based defaults.
    #[must_use]
    pub fn apply_overrides(mut self, log_level: Option<LogLevel>, root: Option<PathBuf>) -> Self {
        if let Some(level) = log_level {
            self.log_level = level;
        }
        if let Some(root) = root {
            self.root = Some(root);
        }
        self
    }

    /// Search configuration for the locator: the configured root, or the
    /// working directory.
    ///
    /// # Errors
    ///
    /// Returns `CliError::InvalidConfig` if the root is not a directory, and
    /// `CliError::Io` if the working directory cannot be determined.
    pub fn search_config(&self) -> Result<SearchConfig, CliError> {
        match &self.root {
            Some(root) if root.is_dir() => Ok(SearchConfig::new(root)),
            Some(root) => Err(CliError::InvalidConfig(format!(
                "search root '{}' is not a directory",
                root.display()
            ))),
            None => Ok(SearchConfig::from_current_dir()?),
        }
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
    use std::collections::HashMap;

    #[rstest]
    #[case::trace("trace", LogLevel::Trace)]
    #[case::debug("Debug", LogLevel::Debug)]
    #[case::info("INFO", LogLevel::Info)]
    #[case::warn("warn", LogLevel::Warn)]
    #[case::warning("warning", LogLevel::Warn)]
    #[case::error("error", LogLevel::Error)]
    #[case::off(" off ", LogLevel::Off)]
    fn log_level_parses_valid_values(#[case] input: &str, #[case] expected: LogLevel) {
        assert_eq!(input.parse::<LogLevel>().ok(), Some(expected));
    }

    #[test]
    fn log_level_rejects_invalid_values() {
        let error = "verbose".parse::<LogLevel>().expect_err("invalid level");
        assert!(error.to_string().contains("unknown log level 'verbose'"));
    }

    #[test]
    fn log_level_round_trips_through_filter_string() {
        for level in [
            LogLevel::Trace,
            LogLevel::Debug,
            LogLevel::Info,
            LogLevel::Warn,
            LogLevel::Error,
            LogLevel::Off,
        ] {
            assert_eq!(level.as_filter_str().parse::<LogLevel>().ok(), Some(level));
        }
    }

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> + use<> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(name, value)| ((*name).to_owned(), (*value).to_owned()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn defaults_without_variables() {
        let config = CliConfig::from_vars(vars(&[])).expect("config");
        assert_eq!(config, CliConfig::default());
        assert_eq!(config.log_level, LogLevel::Warn);
    }

    #[test]
    fn reads_variables() {
        let config = CliConfig::from_vars(vars(&[(LOG_LEVEL_VAR, "debug"), (ROOT_VAR, "/srv/specs")]))
            .expect("config");
        assert_eq!(config.log_level, LogLevel::Debug);
        assert_eq!(config.root, Some(PathBuf::from("/srv/specs")));
    }

    #[test]
    fn empty_variables_count_as_unset() {
        let config =
            CliConfig::from_vars(vars(&[(LOG_LEVEL_VAR, ""), (ROOT_VAR, "  ")])).expect("config");
        assert_eq!(config, CliConfig::default());
    }

    #[test]
    fn invalid_variable_is_rejected() {
        let result = CliConfig::from_vars(vars(&[(LOG_LEVEL_VAR, "loud")]));
        assert!(matches!(result, Err(CliError::InvalidConfig(_))));
    }

    #[test]
    fn apply_overrides_updates_selected_fields() {
        let base = CliConfig {
            log_level: LogLevel::Info,
            root: Some(PathBuf::from("env-root")),
        };
        let config = base
            .clone()
            .apply_overrides(Some(LogLevel::Error), Some(PathBuf::from("cli-root")));
        assert_eq!(config.log_level, LogLevel::Error);
        assert_eq!(config.root, Some(PathBuf::from("cli-root")));

        assert_eq!(base.clone().apply_overrides(None, None), base);
    }

    #[test]
    fn search_config_rejects_missing_root() {
        let dir = tempfile::TempDir::new().expect("temp dir");
        let config = CliConfig {
            root: Some(dir.path().join("absent")),
            ..CliConfig::default()
        };
        assert!(matches!(config.search_config(), Err(CliError::InvalidConfig(_))));

        let config = CliConfig {
            root: Some(dir.path().to_path_buf()),
            ..CliConfig::default()
        };
        assert_eq!(
            config.search_config().expect("valid root").root,
            dir.path().to_path_buf()
        );
    }
}
