//! Error types for the command-line front end.

use std::path::PathBuf;

use thiserror::Error;

/// Exit status for a runtime I/O failure.
pub const EXIT_IO: i32 = 1;

/// Exit status for an invalid configuration value or data file.
pub const EXIT_CONFIG: i32 = 2;

/// Errors that can occur while running a command.
///
/// Expansion problems inside a document are not errors: they are written
/// into the expanded text as comments.
#[derive(Debug, Error)]
pub enum CliError {
    /// An invalid configuration value was provided.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A call-phrase or dialect file could not be decoded.
    #[error("invalid data file {}: {source}", path.display())]
    DataFile {
        /// File that failed to decode.
        path: PathBuf,
        /// Decoder error.
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A file could not be read or written.
    #[error("{}: {source}", path.display())]
    File {
        /// File being accessed.
        path: PathBuf,
        /// Underlying failure.
        source: std::io::Error,
    },

    /// Any other I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Process exit status for this error.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::InvalidConfig(_) | Self::DataFile { .. } => EXIT_CONFIG,
            Self::File { .. } | Self::Io(_) => EXIT_IO,
        }
    }

    pub(crate) fn file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::File {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_config_error_displays_message() {
        let error = CliError::InvalidConfig("unknown log level".to_string());
        assert_eq!(error.to_string(), "invalid configuration: unknown log level");
        assert_eq!(error.exit_code(), EXIT_CONFIG);
    }

    #[test]
    fn file_error_names_path() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let error = CliError::file("features/a.feature", io_err);
        assert_eq!(error.to_string(), "features/a.feature: file not found");
        assert_eq!(error.exit_code(), EXIT_IO);
    }

    #[test]
    fn io_error_converts_from_std_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe closed");
        let error: CliError = io_err.into();
        assert!(error.to_string().contains("pipe closed"));
        assert_eq!(error.exit_code(), EXIT_IO);
    }
}
