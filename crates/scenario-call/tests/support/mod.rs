//! Shared helpers for scenario-call integration tests.
//!
//! Each test binary uses a different subset of these helpers.

#![allow(dead_code, reason = "each test binary uses a different subset of helpers")]

use std::fs;
use std::path::{Path, PathBuf};

use scenario_call::discovery::NoProjectReferences;
use scenario_call::{FeatureLocator, Preprocessor, SearchConfig};
use tempfile::TempDir;

/// Temporary project tree holding feature files.
pub struct Project {
    dir: TempDir,
}

impl Project {
    /// Create an empty project.
    #[expect(clippy::expect_used, reason = "test helper uses expect for clarity")]
    pub fn empty() -> Self {
        Self {
            dir: TempDir::new().expect("create temporary project"),
        }
    }

    /// Project root.
    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Write a file relative to the root, creating parent directories.
    #[expect(clippy::expect_used, reason = "test helper uses expect for clarity")]
    pub fn write(&self, relative: &str, contents: &str) -> PathBuf {
        let path = self.dir.path().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent directories");
        }
        fs::write(&path, contents).expect("write project file");
        path
    }

    /// Builder-style [`Project::write`].
    pub fn with(self, relative: &str, contents: &str) -> Self {
        self.write(relative, contents);
        self
    }

    /// Fresh session rooted at the project, ignoring project references.
    pub fn session(&self) -> Preprocessor {
        Preprocessor::with_locator(FeatureLocator::with_references(
            SearchConfig::new(self.root()),
            NoProjectReferences,
        ))
    }

    /// Fresh session rooted at a subdirectory, following `Cargo.toml`
    /// references.
    pub fn session_at(&self, relative: &str) -> Preprocessor {
        Preprocessor::new(SearchConfig::new(self.root().join(relative)))
    }
}

/// Lines of `text` with trailing `\r` removed.
pub fn lines(text: &str) -> Vec<&str> {
    text.split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .collect()
}

/// Position of the first line equal to `expected`.
pub fn line_index(text: &str, expected: &str) -> usize {
    lines(text)
        .iter()
        .position(|line| *line == expected)
        .unwrap_or_else(|| panic!("missing line {expected:?} in:\n{text}"))
}
