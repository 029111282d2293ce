//! Search roots and `.feature` file enumeration.

use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::{DirEntry, WalkDir};

/// Subdirectories searched beneath each root, in addition to the root
/// itself.
pub const DEFAULT_SUBDIRECTORIES: [&str; 3] = ["Features", "Specs", "Tests"];

/// Where the locator looks for feature files.
///
/// The root is always explicit. Only the outermost caller should consult
/// the process working directory, through
/// [`SearchConfig::from_current_dir`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchConfig {
    /// Project root searched first.
    pub root: PathBuf,
    /// Subdirectories of every root that are searched after the root.
    pub subdirectories: Vec<String>,
}

impl SearchConfig {
    /// Search `root` and the default subdirectories.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            subdirectories: DEFAULT_SUBDIRECTORIES.map(str::to_owned).to_vec(),
        }
    }

    /// Search the process working directory.
    ///
    /// # Errors
    ///
    /// Returns the error reported by [`std::env::current_dir`].
    pub fn from_current_dir() -> io::Result<Self> {
        std::env::current_dir().map(Self::new)
    }

    /// Replace the searched subdirectories.
    #[must_use]
    pub fn with_subdirectories<I, S>(mut self, subdirectories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.subdirectories = subdirectories.into_iter().map(Into::into).collect();
        self
    }

    /// Directories to walk for one project root: the root followed by each
    /// configured subdirectory that exists.
    #[must_use]
    pub fn directories_for(&self, root: &Path) -> Vec<PathBuf> {
        std::iter::once(root.to_path_buf())
            .chain(self.subdirectories.iter().map(|sub| root.join(sub)))
            .filter(|dir| dir.is_dir())
            .collect()
    }
}

/// Whether the path names a `.feature` file (extension compared without
/// regard to case).
#[must_use]
pub fn is_feature_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("feature"))
}

fn feature_path(entry: DirEntry) -> Option<PathBuf> {
    if entry.file_type().is_dir() {
        return None;
    }
    let path = entry.into_path();
    (path.is_file() && is_feature_file(&path)).then_some(path)
}

fn convert_walkdir_error(err: walkdir::Error) -> Option<io::Error> {
    if err.loop_ancestor().is_some() {
        return None;
    }
    let message = err.to_string();
    Some(err.into_io_error().unwrap_or_else(|| io::Error::other(message)))
}

/// Recursively collect `.feature` files beneath each directory.
///
/// Paths are returned in walk order, which follows the platform's directory
/// listing and is not sorted. A path reachable from several directories is
/// reported once, at its first occurrence. Symbolic links to files are
/// reported but directory links are not followed.
///
/// # Errors
///
/// Returns the first error met while reading a directory. Filesystem loops
/// are skipped rather than reported.
pub fn collect_feature_files(directories: &[PathBuf]) -> io::Result<Vec<PathBuf>> {
    let mut seen = HashSet::new();
    let mut files = Vec::new();
    for directory in directories {
        for next in WalkDir::new(directory).follow_links(false) {
            match next {
                Ok(entry) => {
                    if let Some(path) = feature_path(entry) {
                        if seen.insert(path.clone()) {
                            files.push(path);
                        }
                    }
                }
                Err(err) => {
                    if let Some(err) = convert_walkdir_error(err) {
                        return Err(err);
                    }
                }
            }
        }
    }
    debug!(count = files.len(), "enumerated feature files");
    Ok(files)
}

#[cfg(test)]
#[expect(
    clippy::expect_used,
    reason = "tests require explicit panic messages for debugging failures"
)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::fs;
    use tempfile::TempDir;

    fn touch(dir: &Path, relative: &str) -> PathBuf {
        let path = dir.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent directories");
        }
        fs::write(&path, "Feature: x\n").expect("write file");
        path
    }

    #[rstest]
    #[case::lower("a.feature", true)]
    #[case::upper("a.FEATURE", true)]
    #[case::other("a.features", false)]
    #[case::none("feature", false)]
    #[case::rust("a.rs", false)]
    fn classifies_feature_extension(#[case] name: &str, #[case] expected: bool) {
        assert_eq!(is_feature_file(Path::new(name)), expected);
    }

    #[test]
    fn default_config_searches_conventional_subdirectories() {
        let config = SearchConfig::new("/project");
        assert_eq!(config.root, PathBuf::from("/project"));
        assert_eq!(config.subdirectories, ["Features", "Specs", "Tests"]);
    }

    #[test]
    fn directories_skip_missing_subdirectories() {
        let dir = TempDir::new().expect("temp dir");
        fs::create_dir(dir.path().join("Specs")).expect("create Specs");
        let config = SearchConfig::new(dir.path());
        assert_eq!(
            config.directories_for(dir.path()),
            [dir.path().to_path_buf(), dir.path().join("Specs")]
        );
    }

    #[test]
    fn custom_subdirectories_replace_defaults() {
        let config = SearchConfig::new("/p").with_subdirectories(["acceptance"]);
        assert_eq!(config.subdirectories, ["acceptance"]);
    }

    #[test]
    fn collects_nested_feature_files_once() {
        let dir = TempDir::new().expect("temp dir");
        let top = touch(dir.path(), "top.feature");
        let nested = touch(dir.path(), "Features/auth/login.feature");
        touch(dir.path(), "Features/readme.md");

        let config = SearchConfig::new(dir.path());
        let files = collect_feature_files(&config.directories_for(dir.path()))
            .expect("walk should succeed");

        assert_eq!(files.len(), 2);
        assert!(files.contains(&top));
        assert!(files.contains(&nested));
    }

    #[test]
    fn empty_directory_yields_nothing() {
        let dir = TempDir::new().expect("temp dir");
        let files = collect_feature_files(&[dir.path().to_path_buf()]).expect("walk");
        assert!(files.is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn ignores_directory_symlink_loops() {
        let dir = TempDir::new().expect("temp dir");
        let feature = touch(dir.path(), "Features/a.feature");
        std::os::unix::fs::symlink(dir.path(), dir.path().join("Features/loop"))
            .expect("create symlink");

        let files = collect_feature_files(&[dir.path().to_path_buf()]).expect("walk");
        assert_eq!(files, [feature]);
    }
}
