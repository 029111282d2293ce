//! Project references read from a root's manifest.
//!
//! Feature files shared between projects are found by following the
//! projects a root depends on. For Rust projects these are the `path`
//! dependencies declared in `Cargo.toml`.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

/// File name of the manifest read by [`CargoManifestReferences`].
pub const CARGO_MANIFEST: &str = "Cargo.toml";

/// Reader of the projects a project root refers to.
pub trait ProjectReferences {
    /// Directories of the projects referenced from `root`'s top level.
    ///
    /// Implementations return only directories that exist. Unreadable or
    /// malformed descriptors yield no references.
    fn referenced_roots(&self, root: &Path) -> Vec<PathBuf>;
}

/// Follows the `path` dependencies of `<root>/Cargo.toml`.
///
/// `[dependencies]`, `[dev-dependencies]`, `[build-dependencies]` and their
/// `[target.'cfg(..)'.*]` counterparts are read. Paths are resolved against
/// the root; a path naming a manifest resolves to its directory.
#[derive(Debug, Default, Clone, Copy)]
pub struct CargoManifestReferences;

/// Reads no references.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProjectReferences;

impl ProjectReferences for NoProjectReferences {
    fn referenced_roots(&self, _root: &Path) -> Vec<PathBuf> {
        Vec::new()
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct Manifest {
    #[serde(flatten)]
    tables: DependencyTables,
    #[serde(default)]
    target: BTreeMap<String, DependencyTables>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct DependencyTables {
    #[serde(default)]
    dependencies: BTreeMap<String, toml::Value>,
    #[serde(default)]
    dev_dependencies: BTreeMap<String, toml::Value>,
    #[serde(default)]
    build_dependencies: BTreeMap<String, toml::Value>,
}

impl DependencyTables {
    /// `path` keys of detailed dependency entries; version strings and
    /// workspace-inherited entries carry none.
    fn paths(&self) -> impl Iterator<Item = &Path> {
        self.dependencies
            .values()
            .chain(self.dev_dependencies.values())
            .chain(self.build_dependencies.values())
            .filter_map(|dependency| dependency.get("path")?.as_str())
            .map(Path::new)
    }
}

fn parse_manifest(text: &str) -> Option<Manifest> {
    toml::from_str(text)
        .map_err(|error| debug!(%error, "ignoring malformed manifest"))
        .ok()
}

fn project_directory(root: &Path, reference: &Path) -> PathBuf {
    let joined = root.join(reference);
    if joined.file_name().is_some_and(|name| name == CARGO_MANIFEST) {
        joined.parent().map_or_else(|| joined.clone(), Path::to_path_buf)
    } else {
        joined
    }
}

impl ProjectReferences for CargoManifestReferences {
    fn referenced_roots(&self, root: &Path) -> Vec<PathBuf> {
        let manifest_path = root.join(CARGO_MANIFEST);
        let Ok(text) = fs::read_to_string(&manifest_path) else {
            return Vec::new();
        };
        let Some(manifest) = parse_manifest(&text) else {
            return Vec::new();
        };

        let mut roots: Vec<PathBuf> = Vec::new();
        let references = manifest
            .tables
            .paths()
            .chain(manifest.target.values().flat_map(DependencyTables::paths));
        for reference in references {
            let directory = project_directory(root, reference);
            if directory.is_dir() && directory != root && !roots.contains(&directory) {
                roots.push(directory);
            }
        }
        debug!(manifest = %manifest_path.display(), count = roots.len(), "read project references");
        roots
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
    use tempfile::TempDir;

    fn write(path: &Path, contents: &str) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent directories");
        }
        fs::write(path, contents).expect("write file");
    }

    #[test]
    fn reads_path_dependencies_from_every_table() {
        let dir = TempDir::new().expect("temp dir");
        let app = dir.path().join("app");
        for name in ["shared", "fixtures", "codegen", "win"] {
            fs::create_dir_all(dir.path().join(name)).expect("create project");
        }
        write(
            &app.join(CARGO_MANIFEST),
            r#"
[package]
name = "app"

[dependencies]
serde = "1"
shared = { path = "../shared" }
tokio = { version = "1", features = ["full"] }

[dev-dependencies]
fixtures = { path = "../fixtures/Cargo.toml" }

[build-dependencies]
codegen = { path = "../codegen" }

[target.'cfg(windows)'.dependencies]
win = { path = "../win" }
"#,
        );

        let roots = CargoManifestReferences.referenced_roots(&app);
        assert_eq!(
            roots,
            [
                app.join("../shared"),
                app.join("../fixtures"),
                app.join("../codegen"),
                app.join("../win"),
            ]
        );
    }

    #[rstest]
    #[case::missing_directory("[dependencies]\ngone = { path = \"../gone\" }\n")]
    #[case::malformed("[dependencies\nshared = ")]
    #[case::no_dependencies("[package]\nname = \"app\"\n")]
    #[case::workspace_inherited("[dependencies]\nshared = { workspace = true }\n")]
    fn yields_no_references(#[case] manifest: &str) {
        let dir = TempDir::new().expect("temp dir");
        write(&dir.path().join(CARGO_MANIFEST), manifest);
        assert!(CargoManifestReferences.referenced_roots(dir.path()).is_empty());
    }

    #[test]
    fn missing_manifest_yields_no_references() {
        let dir = TempDir::new().expect("temp dir");
        assert!(CargoManifestReferences.referenced_roots(dir.path()).is_empty());
    }

    #[test]
    fn ignores_self_and_duplicate_references() {
        let dir = TempDir::new().expect("temp dir");
        fs::create_dir_all(dir.path().join("shared")).expect("create project");
        write(
            &dir.path().join(CARGO_MANIFEST),
            "[dependencies]\nshared = { path = \"shared\" }\n\n[dev-dependencies]\nshared = { path = \"shared\" }\n",
        );
        assert_eq!(
            CargoManifestReferences.referenced_roots(dir.path()),
            [dir.path().join("shared")]
        );
    }

    #[test]
    fn no_references_reader_is_empty() {
        assert!(NoProjectReferences.referenced_roots(Path::new(".")).is_empty());
    }
}
