//! Feature-title lookup across the search roots, memoised per session.

use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use scenario_call_patterns::{DialectCache, detect_language, strip_byte_order_mark};
use tracing::debug;

use super::project::{CargoManifestReferences, ProjectReferences};
use super::search::{SearchConfig, collect_feature_files};
use crate::error::ExpansionError;
use crate::extract::feature_title;

#[derive(Debug, Clone)]
struct CachedFeature {
    title: String,
    path: PathBuf,
    content: Arc<str>,
}

/// Finds feature documents by their declared title.
///
/// Every file read while searching is cached under its title, whether or
/// not it was the one sought, and is never read again by this locator.
/// When several files declare the same title the first one enumerated is
/// kept; enumeration follows directory-listing order, so which file wins
/// is platform-dependent.
pub struct FeatureLocator {
    config: SearchConfig,
    references: Box<dyn ProjectReferences>,
    features: HashMap<String, CachedFeature>,
    scanned: HashSet<PathBuf>,
}

impl fmt::Debug for FeatureLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FeatureLocator")
            .field("config", &self.config)
            .field("features", &self.features.len())
            .field("scanned", &self.scanned.len())
            .finish_non_exhaustive()
    }
}

impl FeatureLocator {
    /// Locator following `Cargo.toml` path dependencies of the root.
    #[must_use]
    pub fn new(config: SearchConfig) -> Self {
        Self::with_references(config, CargoManifestReferences)
    }

    /// Locator using a custom project-reference reader.
    pub fn with_references(
        config: SearchConfig,
        references: impl ProjectReferences + 'static,
    ) -> Self {
        Self {
            config,
            references: Box::new(references),
            features: HashMap::new(),
            scanned: HashSet::new(),
        }
    }

    /// Search configuration in use.
    #[must_use]
    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// The configured root followed by the projects it references.
    ///
    /// References are followed one level deep: projects referenced by a
    /// referenced project are not included.
    #[must_use]
    pub fn search_roots(&self) -> Vec<PathBuf> {
        let root = self.config.root.clone();
        let mut roots = vec![root.clone()];
        roots.extend(self.references.referenced_roots(&root));
        roots
    }

    /// Every directory walked by a search, in search order.
    #[must_use]
    pub fn search_directories(&self) -> Vec<PathBuf> {
        self.search_roots()
            .iter()
            .flat_map(|root| self.config.directories_for(root))
            .collect()
    }

    /// Content of the feature titled `feature`, if any file declares it.
    ///
    /// Titles compare case-insensitively. Each candidate's language is
    /// detected on its own, so a German caller may locate a French feature.
    /// Unreadable files are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`ExpansionError::Discovery`] if a search directory cannot be
    /// enumerated.
    pub fn locate(
        &mut self,
        feature: &str,
        dialects: &mut DialectCache,
    ) -> Result<Option<Arc<str>>, ExpansionError> {
        let key = title_key(feature);
        if let Some(cached) = self.features.get(&key) {
            debug!(feature, path = %cached.path.display(), "feature cache hit");
            return Ok(Some(Arc::clone(&cached.content)));
        }

        let candidates = collect_feature_files(&self.search_directories())?;
        for path in candidates {
            if !self.scanned.insert(path.clone()) {
                continue;
            }
            let Some(title) = self.index_file(path, dialects) else {
                continue;
            };
            if title == key {
                return Ok(self.features.get(&key).map(|found| Arc::clone(&found.content)));
            }
        }
        debug!(feature, "feature not found");
        Ok(None)
    }

    /// Read one file and cache it under its title. Returns the cache key.
    fn index_file(&mut self, path: PathBuf, dialects: &mut DialectCache) -> Option<String> {
        let content: Arc<str> = match fs::read_to_string(&path) {
            Ok(content) => Arc::from(strip_byte_order_mark(&content)),
            Err(error) => {
                debug!(path = %path.display(), %error, "skipping unreadable feature file");
                return None;
            }
        };
        let dialect = dialects.get(detect_language(&content));
        let title = feature_title(&content, &dialect)?.to_owned();
        let key = title_key(&title);
        match self.features.entry(key.clone()) {
            Entry::Occupied(existing) => debug!(
                %title,
                kept = %existing.get().path.display(),
                ignored = %path.display(),
                "duplicate feature title"
            ),
            Entry::Vacant(slot) => {
                debug!(%title, path = %path.display(), "indexed feature file");
                slot.insert(CachedFeature {
                    title,
                    path,
                    content,
                });
            }
        }
        Some(key)
    }

    /// Content already cached for `feature`, without searching.
    #[must_use]
    pub fn cached(&self, feature: &str) -> Option<Arc<str>> {
        self.features
            .get(&title_key(feature))
            .map(|found| Arc::clone(&found.content))
    }

    /// Titles cached so far, as declared, in no particular order.
    pub fn cached_titles(&self) -> impl Iterator<Item = &str> {
        self.features.values().map(|found| found.title.as_str())
    }
}

fn title_key(title: &str) -> String {
    title.trim().to_lowercase()
}

#[cfg(test)]
#[expect(
    clippy::expect_used,
    reason = "tests require explicit panic messages for debugging failures"
)]
mod tests {
    use super::*;
    use crate::discovery::project::NoProjectReferences;
    use rstest::{fixture, rstest};
    use std::path::Path;
    use tempfile::TempDir;

    fn write(dir: &Path, relative: &str, contents: &str) -> PathBuf {
        let path = dir.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent directories");
        }
        fs::write(&path, contents).expect("write feature file");
        path
    }

    #[fixture]
    fn project() -> TempDir {
        let dir = TempDir::new().expect("temp dir");
        write(dir.path(), "Features/auth.feature", "Feature: Authentication\n  Scenario: Login\n    Given x\n");
        write(
            dir.path(),
            "Specs/de/konto.feature",
            "# language: de\nFunktionalität: Konto\n  Szenario: Anlegen\n    Angenommen y\n",
        );
        write(dir.path(), "notes.feature", "No header here\n");
        dir
    }

    fn locator(dir: &TempDir) -> FeatureLocator {
        FeatureLocator::with_references(SearchConfig::new(dir.path()), NoProjectReferences)
    }

    #[rstest]
    #[case::exact("Authentication")]
    #[case::lowercase("authentication")]
    #[case::padded("  AUTHENTICATION ")]
    fn locates_by_title(project: TempDir, #[case] title: &str) {
        let mut locator = locator(&project);
        let mut dialects = DialectCache::default();
        let content = locator
            .locate(title, &mut dialects)
            .expect("search should succeed")
            .expect("feature should be found");
        assert!(content.starts_with("Feature: Authentication"));
    }

    #[rstest]
    fn locates_localised_feature(project: TempDir) {
        let mut locator = locator(&project);
        let mut dialects = DialectCache::default();
        let content = locator
            .locate("Konto", &mut dialects)
            .expect("search should succeed");
        assert!(content.is_some_and(|text| text.contains("Szenario: Anlegen")));
    }

    #[rstest]
    fn missing_feature_is_none(project: TempDir) {
        let mut locator = locator(&project);
        let mut dialects = DialectCache::default();
        let content = locator.locate("Billing", &mut dialects).expect("search");
        assert!(content.is_none());
        let mut titles: Vec<&str> = locator.cached_titles().collect();
        titles.sort_unstable();
        assert_eq!(titles, ["Authentication", "Konto"]);
    }

    #[rstest]
    fn cached_content_survives_file_removal(project: TempDir) {
        let mut locator = locator(&project);
        let mut dialects = DialectCache::default();
        let first = locator
            .locate("Authentication", &mut dialects)
            .expect("search")
            .expect("found");
        fs::remove_file(project.path().join("Features/auth.feature")).expect("remove file");
        let second = locator
            .locate("Authentication", &mut dialects)
            .expect("search")
            .expect("still cached");
        assert!(Arc::ptr_eq(&first, &second));
        assert!(locator.cached("authentication").is_some());
    }

    #[test]
    fn byte_order_mark_is_dropped_before_indexing() {
        let dir = TempDir::new().expect("temp dir");
        write(
            dir.path(),
            "Features/bom.feature",
            "\u{feff}# language: de\nFunktionalität: Zahlung\n  Szenario: Bezahlen\n    Angenommen z\n",
        );
        let mut locator = locator(&dir);
        let mut dialects = DialectCache::default();
        let content = locator
            .locate("Zahlung", &mut dialects)
            .expect("search")
            .expect("feature with a byte-order mark should be found");
        assert!(content.starts_with("# language: de\n"));
    }

    #[test]
    fn duplicate_titles_keep_a_single_entry() {
        let dir = TempDir::new().expect("temp dir");
        write(dir.path(), "a.feature", "Feature: Shared\n  Scenario: From A\n    Given a\n");
        write(dir.path(), "b.feature", "Feature: shared\n  Scenario: From B\n    Given b\n");
        let mut locator = locator(&dir);
        let mut dialects = DialectCache::default();
        locator.locate("Missing", &mut dialects).expect("search");

        // Which file wins depends on directory-listing order.
        let content = locator.cached("SHARED").expect("one of the duplicates");
        assert!(content.contains("From A") ^ content.contains("From B"));
        assert_eq!(locator.cached_titles().count(), 1);
    }

    #[test]
    fn searches_referenced_projects() {
        let dir = TempDir::new().expect("temp dir");
        let app = dir.path().join("app");
        write(&app, "Cargo.toml", "[dev-dependencies]\nshared = { path = \"../shared\" }\n");
        write(dir.path(), "shared/Cargo.toml", "[dependencies]\ndeep = { path = \"../deep\" }\n");
        write(dir.path(), "shared/Tests/common.feature", "Feature: Common\n  Scenario: Setup\n    Given z\n");
        write(dir.path(), "deep/deep.feature", "Feature: Deep\n  Scenario: Hidden\n    Given w\n");

        let mut locator = FeatureLocator::new(SearchConfig::new(&app));
        let mut dialects = DialectCache::default();
        assert_eq!(locator.search_roots(), [app.clone(), app.join("../shared")]);
        assert!(locator.locate("Common", &mut dialects).expect("search").is_some());
        assert!(locator.locate("Deep", &mut dialects).expect("search").is_none());
    }

    #[test]
    fn missing_root_finds_nothing() {
        let dir = TempDir::new().expect("temp dir");
        let mut locator = FeatureLocator::new(SearchConfig::new(dir.path().join("absent")));
        let mut dialects = DialectCache::default();
        assert!(locator.search_directories().is_empty());
        assert!(locator.locate("Any", &mut dialects).expect("search").is_none());
    }
}
