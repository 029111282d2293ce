//! Feature file discovery.
//!
//! This module finds the feature document a scenario call refers to. It
//! enumerates `.feature` files beneath an explicit project root and the
//! projects that root references, and caches every document it reads under
//! its declared feature title.

mod locator;
mod project;
mod search;

pub use locator::FeatureLocator;
pub use project::{CARGO_MANIFEST, CargoManifestReferences, NoProjectReferences, ProjectReferences};
pub use search::{DEFAULT_SUBDIRECTORIES, SearchConfig, collect_feature_files, is_feature_file};
