//! Subcommand implementations.

use std::collections::HashMap;
use std::ffi::OsStr;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use scenario_call::Preprocessor;
use scenario_call::patterns::{CallPhraseTable, DialectCache, DialectSource, EmbeddedDialects};
use tracing::{debug, info};

use crate::config::CliConfig;
use crate::error::CliError;

/// Optional data files replacing or extending the bundled tables.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DataFiles {
    /// JSON object of extra call phrases keyed by language tag, merged into
    /// the built-in table.
    pub phrases: Option<PathBuf>,
    /// JSON dialect table in the `gherkin-languages.json` layout, used
    /// instead of the bundled one.
    pub dialects: Option<PathBuf>,
}

impl DataFiles {
    /// The built-in phrase table merged with the phrases file, if any.
    ///
    /// # Errors
    ///
    /// Returns `CliError::File` if the file cannot be read and
    /// `CliError::DataFile` if it is not a phrase table.
    pub fn phrase_table(&self) -> Result<CallPhraseTable, CliError> {
        let builtin = CallPhraseTable::builtin();
        let Some(path) = &self.phrases else {
            return Ok(builtin);
        };
        let extra: CallPhraseTable =
            serde_json::from_str(&read(path)?).map_err(|source| CliError::DataFile {
                path: path.clone(),
                source: Box::new(source),
            })?;
        debug!(path = %path.display(), languages = extra.languages().count(), "loaded call phrases");
        Ok(builtin.merged(&extra))
    }

    /// The dialect table to read documents with.
    ///
    /// # Errors
    ///
    /// Returns `CliError::File` if the file cannot be read and
    /// `CliError::DataFile` if it is not a dialect table.
    pub fn dialect_table(&self) -> Result<EmbeddedDialects, CliError> {
        let Some(path) = &self.dialects else {
            return Ok(EmbeddedDialects::bundled());
        };
        let dialects =
            EmbeddedDialects::from_json(&read(path)?).map_err(|source| CliError::DataFile {
                path: path.clone(),
                source: Box::new(source),
            })?;
        debug!(path = %path.display(), languages = dialects.languages().len(), "loaded dialects");
        Ok(dialects)
    }
}

/// Arguments of the `expand` subcommand.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpandOptions {
    /// Feature documents to expand.
    pub files: Vec<PathBuf>,
    /// Directory receiving one expanded file per input, under the input's
    /// file name. Output goes to `out` when unset. Inputs sharing a file
    /// name are rejected when it is set.
    pub output_dir: Option<PathBuf>,
    /// Phrase and dialect overrides.
    pub data: DataFiles,
}

/// Inputs written into one output directory must have distinct file names.
fn reject_colliding_names(files: &[PathBuf]) -> Result<(), CliError> {
    let mut seen: HashMap<&OsStr, &Path> = HashMap::new();
    for path in files {
        let name = path.file_name().ok_or_else(|| {
            CliError::InvalidConfig(format!("'{}' does not name a file", path.display()))
        })?;
        if let Some(earlier) = seen.insert(name, path) {
            return Err(CliError::InvalidConfig(format!(
                "'{}' and '{}' would both be written to the output directory as '{}'",
                earlier.display(),
                path.display(),
                name.to_string_lossy()
            )));
        }
    }
    Ok(())
}

fn read(path: &Path) -> Result<String, CliError> {
    fs::read_to_string(path).map_err(|source| CliError::file(path, source))
}

/// Expand the scenario calls of every input file.
///
/// All files share one session, so a called feature is read at most once
/// per invocation. Expanded documents are written to `out` in input order,
/// or into the output directory.
///
/// # Errors
///
/// Returns `CliError` if the configuration or a data file is invalid, or if
/// an input cannot be read or an output cannot be written. Calls that cannot
/// be expanded are not errors.
pub fn expand(
    config: &CliConfig,
    options: &ExpandOptions,
    out: &mut impl Write,
) -> Result<(), CliError> {
    let search = config.search_config()?;
    info!(root = %search.root.display(), files = options.files.len(), "expanding scenario calls");
    let mut session = Preprocessor::new(search)
        .with_phrases(options.data.phrase_table()?)
        .with_dialects(DialectCache::new(options.data.dialect_table()?));

    if let Some(dir) = &options.output_dir {
        reject_colliding_names(&options.files)?;
        fs::create_dir_all(dir).map_err(|source| CliError::file(dir, source))?;
    }

    for path in &options.files {
        let text = read(path)?;
        let expanded = session.preprocess(&text);
        match &options.output_dir {
            Some(dir) => {
                let name = path.file_name().ok_or_else(|| {
                    CliError::InvalidConfig(format!("'{}' does not name a file", path.display()))
                })?;
                let target = dir.join(name);
                fs::write(&target, expanded).map_err(|source| CliError::file(&target, source))?;
                info!(input = %path.display(), output = %target.display(), "wrote expanded feature");
            }
            None => out.write_all(expanded.as_bytes())?,
        }
    }
    out.flush()?;
    Ok(())
}

/// List the available dialects: tag, native name and whether the language
/// has its own call phrases (English phrases work in every language).
///
/// # Errors
///
/// Returns `CliError` if a data file is invalid or `out` cannot be written.
pub fn languages(data: &DataFiles, out: &mut impl Write) -> Result<(), CliError> {
    let dialects = data.dialect_table()?;
    let phrases = data.phrase_table()?;
    for tag in dialects.languages() {
        let Ok(dialect) = dialects.lookup(tag) else {
            continue;
        };
        let localised = if phrases.phrases(tag).is_some() {
            "yes"
        } else {
            "no"
        };
        writeln!(out, "{tag}\t{}\t{localised}", dialect.native())?;
    }
    out.flush()?;
    Ok(())
}

#[cfg(test)]
#[expect(
    clippy::expect_used,
    reason = "tests require explicit panic messages for debugging failures"
)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};
    use tempfile::TempDir;

    const SHARED: &str = "Feature: Shared\n  Scenario: Log in\n    Given a session\n";

    #[fixture]
    fn root() -> TempDir {
        let dir = TempDir::new().expect("temp dir");
        fs::create_dir_all(dir.path().join("Features")).expect("features dir");
        fs::write(dir.path().join("Features/shared.feature"), SHARED).expect("write feature");
        dir
    }

    fn config_for(root: &TempDir) -> CliConfig {
        CliConfig {
            root: Some(root.path().to_path_buf()),
            ..CliConfig::default()
        }
    }

    fn write_caller(dir: &Path, name: &str, text: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, text).expect("write caller");
        path
    }

    #[rstest]
    fn expand_writes_to_output(root: TempDir) {
        let callers = TempDir::new().expect("temp dir");
        let path = write_caller(
            callers.path(),
            "a.feature",
            "Feature: A\n  Scenario: S\n    Given I call scenario \"Log in\" from feature \"Shared\"\n",
        );
        let options = ExpandOptions {
            files: vec![path],
            ..ExpandOptions::default()
        };
        let mut out = Vec::new();
        expand(&config_for(&root), &options, &mut out).expect("expand");
        let text = String::from_utf8(out).expect("utf-8");
        assert!(text.contains("    Given a session\n"), "{text}");
        assert!(!text.contains("I call scenario"));
    }

    #[rstest]
    fn expand_writes_into_output_dir(root: TempDir) {
        let callers = TempDir::new().expect("temp dir");
        let plain = "Feature: B\n  Scenario: S\n    Given nothing\n";
        let path = write_caller(callers.path(), "b.feature", plain);
        let output_dir = callers.path().join("out");
        let options = ExpandOptions {
            files: vec![path],
            output_dir: Some(output_dir.clone()),
            ..ExpandOptions::default()
        };
        let mut out = Vec::new();
        expand(&config_for(&root), &options, &mut out).expect("expand");
        assert!(out.is_empty());
        let written = fs::read_to_string(output_dir.join("b.feature")).expect("output file");
        assert_eq!(written, format!("{plain}\n"));
    }

    #[rstest]
    fn output_dir_rejects_inputs_sharing_a_file_name(root: TempDir) {
        let callers = TempDir::new().expect("temp dir");
        fs::create_dir_all(callers.path().join("a")).expect("dir a");
        fs::create_dir_all(callers.path().join("b")).expect("dir b");
        let first = write_caller(callers.path(), "a/same.feature", "Feature: A\n");
        let second = write_caller(callers.path(), "b/same.feature", "Feature: B\n");
        let output_dir = callers.path().join("out");
        let options = ExpandOptions {
            files: vec![first, second],
            output_dir: Some(output_dir.clone()),
            ..ExpandOptions::default()
        };
        let error = expand(&config_for(&root), &options, &mut Vec::new()).expect_err("collision");
        assert!(matches!(error, CliError::InvalidConfig(_)));
        assert!(error.to_string().contains("same.feature"));
        assert!(!output_dir.exists());
    }

    #[rstest]
    fn expand_reports_missing_input(root: TempDir) {
        let options = ExpandOptions {
            files: vec![root.path().join("absent.feature")],
            ..ExpandOptions::default()
        };
        let error = expand(&config_for(&root), &options, &mut Vec::new()).expect_err("missing");
        assert!(matches!(error, CliError::File { .. }));
    }

    #[rstest]
    fn extra_phrases_enable_new_languages(root: TempDir) {
        let callers = TempDir::new().expect("temp dir");
        let phrases = write_caller(
            callers.path(),
            "phrases.json",
            r#"{"it": {"call": ["chiamo lo scenario"], "from": ["dalla funzionalità"]}}"#,
        );
        let path = write_caller(
            callers.path(),
            "c.feature",
            "# language: it\nFunzionalità: C\n  Scenario: S\n    Dato chiamo lo scenario \"Log in\" dalla funzionalità \"Shared\"\n",
        );
        let options = ExpandOptions {
            files: vec![path],
            output_dir: None,
            data: DataFiles {
                phrases: Some(phrases),
                dialects: None,
            },
        };
        let mut out = Vec::new();
        expand(&config_for(&root), &options, &mut out).expect("expand");
        let text = String::from_utf8(out).expect("utf-8");
        assert!(text.contains("    Given a session\n"), "{text}");
    }

    #[rstest]
    #[case::phrases(true)]
    #[case::dialects(false)]
    fn malformed_data_files_are_config_errors(#[case] phrases: bool) {
        let dir = TempDir::new().expect("temp dir");
        let path = write_caller(dir.path(), "bad.json", "[1, 2, 3]");
        let data = if phrases {
            DataFiles {
                phrases: Some(path),
                dialects: None,
            }
        } else {
            DataFiles {
                phrases: None,
                dialects: Some(path),
            }
        };
        let error = languages(&data, &mut Vec::new()).expect_err("malformed data");
        assert!(matches!(error, CliError::DataFile { .. }));
        assert_eq!(error.exit_code(), crate::error::EXIT_CONFIG);
    }

    #[test]
    fn languages_lists_bundled_dialects() {
        let mut out = Vec::new();
        languages(&DataFiles::default(), &mut out).expect("languages");
        let text = String::from_utf8(out).expect("utf-8");
        assert!(text.lines().any(|line| line == "de\tDeutsch\tyes"), "{text}");
        assert!(text.lines().any(|line| line.starts_with("en\t")));
        assert!(text.lines().any(|line| line.starts_with("it\t") && line.ends_with("\tno")));
    }
}
