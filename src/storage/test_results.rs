//! Test result reports are discovered by walking the project tree and
//! matching each regular file's path, relative to the walk root, against a
//! set of glob patterns.
//!
//! Patterns use `/` as separator. `*` and `?` never match across a `/`.
//! A `**` segment followed by more of the pattern spans one or more
//! directories, so `reports/**/*.xml` does not match `reports/a.xml` and
//! `**/*.xml` does not match a file at the root. A trailing `**` matches
//! everything below its parent.

use std::path::{Component, Path, PathBuf};

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use walkdir::WalkDir;

/// An invalid test result pattern.
#[derive(Debug, thiserror::Error)]
#[error("Invalid test result pattern '{pattern}': {source}")]
pub struct PatternError {
    pattern: String,
    source: globset::Error,
}

impl PatternError {
    /// The offending pattern.
    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.pattern
    }
}

/// A compiled set of test result patterns.
///
/// A path matches if it matches any of the patterns.
#[derive(Debug, Clone)]
pub struct TestResultMatcher {
    set: GlobSet,
}

impl TestResultMatcher {
    /// Compiles the given patterns.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first pattern that is not a valid glob.
    pub fn new<I, S>(patterns: I) -> Result<Self, PatternError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let patterns: Vec<String> = patterns.into_iter().map(Into::into).collect();

        let mut builder = GlobSetBuilder::new();
        for pattern in &patterns {
            let glob = GlobBuilder::new(&require_directory_for_double_star(pattern))
                .literal_separator(true)
                .build()
                .map_err(|source| PatternError {
                    pattern: pattern.clone(),
                    source,
                })?;
            builder.add(glob);
        }
        let set = builder.build().map_err(|source| PatternError {
            pattern: patterns.join(", "),
            source,
        })?;

        Ok(Self { set })
    }

    /// Whether a path relative to the search root matches any pattern.
    #[must_use]
    pub fn is_match(&self, relative: &Path) -> bool {
        self.set.is_match(relative)
    }
}

/// Rewrites every inner `**` segment as `*/**`.
///
/// In `globset`, `/**/` also matches a single `/`; prefixing one mandatory
/// segment makes `**` span at least one directory.
fn require_directory_for_double_star(pattern: &str) -> String {
    let segments: Vec<&str> = pattern.split('/').collect();
    let last = segments.len() - 1;
    segments
        .into_iter()
        .enumerate()
        .map(|(index, segment)| {
            if segment == "**" && index < last {
                "*/**"
            } else {
                segment
            }
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// A test result file found under the search root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestResultFile {
    /// Location on disk.
    pub source: PathBuf,
    /// Location relative to the search root.
    pub relative: PathBuf,
}

impl TestResultFile {
    /// The path of this file below the archive's test results directory.
    ///
    /// Only the file name is kept unless `preserve_paths` is set, in which
    /// case the relative path is kept with `/` separators.
    #[must_use]
    pub fn entry_name(&self, preserve_paths: bool) -> String {
        if preserve_paths {
            self.relative
                .components()
                .filter_map(|component| match component {
                    Component::Normal(segment) => Some(segment.to_string_lossy()),
                    _ => None,
                })
                .collect::<Vec<_>>()
                .join("/")
        } else {
            self.relative
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default()
        }
    }
}

/// Walks `root` and returns every regular file matching `matcher`.
///
/// Directory entries are visited in file name order, so the result is
/// stable across runs. Symbolic links are not followed, and a link to a
/// file is not itself collected.
///
/// # Errors
///
/// Returns an error if a directory cannot be read.
pub fn collect(
    root: &Path,
    matcher: &TestResultMatcher,
) -> Result<Vec<TestResultFile>, walkdir::Error> {
    let mut files = Vec::new();

    for entry in WalkDir::new(root).follow_links(false).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Ok(relative) = entry.path().strip_prefix(root) else {
            continue;
        };

        tracing::trace!("Checking file: {}", relative.display());
        if matcher.is_match(relative) {
            tracing::debug!("Match found for: {}", relative.display());
            files.push(TestResultFile {
                relative: relative.to_path_buf(),
                source: entry.into_path(),
            });
        }
    }

    Ok(files)
}
