//! Assembly of the reqstool archive.
//!
//! The [`Assembler`] collects the dataset files, the combined annotations
//! document and the matching test results into a single zip archive, with a
//! manifest describing what was included. Every entry is nested under one
//! top-level directory, `{project}-reqstool`:
//!
//! ```text
//! demo-reqstool/requirements.yml
//! demo-reqstool/software_verification_cases.yml
//! demo-reqstool/manual_verification_results.yml
//! demo-reqstool/annotations.yml
//! demo-reqstool/test_results/TEST-a.xml
//! demo-reqstool/reqstool_config.yml
//! ```
//!
//! Entries are written in exactly that order, with a fixed timestamp and
//! mode, so identical inputs produce identical archives.

use std::{
    collections::{HashMap, hash_map},
    io::{self, Write},
    path::{Path, PathBuf},
};

use serde::Serialize;
use zip::{CompressionMethod, DateTime, ZipWriter, write::SimpleFileOptions};

use crate::{
    domain::{DatasetFile, Manifest, Resource, ResourceManifest, annotations, manifest},
    storage::test_results::{self, PatternError, TestResultFile, TestResultMatcher},
};

/// Suffix of both the archive's top-level directory and its file name.
pub const SUFFIX: &str = "-reqstool";

/// Directory inside the archive holding test results.
pub const TEST_RESULTS_DIR: &str = "test_results";

/// Errors assembling an archive.
#[derive(Debug, thiserror::Error)]
pub enum AssemblyError {
    /// A mandatory dataset file does not exist.
    #[error("Missing mandatory {file}: {}", path.display())]
    MissingMandatory {
        /// The file name within the dataset.
        file: &'static str,
        /// The absolute path the file was expected at.
        path: PathBuf,
    },

    /// A filesystem operation failed.
    #[error("Failed to {action} {}: {source}", path.display())]
    Io {
        /// What was being attempted.
        action: &'static str,
        /// The file or directory involved.
        path: PathBuf,
        /// The underlying error.
        source: io::Error,
    },

    /// A test result pattern is not a valid glob.
    #[error(transparent)]
    Pattern(#[from] PatternError),

    /// The search root could not be walked.
    #[error("Failed to search {} for test results: {source}", root.display())]
    Walk {
        /// The search root.
        root: PathBuf,
        /// The underlying error.
        source: walkdir::Error,
    },

    /// The manifest could not be serialized.
    #[error("Failed to render manifest: {0}")]
    Manifest(#[source] serde_yaml::Error),

    /// Writing the zip structure failed.
    #[error("Failed to write archive: {0}")]
    Archive(#[from] zip::result::ZipError),
}

impl AssemblyError {
    fn io(action: &'static str, path: &Path) -> impl FnOnce(io::Error) -> Self {
        let path = path.to_path_buf();
        move |source| Self::Io {
            action,
            path,
            source,
        }
    }
}

/// Naming of the archive and its entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveLayout {
    top_level_dir: String,
}

impl ArchiveLayout {
    /// The layout for a project.
    #[must_use]
    pub fn new(project_name: &str) -> Self {
        Self {
            top_level_dir: format!("{project_name}{SUFFIX}"),
        }
    }

    /// The file name of the archive for the given base name.
    #[must_use]
    pub fn file_name(base_name: &str) -> String {
        format!("{base_name}{SUFFIX}.zip")
    }

    /// The directory every entry is nested under.
    #[must_use]
    pub fn top_level_dir(&self) -> &str {
        &self.top_level_dir
    }

    /// The entry path of a file placed directly in the top-level directory.
    #[must_use]
    pub fn entry(&self, name: &str) -> String {
        format!("{}/{name}", self.top_level_dir)
    }

    /// The entry path of a test result.
    #[must_use]
    pub fn test_result_entry(&self, name: &str) -> String {
        format!("{}/{TEST_RESULTS_DIR}/{name}", self.top_level_dir)
    }
}

/// The inputs of one archive assembly.
#[derive(Debug, Clone)]
pub struct Assembler {
    /// Directory holding the dataset files.
    pub dataset_dir: PathBuf,
    /// The combined annotations document. Skipped if it does not exist.
    pub annotations_file: PathBuf,
    /// Glob patterns selecting test results, relative to `search_root`.
    pub test_result_patterns: Vec<String>,
    /// Root of the test result search, usually the project root.
    pub search_root: PathBuf,
    /// Names the top-level directory of the archive.
    pub project_name: String,
    /// Written to the manifest's version comment.
    pub project_version: String,
    /// Language recorded in the manifest.
    pub language: String,
    /// Build system recorded in the manifest.
    pub build: String,
    /// Where the archive is written.
    pub output_path: PathBuf,
    /// Keep the relative directory of test results inside the archive.
    pub preserve_test_result_paths: bool,
}

/// What an assembly produced.
#[derive(Debug, Clone, Serialize)]
pub struct AssemblyReport {
    /// The written archive.
    pub archive: PathBuf,
    /// Entry paths, in write order.
    pub entries: Vec<String>,
    /// Number of files that matched a test result pattern.
    pub test_results: usize,
    /// The manifest stored in the archive.
    pub manifest: Manifest,
}

#[derive(Debug)]
enum Content {
    File(PathBuf),
    Manifest(String),
}

#[derive(Debug)]
struct Entry {
    name: String,
    content: Content,
}

impl Assembler {
    /// Assembles the archive at `output_path`.
    ///
    /// Nothing is written unless the mandatory dataset file exists and all
    /// test result patterns are valid. The archive is written to a temporary
    /// file next to `output_path` and moved into place once complete.
    ///
    /// # Errors
    ///
    /// Returns an error if `requirements.yml` is missing from the dataset, if
    /// a pattern is invalid, or if any filesystem operation fails.
    pub fn assemble(&self) -> Result<AssemblyReport, AssemblyError> {
        self.check_mandatory_files()?;
        let matcher = TestResultMatcher::new(self.test_result_patterns.iter().cloned())?;

        let layout = ArchiveLayout::new(&self.project_name);
        let mut resources = ResourceManifest::default();
        let mut entries = Vec::new();

        for file in DatasetFile::ALL {
            let path = self.dataset_dir.join(file.file_name());
            if path.is_file() {
                tracing::info!("added to {}: {}", layout.top_level_dir(), path.display());
                resources.record_file(file.resource(), file.file_name());
                entries.push(Entry {
                    name: layout.entry(file.file_name()),
                    content: Content::File(path),
                });
            } else {
                tracing::debug!("Optional {} not found, skipping", file.file_name());
            }
        }

        if self.annotations_file.is_file() {
            tracing::info!(
                "added to {}: {}",
                layout.top_level_dir(),
                self.annotations_file.display()
            );
            resources.record_file(Resource::Annotations, annotations::FILE_NAME);
            entries.push(Entry {
                name: layout.entry(annotations::FILE_NAME),
                content: Content::File(self.annotations_file.clone()),
            });
        } else {
            tracing::debug!(
                "No combined annotations at {}, skipping",
                self.annotations_file.display()
            );
        }

        let matched = test_results::collect(&self.search_root, &matcher).map_err(|source| {
            AssemblyError::Walk {
                root: self.search_root.clone(),
                source,
            }
        })?;
        let test_results = matched.len();
        tracing::debug!("added {test_results} test_results");
        entries.extend(self.test_result_entries(&layout, matched));
        resources.record_test_results();

        let manifest = Manifest {
            language: self.language.clone(),
            build: self.build.clone(),
            resources,
        };
        let rendered = manifest
            .render(&self.project_version)
            .map_err(AssemblyError::Manifest)?;
        entries.push(Entry {
            name: layout.entry(manifest::FILE_NAME),
            content: Content::Manifest(rendered),
        });

        tracing::info!("Assembling zip file: {}", self.output_path.display());
        self.write_archive(&entries)?;
        tracing::info!("Assembled zip artifact: {}", self.output_path.display());

        Ok(AssemblyReport {
            archive: self.output_path.clone(),
            entries: entries.into_iter().map(|entry| entry.name).collect(),
            test_results,
            manifest,
        })
    }

    fn check_mandatory_files(&self) -> Result<(), AssemblyError> {
        for file in DatasetFile::ALL {
            if !file.is_mandatory() {
                continue;
            }
            let path = self.dataset_dir.join(file.file_name());
            if !path.is_file() {
                let path = std::path::absolute(&path).unwrap_or(path);
                return Err(AssemblyError::MissingMandatory {
                    file: file.file_name(),
                    path,
                });
            }
        }
        Ok(())
    }

    /// Turns matched files into entries.
    ///
    /// Without `preserve_test_result_paths`, files sharing a name collapse
    /// into one entry holding the content of the last match.
    fn test_result_entries(
        &self,
        layout: &ArchiveLayout,
        files: Vec<TestResultFile>,
    ) -> Vec<Entry> {
        let mut entries: Vec<Entry> = Vec::with_capacity(files.len());
        let mut positions: HashMap<String, usize> = HashMap::new();

        for file in files {
            let name = layout.test_result_entry(&file.entry_name(self.preserve_test_result_paths));
            match positions.entry(name) {
                hash_map::Entry::Occupied(occupied) => {
                    tracing::warn!(
                        "{} replaces an earlier test result at {}",
                        file.relative.display(),
                        occupied.key()
                    );
                    entries[*occupied.get()].content = Content::File(file.source);
                }
                hash_map::Entry::Vacant(vacant) => {
                    tracing::debug!("Adding file: {}", vacant.key());
                    entries.push(Entry {
                        name: vacant.key().clone(),
                        content: Content::File(file.source),
                    });
                    vacant.insert(entries.len() - 1);
                }
            }
        }

        entries
    }

    fn write_archive(&self, entries: &[Entry]) -> Result<(), AssemblyError> {
        let parent = self
            .output_path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        std::fs::create_dir_all(parent)
            .map_err(AssemblyError::io("create output directory", parent))?;

        let mut temp = tempfile::NamedTempFile::new_in(parent)
            .map_err(AssemblyError::io("create temporary archive in", parent))?;

        {
            let mut zip = ZipWriter::new(temp.as_file_mut());
            for entry in entries {
                zip.start_file(entry.name.as_str(), entry_options())?;
                match &entry.content {
                    Content::File(path) => {
                        let bytes = std::fs::read(path).map_err(AssemblyError::io("read", path))?;
                        zip.write_all(&bytes)
                            .map_err(AssemblyError::io("write", &self.output_path))?;
                    }
                    Content::Manifest(rendered) => {
                        zip.write_all(rendered.as_bytes())
                            .map_err(AssemblyError::io("write", &self.output_path))?;
                    }
                }
            }
            zip.finish()?;
        }

        temp.persist(&self.output_path)
            .map_err(|error| AssemblyError::Io {
                action: "move archive into place at",
                path: self.output_path.clone(),
                source: error.error,
            })?;
        Ok(())
    }
}

fn entry_options() -> SimpleFileOptions {
    SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(DateTime::default())
        .unix_permissions(0o644)
}
