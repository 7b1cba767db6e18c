//! One invocation of the tool: merge the annotation sources, write the
//! combined document, then assemble the archive, honouring the skip flags.

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::{
    domain::{Config, Section, annotations, merge},
    storage::{
        annotations::{ReadError, WriteError, read_subtree, write_combined},
        archive::{ArchiveLayout, Assembler, AssemblyError, AssemblyReport},
    },
};

/// Errors of a single invocation.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An annotation source could not be read.
    #[error(transparent)]
    Read(#[from] ReadError),

    /// The combined annotations could not be written.
    #[error(transparent)]
    Write(#[from] WriteError),

    /// The output directory could not be created.
    #[error("Failed to create output directory {}: {source}", path.display())]
    OutputDirectory {
        /// The output directory.
        path: PathBuf,
        /// The underlying error.
        source: std::io::Error,
    },

    /// The archive could not be assembled.
    #[error(transparent)]
    Assembly(#[from] AssemblyError),
}

/// The result of a successful invocation.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    /// Nothing was done.
    Skipped,

    /// Annotations were merged; archive assembly was skipped.
    Merged {
        /// The combined annotations document.
        annotations: PathBuf,
    },

    /// Annotations were merged and the archive assembled.
    Assembled {
        /// The combined annotations document.
        annotations: PathBuf,
        /// What was archived.
        report: AssemblyReport,
        /// Whether the archive should be attached for publishing.
        attach: bool,
    },
}

/// Runs the whole pipeline for the project at `root`.
///
/// With `skip` set nothing is read or written.
///
/// # Errors
///
/// Returns an error if an annotation source is unreadable or malformed, if
/// the mandatory dataset file is missing, or if any write fails.
pub fn run(root: &Path, config: &Config) -> Result<Outcome, Error> {
    if config.skip {
        tracing::info!("Skipping execution of reqstool");
        return Ok(Outcome::Skipped);
    }

    tracing::info!("testResults: {:?}", config.test_results);
    let annotations = merge_annotations(root, config)?;

    if config.skip_assemble_zip_artifact {
        tracing::info!("Skipping zip artifact assembly");
        return Ok(Outcome::Merged { annotations });
    }

    let report = assembler(root, config, annotations.clone()).assemble()?;
    if config.skip_attach_zip_artifact {
        tracing::info!("Skipping zip artifact attachment");
    }

    Ok(Outcome::Assembled {
        annotations,
        report,
        attach: !config.skip_attach_zip_artifact,
    })
}

/// Merges the two annotation sources into `{output_directory}/annotations.yml`
/// and returns its path.
///
/// The output directory is created if needed.
///
/// # Errors
///
/// Returns an error if an annotation source is unreadable or malformed, or if
/// the combined document cannot be written.
pub fn merge_annotations(root: &Path, config: &Config) -> Result<PathBuf, Error> {
    let requirements_file = root.join(&config.requirements_annotations_file);
    let svcs_file = root.join(&config.svcs_annotations_file);

    let implementations = read_subtree(Some(&requirements_file), Section::Implementations)?;
    let tests = read_subtree(Some(&svcs_file), Section::Tests)?;
    let combined = merge(implementations, tests);

    let output_directory = root.join(&config.output_directory);
    std::fs::create_dir_all(&output_directory).map_err(|source| Error::OutputDirectory {
        path: output_directory.clone(),
        source,
    })?;

    let output = output_directory.join(annotations::FILE_NAME);
    tracing::info!(
        "Combining {} and {} into {}",
        requirements_file.display(),
        svcs_file.display(),
        output.display()
    );
    write_combined(&output, &combined)?;

    Ok(output)
}

/// The archive path for the project at `root`.
#[must_use]
pub fn archive_path(root: &Path, config: &Config) -> PathBuf {
    root.join(&config.output_directory)
        .join(ArchiveLayout::file_name(&config.archive_base_name(root)))
}

fn assembler(root: &Path, config: &Config, annotations_file: PathBuf) -> Assembler {
    Assembler {
        dataset_dir: root.join(&config.dataset_path),
        annotations_file,
        test_result_patterns: config.test_results.clone(),
        search_root: root.to_path_buf(),
        project_name: config.project_name(root),
        project_version: config.project_version.clone(),
        language: config.language.clone(),
        build: config.build.clone(),
        output_path: archive_path(root, config),
        preserve_test_result_paths: config.preserve_test_result_paths,
    }
}

#[cfg(test)]
mod tests {
    use std::{fs::File, io::Read};

    use tempfile::TempDir;
    use zip::ZipArchive;

    use super::*;
    use crate::CombinedAnnotations;

    const IMPLEMENTATIONS: &str = "\
requirement_annotations:
  implementations:
    REQ-001:
    - elementKind: CLASS
      fullyQualifiedName: se.example.Service
";

    const TESTS: &str = "\
requirement_annotations:
  tests:
    SVC-001:
    - elementKind: METHOD
      fullyQualifiedName: se.example.ServiceTest.works
";

    fn write(root: &Path, relative: &Path, content: &str) {
        let path = root.join(relative);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    fn config() -> Config {
        Config {
            project_name: Some("demo".to_string()),
            project_version: "1.0.0".to_string(),
            ..Config::default()
        }
    }

    fn project(config: &Config) -> TempDir {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        write(
            root,
            &config.dataset_path.join("requirements.yml"),
            "requirements: []\n",
        );
        write(root, &config.requirements_annotations_file, IMPLEMENTATIONS);
        write(root, &config.svcs_annotations_file, TESTS);
        write(
            root,
            Path::new("build/test-results/test/TEST-se.example.ServiceTest.xml"),
            "<testsuite/>",
        );
        tmp
    }

    fn listing(root: &Path) -> Vec<PathBuf> {
        walkdir::WalkDir::new(root)
            .sort_by_file_name()
            .into_iter()
            .map(|entry| entry.unwrap().into_path())
            .collect()
    }

    #[test]
    fn skip_performs_no_writes() {
        let config = Config {
            skip: true,
            ..config()
        };
        let tmp = project(&config);
        let before = listing(tmp.path());

        let outcome = run(tmp.path(), &config).unwrap();

        assert!(matches!(outcome, Outcome::Skipped));
        assert_eq!(listing(tmp.path()), before);
    }

    #[test]
    fn run_merges_and_assembles() {
        let config = config();
        let tmp = project(&config);

        let outcome = run(tmp.path(), &config).unwrap();

        let Outcome::Assembled {
            annotations,
            report,
            attach,
        } = outcome
        else {
            panic!("expected an assembled archive");
        };
        assert!(attach);
        assert_eq!(
            report.archive,
            tmp.path().join("build/reqstool/demo-reqstool.zip")
        );
        assert_eq!(report.entries.len(), 4);
        assert_eq!(report.test_results, 1);

        let written = std::fs::read_to_string(&annotations).unwrap();
        let combined = CombinedAnnotations::from_yaml(&written).unwrap();
        assert!(combined.implementations().unwrap().contains_key("REQ-001"));
        assert!(combined.tests().unwrap().contains_key("SVC-001"));

        let mut archive = ZipArchive::new(File::open(&report.archive).unwrap()).unwrap();
        let mut archived = String::new();
        archive
            .by_name("demo-reqstool/annotations.yml")
            .unwrap()
            .read_to_string(&mut archived)
            .unwrap();
        assert_eq!(archived, written);
    }

    #[test]
    fn skip_assemble_only_writes_annotations() {
        let config = Config {
            skip_assemble_zip_artifact: true,
            ..config()
        };
        let tmp = project(&config);

        let outcome = run(tmp.path(), &config).unwrap();

        assert!(matches!(outcome, Outcome::Merged { .. }));
        assert!(tmp.path().join("build/reqstool/annotations.yml").is_file());
        assert!(!archive_path(tmp.path(), &config).exists());
    }

    #[test]
    fn skip_attach_is_reported() {
        let config = Config {
            skip_attach_zip_artifact: true,
            ..config()
        };
        let tmp = project(&config);

        let outcome = run(tmp.path(), &config).unwrap();

        assert!(matches!(outcome, Outcome::Assembled { attach: false, .. }));
    }

    #[test]
    fn missing_annotation_sources_still_assemble() {
        let config = config();
        let tmp = project(&config);
        std::fs::remove_file(tmp.path().join(&config.requirements_annotations_file)).unwrap();
        std::fs::remove_file(tmp.path().join(&config.svcs_annotations_file)).unwrap();

        let outcome = run(tmp.path(), &config).unwrap();

        let Outcome::Assembled { annotations, .. } = outcome else {
            panic!("expected an assembled archive");
        };
        let written = std::fs::read_to_string(annotations).unwrap();
        let combined = CombinedAnnotations::from_yaml(&written).unwrap();
        assert!(combined.is_empty());
    }

    #[test]
    fn malformed_annotation_source_is_fatal() {
        let config = config();
        let tmp = project(&config);
        let broken = "tests: [broken\n";
        write(tmp.path(), &config.svcs_annotations_file, broken);

        let error = run(tmp.path(), &config).unwrap_err();

        assert!(matches!(error, Error::Read(ReadError::Malformed { .. })));
        assert!(!archive_path(tmp.path(), &config).exists());
    }

    #[test]
    fn missing_requirements_names_the_file() {
        let config = config();
        let tmp = project(&config);
        std::fs::remove_file(tmp.path().join("reqstool/requirements.yml")).unwrap();

        let error = run(tmp.path(), &config).unwrap_err();

        assert!(matches!(
            error,
            Error::Assembly(AssemblyError::MissingMandatory { .. })
        ));
        assert!(error.to_string().contains("requirements.yml"));
        assert!(!archive_path(tmp.path(), &config).exists());
    }

    #[test]
    fn archive_base_name_names_the_file_not_the_directory() {
        let config = Config {
            archive_base_name: Some("demo-dist".to_string()),
            ..config()
        };
        let tmp = project(&config);

        let Outcome::Assembled { report, .. } = run(tmp.path(), &config).unwrap() else {
            panic!("expected an assembled archive");
        };

        let under_project_dir = report
            .entries
            .iter()
            .all(|entry| entry.starts_with("demo-reqstool/"));
        assert!(report.archive.ends_with("demo-dist-reqstool.zip"));
        assert!(under_project_dir);
    }
}
