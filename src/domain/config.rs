use std::{
    io,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

/// Name of the configuration file looked up in the project root.
pub const CONFIG_FILE_NAME: &str = "reqstool.toml";

/// Configuration for merging annotations and assembling archives.
///
/// Relative paths are resolved against the project root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Versions", into = "Versions")]
#[allow(clippy::struct_excessive_bools)]
pub struct Config {
    /// Name of the project.
    ///
    /// Names the top-level directory of the archive. Defaults to the name of
    /// the project root directory.
    pub project_name: Option<String>,

    /// Version of the project, written to the manifest.
    pub project_version: String,

    /// Base name of the archive file. Defaults to the project name.
    pub archive_base_name: Option<String>,

    /// Directory holding the dataset files.
    pub dataset_path: PathBuf,

    /// Directory the combined annotations and the archive are written to.
    pub output_directory: PathBuf,

    /// Annotations produced from production sources.
    pub requirements_annotations_file: PathBuf,

    /// Annotations produced from test sources.
    pub svcs_annotations_file: PathBuf,

    /// Glob patterns selecting test result files, relative to the project
    /// root.
    pub test_results: Vec<String>,

    /// Skip the whole run.
    pub skip: bool,

    /// Merge annotations but do not assemble the archive.
    pub skip_assemble_zip_artifact: bool,

    /// Do not attach the archive for publishing.
    pub skip_attach_zip_artifact: bool,

    /// Keep the relative directory of each test result inside the archive
    /// instead of only its file name.
    ///
    /// With the default (`false`), test results sharing a file name replace
    /// each other.
    pub preserve_test_result_paths: bool,

    /// Language recorded in the manifest.
    pub language: String,

    /// Build system recorded in the manifest.
    pub build: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            project_name: None,
            project_version: default_project_version(),
            archive_base_name: None,
            dataset_path: default_dataset_path(),
            output_directory: default_output_directory(),
            requirements_annotations_file: default_requirements_annotations_file(),
            svcs_annotations_file: default_svcs_annotations_file(),
            test_results: default_test_results(),
            skip: false,
            skip_assemble_zip_artifact: false,
            skip_attach_zip_artifact: false,
            preserve_test_result_paths: false,
            language: default_language(),
            build: default_build(),
        }
    }
}

/// Errors loading a configuration file.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// The file exists but could not be read.
    #[error("Failed to read config file {}: {source}", path.display())]
    Read {
        /// The configuration file.
        path: PathBuf,
        /// The underlying error.
        source: io::Error,
    },

    /// The file is not valid configuration.
    #[error("Failed to parse config file {}: {source}", path.display())]
    Parse {
        /// The configuration file.
        path: PathBuf,
        /// The underlying error.
        source: toml::de::Error,
    },
}

/// Errors saving a configuration file.
#[derive(Debug, thiserror::Error)]
pub enum SaveError {
    /// The configuration could not be serialized.
    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// The file could not be written.
    #[error("Failed to write config file {}: {source}", path.display())]
    Write {
        /// The configuration file.
        path: PathBuf,
        /// The underlying error.
        source: io::Error,
    },
}

impl Config {
    /// Loads the configuration from a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or if the TOML content is
    /// invalid.
    pub fn load(path: &Path) -> Result<Self, LoadError> {
        let content = std::fs::read_to_string(path).map_err(|source| LoadError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| LoadError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Loads the configuration, falling back to the defaults if the file
    /// does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_or_default(path: &Path) -> Result<Self, LoadError> {
        if path.exists() {
            Self::load(path)
        } else {
            tracing::debug!("No config file at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Saves the configuration to a TOML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be serialized to TOML or if
    /// the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), SaveError> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content).map_err(|source| SaveError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    /// The project name, falling back to the name of the project root.
    #[must_use]
    pub fn project_name(&self, root: &Path) -> String {
        self.project_name.clone().unwrap_or_else(|| {
            std::path::absolute(root)
                .ok()
                .as_deref()
                .and_then(Path::file_name)
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| "project".to_string())
        })
    }

    /// The archive base name, falling back to the project name.
    #[must_use]
    pub fn archive_base_name(&self, root: &Path) -> String {
        self.archive_base_name
            .clone()
            .unwrap_or_else(|| self.project_name(root))
    }
}

fn default_project_version() -> String {
    "unspecified".to_string()
}

fn default_dataset_path() -> PathBuf {
    PathBuf::from("reqstool")
}

fn default_output_directory() -> PathBuf {
    PathBuf::from("build/reqstool")
}

fn default_requirements_annotations_file() -> PathBuf {
    PathBuf::from("build/generated/sources/annotationProcessor/java/main/resources/annotations.yml")
}

fn default_svcs_annotations_file() -> PathBuf {
    PathBuf::from("build/generated/sources/annotationProcessor/java/test/resources/annotations.yml")
}

fn default_test_results() -> Vec<String> {
    vec!["build/test-results/**/*.xml".to_string()]
}

fn default_language() -> String {
    "java".to_string()
}

fn default_build() -> String {
    "gradle".to_string()
}

/// The serialized versions of the configuration.
/// This allows for future changes to the configuration format and to the domain
/// type without breaking compatibility.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "_version")]
enum Versions {
    #[serde(rename = "1")]
    V1 {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        project_name: Option<String>,

        #[serde(default = "default_project_version")]
        project_version: String,

        #[serde(default, skip_serializing_if = "Option::is_none")]
        archive_base_name: Option<String>,

        #[serde(default = "default_dataset_path")]
        dataset_path: PathBuf,

        #[serde(default = "default_output_directory")]
        output_directory: PathBuf,

        #[serde(default = "default_requirements_annotations_file")]
        requirements_annotations_file: PathBuf,

        #[serde(default = "default_svcs_annotations_file")]
        svcs_annotations_file: PathBuf,

        #[serde(default = "default_test_results")]
        test_results: Vec<String>,

        #[serde(default)]
        skip: bool,

        #[serde(default)]
        skip_assemble_zip_artifact: bool,

        #[serde(default)]
        skip_attach_zip_artifact: bool,

        #[serde(default)]
        preserve_test_result_paths: bool,

        #[serde(default = "default_language")]
        language: String,

        #[serde(default = "default_build")]
        build: String,
    },
}

impl From<Versions> for Config {
    fn from(versions: Versions) -> Self {
        match versions {
            Versions::V1 {
                project_name,
                project_version,
                archive_base_name,
                dataset_path,
                output_directory,
                requirements_annotations_file,
                svcs_annotations_file,
                test_results,
                skip,
                skip_assemble_zip_artifact,
                skip_attach_zip_artifact,
                preserve_test_result_paths,
                language,
                build,
            } => Self {
                project_name,
                project_version,
                archive_base_name,
                dataset_path,
                output_directory,
                requirements_annotations_file,
                svcs_annotations_file,
                test_results,
                skip,
                skip_assemble_zip_artifact,
                skip_attach_zip_artifact,
                preserve_test_result_paths,
                language,
                build,
            },
        }
    }
}

impl From<Config> for Versions {
    fn from(config: Config) -> Self {
        Self::V1 {
            project_name: config.project_name,
            project_version: config.project_version,
            archive_base_name: config.archive_base_name,
            dataset_path: config.dataset_path,
            output_directory: config.output_directory,
            requirements_annotations_file: config.requirements_annotations_file,
            svcs_annotations_file: config.svcs_annotations_file,
            test_results: config.test_results,
            skip: config.skip,
            skip_assemble_zip_artifact: config.skip_assemble_zip_artifact,
            skip_attach_zip_artifact: config.skip_attach_zip_artifact,
            preserve_test_result_paths: config.preserve_test_result_paths,
            language: config.language,
            build: config.build,
        }
    }
}
