use std::{
    io,
    path::{Path, PathBuf},
};

use serde_yaml::Value;

use crate::domain::{CombinedAnnotations, annotations::{Section, Tree, extract_subtree}};

/// Errors reading an annotation source.
#[derive(Debug, thiserror::Error)]
pub enum ReadError {
    /// The file exists but could not be read.
    #[error("Failed to read annotations file {}: {source}", path.display())]
    Io {
        /// The annotation source.
        path: PathBuf,
        /// The underlying error.
        source: io::Error,
    },

    /// The file is not valid YAML.
    #[error("Malformed annotations file {}: {source}", path.display())]
    Malformed {
        /// The annotation source.
        path: PathBuf,
        /// The underlying error.
        source: serde_yaml::Error,
    },
}

/// Errors writing the combined annotations document.
#[derive(Debug, thiserror::Error)]
pub enum WriteError {
    /// The document could not be serialized.
    #[error("Failed to serialize combined annotations: {0}")]
    Serialize(#[from] serde_yaml::Error),

    /// The file could not be written.
    #[error("Failed to write combined annotations {}: {source}", path.display())]
    Io {
        /// The output file.
        path: PathBuf,
        /// The underlying error.
        source: io::Error,
    },
}

/// Reads one section from an optional annotation source.
///
/// An absent path, a missing file or a document without the section all
/// yield an empty tree.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or is not valid
/// YAML.
pub fn read_subtree(path: Option<&Path>, section: Section) -> Result<Tree, ReadError> {
    let Some(path) = path.filter(|path| path.is_file()) else {
        tracing::debug!(
            "No annotations file for {}, using empty tree",
            section.key()
        );
        return Ok(Tree::new());
    };

    let content = std::fs::read_to_string(path).map_err(|source| ReadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let document: Value = serde_yaml::from_str(&content).map_err(|source| ReadError::Malformed {
        path: path.to_path_buf(),
        source,
    })?;

    let subtree = extract_subtree(&document, section);
    tracing::debug!(
        "Read {} {} entries from {}",
        subtree.len(),
        section.key(),
        path.display()
    );
    Ok(subtree)
}

/// Writes the combined annotations document to `path`.
///
/// The parent directory must exist.
///
/// # Errors
///
/// Returns an error if the document cannot be serialized or written.
pub fn write_combined(path: &Path, combined: &CombinedAnnotations) -> Result<(), WriteError> {
    let rendered = combined.render()?;
    std::fs::write(path, rendered).map_err(|source| WriteError::Io {
        path: path.to_path_buf(),
        source,
    })
}
