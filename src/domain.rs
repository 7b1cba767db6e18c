//! Domain models for requirements traceability artifacts.
//!
//! This module contains the filesystem agnostic types: annotation documents
//! and their merge, the fixed set of dataset files, the archive manifest and
//! the tool configuration.

/// Requirement annotation documents and their merge.
pub mod annotations;
pub use annotations::{CombinedAnnotations, Section, Tree, merge};

mod config;
pub use config::{CONFIG_FILE_NAME, Config, LoadError, SaveError};

/// The fixed set of files making up a requirements dataset.
pub mod dataset;
pub use dataset::DatasetFile;

/// The manifest describing the contents of an assembled archive.
pub mod manifest;
pub use manifest::{Manifest, Resource, ResourceManifest, ResourceValue};
