//! Requirements traceability artifacts
//!
//! Merges the requirement annotations produced at build time and packages
//! them, together with a requirements dataset and test results, into a
//! single reqstool archive.

pub mod domain;
pub use domain::{CombinedAnnotations, Config, DatasetFile, Manifest, Resource, merge};

/// Filesystem access: annotation sources, test result discovery and the
/// archive itself.
pub mod storage;
pub use storage::{Assembler, AssemblyError, AssemblyReport};

pub mod task;
pub use task::Outcome;
