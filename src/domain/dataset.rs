//! A dataset is a directory holding the source-of-truth YAML files for a
//! project's requirements. The set of files is closed: each slot has a fixed
//! file name, a fixed manifest resource and is either mandatory or optional.

use crate::domain::Resource;

/// One of the files of a requirements dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DatasetFile {
    /// `requirements.yml`, the only mandatory file.
    Requirements,
    /// `software_verification_cases.yml`
    SoftwareVerificationCases,
    /// `manual_verification_results.yml`
    ManualVerificationResults,
}

impl DatasetFile {
    /// All dataset files, in archive order.
    pub const ALL: [Self; 3] = [
        Self::Requirements,
        Self::SoftwareVerificationCases,
        Self::ManualVerificationResults,
    ];

    /// The file name within the dataset directory.
    #[must_use]
    pub const fn file_name(self) -> &'static str {
        match self {
            Self::Requirements => "requirements.yml",
            Self::SoftwareVerificationCases => "software_verification_cases.yml",
            Self::ManualVerificationResults => "manual_verification_results.yml",
        }
    }

    /// Whether assembly must fail when this file is absent.
    #[must_use]
    pub const fn is_mandatory(self) -> bool {
        matches!(self, Self::Requirements)
    }

    /// The manifest resource this file is recorded under.
    #[must_use]
    pub const fn resource(self) -> Resource {
        match self {
            Self::Requirements => Resource::Requirements,
            Self::SoftwareVerificationCases => Resource::SoftwareVerificationCases,
            Self::ManualVerificationResults => Resource::ManualVerificationResults,
        }
    }
}
