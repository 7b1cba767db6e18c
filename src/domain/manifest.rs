//! Every archive carries a `reqstool_config.yml` describing what it contains.
//!
//! Dataset files and the annotations document are recorded by file name.
//! Test results are recorded by the pattern selecting them inside the
//! archive, never by the list of files that happened to match.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// File name of the manifest inside the archive.
pub const FILE_NAME: &str = "reqstool_config.yml";

/// Schema reference written as the first line of the manifest.
pub const SCHEMA_COMMENT: &str = "# yaml-language-server: $schema=https://raw.githubusercontent.com/Luftfartsverket/reqstool-client/main/src/reqstool/resources/schemas/v1/reqstool_config.schema.json";

/// Pattern recorded for the test results of every archive.
pub const TEST_RESULTS_PATTERN: &str = "test_results/**/*.xml";

/// A logical resource that may be listed in a manifest.
///
/// Declaration order is the order resources appear in the manifest.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Resource {
    /// The mandatory requirements file.
    Requirements,
    /// Software verification cases.
    SoftwareVerificationCases,
    /// Manual verification results.
    ManualVerificationResults,
    /// The combined annotations document.
    Annotations,
    /// Test result reports.
    TestResults,
}

/// How a resource is located inside the archive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResourceValue {
    /// A single file, by name.
    File(String),
    /// Glob patterns relative to the archive's top-level directory.
    Patterns(Vec<String>),
}

/// The resources recorded in a manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceManifest(BTreeMap<Resource, ResourceValue>);

impl ResourceManifest {
    /// Records a resource stored as a single file.
    pub fn record_file(&mut self, resource: Resource, file_name: impl Into<String>) {
        self.0
            .insert(resource, ResourceValue::File(file_name.into()));
    }

    /// Records the test results selection pattern.
    pub fn record_test_results(&mut self) {
        self.0.insert(
            Resource::TestResults,
            ResourceValue::Patterns(vec![TEST_RESULTS_PATTERN.to_string()]),
        );
    }

    /// Looks up a recorded resource.
    #[must_use]
    pub fn get(&self, resource: Resource) -> Option<&ResourceValue> {
        self.0.get(&resource)
    }

    /// Whether the given resource has been recorded.
    #[must_use]
    pub fn contains(&self, resource: Resource) -> bool {
        self.0.contains_key(&resource)
    }

    /// Iterates over the recorded resources in manifest order.
    pub fn iter(&self) -> impl Iterator<Item = (Resource, &ResourceValue)> {
        self.0.iter().map(|(resource, value)| (*resource, value))
    }
}

/// The manifest document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    /// Language of the project the archive was built from.
    pub language: String,
    /// Build system of the project the archive was built from.
    pub build: String,
    /// The archived resources.
    pub resources: ResourceManifest,
}

impl Manifest {
    /// Renders the manifest with its schema and version comment lines.
    ///
    /// # Errors
    ///
    /// Returns an error if the manifest cannot be serialized.
    pub fn render(&self, version: &str) -> Result<String, serde_yaml::Error> {
        Ok(format!(
            "{SCHEMA_COMMENT}\n# version: {version}\n{}",
            serde_yaml::to_string(self)?
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_manifest() -> Manifest {
        let mut resources = ResourceManifest::default();
        // recorded out of order on purpose
        resources.record_test_results();
        resources.record_file(Resource::Annotations, "annotations.yml");
        resources.record_file(Resource::Requirements, "requirements.yml");
        Manifest {
            language: "java".to_string(),
            build: "gradle".to_string(),
            resources,
        }
    }

    #[test]
    fn render_writes_header_then_fixed_key_order() {
        let rendered = full_manifest().render("1.2.3").unwrap();

        let expected = format!(
            "{SCHEMA_COMMENT}\n# version: 1.2.3\nlanguage: java\nbuild: gradle\nresources:\n  requirements: requirements.yml\n  annotations: annotations.yml\n  test_results:\n  - test_results/**/*.xml\n"
        );
        assert_eq!(rendered, expected);
    }

    #[test]
    fn test_results_are_recorded_as_pattern() {
        let manifest = full_manifest();

        let recorded = manifest.resources.get(Resource::TestResults);

        let expected = ResourceValue::Patterns(vec![TEST_RESULTS_PATTERN.to_string()]);
        assert_eq!(recorded, Some(&expected));
    }

    #[test]
    fn rendered_manifest_parses_back() {
        let manifest = full_manifest();

        let rendered = manifest.render("0.1.0").unwrap();
        let parsed: Manifest = serde_yaml::from_str(&rendered).unwrap();

        assert_eq!(parsed, manifest);
        assert!(!parsed.resources.contains(Resource::SoftwareVerificationCases));
    }
}
