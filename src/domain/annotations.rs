//! Requirement annotations are produced by annotation processors at build
//! time. Implementation annotations come from production sources and test
//! annotations from test sources; both land in separate documents of the
//! same shape:
//!
//! ```yaml
//! requirement_annotations:
//!   implementations: { ... }
//!   tests: { ... }
//! ```
//!
//! [`merge`] places one extracted sub-tree from each document under a single
//! combined document.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value, value::TaggedValue};

/// Top-level key wrapping all requirement annotations.
pub const REQUIREMENT_ANNOTATIONS: &str = "requirement_annotations";

/// Schema reference written as the first line of a combined document.
pub const SCHEMA_COMMENT: &str = "# yaml-language-server: $schema=https://raw.githubusercontent.com/Luftfartsverket/reqstool-client/main/src/reqstool/resources/schemas/v1/annotations.schema.json";

/// File name of the combined annotations document.
pub const FILE_NAME: &str = "annotations.yml";

/// An annotation sub-tree, keyed by requirement or verification case id.
pub type Tree = Mapping;

/// The section of an annotation document a source contributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    /// Annotations on production code (`implementations`).
    Implementations,
    /// Annotations on test code (`tests`).
    Tests,
}

impl Section {
    /// The key of this section below [`REQUIREMENT_ANNOTATIONS`].
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Implementations => "implementations",
            Self::Tests => "tests",
        }
    }
}

/// Extracts `requirement_annotations.<section>` from a parsed document.
///
/// Every missing level yields an empty tree, as does a section that is not a
/// mapping.
#[must_use]
pub fn extract_subtree(document: &Value, section: Section) -> Tree {
    let subtree = document
        .get(REQUIREMENT_ANNOTATIONS)
        .and_then(|annotations| annotations.get(section.key()))
        .and_then(Value::as_mapping);

    if let Some(subtree) = subtree {
        subtree.clone()
    } else {
        tracing::debug!(
            "No {REQUIREMENT_ANNOTATIONS}.{} mapping in document, using empty tree",
            section.key()
        );
        Tree::new()
    }
}

/// Combines implementation and test annotations into one document.
///
/// A section is only present when its input is non-empty. Both inputs are
/// placed verbatim; nothing is merged within a section.
#[must_use]
pub fn merge(implementations: Tree, tests: Tree) -> CombinedAnnotations {
    CombinedAnnotations {
        requirement_annotations: RequirementAnnotations {
            implementations: non_empty(implementations),
            tests: non_empty(tests),
        },
    }
}

fn non_empty(tree: Tree) -> Option<Tree> {
    (!tree.is_empty()).then_some(tree)
}

/// A combined annotations document.
///
/// Invariant: a section that is present is never empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CombinedAnnotations {
    requirement_annotations: RequirementAnnotations,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct RequirementAnnotations {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    implementations: Option<Tree>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    tests: Option<Tree>,
}

impl CombinedAnnotations {
    /// The implementation annotations, if any.
    #[must_use]
    pub const fn implementations(&self) -> Option<&Tree> {
        self.requirement_annotations.implementations.as_ref()
    }

    /// The test annotations, if any.
    #[must_use]
    pub const fn tests(&self) -> Option<&Tree> {
        self.requirement_annotations.tests.as_ref()
    }

    /// Whether neither section is present.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.implementations().is_none() && self.tests().is_none()
    }

    /// Serializes the document as block-style YAML with all mapping keys
    /// sorted.
    ///
    /// # Errors
    ///
    /// Returns an error if an annotation value cannot be represented as YAML.
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        let value = serde_yaml::to_value(self)?;
        serde_yaml::to_string(&sort_keys(value))
    }

    /// Renders the document as written to disk: the schema comment line
    /// followed by [`Self::to_yaml`].
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be serialized.
    pub fn render(&self) -> Result<String, serde_yaml::Error> {
        Ok(format!("{SCHEMA_COMMENT}\n{}", self.to_yaml()?))
    }

    /// Parses a combined document.
    ///
    /// Sections that are present but empty are dropped so the invariant
    /// holds for parsed documents too.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is not a valid combined document.
    pub fn from_yaml(input: &str) -> Result<Self, serde_yaml::Error> {
        let parsed: Self = serde_yaml::from_str(input)?;
        let RequirementAnnotations {
            implementations,
            tests,
        } = parsed.requirement_annotations;
        Ok(merge(
            implementations.unwrap_or_default(),
            tests.unwrap_or_default(),
        ))
    }
}

/// Recursively orders mapping entries by key.
///
/// String keys compare lexicographically; any other key compares by its YAML
/// rendering.
fn sort_keys(value: Value) -> Value {
    match value {
        Value::Mapping(mapping) => {
            let mut entries: Vec<(Value, Value)> = mapping
                .into_iter()
                .map(|(key, value)| (key, sort_keys(value)))
                .collect();
            entries.sort_by(|(a, _), (b, _)| compare_keys(a, b));
            Value::Mapping(entries.into_iter().collect())
        }
        Value::Sequence(items) => Value::Sequence(items.into_iter().map(sort_keys).collect()),
        Value::Tagged(tagged) => {
            let TaggedValue { tag, value } = *tagged;
            Value::Tagged(Box::new(TaggedValue {
                tag,
                value: sort_keys(value),
            }))
        }
        scalar => scalar,
    }
}

fn compare_keys(a: &Value, b: &Value) -> Ordering {
    match (a.as_str(), b.as_str()) {
        (Some(a), Some(b)) => a.cmp(b),
        _ => key_text(a).cmp(&key_text(b)),
    }
}

fn key_text(key: &Value) -> String {
    serde_yaml::to_string(key).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    fn tree(yaml: &str) -> Tree {
        serde_yaml::from_str(yaml).unwrap()
    }

    fn document(yaml: &str) -> Value {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn merging_two_empty_trees_keeps_the_wrapping_key() {
        let combined = merge(Tree::new(), Tree::new());

        assert!(combined.is_empty());
        assert_eq!(combined.to_yaml().unwrap(), "requirement_annotations: {}\n");
    }

    #[test_case("impl1:\n  id: REQ-001\n", "", true, false; "implementations only")]
    #[test_case("", "test1:\n  id: SVC-001\n", false, true; "tests only")]
    #[test_case("impl1:\n  id: REQ-001\n", "test1:\n  id: SVC-001\n", true, true; "both")]
    fn merge_only_includes_non_empty_sections(
        implementations: &str,
        tests: &str,
        has_implementations: bool,
        has_tests: bool,
    ) {
        let implementations = if implementations.is_empty() {
            Tree::new()
        } else {
            tree(implementations)
        };
        let tests = if tests.is_empty() {
            Tree::new()
        } else {
            tree(tests)
        };

        let combined = merge(implementations.clone(), tests.clone());

        assert_eq!(combined.implementations().is_some(), has_implementations);
        assert_eq!(combined.tests().is_some(), has_tests);
        if has_implementations {
            assert_eq!(combined.implementations(), Some(&implementations));
        }
        if has_tests {
            assert_eq!(combined.tests(), Some(&tests));
        }
    }

    #[test]
    fn merge_does_not_combine_keys_across_sections() {
        let implementations = tree("REQ-001:\n- elementKind: CLASS\n  fullyQualifiedName: a.B\n");
        let tests = tree("REQ-001:\n- elementKind: METHOD\n  fullyQualifiedName: a.BTest.t\n");

        let combined = merge(implementations.clone(), tests.clone());

        assert_eq!(combined.implementations(), Some(&implementations));
        assert_eq!(combined.tests(), Some(&tests));
    }

    #[test]
    fn serialization_sorts_keys_at_every_level() {
        let implementations = tree("zeta:\n  b: 1\n  a: 2\nalpha: x\n");

        let yaml = merge(implementations, Tree::new()).to_yaml().unwrap();

        assert_eq!(
            yaml,
            "requirement_annotations:\n  implementations:\n    alpha: x\n    zeta:\n      a: 2\n      b: 1\n"
        );
    }

    #[test]
    fn rendered_document_starts_with_schema_comment() {
        let rendered = merge(tree("a: 1\n"), Tree::new()).render().unwrap();

        let mut lines = rendered.lines();
        assert_eq!(lines.next(), Some(SCHEMA_COMMENT));
        assert_eq!(lines.next(), Some("requirement_annotations:"));
    }

    #[test]
    fn reparsing_reproduces_the_original_sections() {
        let implementations =
            tree("REQ-002:\n- elementKind: CLASS\nREQ-001:\n- elementKind: METHOD\n");
        let tests = tree("SVC-001:\n- fullyQualifiedName: a.BTest.t\n");
        let combined = merge(implementations.clone(), tests.clone());

        let reparsed = CombinedAnnotations::from_yaml(&combined.render().unwrap()).unwrap();
        let document: Value = serde_yaml::from_str(&combined.render().unwrap()).unwrap();

        assert_eq!(reparsed, combined);
        assert_eq!(
            extract_subtree(&document, Section::Implementations),
            implementations
        );
        assert_eq!(extract_subtree(&document, Section::Tests), tests);
    }

    #[test]
    fn parsing_drops_empty_sections() {
        let parsed = CombinedAnnotations::from_yaml(
            "requirement_annotations:\n  implementations: {}\n  tests:\n    SVC-001: []\n",
        )
        .unwrap();

        assert!(parsed.implementations().is_none());
        assert!(parsed.tests().is_some());
    }

    #[test_case("other: 1\n"; "missing wrapping key")]
    #[test_case("requirement_annotations:\n  tests:\n    a: 1\n"; "missing section")]
    #[test_case("requirement_annotations:\n  implementations: ~\n"; "null section")]
    #[test_case("requirement_annotations:\n  implementations: text\n"; "scalar section")]
    #[test_case("requirement_annotations: []\n"; "sequence wrapper")]
    fn extraction_defaults_to_empty_tree(yaml: &str) {
        let extracted = extract_subtree(&document(yaml), Section::Implementations);

        assert!(extracted.is_empty());
    }

    #[test]
    fn extraction_returns_the_nested_mapping() {
        let doc = document(
            "requirement_annotations:\n  implementations:\n    REQ-001:\n    - elementKind: CLASS\n",
        );

        let extracted = extract_subtree(&doc, Section::Implementations);

        assert_eq!(extracted, tree("REQ-001:\n- elementKind: CLASS\n"));
    }
}
