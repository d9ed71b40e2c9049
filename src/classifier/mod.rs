//! Operation classification.
//!
//! Maps an operation name such as `"SELECT"` or `"CREATE MATERIALIZED VIEW"`
//! to its [`OperationCategory`] and base [`Severity`]. Names outside the
//! vocabulary fail with [`Error::UnknownOperation`](crate::Error::UnknownOperation);
//! callers treat that as a denial.
//!
//! ```rust
//! use cql_gate::classifier::{OperationCategory, OperationClassifier};
//!
//! let classifier = OperationClassifier::new();
//! let info = classifier.classify("create table ks.users").unwrap();
//! assert_eq!(info.operation, "CREATE TABLE");
//! assert_eq!(info.category, OperationCategory::Ddl);
//! assert!(classifier.classify("FROBNICATE").is_err());
//! ```

mod category;
pub mod severity;
mod vocabulary;

pub use category::{FileDirection, OperationCategory};
pub use severity::Severity;
pub use vocabulary::{OperationSpec, Vocabulary, normalize};

use std::sync::Arc;

use serde::Serialize;

use crate::{Error, Result};

/// Result of classifying one operation name.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Classification {
    /// Canonical operation name from the vocabulary.
    pub operation: String,
    pub category: OperationCategory,
    /// Base severity before any context-based escalation.
    pub severity: Severity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub direction: Option<FileDirection>,
    pub description: String,
}

impl Classification {
    fn from_spec(spec: &OperationSpec, direction: Option<FileDirection>) -> Self {
        let direction = match spec.category {
            OperationCategory::File => spec.direction.or(direction),
            _ => None,
        };
        Self {
            operation: spec.name.clone(),
            category: spec.category,
            severity: spec.severity,
            direction,
            description: spec.description.clone(),
        }
    }
}

/// Stateless classifier over a shared, immutable vocabulary.
#[derive(Clone, Debug)]
pub struct OperationClassifier {
    vocabulary: Arc<Vocabulary>,
}

impl OperationClassifier {
    pub fn new() -> Self {
        Self::with_vocabulary(Vocabulary::cql())
    }

    pub fn with_vocabulary(vocabulary: Vocabulary) -> Self {
        Self {
            vocabulary: Arc::new(vocabulary),
        }
    }

    pub fn classify(&self, operation: &str) -> Result<Classification> {
        self.classify_with(operation, None)
    }

    /// Classifies with an auxiliary FILE direction.
    ///
    /// `COPY` combines `direction` with a `TO`/`FROM` keyword in the text.
    /// Either one saying import makes it `COPY FROM`, so a keyword that
    /// contradicts the flag resolves to an import.
    pub fn classify_with(
        &self,
        operation: &str,
        direction: Option<FileDirection>,
    ) -> Result<Classification> {
        let words = self.vocabulary.canonical_words(operation);
        let unknown = || Error::UnknownOperation {
            operation: operation.trim().to_string(),
        };

        let Some(first) = words.first() else {
            return Err(unknown());
        };

        let spec = if first == "COPY" {
            let keyword = words.iter().skip(1).find_map(|w| match w.as_str() {
                "TO" => Some(FileDirection::Export),
                "FROM" => Some(FileDirection::Import),
                _ => None,
            });
            let name = match (direction, keyword) {
                (Some(FileDirection::Import), _) | (_, Some(FileDirection::Import)) => {
                    "COPY FROM"
                }
                (Some(FileDirection::Export), _) | (_, Some(FileDirection::Export)) => "COPY TO",
                (None, None) => "COPY",
            };
            self.vocabulary.get(name)
        } else {
            self.vocabulary.resolve(&words.join(" "))
        };

        let classification = spec
            .map(|spec| Classification::from_spec(spec, direction))
            .ok_or_else(unknown)?;

        tracing::debug!(
            operation = %classification.operation,
            category = %classification.category,
            severity = %classification.severity,
            "Operation classified"
        );

        Ok(classification)
    }

    pub fn operations(&self) -> &[OperationSpec] {
        self.vocabulary.entries()
    }

    pub fn operations_in(
        &self,
        category: OperationCategory,
    ) -> impl Iterator<Item = &OperationSpec> + '_ {
        self.operations()
            .iter()
            .filter(move |spec| spec.category == category)
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }
}

impl Default for OperationClassifier {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_every_vocabulary_entry() {
        let classifier = OperationClassifier::new();
        for spec in classifier.operations() {
            let result = classifier.classify(&spec.name).unwrap();
            assert_eq!(result.category, spec.category, "{}", spec.name);
            assert_eq!(result.operation, spec.name);
        }
    }

    #[test]
    fn test_unknown_operation_fails_closed() {
        let classifier = OperationClassifier::new();
        for name in ["", "   ", "FROBNICATE", "SELECTALL", "MERGE INTO"] {
            let err = classifier.classify(name).unwrap_err();
            assert!(matches!(err, Error::UnknownOperation { .. }), "{}", name);
        }
    }

    #[test]
    fn test_case_and_spacing_insensitive() {
        let classifier = OperationClassifier::new();
        let result = classifier.classify("  begin   unlogged batch ").unwrap();
        assert_eq!(result.operation, "BEGIN UNLOGGED BATCH");
        assert_eq!(result.category, OperationCategory::Dml);
    }

    #[test]
    fn test_copy_direction_from_keyword() {
        let classifier = OperationClassifier::new();

        let export = classifier.classify("COPY ks.users TO 'users.csv'").unwrap();
        assert_eq!(export.operation, "COPY TO");
        assert_eq!(export.direction, Some(FileDirection::Export));
        assert_eq!(export.severity, Severity::Low);

        let import = classifier.classify("copy ks.users from 'users.csv'").unwrap();
        assert_eq!(import.operation, "COPY FROM");
        assert_eq!(import.direction, Some(FileDirection::Import));
    }

    #[test]
    fn test_copy_direction_from_context() {
        let classifier = OperationClassifier::new();

        let export = classifier
            .classify_with("COPY", Some(FileDirection::Export))
            .unwrap();
        assert_eq!(export.operation, "COPY TO");

        let unknown = classifier.classify("COPY").unwrap();
        assert_eq!(unknown.operation, "COPY");
        assert_eq!(unknown.category, OperationCategory::File);
        assert_eq!(unknown.direction, None);
    }

    #[test]
    fn test_copy_conflicting_direction_is_import() {
        let classifier = OperationClassifier::new();

        let flagged_import = classifier
            .classify_with("COPY ks.t TO 'f.csv'", Some(FileDirection::Import))
            .unwrap();
        assert_eq!(flagged_import.operation, "COPY FROM");
        assert_eq!(flagged_import.direction, Some(FileDirection::Import));

        let keyword_import = classifier
            .classify_with("COPY ks.t FROM 'f.csv'", Some(FileDirection::Export))
            .unwrap();
        assert_eq!(keyword_import.operation, "COPY FROM");
        assert_eq!(keyword_import.direction, Some(FileDirection::Import));
    }

    #[test]
    fn test_direction_ignored_outside_file() {
        let classifier = OperationClassifier::new();
        let result = classifier
            .classify_with("SELECT", Some(FileDirection::Import))
            .unwrap();
        assert_eq!(result.direction, None);
    }

    #[test]
    fn test_source_is_import() {
        let classifier = OperationClassifier::new();
        let result = classifier.classify("SOURCE 'setup.cql'").unwrap();
        assert_eq!(result.direction, Some(FileDirection::Import));
    }

    #[test]
    fn test_base_severities() {
        let classifier = OperationClassifier::new();
        let severity = |op: &str| classifier.classify(op).unwrap().severity;
        assert_eq!(severity("SELECT"), Severity::None);
        assert_eq!(severity("INSERT"), Severity::Low);
        assert_eq!(severity("DELETE"), Severity::High);
        assert_eq!(severity("DROP KEYSPACE"), Severity::Critical);
        assert_eq!(severity("DROP INDEX"), Severity::High);
        assert_eq!(severity("DROP ROLE"), Severity::Critical);
    }

    #[test]
    fn test_role_statements_are_dcl() {
        let classifier = OperationClassifier::new();
        for op in ["CREATE ROLE", "ALTER ROLE", "DROP USER", "GRANT", "ADD IDENTITY"] {
            assert_eq!(
                classifier.classify(op).unwrap().category,
                OperationCategory::Dcl,
                "{}",
                op
            );
        }
    }

    #[test]
    fn test_operations_in_category() {
        let classifier = OperationClassifier::new();
        let session: Vec<_> = classifier
            .operations_in(OperationCategory::Session)
            .map(|s| s.name.as_str())
            .collect();
        assert!(session.contains(&"CONSISTENCY"));
        assert!(session.iter().all(|name| !name.starts_with("SELECT")));
    }
}
