//! Danger severity for reporting.
//!
//! Severity is attached to confirmation requests and refusals so a human can
//! judge an operation at a glance. It never feeds permission decisions.

use std::sync::LazyLock;

use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    JsonSchema,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    #[default]
    None,
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn is_dangerous(&self) -> bool {
        *self >= Severity::High
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::None => write!(f, "NONE"),
            Severity::Low => write!(f, "LOW"),
            Severity::Medium => write!(f, "MEDIUM"),
            Severity::High => write!(f, "HIGH"),
            Severity::Critical => write!(f, "CRITICAL"),
        }
    }
}

static CRITICAL_PATTERNS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(DROP\s+(TABLE|KEYSPACE|ROLE|USER|INDEX)|TRUNCATE|(GRANT|REVOKE)\s+(ALL|SUPERUSER))\b",
    )
    .expect("valid critical pattern regex")
});

static HIGH_PATTERNS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(DELETE|UPDATE|ALTER\s+(TABLE|KEYSPACE|ROLE|USER))\b")
        .expect("valid high pattern regex")
});

/// Severity implied by destructive keywords in raw query text.
pub fn scan_query(query: &str) -> Severity {
    if CRITICAL_PATTERNS.is_match(query) {
        Severity::Critical
    } else if HIGH_PATTERNS.is_match(query) {
        Severity::High
    } else {
        Severity::None
    }
}

/// Escalates a base severity with context the vocabulary cannot see.
///
/// Row-level DELETE and UPDATE without a where clause touch every row and
/// are reported as critical.
pub fn assess(operation: &str, base: Severity, has_where: bool, query: Option<&str>) -> Severity {
    let mut severity = base;

    if !has_where && matches!(operation, "DELETE" | "UPDATE") {
        severity = severity.max(Severity::Critical);
    }

    if let Some(query) = query {
        severity = severity.max(scan_query(query));
    }

    severity
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordering() {
        assert!(Severity::None < Severity::Low);
        assert!(Severity::Low < Severity::Medium);
        assert!(Severity::Medium < Severity::High);
        assert!(Severity::High < Severity::Critical);
        assert!(Severity::High.is_dangerous());
        assert!(!Severity::Medium.is_dangerous());
    }

    #[test]
    fn test_scan_query() {
        assert_eq!(scan_query("DROP TABLE ks.users"), Severity::Critical);
        assert_eq!(scan_query("truncate ks.users"), Severity::Critical);
        assert_eq!(scan_query("GRANT ALL ON ks TO bob"), Severity::Critical);
        assert_eq!(
            scan_query("DELETE FROM ks.users WHERE id = 1"),
            Severity::High
        );
        assert_eq!(scan_query("SELECT * FROM ks.users"), Severity::None);
    }

    #[test]
    fn test_unconditional_delete_escalates() {
        assert_eq!(
            assess("DELETE", Severity::High, false, None),
            Severity::Critical
        );
        assert_eq!(assess("DELETE", Severity::High, true, None), Severity::High);
        assert_eq!(assess("INSERT", Severity::Low, false, None), Severity::Low);
    }

    #[test]
    fn test_query_scan_never_lowers_base() {
        assert_eq!(
            assess("DROP KEYSPACE", Severity::Critical, true, Some("select 1")),
            Severity::Critical
        );
        assert_eq!(
            assess("SELECT", Severity::None, true, Some("DROP TABLE x")),
            Severity::Critical
        );
    }

    #[test]
    fn test_serde() {
        let json = serde_json::to_string(&Severity::Critical).unwrap();
        assert_eq!(json, "\"CRITICAL\"");
    }
}
