//! Preset permission modes.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::classifier::{FileDirection, OperationCategory};

/// Named bundle fixing the set of allowed operation categories.
///
/// # Modes
///
/// - **Readonly**: queries and session settings. FILE is limited to exports.
///
/// - **Readwrite**: adds data modification and FILE imports.
///
/// - **Dba**: every category, including schema and access control changes.
///
/// # Example
///
/// ```rust
/// use cql_gate::classifier::{FileDirection, OperationCategory};
/// use cql_gate::permissions::PresetMode;
///
/// let mode = PresetMode::Readonly;
/// assert!(mode.allows(OperationCategory::Dql, None));
/// assert!(mode.allows(OperationCategory::File, Some(FileDirection::Export)));
/// assert!(!mode.allows(OperationCategory::File, Some(FileDirection::Import)));
/// assert_eq!(mode.next(), Some(PresetMode::Readwrite));
/// ```
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum PresetMode {
    #[default]
    Readonly,
    Readwrite,
    Dba,
}

impl PresetMode {
    pub const ALL: [PresetMode; 3] = [PresetMode::Readonly, PresetMode::Readwrite, PresetMode::Dba];

    /// Categories the preset admits. `Readonly` admits FILE for exports only.
    pub fn allowed_categories(&self) -> &'static [OperationCategory] {
        use OperationCategory::*;
        match self {
            PresetMode::Readonly => &[Dql, Session, File],
            PresetMode::Readwrite => &[Dql, Session, Dml, File],
            PresetMode::Dba => &[Dql, Session, Dml, Ddl, Dcl, File],
        }
    }

    /// Allow-table check. A FILE operation with unknown direction is
    /// treated as an import.
    pub fn allows(&self, category: OperationCategory, direction: Option<FileDirection>) -> bool {
        match (self, category) {
            (_, OperationCategory::Session) => true,
            (PresetMode::Readonly, OperationCategory::File) => {
                direction == Some(FileDirection::Export)
            }
            _ => self.allowed_categories().contains(&category),
        }
    }

    /// The next, more permissive preset.
    pub fn next(&self) -> Option<PresetMode> {
        match self {
            PresetMode::Readonly => Some(PresetMode::Readwrite),
            PresetMode::Readwrite => Some(PresetMode::Dba),
            PresetMode::Dba => None,
        }
    }

    pub fn is_read_only(&self) -> bool {
        matches!(self, PresetMode::Readonly)
    }

    pub fn allows_all(&self) -> bool {
        matches!(self, PresetMode::Dba)
    }

    pub fn description(&self) -> &'static str {
        match self {
            PresetMode::Readonly => "Read-only: queries, session settings and file exports",
            PresetMode::Readwrite => "Read-write: queries, data changes and file transfer",
            PresetMode::Dba => "DBA: all operations including schema and access control",
        }
    }
}

impl std::fmt::Display for PresetMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PresetMode::Readonly => write!(f, "readonly"),
            PresetMode::Readwrite => write!(f, "readwrite"),
            PresetMode::Dba => write!(f, "dba"),
        }
    }
}

impl std::str::FromStr for PresetMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "readonly" | "read-only" | "read_only" => Ok(PresetMode::Readonly),
            "readwrite" | "read-write" | "read_write" => Ok(PresetMode::Readwrite),
            "dba" | "admin" => Ok(PresetMode::Dba),
            _ => Err(format!(
                "invalid preset mode: {} (valid: readonly, readwrite, dba)",
                s
            )),
        }
    }
}
