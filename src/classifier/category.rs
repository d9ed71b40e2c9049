//! Operation categories and FILE transfer direction.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// The unit of permission granularity.
///
/// Every recognized operation belongs to exactly one category. `Session`
/// operations only change client-side settings and are always permitted.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum OperationCategory {
    /// Data query: SELECT, DESCRIBE, LIST, SHOW
    Dql,
    /// Data modification: INSERT, UPDATE, DELETE, batches
    Dml,
    /// Schema definition: CREATE, ALTER, DROP, TRUNCATE
    Ddl,
    /// Access control: roles, users, grants
    Dcl,
    /// Client-side session settings
    Session,
    /// File import and export
    File,
}

impl OperationCategory {
    pub const ALL: [OperationCategory; 6] = [
        OperationCategory::Dql,
        OperationCategory::Session,
        OperationCategory::Dml,
        OperationCategory::Ddl,
        OperationCategory::Dcl,
        OperationCategory::File,
    ];

    /// Lowercase identifier used in configuration and tool arguments.
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationCategory::Dql => "dql",
            OperationCategory::Dml => "dml",
            OperationCategory::Ddl => "ddl",
            OperationCategory::Dcl => "dcl",
            OperationCategory::Session => "session",
            OperationCategory::File => "file",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            OperationCategory::Dql => "Data queries: SELECT, LIST, DESCRIBE, SHOW",
            OperationCategory::Dml => "Data changes: INSERT, UPDATE, DELETE, BATCH",
            OperationCategory::Ddl => "Schema changes: CREATE, ALTER, DROP, TRUNCATE",
            OperationCategory::Dcl => "Access control: roles, users, GRANT, REVOKE",
            OperationCategory::Session => "Session settings: CONSISTENCY, PAGING, TRACING",
            OperationCategory::File => "File transfer: COPY TO, COPY FROM, SOURCE",
        }
    }

    pub fn is_session(&self) -> bool {
        matches!(self, OperationCategory::Session)
    }
}

impl std::fmt::Display for OperationCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OperationCategory::Dql => write!(f, "DQL"),
            OperationCategory::Dml => write!(f, "DML"),
            OperationCategory::Ddl => write!(f, "DDL"),
            OperationCategory::Dcl => write!(f, "DCL"),
            OperationCategory::Session => write!(f, "SESSION"),
            OperationCategory::File => write!(f, "FILE"),
        }
    }
}

impl std::str::FromStr for OperationCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "dql" => Ok(OperationCategory::Dql),
            "dml" => Ok(OperationCategory::Dml),
            "ddl" => Ok(OperationCategory::Ddl),
            "dcl" => Ok(OperationCategory::Dcl),
            "session" => Ok(OperationCategory::Session),
            "file" => Ok(OperationCategory::File),
            _ => Err(format!(
                "invalid category: {} (valid: dql, session, dml, ddl, dcl, file)",
                s
            )),
        }
    }
}

/// Direction of a FILE operation.
///
/// Exports are readable under every preset; imports write data and need
/// `readwrite` or higher.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum FileDirection {
    Export,
    Import,
}

impl std::fmt::Display for FileDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FileDirection::Export => write!(f, "export"),
            FileDirection::Import => write!(f, "import"),
        }
    }
}

impl std::str::FromStr for FileDirection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "export" | "to" => Ok(FileDirection::Export),
            "import" | "from" => Ok(FileDirection::Import),
            _ => Err(format!("invalid file direction: {}", s)),
        }
    }
}
