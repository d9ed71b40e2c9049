//! The operation-name table.
//!
//! A [`Vocabulary`] is loaded once and never mutated. The built-in CQL table
//! covers statements, cqlsh shell commands and batch markers.

use std::collections::HashMap;

use serde::Serialize;

use super::{FileDirection, OperationCategory, Severity};

use OperationCategory::{Dcl, Ddl, Dml, Dql, Session};
use Severity::{Critical, High, Low, Medium, None as Safe};

/// A single recognized operation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct OperationSpec {
    pub name: String,
    pub category: OperationCategory,
    pub severity: Severity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub direction: Option<FileDirection>,
    pub description: String,
}

impl OperationSpec {
    pub fn new(
        name: impl Into<String>,
        category: OperationCategory,
        severity: Severity,
        description: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            category,
            severity,
            direction: None,
            description: description.into(),
        }
    }

    pub fn with_direction(mut self, direction: FileDirection) -> Self {
        self.direction = Some(direction);
        self
    }
}

const CQL_OPERATIONS: &[(&str, OperationCategory, Severity, &str)] = &[
    // DQL
    ("SELECT", Dql, Safe, "Query rows"),
    ("DESCRIBE", Dql, Safe, "Describe schema objects"),
    ("SHOW", Dql, Safe, "Show client information"),
    ("LIST", Dql, Safe, "List access-control objects"),
    ("LIST ROLES", Dql, Safe, "List all roles"),
    ("LIST USERS", Dql, Safe, "List all users"),
    ("LIST PERMISSIONS", Dql, Safe, "List granted permissions"),
    ("DESCRIBE KEYSPACES", Dql, Safe, "List keyspaces"),
    ("DESCRIBE KEYSPACE", Dql, Safe, "Show keyspace definition"),
    ("DESCRIBE TABLES", Dql, Safe, "List tables"),
    ("DESCRIBE TABLE", Dql, Safe, "Show table schema"),
    ("DESCRIBE TYPE", Dql, Safe, "Show user-defined type"),
    ("DESCRIBE TYPES", Dql, Safe, "List user-defined types"),
    ("DESCRIBE CLUSTER", Dql, Safe, "Show cluster information"),
    ("SHOW VERSION", Dql, Safe, "Show server version"),
    ("SHOW HOST", Dql, Safe, "Show connection details"),
    ("SHOW SESSION", Dql, Safe, "Show session settings"),
    // DML
    ("INSERT", Dml, Low, "Insert a row"),
    ("UPDATE", Dml, Medium, "Update rows"),
    ("DELETE", Dml, High, "Delete rows"),
    ("BATCH", Dml, Medium, "Execute a batch"),
    ("BEGIN BATCH", Dml, Medium, "Start a logged batch"),
    ("BEGIN UNLOGGED BATCH", Dml, Medium, "Start an unlogged batch"),
    ("BEGIN COUNTER BATCH", Dml, Medium, "Start a counter batch"),
    ("APPLY BATCH", Dml, Medium, "Apply the current batch"),
    // DDL
    ("USE", Ddl, Safe, "Switch keyspace"),
    ("CREATE", Ddl, Medium, "Create a schema object"),
    ("ALTER", Ddl, High, "Alter a schema object"),
    ("DROP", Ddl, Critical, "Drop a schema object"),
    ("TRUNCATE", Ddl, Critical, "Remove every row of a table"),
    ("CREATE KEYSPACE", Ddl, Medium, "Create a keyspace"),
    ("CREATE TABLE", Ddl, Medium, "Create a table"),
    ("CREATE INDEX", Ddl, Medium, "Create a secondary index"),
    ("CREATE CUSTOM INDEX", Ddl, Medium, "Create a custom (SAI) index"),
    ("CREATE MATERIALIZED VIEW", Ddl, Medium, "Create a materialized view"),
    ("CREATE TYPE", Ddl, Medium, "Create a user-defined type"),
    ("CREATE FUNCTION", Ddl, Medium, "Create a user-defined function"),
    ("CREATE AGGREGATE", Ddl, Medium, "Create a user-defined aggregate"),
    ("CREATE TRIGGER", Ddl, Medium, "Create a trigger"),
    ("ALTER KEYSPACE", Ddl, High, "Alter keyspace replication or options"),
    ("ALTER TABLE", Ddl, High, "Alter table columns or options"),
    ("ALTER MATERIALIZED VIEW", Ddl, High, "Alter materialized view options"),
    ("ALTER TYPE", Ddl, High, "Alter a user-defined type"),
    ("DROP KEYSPACE", Ddl, Critical, "Drop a keyspace and all its data"),
    ("DROP TABLE", Ddl, Critical, "Drop a table and all its data"),
    ("DROP INDEX", Ddl, High, "Drop an index"),
    ("DROP MATERIALIZED VIEW", Ddl, High, "Drop a materialized view"),
    ("DROP TYPE", Ddl, High, "Drop a user-defined type"),
    ("DROP FUNCTION", Ddl, High, "Drop a user-defined function"),
    ("DROP AGGREGATE", Ddl, High, "Drop a user-defined aggregate"),
    ("DROP TRIGGER", Ddl, High, "Drop a trigger"),
    // DCL
    ("GRANT", Dcl, High, "Grant permissions"),
    ("REVOKE", Dcl, High, "Revoke permissions"),
    ("GRANT ROLE", Dcl, High, "Grant a role to another role"),
    ("REVOKE ROLE", Dcl, High, "Revoke a role from another role"),
    ("CREATE ROLE", Dcl, High, "Create a role"),
    ("ALTER ROLE", Dcl, High, "Alter a role"),
    ("DROP ROLE", Dcl, Critical, "Drop a role"),
    ("CREATE USER", Dcl, High, "Create a user"),
    ("ALTER USER", Dcl, High, "Alter a user"),
    ("DROP USER", Dcl, Critical, "Drop a user"),
    ("ADD IDENTITY", Dcl, High, "Map an external identity to a role"),
    ("DROP IDENTITY", Dcl, High, "Remove an identity mapping"),
    // SESSION
    ("CONSISTENCY", Session, Safe, "Set consistency level"),
    ("SERIAL CONSISTENCY", Session, Safe, "Set serial consistency level"),
    ("PAGING", Session, Safe, "Configure result paging"),
    ("TRACING", Session, Safe, "Toggle request tracing"),
    ("AUTOFETCH", Session, Safe, "Toggle automatic page fetching"),
    ("EXPAND", Session, Safe, "Toggle vertical output"),
    ("OUTPUT", Session, Safe, "Set output format"),
    ("CAPTURE", Session, Safe, "Capture output to a file"),
    ("CAPTURE ON", Session, Safe, "Start capturing output"),
    ("CAPTURE OFF", Session, Safe, "Stop capturing output"),
    ("CAPTURE JSON", Session, Safe, "Capture output as JSON"),
    ("CAPTURE CSV", Session, Safe, "Capture output as CSV"),
    ("CAPTURE PARQUET", Session, Safe, "Capture output as Parquet"),
    ("SAVE", Session, Safe, "Save the last result to a file"),
];

const FILE_OPERATIONS: &[(&str, Severity, Option<FileDirection>, &str)] = &[
    (
        "COPY TO",
        Low,
        Some(FileDirection::Export),
        "Export table data to a file",
    ),
    (
        "COPY FROM",
        Medium,
        Some(FileDirection::Import),
        "Import table data from a file",
    ),
    (
        "SOURCE",
        Medium,
        Some(FileDirection::Import),
        "Execute statements from a file",
    ),
    ("COPY", Medium, None, "Copy data between a table and a file"),
];

const PHRASE_ALIASES: &[(&str, &str)] = &[
    ("BEGIN UNLOGGED", "BEGIN UNLOGGED BATCH"),
    ("BEGIN COUNTER", "BEGIN COUNTER BATCH"),
    ("CREATE MATERIALIZED", "CREATE MATERIALIZED VIEW"),
    ("CREATE CUSTOM", "CREATE CUSTOM INDEX"),
    ("CREATE OR REPLACE FUNCTION", "CREATE FUNCTION"),
    ("CREATE OR REPLACE AGGREGATE", "CREATE AGGREGATE"),
    ("CREATE OR", "CREATE FUNCTION"),
];

const WORD_ALIASES: &[(&str, &str)] = &[("DESC", "DESCRIBE"), ("COLUMNFAMILY", "TABLE")];

/// Operation-name lookup table.
#[derive(Clone, Debug)]
pub struct Vocabulary {
    entries: Vec<OperationSpec>,
    index: HashMap<String, usize>,
    word_aliases: HashMap<String, String>,
    max_words: usize,
}

impl Vocabulary {
    /// The built-in CQL and cqlsh vocabulary.
    pub fn cql() -> Self {
        let statements = CQL_OPERATIONS
            .iter()
            .map(|(name, category, severity, description)| {
                OperationSpec::new(*name, *category, *severity, *description)
            });
        let files = FILE_OPERATIONS
            .iter()
            .map(|(name, severity, direction, description)| {
                let spec = OperationSpec::new(*name, OperationCategory::File, *severity, *description);
                match direction {
                    Some(direction) => spec.with_direction(*direction),
                    None => spec,
                }
            });

        let mut vocabulary = Self::from_entries(statements.chain(files));
        for (alias, canonical) in PHRASE_ALIASES {
            vocabulary.add_alias(alias, canonical);
        }
        for (alias, canonical) in WORD_ALIASES {
            vocabulary
                .word_aliases
                .insert((*alias).to_string(), (*canonical).to_string());
        }
        vocabulary
    }

    /// Builds a vocabulary from custom entries. Later duplicates replace
    /// earlier ones.
    pub fn from_entries(entries: impl IntoIterator<Item = OperationSpec>) -> Self {
        let mut vocabulary = Self {
            entries: Vec::new(),
            index: HashMap::new(),
            word_aliases: HashMap::new(),
            max_words: 0,
        };
        for mut entry in entries {
            entry.name = normalize(&entry.name);
            match vocabulary.index.get(&entry.name) {
                Some(&existing) => vocabulary.entries[existing] = entry,
                None => {
                    vocabulary.track_words(&entry.name);
                    vocabulary
                        .index
                        .insert(entry.name.clone(), vocabulary.entries.len());
                    vocabulary.entries.push(entry);
                }
            }
        }
        vocabulary
    }

    /// Registers an alternative phrase for an existing entry.
    pub fn with_alias(mut self, alias: &str, canonical: &str) -> Self {
        self.add_alias(alias, canonical);
        self
    }

    fn add_alias(&mut self, alias: &str, canonical: &str) {
        let alias = normalize(alias);
        if let Some(&idx) = self.index.get(&normalize(canonical)) {
            self.track_words(&alias);
            self.index.entry(alias).or_insert(idx);
        }
    }

    fn track_words(&mut self, phrase: &str) {
        self.max_words = self.max_words.max(phrase.split(' ').count());
    }

    /// Exact lookup of a normalized name or alias.
    pub fn get(&self, name: &str) -> Option<&OperationSpec> {
        self.index
            .get(&self.canonical_words(name).join(" "))
            .map(|&idx| &self.entries[idx])
    }

    /// Longest-prefix lookup on word boundaries, so `CREATE TABLE users`
    /// resolves to `CREATE TABLE`.
    pub fn resolve(&self, operation: &str) -> Option<&OperationSpec> {
        let words = self.canonical_words(operation);
        let longest = words.len().min(self.max_words);
        (1..=longest).rev().find_map(|len| {
            self.index
                .get(&words[..len].join(" "))
                .map(|&idx| &self.entries[idx])
        })
    }

    pub(crate) fn canonical_words(&self, operation: &str) -> Vec<String> {
        operation
            .split_whitespace()
            .map(|word| {
                let word = word.to_uppercase();
                self.word_aliases.get(&word).cloned().unwrap_or(word)
            })
            .collect()
    }

    pub fn entries(&self) -> &[OperationSpec] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self::cql()
    }
}

/// Trims, uppercases and collapses internal whitespace.
pub fn normalize(operation: &str) -> String {
    operation
        .split_whitespace()
        .map(str::to_uppercase)
        .collect::<Vec<_>>()
        .join(" ")
}
