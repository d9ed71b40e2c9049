//! Structured operation submitted by an agent.

use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::classifier::FileDirection;

/// An operation name plus the context needed to classify and describe it.
///
/// Only `operation`, `direction`, `where` and `query` influence
/// classification and severity. The rest is passed through to the executor.
/// When `query` is present it is the statement that runs, so it must
/// classify the same way as `operation`.
#[derive(Clone, Debug, Default, Serialize, Deserialize, JsonSchema)]
pub struct OperationPlan {
    /// Operation name, e.g. SELECT, INSERT, CREATE TABLE, COPY
    pub operation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keyspace: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub columns: Vec<String>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub values: Map<String, Value>,
    #[serde(default, rename = "where", skip_serializing_if = "Vec::is_empty")]
    pub where_clause: Vec<WhereClause>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub order_by: Vec<OrderClause>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub allow_filtering: bool,
    /// Column definitions for CREATE TABLE
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub schema: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub options: Map<String, Value>,
    /// FILE direction for COPY: export or import
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<FileDirection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    /// Raw statement text, when the caller has one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct WhereClause {
    pub column: String,
    /// =, <, >, <=, >=, IN, CONTAINS
    pub operator: String,
    pub value: Value,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct OrderClause {
    pub column: String,
    /// ASC or DESC
    pub order: String,
}

impl OperationPlan {
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            ..Default::default()
        }
    }

    pub fn keyspace(mut self, keyspace: impl Into<String>) -> Self {
        self.keyspace = Some(keyspace.into());
        self
    }

    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    pub fn value(mut self, column: impl Into<String>, value: Value) -> Self {
        self.values.insert(column.into(), value);
        self
    }

    pub fn filter(
        mut self,
        column: impl Into<String>,
        operator: impl Into<String>,
        value: Value,
    ) -> Self {
        self.where_clause.push(WhereClause {
            column: column.into(),
            operator: operator.into(),
            value,
        });
        self
    }

    pub fn direction(mut self, direction: FileDirection) -> Self {
        self.direction = Some(direction);
        self
    }

    pub fn query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    /// Non-blank raw statement text.
    pub fn raw_query(&self) -> Option<&str> {
        self.query.as_deref().map(str::trim).filter(|q| !q.is_empty())
    }

    /// Whether the operation is restricted to specific rows.
    pub fn has_where(&self) -> bool {
        !self.where_clause.is_empty()
            || self
                .query
                .as_deref()
                .is_some_and(|q| q.to_uppercase().split_whitespace().any(|w| w == "WHERE"))
    }

    /// `keyspace.table`, whichever parts are known.
    pub fn target(&self) -> Option<String> {
        match (&self.keyspace, &self.table) {
            (Some(ks), Some(table)) => Some(format!("{}.{}", ks, table)),
            (None, Some(table)) => Some(table.clone()),
            (Some(ks), None) => Some(ks.clone()),
            (None, None) => None,
        }
    }

    /// Human-readable description for confirmation prompts and listings.
    pub fn describe(&self, canonical_operation: &str) -> String {
        if let Some(query) = self.raw_query() {
            return query.to_string();
        }

        let mut description = canonical_operation.to_string();
        if let Some(target) = self.target() {
            description.push(' ');
            description.push_str(&target);
        }
        if let Some(path) = &self.file_path {
            description.push_str(&format!(" [file: {}]", path));
        }
        if !self.where_clause.is_empty() {
            let conditions: Vec<String> = self
                .where_clause
                .iter()
                .map(|w| format!("{} {} {}", w.column, w.operator, w.value))
                .collect();
            description.push_str(&format!(" WHERE {}", conditions.join(" AND ")));
        }
        description
    }
}

/// Number of `;`-separated statements in `query`, ignoring separators
/// inside quoted literals and empty trailing segments.
pub(crate) fn statement_count(query: &str) -> usize {
    let mut count = 0;
    let mut pending = false;
    let mut quote: Option<char> = None;

    for c in query.chars() {
        match (quote, c) {
            (Some(open), c) if c == open => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"') => {
                quote = Some(c);
                pending = true;
            }
            (None, ';') => {
                if pending {
                    count += 1;
                }
                pending = false;
            }
            (None, c) if !c.is_whitespace() => pending = true,
            (None, _) => {}
        }
    }
    count + usize::from(pending)
}
