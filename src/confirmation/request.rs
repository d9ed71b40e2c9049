//! Confirmation request records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::classifier::{OperationCategory, Severity};

pub const REQUEST_ID_PREFIX: &str = "req_";

/// Process-unique confirmation request identifier, e.g. `req_007`.
#[derive(Clone, Debug, Hash, Eq, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(String);

impl RequestId {
    pub(crate) fn from_sequence(sequence: u64) -> Self {
        Self(format!("{}{:03}", REQUEST_ID_PREFIX, sequence))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for RequestId {
    fn from(s: &str) -> Self {
        Self(s.trim().to_string())
    }
}

impl From<String> for RequestId {
    fn from(s: String) -> Self {
        Self::from(s.as_str())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConfirmationStatus {
    Pending,
    Approved,
    Denied,
    Cancelled,
}

impl ConfirmationStatus {
    pub const ALL: [ConfirmationStatus; 4] = [
        ConfirmationStatus::Pending,
        ConfirmationStatus::Approved,
        ConfirmationStatus::Denied,
        ConfirmationStatus::Cancelled,
    ];

    pub fn is_terminal(&self) -> bool {
        !matches!(self, ConfirmationStatus::Pending)
    }
}

impl std::fmt::Display for ConfirmationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfirmationStatus::Pending => write!(f, "PENDING"),
            ConfirmationStatus::Approved => write!(f, "APPROVED"),
            ConfirmationStatus::Denied => write!(f, "DENIED"),
            ConfirmationStatus::Cancelled => write!(f, "CANCELLED"),
        }
    }
}

/// A terminal transition. PENDING is not a valid target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Resolution {
    Approve,
    Deny,
    Cancel,
}

impl Resolution {
    pub fn status(&self) -> ConfirmationStatus {
        match self {
            Resolution::Approve => ConfirmationStatus::Approved,
            Resolution::Deny => ConfirmationStatus::Denied,
            Resolution::Cancel => ConfirmationStatus::Cancelled,
        }
    }
}

/// Who made a terminal transition, and why.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResolutionNote {
    pub actor: Option<String>,
    pub reason: Option<String>,
}

impl ResolutionNote {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn by(mut self, actor: impl Into<String>) -> Self {
        self.actor = non_blank(actor.into());
        self
    }

    pub fn reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = non_blank(reason.into());
        self
    }
}

fn non_blank(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Result of running an approved request.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExecutionRecord {
    pub rows_affected: Option<u64>,
    pub error: Option<String>,
}

impl ExecutionRecord {
    pub fn succeeded(rows_affected: Option<u64>) -> Self {
        Self {
            rows_affected,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            rows_affected: None,
            error: Some(error.into()),
        }
    }
}

/// Everything needed to open a request; the store assigns id and timestamps.
#[derive(Clone, Debug)]
pub struct NewConfirmation {
    pub operation: String,
    pub category: OperationCategory,
    pub severity: Severity,
    pub query: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct ConfirmationRequest {
    #[serde(rename = "request_id")]
    pub id: RequestId,
    pub operation: String,
    pub category: OperationCategory,
    pub severity: Severity,
    pub query: String,
    pub status: ConfirmationStatus,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Set once an APPROVED request has been run, successfully or not.
    pub executed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub executed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rows_affected: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub execution_error: Option<String>,
    /// An execution is in flight.
    #[serde(skip)]
    pub(crate) execution_claimed: bool,
}

impl ConfirmationRequest {
    pub(crate) fn open(id: RequestId, new: NewConfirmation) -> Self {
        Self {
            id,
            operation: new.operation,
            category: new.category,
            severity: new.severity,
            query: new.query,
            status: ConfirmationStatus::Pending,
            created_at: Utc::now(),
            resolved_at: None,
            resolved_by: None,
            reason: None,
            executed: false,
            executed_at: None,
            rows_affected: None,
            execution_error: None,
            execution_claimed: false,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == ConfirmationStatus::Pending
    }

    /// Terminal and no longer runnable: DENIED, CANCELLED, or APPROVED and
    /// already executed.
    pub fn is_settled(&self) -> bool {
        match self.status {
            ConfirmationStatus::Pending => false,
            ConfirmationStatus::Approved => self.executed,
            ConfirmationStatus::Denied | ConfirmationStatus::Cancelled => true,
        }
    }
}
