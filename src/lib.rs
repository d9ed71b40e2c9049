//! # cql-gate
//!
//! Permission gate for agent-issued CQL operations.
//!
//! Every operation an agent submits is classified into a category, checked
//! against the live permission configuration, and either allowed, refused,
//! or parked as a confirmation request for a human to decide on.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use cql_gate::{GateServer, PermissionConfig, PresetMode};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), cql_gate::Error> {
//!     let server = GateServer::builder()
//!         .permissions(PermissionConfig::preset(PresetMode::Readwrite))
//!         .build()?;
//!
//!     let output = server
//!         .call_tool("submit_query_plan", json!({"operation": "SELECT", "table": "users"}))
//!         .await;
//!     println!("{}", output.text());
//!     Ok(())
//! }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod classifier;
pub mod confirmation;
pub mod config;
pub mod observability;
pub mod orchestrator;
pub mod permissions;
pub mod prelude;
pub mod server;
pub mod tools;

pub use classifier::{
    Classification, FileDirection, OperationCategory, OperationClassifier, OperationSpec,
    Severity, Vocabulary,
};
pub use confirmation::{
    ConfirmationRequest, ConfirmationStatus, ConfirmationStore, ExecutionRecord, NewConfirmation,
    RequestId, Resolution, ResolutionNote,
};
pub use config::{ConfigBuilder, ConfigError, ConfigProvider, GateSettings};
pub use observability::{MetricsRegistry, MetricsSummary};
pub use orchestrator::{
    ConfirmedExecution, ExecutionReport, Executor, NoopExecutor, OperationPlan, Outcome,
    RequestOrchestrator,
};
pub use permissions::{
    CategorySelection, Decision, Denial, PermissionChange, PermissionConfig, PermissionStatus,
    PolicyManager, PresetMode,
};
pub use server::{GateServer, GateServerBuilder};
pub use tools::{ToolDefinition, ToolError, ToolName, ToolOutput};

/// Error type for cql-gate operations.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Operation name is not in the vocabulary.
    #[error("Unknown operation: {operation}")]
    UnknownOperation { operation: String },

    /// Raw query text classifies differently from the declared operation.
    #[error(
        "Query text runs {query}, but the plan declares {declared}; submit the plan with the operation the query actually performs"
    )]
    QueryMismatch { declared: String, query: String },

    /// Operation category is outside the current preset.
    #[error("{0}")]
    NotAllowed(permissions::Denial),

    /// Permission change attempted without explicit user confirmation.
    #[error(
        "Permission changes require user confirmation: ask the user explicitly, then retry with user_confirmed=true"
    )]
    ConfirmationRequired,

    /// Runtime permission changes are disabled for this process.
    #[error(
        "Runtime permission changes are disabled (lockdown). To change permissions, stop the server and restart it without the lockdown flag (disable_runtime_permission_changes)"
    )]
    LockedDown,

    #[error("Confirmation request not found: {id}")]
    RequestNotFound { id: confirmation::RequestId },

    #[error("Confirmation request {id} is already {status}")]
    AlreadyResolved {
        id: confirmation::RequestId,
        status: confirmation::ConfirmationStatus,
    },

    /// Only APPROVED requests can be executed.
    #[error("Confirmation request {id} is {status}; only APPROVED requests can be executed")]
    NotApproved {
        id: confirmation::RequestId,
        status: confirmation::ConfirmationStatus,
    },

    #[error("Confirmation request {id} has already been executed")]
    AlreadyExecuted { id: confirmation::RequestId },

    /// Permission change arguments are malformed or conflicting.
    #[error("Invalid permission change: {0}")]
    InvalidChange(String),

    /// Tool arguments failed validation.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Resolving confirmations through the tool surface is not enabled.
    #[error(
        "Resolving confirmation requests through tools is disabled; a human must approve or deny the request"
    )]
    ApprovalDisabled,

    /// The executor failed to run an allowed operation.
    #[error("Execution failed: {0}")]
    Execution(String),

    /// Tool handlers do not cover the declared tool set exactly once.
    #[error("Invalid tool registry: {0}")]
    InvalidRegistry(String),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),
}

/// Error category for unified error handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Refused by policy, lockdown, or missing user confirmation
    Authorization,
    /// Malformed input from the caller
    Validation,
    /// Referenced request does not exist
    NotFound,
    /// Request is no longer in a state that allows the transition
    Conflict,
    /// Startup configuration errors
    Configuration,
    /// Executor or serialization failures
    Internal,
}

impl Error {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::NotAllowed(_)
            | Error::QueryMismatch { .. }
            | Error::ConfirmationRequired
            | Error::LockedDown
            | Error::ApprovalDisabled => ErrorCategory::Authorization,

            Error::UnknownOperation { .. } | Error::InvalidChange(_) | Error::InvalidInput(_) => {
                ErrorCategory::Validation
            }

            Error::RequestNotFound { .. } => ErrorCategory::NotFound,
            Error::AlreadyResolved { .. }
            | Error::NotApproved { .. }
            | Error::AlreadyExecuted { .. } => ErrorCategory::Conflict,
            Error::Config(_) | Error::InvalidRegistry(_) => ErrorCategory::Configuration,
            Error::Execution(_) | Error::Json(_) => ErrorCategory::Internal,
        }
    }

    /// Stable machine-readable identifier used in tool responses.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::UnknownOperation { .. } => "unknown_operation",
            Error::NotAllowed(_) => "permission_denied",
            Error::QueryMismatch { .. } => "query_mismatch",
            Error::ConfirmationRequired => "user_confirmation_required",
            Error::LockedDown => "locked_down",
            Error::RequestNotFound { .. } => "request_not_found",
            Error::AlreadyResolved { .. } => "already_resolved",
            Error::NotApproved { .. } => "not_approved",
            Error::AlreadyExecuted { .. } => "already_executed",
            Error::InvalidChange(_) => "invalid_change",
            Error::InvalidInput(_) => "invalid_input",
            Error::ApprovalDisabled => "approval_disabled",
            Error::Execution(_) => "execution_failed",
            Error::InvalidRegistry(_) => "invalid_registry",
            Error::Config(_) => "configuration",
            Error::Json(_) => "json",
        }
    }

    pub fn is_authorization_error(&self) -> bool {
        self.category() == ErrorCategory::Authorization
    }

    pub fn is_validation_error(&self) -> bool {
        self.category() == ErrorCategory::Validation
    }

    pub fn is_not_found(&self) -> bool {
        self.category() == ErrorCategory::NotFound
    }
}

/// Result type for cql-gate operations.
pub type Result<T> = std::result::Result<T, Error>;
