//! Prelude module for convenient imports.
//!
//! ```rust
//! use cql_gate::prelude::*;
//! ```

// Core types
pub use crate::Error;
pub use crate::Result;

// Server
pub use crate::GateServer;
pub use crate::GateServerBuilder;
pub use crate::GateSettings;

// Policy
pub use crate::classifier::{Classification, FileDirection, OperationCategory, Severity};
pub use crate::permissions::{
    CategorySelection, Decision, PermissionChange, PermissionConfig, PolicyManager, PresetMode,
};

// Confirmations
pub use crate::confirmation::{
    ConfirmationRequest, ConfirmationStatus, ConfirmationStore, RequestId, ResolutionNote,
};

// Orchestration
pub use crate::orchestrator::{ConfirmedExecution, ExecutionReport, Executor, OperationPlan, Outcome};

// Tools
pub use crate::tools::{GateContext, SchemaTool, Tool, ToolName, ToolOutput};
