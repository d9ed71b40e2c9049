//! Tool surface of the gate.
//!
//! Each [`ToolName`] maps to exactly one handler in the [`ToolRegistry`].
//! Handlers are thin: they parse arguments, call into the owning component,
//! and turn the result into a [`ToolOutput`].

mod confirmations;
mod context;
mod definition;
mod output;
mod permissions;
mod query;
mod refusal;
mod registry;
mod traits;

pub use confirmations::{
    ApprovalDecision, CancelConfirmationTool, ConfirmationStateTool, ListConfirmationsTool,
    ResolveConfirmationTool,
};
pub use context::GateContext;
pub use definition::ToolDefinition;
pub use output::{ToolError, ToolOutput};
pub use permissions::{NoInput, StatusTool, UpdatePermissionsInput, UpdatePermissionsTool};
pub use query::SubmitQueryPlanTool;
pub use refusal::{ConfigurationHints, Refusal};
pub use registry::{ToolName, ToolRegistry, ToolRegistryBuilder};
pub use traits::{SchemaTool, Tool};
