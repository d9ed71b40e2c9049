//! Closed tool set and its handler registry.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::context::GateContext;
use super::traits::Tool;
use super::{ToolDefinition, ToolError, ToolOutput};
use crate::confirmation::ConfirmationStatus;
use crate::{Error, Result};

/// Every tool the gate serves.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolName {
    SubmitQueryPlan,
    UpdateMcpPermissions,
    GetMcpStatus,
    GetPendingConfirmations,
    GetApprovedConfirmations,
    GetDeniedConfirmations,
    GetCancelledConfirmations,
    GetConfirmationState,
    CancelConfirmation,
    ResolveConfirmation,
}

impl ToolName {
    pub const ALL: [ToolName; 10] = [
        ToolName::SubmitQueryPlan,
        ToolName::UpdateMcpPermissions,
        ToolName::GetMcpStatus,
        ToolName::GetPendingConfirmations,
        ToolName::GetApprovedConfirmations,
        ToolName::GetDeniedConfirmations,
        ToolName::GetCancelledConfirmations,
        ToolName::GetConfirmationState,
        ToolName::CancelConfirmation,
        ToolName::ResolveConfirmation,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ToolName::SubmitQueryPlan => "submit_query_plan",
            ToolName::UpdateMcpPermissions => "update_mcp_permissions",
            ToolName::GetMcpStatus => "get_mcp_status",
            ToolName::GetPendingConfirmations => "get_pending_confirmations",
            ToolName::GetApprovedConfirmations => "get_approved_confirmations",
            ToolName::GetDeniedConfirmations => "get_denied_confirmations",
            ToolName::GetCancelledConfirmations => "get_cancelled_confirmations",
            ToolName::GetConfirmationState => "get_confirmation_state",
            ToolName::CancelConfirmation => "cancel_confirmation",
            ToolName::ResolveConfirmation => "resolve_confirmation",
        }
    }

    /// The listing tool for `status`.
    pub fn listing(status: ConfirmationStatus) -> Self {
        match status {
            ConfirmationStatus::Pending => ToolName::GetPendingConfirmations,
            ConfirmationStatus::Approved => ToolName::GetApprovedConfirmations,
            ConfirmationStatus::Denied => ToolName::GetDeniedConfirmations,
            ConfirmationStatus::Cancelled => ToolName::GetCancelledConfirmations,
        }
    }
}

impl std::fmt::Display for ToolName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ToolName {
    type Err = ToolError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let trimmed = s.trim();
        ToolName::ALL
            .into_iter()
            .find(|name| name.as_str() == trimmed)
            .ok_or_else(|| ToolError::unknown_tool(trimmed))
    }
}

/// Exactly one handler per [`ToolName`].
pub struct ToolRegistry {
    tools: BTreeMap<ToolName, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn builder() -> ToolRegistryBuilder {
        ToolRegistryBuilder::new()
    }

    /// Registry with the built-in handler for every tool.
    pub fn standard() -> Result<Self> {
        let mut builder = Self::builder()
            .register(Arc::new(super::SubmitQueryPlanTool))
            .register(Arc::new(super::UpdatePermissionsTool))
            .register(Arc::new(super::StatusTool))
            .register(Arc::new(super::ConfirmationStateTool))
            .register(Arc::new(super::CancelConfirmationTool))
            .register(Arc::new(super::ResolveConfirmationTool));

        for status in ConfirmationStatus::ALL {
            builder = builder.register(Arc::new(super::ListConfirmationsTool::new(status)));
        }
        builder.build()
    }

    pub fn get(&self, name: ToolName) -> Option<&Arc<dyn Tool>> {
        self.tools.get(&name)
    }

    pub async fn execute(
        &self,
        name: ToolName,
        input: serde_json::Value,
        context: &GateContext,
    ) -> ToolOutput {
        match self.tools.get(&name) {
            Some(tool) => tool.execute(input, context).await,
            None => ToolOutput::error(ToolError::unknown_tool(name.as_str())),
        }
    }

    /// Definitions in declaration order.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.values().map(|tool| tool.definition()).collect()
    }

    pub fn names(&self) -> Vec<ToolName> {
        self.tools.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.names())
            .finish()
    }
}

#[derive(Default)]
pub struct ToolRegistryBuilder {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolRegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(mut self, tool: Arc<dyn Tool>) -> Self {
        self.tools.push(tool);
        self
    }

    /// Fails unless every declared tool has exactly one handler.
    pub fn build(self) -> Result<ToolRegistry> {
        let mut tools = BTreeMap::new();
        for tool in self.tools {
            let name = tool.name();
            if tools.insert(name, tool).is_some() {
                return Err(Error::InvalidRegistry(format!(
                    "duplicate handler for {}",
                    name
                )));
            }
        }

        let missing: Vec<&str> = ToolName::ALL
            .iter()
            .filter(|name| !tools.contains_key(*name))
            .map(|name| name.as_str())
            .collect();
        if !missing.is_empty() {
            return Err(Error::InvalidRegistry(format!(
                "no handler for {}",
                missing.join(", ")
            )));
        }

        tracing::debug!(tools = tools.len(), "Tool registry built");
        Ok(ToolRegistry { tools })
    }
}
