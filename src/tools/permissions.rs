//! Permission update and status tools.

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::{GateContext, SchemaTool, ToolName, ToolOutput};
use crate::Error;
use crate::confirmation::ConfirmationStatus;
use crate::observability::MetricsSummary;
use crate::permissions::{PermissionChange, PermissionStatus};

#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct UpdatePermissionsInput {
    /// Preset mode: readonly, readwrite or dba
    #[serde(default)]
    pub mode: Option<String>,
    /// Categories that still need confirmation in a preset mode, e.g.
    /// "dml,ddl", "all" or "none"
    #[serde(default)]
    pub confirm_queries: Option<String>,
    /// Switches to fine-grained mode: categories that skip confirmation, e.g.
    /// "dql,dml", "all" or "none"
    #[serde(default)]
    pub skip_confirmation: Option<String>,
    /// Must be true, and only after the user explicitly agreed to the change
    #[serde(default)]
    pub user_confirmed: bool,
}

/// Applies a runtime permission change.
#[derive(Clone, Copy, Debug, Default)]
pub struct UpdatePermissionsTool;

#[async_trait]
impl SchemaTool for UpdatePermissionsTool {
    type Input = UpdatePermissionsInput;

    const NAME: ToolName = ToolName::UpdateMcpPermissions;
    const DESCRIPTION: &'static str = "Change the permission configuration. Set mode (readonly, \
        readwrite, dba) and optionally confirm_queries, or set skip_confirmation to switch to \
        fine-grained mode. Requires user_confirmed=true, which you may only send after the user \
        has explicitly approved this exact change. Fails permanently when runtime changes are \
        disabled.";

    async fn handle(&self, input: UpdatePermissionsInput, context: &GateContext) -> ToolOutput {
        let policy = context.policy();
        if policy.is_locked_down() {
            tracing::warn!("Permission update refused: lockdown is active");
            return ToolOutput::error(Error::LockedDown);
        }

        let change = match PermissionChange::parse(
            input.mode.as_deref(),
            input.confirm_queries.as_deref(),
            input.skip_confirmation.as_deref(),
        ) {
            Ok(change) => change,
            Err(e) => return ToolOutput::error(e),
        };

        match policy.update(&change, input.user_confirmed) {
            Ok(config) => ToolOutput::success(format!(
                "Configuration updated successfully (version {}).\n\n{}",
                config.version,
                config.summary()
            )),
            Err(e) => ToolOutput::error(e),
        }
    }
}

#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct NoInput {}

#[derive(Serialize)]
struct StatusReport {
    state: &'static str,
    config: PermissionStatus,
    pending_confirmations: usize,
    metrics: MetricsSummary,
}

/// Reports the live configuration and dispatch metrics.
#[derive(Clone, Copy, Debug, Default)]
pub struct StatusTool;

#[async_trait]
impl SchemaTool for StatusTool {
    type Input = NoInput;

    const NAME: ToolName = ToolName::GetMcpStatus;
    const DESCRIPTION: &'static str = "Show the current permission mode, confirmation settings, \
        lockdown state and request metrics.";

    async fn handle(&self, _input: NoInput, context: &GateContext) -> ToolOutput {
        ToolOutput::json(&StatusReport {
            state: "RUNNING",
            config: context.policy().snapshot().status(),
            pending_confirmations: context.confirmations().count(ConfirmationStatus::Pending),
            metrics: context.metrics().summary(),
        })
    }
}
