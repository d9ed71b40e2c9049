//! Confirmation request tools.

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::traits::schema_value;
use super::{GateContext, SchemaTool, Tool, ToolName, ToolOutput};
use crate::Error;
use crate::confirmation::{
    ConfirmationRequest, ConfirmationStatus, RequestId, Resolution, ResolutionNote,
};

const DEFAULT_CANCEL_REASON: &str = "Cancelled by agent";
const DEFAULT_CANCEL_ACTOR: &str = "agent";
const DEFAULT_RESOLVE_ACTOR: &str = "user";

fn request_id(raw: &str) -> Result<RequestId, Error> {
    let id = RequestId::from(raw);
    if id.as_str().is_empty() {
        return Err(Error::InvalidInput("request_id is required".into()));
    }
    Ok(id)
}

#[derive(Serialize)]
struct Listing {
    status: ConfirmationStatus,
    count: usize,
    requests: Vec<ConfirmationRequest>,
}

/// Lists requests in one status, oldest first. One instance per status.
#[derive(Clone, Copy, Debug)]
pub struct ListConfirmationsTool {
    status: ConfirmationStatus,
}

impl ListConfirmationsTool {
    pub fn new(status: ConfirmationStatus) -> Self {
        Self { status }
    }
}

#[async_trait]
impl Tool for ListConfirmationsTool {
    fn name(&self) -> ToolName {
        ToolName::listing(self.status)
    }

    fn description(&self) -> &str {
        match self.status {
            ConfirmationStatus::Pending => "List confirmation requests still waiting for a human decision.",
            ConfirmationStatus::Approved => "List confirmation requests a human approved.",
            ConfirmationStatus::Denied => "List confirmation requests a human denied.",
            ConfirmationStatus::Cancelled => "List confirmation requests that were cancelled.",
        }
    }

    fn input_schema(&self) -> serde_json::Value {
        schema_value(schemars::schema_for!(super::NoInput))
    }

    async fn execute(&self, _input: serde_json::Value, context: &GateContext) -> ToolOutput {
        let requests = context.confirmations().list_by_status(self.status);
        ToolOutput::json(&Listing {
            status: self.status,
            count: requests.len(),
            requests,
        })
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct RequestIdInput {
    /// Confirmation request id, e.g. req_001
    pub request_id: String,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct ConfirmationStateTool;

#[async_trait]
impl SchemaTool for ConfirmationStateTool {
    type Input = RequestIdInput;

    const NAME: ToolName = ToolName::GetConfirmationState;
    const DESCRIPTION: &'static str = "Get the current state of a confirmation request: PENDING, \
        APPROVED, DENIED or CANCELLED.";

    async fn handle(&self, input: RequestIdInput, context: &GateContext) -> ToolOutput {
        let result = request_id(&input.request_id)
            .and_then(|id| context.confirmations().get(&id))
            .map(|request| ToolOutput::json(&request));
        result.into()
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CancelInput {
    /// Confirmation request id, e.g. req_001
    pub request_id: String,
    /// Why the request is withdrawn
    #[serde(default)]
    pub reason: Option<String>,
    /// Who withdraws it; defaults to "agent"
    #[serde(default)]
    pub cancelled_by: Option<String>,
}

#[derive(Serialize)]
struct Transition {
    message: String,
    request: ConfirmationRequest,
}

/// Withdraws a pending request.
#[derive(Clone, Copy, Debug, Default)]
pub struct CancelConfirmationTool;

#[async_trait]
impl SchemaTool for CancelConfirmationTool {
    type Input = CancelInput;

    const NAME: ToolName = ToolName::CancelConfirmation;
    const DESCRIPTION: &'static str = "Cancel a pending confirmation request that is no longer \
        needed. Requests that were already approved, denied or cancelled cannot be changed.";

    async fn handle(&self, input: CancelInput, context: &GateContext) -> ToolOutput {
        let reason = input
            .reason
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty())
            .unwrap_or_else(|| DEFAULT_CANCEL_REASON.to_string());

        let note = ResolutionNote::new()
            .by(input.cancelled_by.unwrap_or_else(|| DEFAULT_CANCEL_ACTOR.to_string()))
            .reason(reason);

        let result = request_id(&input.request_id)
            .and_then(|id| context.confirmations().cancel(&id, note))
            .map(|request| {
                ToolOutput::json(&Transition {
                    message: format!("Confirmation request {} cancelled", request.id),
                    request,
                })
            });
        result.into()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalDecision {
    Approve,
    Deny,
}

impl From<ApprovalDecision> for Resolution {
    fn from(decision: ApprovalDecision) -> Self {
        match decision {
            ApprovalDecision::Approve => Resolution::Approve,
            ApprovalDecision::Deny => Resolution::Deny,
        }
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ResolveInput {
    /// Confirmation request id, e.g. req_001
    pub request_id: String,
    /// approve or deny
    pub decision: ApprovalDecision,
    #[serde(default)]
    pub reason: Option<String>,
    /// Who made the decision; defaults to "user"
    #[serde(default)]
    pub resolved_by: Option<String>,
}

/// Approves or denies a pending request. Disabled unless the server was
/// started with request approval enabled.
#[derive(Clone, Copy, Debug, Default)]
pub struct ResolveConfirmationTool;

#[async_trait]
impl SchemaTool for ResolveConfirmationTool {
    type Input = ResolveInput;

    const NAME: ToolName = ToolName::ResolveConfirmation;
    const DESCRIPTION: &'static str = "Record the user's decision on a pending confirmation \
        request. Only relay a decision the user gave explicitly. Usually disabled: approvals then \
        come from the operator's own interface.";

    async fn handle(&self, input: ResolveInput, context: &GateContext) -> ToolOutput {
        if !context.allow_request_approval() {
            tracing::warn!(request_id = %input.request_id, "Request approval through tools is disabled");
            return ToolOutput::error(Error::ApprovalDisabled);
        }

        let resolution = Resolution::from(input.decision);
        let mut note = ResolutionNote::new()
            .by(input.resolved_by.unwrap_or_else(|| DEFAULT_RESOLVE_ACTOR.to_string()));
        if let Some(reason) = input.reason {
            note = note.reason(reason);
        }
        let result = request_id(&input.request_id)
            .and_then(|id| context.confirmations().resolve(&id, resolution, note))
            .map(|request| {
                ToolOutput::json(&Transition {
                    message: format!("Confirmation request {} {}", request.id, request.status),
                    request,
                })
            });
        result.into()
    }
}
