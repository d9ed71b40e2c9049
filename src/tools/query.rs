//! submit_query_plan tool.

use async_trait::async_trait;
use serde::Serialize;

use super::refusal::Refusal;
use super::{GateContext, SchemaTool, ToolName, ToolOutput};
use crate::orchestrator::{ExecutionReport, OperationPlan, OutcomeView};

#[derive(Serialize)]
struct Executed<'a> {
    status: &'static str,
    #[serde(flatten)]
    outcome: OutcomeView<'a>,
    #[serde(flatten)]
    report: &'a ExecutionReport,
}

/// Classifies a plan, applies the permission policy, and runs it when
/// allowed.
#[derive(Clone, Copy, Debug, Default)]
pub struct SubmitQueryPlanTool;

#[async_trait]
impl SchemaTool for SubmitQueryPlanTool {
    type Input = OperationPlan;

    const NAME: ToolName = ToolName::SubmitQueryPlan;
    const DESCRIPTION: &'static str = "Submit a structured CQL operation plan. The operation is \
        checked against the current permission mode: it is executed when allowed, refused with \
        configuration hints when the mode does not permit it, or parked as a confirmation request \
        that a human must approve. Never retry a refused operation by changing permissions \
        without asking the user.";

    async fn handle(&self, plan: OperationPlan, context: &GateContext) -> ToolOutput {
        let outcome = match context.orchestrator().submit(&plan) {
            Ok(outcome) => outcome,
            Err(e) => return ToolOutput::error(e),
        };

        if let Some(refusal) = Refusal::from_outcome(&outcome) {
            return ToolOutput::error(refusal.into_tool_error());
        }

        match context
            .executor()
            .execute(&plan, &outcome.classification)
            .await
        {
            Ok(report) => ToolOutput::json(&Executed {
                status: "executed",
                outcome: OutcomeView::from(&outcome),
                report: &report,
            }),
            Err(e) => {
                tracing::warn!(
                    operation = %outcome.classification.operation,
                    error = %e,
                    "Executor failed"
                );
                ToolOutput::error(e)
            }
        }
    }
}
