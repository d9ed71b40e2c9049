//! Request orchestration: classify, evaluate, and open confirmations.
//!
//! `submit` never executes anything itself. An [`Outcome`] tells the caller
//! whether to hand the plan to an [`Executor`], report a refusal, or report
//! the confirmation request it opened. Plans parked behind a confirmation
//! request are kept so a collaborator can run them once the request is
//! APPROVED.

mod executor;
mod plan;

pub use executor::{ExecutionReport, Executor, NoopExecutor};
pub use plan::{OperationPlan, OrderClause, WhereClause};

use std::sync::Arc;

use dashmap::DashMap;
use serde::Serialize;

use crate::classifier::{Classification, OperationClassifier, Severity, severity};
use crate::confirmation::{
    ConfirmationRequest, ConfirmationStore, ExecutionRecord, NewConfirmation, RequestId,
};
use crate::{Error, Result};
use crate::permissions::{Decision, PermissionConfig, PolicyManager};

/// Result of submitting one plan.
#[derive(Clone, Debug)]
pub struct Outcome {
    pub classification: Classification,
    /// Severity after context escalation.
    pub severity: Severity,
    pub decision: Decision,
    /// Set when the decision is [`Decision::NeedsConfirmation`].
    pub request_id: Option<RequestId>,
    /// Snapshot the decision was made against.
    pub config: Arc<PermissionConfig>,
    pub query: String,
}

impl Outcome {
    /// Whether the dispatch counts as successful.
    pub fn is_success(&self) -> bool {
        self.decision.is_allowed()
    }

    pub fn message(&self) -> String {
        match (&self.decision, &self.request_id) {
            (Decision::Allowed, _) => format!("{} allowed", self.classification.operation),
            (Decision::Denied(denial), _) => denial.to_string(),
            (Decision::NeedsConfirmation, Some(id)) => confirmation_message(
                &self.classification.operation,
                self.severity,
                id,
            ),
            (Decision::NeedsConfirmation, None) => format!(
                "{} requires confirmation",
                self.classification.operation
            ),
        }
    }
}

fn confirmation_message(operation: &str, severity: Severity, id: &RequestId) -> String {
    format!(
        "{operation} requires user confirmation (severity {severity}). \
         Confirmation request {id} is PENDING. \
         Check it with get_confirmation_state(request_id=\"{id}\") \
         or withdraw it with cancel_confirmation(request_id=\"{id}\")."
    )
}

/// A plan waiting on its confirmation request.
#[derive(Clone, Debug)]
struct ParkedPlan {
    plan: OperationPlan,
    classification: Classification,
}

/// An APPROVED request after it ran.
#[derive(Clone, Debug, Serialize)]
pub struct ConfirmedExecution {
    pub request: ConfirmationRequest,
    pub report: ExecutionReport,
}

/// Coordinates classifier, policy snapshot, and confirmation store for one
/// submission.
#[derive(Clone, Debug)]
pub struct RequestOrchestrator {
    classifier: OperationClassifier,
    policy: Arc<PolicyManager>,
    confirmations: Arc<ConfirmationStore>,
    parked: Arc<DashMap<RequestId, ParkedPlan>>,
}

impl RequestOrchestrator {
    pub fn new(
        classifier: OperationClassifier,
        policy: Arc<PolicyManager>,
        confirmations: Arc<ConfirmationStore>,
    ) -> Self {
        Self {
            classifier,
            policy,
            confirmations,
            parked: Arc::new(DashMap::new()),
        }
    }

    /// Classifies the statement that would run.
    ///
    /// With raw query text, the query itself is classified and must match
    /// the declared operation in both canonical name and category.
    fn classify(&self, plan: &OperationPlan) -> Result<Classification> {
        let declared = self.classifier.classify_with(&plan.operation, plan.direction)?;
        let Some(query) = plan.raw_query() else {
            return Ok(declared);
        };

        if plan::statement_count(query) > 1 && !declared.operation.starts_with("BEGIN") {
            return Err(Error::InvalidInput(
                "query must contain a single statement".into(),
            ));
        }

        let actual = self.classifier.classify_with(query, plan.direction)?;
        if actual.operation != declared.operation || actual.category != declared.category {
            return Err(Error::QueryMismatch {
                declared: declared.operation,
                query: actual.operation,
            });
        }
        Ok(actual)
    }

    /// Classifies `plan` and evaluates it against the current snapshot.
    ///
    /// Unknown operations fail with [`crate::Error::UnknownOperation`], and
    /// query text that does not match the declared operation fails with
    /// [`crate::Error::QueryMismatch`]. A confirmation request is opened
    /// only for [`Decision::NeedsConfirmation`].
    pub fn submit(&self, plan: &OperationPlan) -> Result<Outcome> {
        let classification = self.classify(plan).inspect_err(|e| {
            tracing::warn!(operation = %plan.operation, error = %e, "Operation rejected")
        })?;

        let severity = severity::assess(
            &classification.operation,
            classification.severity,
            plan.has_where(),
            plan.query.as_deref(),
        );

        let config = self.policy.snapshot();
        let decision = config.evaluate(classification.category, classification.direction);
        let query = plan.describe(&classification.operation);

        let request_id = match &decision {
            Decision::NeedsConfirmation => {
                let id = self.confirmations.create(NewConfirmation {
                    operation: classification.operation.clone(),
                    category: classification.category,
                    severity,
                    query: query.clone(),
                });
                self.parked.insert(
                    id.clone(),
                    ParkedPlan {
                        plan: plan.clone(),
                        classification: classification.clone(),
                    },
                );
                Some(id)
            }
            _ => None,
        };

        match &decision {
            Decision::Allowed => tracing::debug!(
                operation = %classification.operation,
                mode = %config.mode_label(),
                "Operation allowed"
            ),
            Decision::Denied(denial) => tracing::info!(
                operation = %classification.operation,
                mode = %config.mode_label(),
                reason = %denial,
                "Operation denied"
            ),
            Decision::NeedsConfirmation => tracing::info!(
                operation = %classification.operation,
                severity = %severity,
                request_id = request_id.as_ref().map(|id| id.as_str()).unwrap_or(""),
                "Operation awaiting confirmation"
            ),
        }

        Ok(Outcome {
            classification,
            severity,
            decision,
            request_id,
            config,
            query,
        })
    }

    /// Runs an APPROVED request's plan through `executor`, at most once.
    ///
    /// The result is stored on the request whether the executor succeeds
    /// or fails. The executor is awaited outside every store lock.
    pub async fn execute_confirmed(
        &self,
        id: &RequestId,
        executor: &dyn Executor,
    ) -> Result<ConfirmedExecution> {
        self.confirmations.claim_execution(id)?;

        let Some((_, parked)) = self.parked.remove(id) else {
            let message = format!("no operation plan was recorded for {}", id);
            self.confirmations
                .record_execution(id, ExecutionRecord::failed(message.clone()))?;
            return Err(Error::Execution(message));
        };

        tracing::info!(
            request_id = %id,
            operation = %parked.classification.operation,
            "Executing confirmed request"
        );

        match executor.execute(&parked.plan, &parked.classification).await {
            Ok(report) => {
                let request = self.confirmations.record_execution(
                    id,
                    ExecutionRecord::succeeded(report.rows_affected),
                )?;
                Ok(ConfirmedExecution { request, report })
            }
            Err(e) => {
                self.confirmations
                    .record_execution(id, ExecutionRecord::failed(e.to_string()))?;
                Err(e)
            }
        }
    }

    /// Removes a request and any plan parked behind it.
    pub fn remove(&self, id: &RequestId) -> Result<ConfirmationRequest> {
        self.parked.remove(id);
        self.confirmations.remove(id)
    }

    /// Prunes settled requests from the store along with their parked plans.
    pub fn prune_resolved(&self) -> Vec<RequestId> {
        let pruned = self.confirmations.prune_resolved();
        for id in &pruned {
            self.parked.remove(id);
        }
        pruned
    }

    /// Number of plans still waiting to run.
    pub fn parked_len(&self) -> usize {
        self.parked.len()
    }

    pub fn classifier(&self) -> &OperationClassifier {
        &self.classifier
    }

    pub fn policy(&self) -> &Arc<PolicyManager> {
        &self.policy
    }

    pub fn confirmations(&self) -> &Arc<ConfirmationStore> {
        &self.confirmations
    }
}

/// Serialized view of an [`Outcome`] for tool responses.
#[derive(Clone, Debug, Serialize)]
pub struct OutcomeView<'a> {
    pub operation: &'a str,
    pub category: crate::classifier::OperationCategory,
    pub severity: Severity,
    pub query: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<&'a RequestId>,
}

impl<'a> From<&'a Outcome> for OutcomeView<'a> {
    fn from(outcome: &'a Outcome) -> Self {
        Self {
            operation: &outcome.classification.operation,
            category: outcome.classification.category,
            severity: outcome.severity,
            query: &outcome.query,
            request_id: outcome.request_id.as_ref(),
        }
    }
}
