//! Shared state handed to every tool invocation.

use std::sync::Arc;

use crate::confirmation::ConfirmationStore;
use crate::observability::MetricsRegistry;
use crate::orchestrator::{Executor, RequestOrchestrator};
use crate::permissions::PolicyManager;

/// Handles to the gate components.
///
/// Cloning is cheap. The context owns no locks of its own; every mutation
/// goes through the component that owns the state.
#[derive(Clone)]
pub struct GateContext {
    orchestrator: RequestOrchestrator,
    executor: Arc<dyn Executor>,
    metrics: Arc<MetricsRegistry>,
    allow_request_approval: bool,
}

impl GateContext {
    pub fn new(
        orchestrator: RequestOrchestrator,
        executor: Arc<dyn Executor>,
        metrics: Arc<MetricsRegistry>,
    ) -> Self {
        Self {
            orchestrator,
            executor,
            metrics,
            allow_request_approval: false,
        }
    }

    /// Lets agents approve or deny confirmation requests through
    /// `resolve_confirmation`.
    pub fn with_request_approval(mut self, allow: bool) -> Self {
        self.allow_request_approval = allow;
        self
    }

    pub fn orchestrator(&self) -> &RequestOrchestrator {
        &self.orchestrator
    }

    pub fn policy(&self) -> &Arc<PolicyManager> {
        self.orchestrator.policy()
    }

    pub fn confirmations(&self) -> &Arc<ConfirmationStore> {
        self.orchestrator.confirmations()
    }

    pub fn executor(&self) -> &Arc<dyn Executor> {
        &self.executor
    }

    pub fn metrics(&self) -> &Arc<MetricsRegistry> {
        &self.metrics
    }

    pub fn allow_request_approval(&self) -> bool {
        self.allow_request_approval
    }
}

impl std::fmt::Debug for GateContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GateContext")
            .field("orchestrator", &self.orchestrator)
            .field("allow_request_approval", &self.allow_request_approval)
            .finish_non_exhaustive()
    }
}
