//! Execution boundary for allowed operations.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use super::OperationPlan;
use crate::Result;
use crate::classifier::Classification;

/// Runs an operation once the policy has allowed it.
///
/// Implementations own the database session. They are called outside every
/// policy and store lock.
#[async_trait]
pub trait Executor: Send + Sync {
    async fn execute(
        &self,
        plan: &OperationPlan,
        classification: &Classification,
    ) -> Result<ExecutionReport>;
}

/// Opaque execution metadata returned to the caller.
#[derive(Clone, Debug, Default, Serialize)]
pub struct ExecutionReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rows_affected: Option<u64>,
    #[serde(skip_serializing_if = "Value::is_null")]
    pub metadata: Value,
}

impl ExecutionReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rows(mut self, rows: u64) -> Self {
        self.rows_affected = Some(rows);
        self
    }

    pub fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = metadata;
        self
    }
}

/// Acknowledges allowed operations without running them.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopExecutor;

#[async_trait]
impl Executor for NoopExecutor {
    async fn execute(
        &self,
        plan: &OperationPlan,
        classification: &Classification,
    ) -> Result<ExecutionReport> {
        tracing::debug!(
            operation = %classification.operation,
            target = plan.target().as_deref().unwrap_or(""),
            "No executor configured; acknowledging operation"
        );
        Ok(ExecutionReport::new())
    }
}
