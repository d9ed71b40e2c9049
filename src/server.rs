//! Gate server: assembles the components and dispatches tool calls.

use std::sync::Arc;

use tracing::Instrument;

use crate::Result;
use crate::classifier::{OperationClassifier, Vocabulary};
use crate::config::{ConfigProvider, GateSettings};
use crate::confirmation::{ConfirmationStore, RequestId};
use crate::observability::{DispatchSpan, MetricsRegistry};
use crate::orchestrator::{ConfirmedExecution, Executor, NoopExecutor, RequestOrchestrator};
use crate::permissions::{PermissionConfig, PolicyManager};
use crate::tools::{GateContext, ToolDefinition, ToolName, ToolOutput, ToolRegistry};

/// Metrics bucket for calls naming a tool outside the closed set.
const UNKNOWN_TOOL_BUCKET: &str = "unknown";

/// Serves the gate's tool surface.
///
/// `call_tool` takes `&self` and may be invoked concurrently; all shared
/// state lives in the components reachable from [`GateContext`].
pub struct GateServer {
    registry: ToolRegistry,
    context: GateContext,
}

impl GateServer {
    pub fn builder() -> GateServerBuilder {
        GateServerBuilder::default()
    }

    /// Builds a server from settings read through `provider`.
    pub async fn from_config(provider: &dyn ConfigProvider) -> Result<Self> {
        let settings = GateSettings::load(provider).await?;
        Self::builder().settings(settings).build()
    }

    /// Dispatches one tool call and records it in the metrics exactly once.
    pub async fn call_tool(&self, name: &str, input: serde_json::Value) -> ToolOutput {
        let span = DispatchSpan::new(name);

        let (bucket, output) = match name.parse::<ToolName>() {
            Ok(tool) => {
                let output = self
                    .registry
                    .execute(tool, input, &self.context)
                    .instrument(span.span().clone())
                    .await;
                (tool.as_str(), output)
            }
            Err(e) => {
                tracing::warn!(tool_name = %name, "Unknown tool requested");
                (UNKNOWN_TOOL_BUCKET, ToolOutput::error(e))
            }
        };

        let is_error = output.is_error();
        let latency_ms = span.finish(is_error);
        self.context
            .metrics()
            .record_dispatch(bucket, !is_error, latency_ms);
        output
    }

    /// Runs an APPROVED confirmation request through the configured
    /// executor. Each request runs at most once.
    pub async fn execute_confirmed(&self, id: &RequestId) -> Result<ConfirmedExecution> {
        self.context
            .orchestrator()
            .execute_confirmed(id, self.context.executor().as_ref())
            .await
    }

    /// Drops settled confirmation requests; see
    /// [`RequestOrchestrator::prune_resolved`].
    pub fn prune_confirmations(&self) -> Vec<RequestId> {
        self.context.orchestrator().prune_resolved()
    }

    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.registry.definitions()
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    pub fn context(&self) -> &GateContext {
        &self.context
    }

    pub fn policy(&self) -> &Arc<PolicyManager> {
        self.context.policy()
    }

    pub fn confirmations(&self) -> &Arc<ConfirmationStore> {
        self.context.confirmations()
    }

    pub fn metrics(&self) -> &Arc<MetricsRegistry> {
        self.context.metrics()
    }
}

impl std::fmt::Debug for GateServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GateServer")
            .field("registry", &self.registry)
            .field("context", &self.context)
            .finish()
    }
}

/// Builder for [`GateServer`].
///
/// Explicit `permissions` and `allow_request_approval` take precedence over
/// the values derived from `settings`.
#[derive(Default)]
pub struct GateServerBuilder {
    settings: Option<GateSettings>,
    permissions: Option<PermissionConfig>,
    executor: Option<Arc<dyn Executor>>,
    vocabulary: Option<Vocabulary>,
    allow_request_approval: Option<bool>,
}

impl GateServerBuilder {
    pub fn settings(mut self, settings: GateSettings) -> Self {
        self.settings = Some(settings);
        self
    }

    pub fn permissions(mut self, config: PermissionConfig) -> Self {
        self.permissions = Some(config);
        self
    }

    pub fn executor(mut self, executor: Arc<dyn Executor>) -> Self {
        self.executor = Some(executor);
        self
    }

    pub fn vocabulary(mut self, vocabulary: Vocabulary) -> Self {
        self.vocabulary = Some(vocabulary);
        self
    }

    pub fn allow_request_approval(mut self, allow: bool) -> Self {
        self.allow_request_approval = Some(allow);
        self
    }

    pub fn build(self) -> Result<GateServer> {
        let settings = self.settings.unwrap_or_default();
        let permissions = self
            .permissions
            .unwrap_or_else(|| settings.permission_config());
        let allow_request_approval = self
            .allow_request_approval
            .unwrap_or(settings.allow_request_approval);

        let classifier = match self.vocabulary {
            Some(vocabulary) => OperationClassifier::with_vocabulary(vocabulary),
            None => OperationClassifier::new(),
        };

        tracing::info!(
            mode = %permissions.mode_label(),
            lockdown = permissions.lockdown,
            allow_request_approval,
            "Starting gate server"
        );

        let orchestrator = RequestOrchestrator::new(
            classifier,
            Arc::new(PolicyManager::new(permissions)),
            Arc::new(ConfirmationStore::new()),
        );
        let context = GateContext::new(
            orchestrator,
            self.executor.unwrap_or_else(|| Arc::new(NoopExecutor)),
            Arc::new(MetricsRegistry::new()),
        )
        .with_request_approval(allow_request_approval);

        Ok(GateServer {
            registry: ToolRegistry::standard()?,
            context,
        })
    }
}
