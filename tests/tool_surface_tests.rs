//! Tool Surface Tests
//!
//! End-to-end flows through `GateServer::call_tool`: submissions, permission
//! updates, confirmation tools, metrics, configuration loading and
//! concurrent dispatch.
//!
//! Run: cargo nextest run --test tool_surface_tests --all-features

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use cql_gate::{
    CategorySelection, Classification, ExecutionReport, Executor, GateServer, OperationCategory,
    OperationPlan, PermissionConfig, PresetMode, ToolName, ToolOutput,
};
use serde_json::{Value, json};

fn server(config: PermissionConfig) -> GateServer {
    GateServer::builder().permissions(config).build().unwrap()
}

/// Counts executions and reports one affected row per call.
#[derive(Default)]
struct RecordingExecutor {
    calls: AtomicUsize,
}

impl RecordingExecutor {
    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Executor for RecordingExecutor {
    async fn execute(
        &self,
        _plan: &OperationPlan,
        _classification: &Classification,
    ) -> cql_gate::Result<ExecutionReport> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(ExecutionReport::new().with_rows(1))
    }
}

fn recording_server(config: PermissionConfig, executor: Arc<RecordingExecutor>) -> GateServer {
    GateServer::builder()
        .permissions(config)
        .executor(executor)
        .allow_request_approval(true)
        .build()
        .unwrap()
}

fn body(output: &ToolOutput) -> Value {
    assert!(!output.is_error(), "unexpected error: {}", output.text());
    serde_json::from_str(&output.text()).unwrap()
}

/// The JSON block that follows the human-readable part of a refusal.
fn structured_error(output: &ToolOutput) -> Value {
    let text = output.text();
    let (_, json) = text
        .split_once("Structured error (for programmatic access):\n")
        .expect("structured block");
    serde_json::from_str(json).unwrap()
}

// =============================================================================
// Submissions
// =============================================================================

mod submit_tests {
    use super::*;

    #[tokio::test]
    async fn test_readonly_insert_then_upgrade() {
        let server = server(PermissionConfig::default());
        let plan = json!({
            "operation": "INSERT",
            "keyspace": "app",
            "table": "users",
            "values": {"id": 1, "name": "Ada"}
        });

        let denied = server.call_tool("submit_query_plan", plan.clone()).await;
        assert!(denied.is_error());
        assert!(denied.text().contains("readwrite"));

        let error = structured_error(&denied);
        assert_eq!(error["error_type"], "permission_denied");
        assert_eq!(error["current_mode"], "readonly");
        assert_eq!(error["operation"], "INSERT");
        assert_eq!(error["operation_category"], "dml");
        assert_eq!(
            error["configuration_hints"]["suggested_modes"],
            json!(["readwrite", "dba"])
        );
        assert_eq!(error["configuration_hints"]["can_update_runtime"], true);

        let updated = server
            .call_tool(
                "update_mcp_permissions",
                json!({"mode": "readwrite", "user_confirmed": true}),
            )
            .await;
        assert!(!updated.is_error(), "{}", updated.text());

        let executed = body(&server.call_tool("submit_query_plan", plan).await);
        assert_eq!(executed["status"], "executed");
        assert_eq!(executed["category"], "dml");
    }

    #[tokio::test]
    async fn test_confirmation_flow() {
        let server = server(PermissionConfig::preset_with(
            PresetMode::Dba,
            CategorySelection::explicit([OperationCategory::Ddl]),
        ));

        let parked = server
            .call_tool(
                "submit_query_plan",
                json!({"operation": "DROP TABLE", "keyspace": "app", "table": "events"}),
            )
            .await;
        assert_eq!(
            parked.as_error().unwrap().error_type(),
            "confirmation_required"
        );
        assert!(parked.text().contains("req_001"));
        assert_eq!(structured_error(&parked)["current_mode"], "dba (confirm: ddl)");

        let state = body(
            &server
                .call_tool("get_confirmation_state", json!({"request_id": "req_001"}))
                .await,
        );
        assert_eq!(state["status"], "PENDING");
        assert_eq!(state["severity"], "CRITICAL");
        assert_eq!(state["query"], "DROP TABLE app.events");

        let pending = body(&server.call_tool("get_pending_confirmations", json!({})).await);
        assert_eq!(pending["count"], 1);
    }

    #[tokio::test]
    async fn test_query_text_must_match_operation() {
        let executor = Arc::new(RecordingExecutor::default());
        let server = recording_server(PermissionConfig::default(), Arc::clone(&executor));

        let output = server
            .call_tool(
                "submit_query_plan",
                json!({"operation": "SELECT", "query": "DROP KEYSPACE prod"}),
            )
            .await;
        assert!(output.is_error());
        assert_eq!(output.as_error().unwrap().error_type(), "query_mismatch");
        assert!(output.text().contains("DROP KEYSPACE"));

        let smuggled = server
            .call_tool(
                "submit_query_plan",
                json!({"operation": "SELECT", "query": "SELECT * FROM t; DROP KEYSPACE prod"}),
            )
            .await;
        assert_eq!(smuggled.as_error().unwrap().error_type(), "invalid_input");

        let honest = server
            .call_tool(
                "submit_query_plan",
                json!({"operation": "DROP KEYSPACE", "query": "DROP KEYSPACE prod"}),
            )
            .await;
        assert_eq!(structured_error(&honest)["error_type"], "permission_denied");

        assert_eq!(executor.calls(), 0);
        assert!(server.confirmations().is_empty());

        let select = body(
            &server
                .call_tool(
                    "submit_query_plan",
                    json!({"operation": "SELECT", "query": "SELECT * FROM app.users"}),
                )
                .await,
        );
        assert_eq!(select["query"], "SELECT * FROM app.users");
        assert_eq!(executor.calls(), 1);
    }

    #[tokio::test]
    async fn test_copy_direction_conflict_fails_closed() {
        let server = server(PermissionConfig::default());
        let output = server
            .call_tool(
                "submit_query_plan",
                json!({"operation": "COPY ks.t TO 'f.csv'", "direction": "import"}),
            )
            .await;

        let error = structured_error(&output);
        assert_eq!(error["error_type"], "permission_denied");
        assert_eq!(error["operation"], "COPY FROM");

        let export = server
            .call_tool(
                "submit_query_plan",
                json!({"operation": "COPY ks.t TO 'f.csv'", "direction": "export"}),
            )
            .await;
        assert_eq!(body(&export)["operation"], "COPY TO");
    }

    #[tokio::test]
    async fn test_session_passes_everything() {
        let server = server(PermissionConfig::fine_grained(CategorySelection::None));
        let output = server
            .call_tool("submit_query_plan", json!({"operation": "consistency"}))
            .await;
        assert_eq!(body(&output)["category"], "session");
        assert!(server.confirmations().is_empty());
    }

    #[tokio::test]
    async fn test_lockdown_refusal_names_restart() {
        let server = server(PermissionConfig::default().with_lockdown(true));
        let output = server
            .call_tool("submit_query_plan", json!({"operation": "CREATE TABLE"}))
            .await;

        let error = structured_error(&output);
        assert_eq!(error["configuration_hints"]["can_update_runtime"], false);
        assert!(
            error["configuration_hints"]["message"]
                .as_str()
                .unwrap()
                .contains("restart")
        );
        assert!(error["configuration_hints"].get("update_command_example").is_none());
    }
}

// =============================================================================
// Permission Updates
// =============================================================================

mod permission_tests {
    use super::*;

    #[tokio::test]
    async fn test_update_without_user_confirmation() {
        let server = server(PermissionConfig::default());
        let output = server
            .call_tool("update_mcp_permissions", json!({"mode": "dba"}))
            .await;
        assert!(output.text().contains("user_confirmed=true"));
        assert_eq!(server.policy().snapshot().version, 0);
    }

    #[tokio::test]
    async fn test_lockdown_ignores_every_payload() {
        let server = server(PermissionConfig::preset(PresetMode::Readwrite).with_lockdown(true));
        let payloads = [
            json!({"mode": "dba", "user_confirmed": true}),
            json!({"skip_confirmation": "all", "user_confirmed": true}),
            json!({"confirm_queries": "none", "user_confirmed": false}),
            json!({"mode": "nonsense", "user_confirmed": true}),
        ];

        for payload in payloads {
            let output = server.call_tool("update_mcp_permissions", payload).await;
            assert_eq!(output.as_error().unwrap().error_type(), "locked_down");
            assert!(output.text().contains("restart"));
        }

        let status = body(&server.call_tool("get_mcp_status", json!({})).await);
        assert_eq!(status["config"]["preset_mode"], "readwrite");
        assert_eq!(status["config"]["disable_runtime_permission_changes"], true);
        assert_eq!(status["config"]["version"], 0);
    }

    #[tokio::test]
    async fn test_switch_to_fine_grained_and_back() {
        let server = server(PermissionConfig::default());

        server
            .call_tool(
                "update_mcp_permissions",
                json!({"skip_confirmation": "dql,dml", "user_confirmed": true}),
            )
            .await;
        let status = body(&server.call_tool("get_mcp_status", json!({})).await);
        assert_eq!(status["config"]["mode"], "fine-grained");
        assert_eq!(
            status["config"]["skip_confirmation"],
            json!(["dql", "dml", "session"])
        );

        let conflict = server
            .call_tool(
                "update_mcp_permissions",
                json!({"confirm_queries": "ddl", "user_confirmed": true}),
            )
            .await;
        assert_eq!(conflict.as_error().unwrap().error_type(), "invalid_change");

        server
            .call_tool(
                "update_mcp_permissions",
                json!({"mode": "dba", "user_confirmed": true}),
            )
            .await;
        let status = body(&server.call_tool("get_mcp_status", json!({})).await);
        assert_eq!(status["config"]["mode"], "preset");
        assert_eq!(status["config"]["confirm_queries"], json!([]));
        assert_eq!(status["config"]["version"], 2);
    }
}

// =============================================================================
// Confirmation Tools
// =============================================================================

mod confirmation_tests {
    use super::*;

    async fn park(server: &GateServer, operation: &str) -> String {
        let output = server
            .call_tool("submit_query_plan", json!({"operation": operation}))
            .await;
        assert!(output.is_error());
        let pending = body(&server.call_tool("get_pending_confirmations", Value::Null).await);
        pending["requests"]
            .as_array()
            .unwrap()
            .last()
            .unwrap()["request_id"]
            .as_str()
            .unwrap()
            .to_string()
    }

    #[tokio::test]
    async fn test_cancel_moves_to_cancelled_listing() {
        let server = server(PermissionConfig::fine_grained(CategorySelection::None));
        let id = park(&server, "ALTER TABLE").await;

        let cancelled = body(
            &server
                .call_tool("cancel_confirmation", json!({"request_id": id}))
                .await,
        );
        assert_eq!(cancelled["request"]["status"], "CANCELLED");
        assert_eq!(cancelled["request"]["reason"], "Cancelled by agent");

        let listing = body(&server.call_tool("get_cancelled_confirmations", json!({})).await);
        assert_eq!(listing["count"], 1);
        assert_eq!(listing["requests"][0]["request_id"], id.as_str());

        let pending = body(&server.call_tool("get_pending_confirmations", json!({})).await);
        assert_eq!(pending["count"], 0);
    }

    #[tokio::test]
    async fn test_approved_request_runs_once() {
        let executor = Arc::new(RecordingExecutor::default());
        let server = recording_server(
            PermissionConfig::fine_grained(CategorySelection::None),
            Arc::clone(&executor),
        );
        let id = park(&server, "TRUNCATE").await;
        let request_id = cql_gate::RequestId::from(id.as_str());
        assert_eq!(executor.calls(), 0);

        let early = server.execute_confirmed(&request_id).await.unwrap_err();
        assert_eq!(early.kind(), "not_approved");

        body(
            &server
                .call_tool(
                    "resolve_confirmation",
                    json!({"request_id": id, "decision": "approve", "resolved_by": "alice"}),
                )
                .await,
        );

        let executed = server.execute_confirmed(&request_id).await.unwrap();
        assert_eq!(executed.report.rows_affected, Some(1));
        assert_eq!(executor.calls(), 1);

        let again = server.execute_confirmed(&request_id).await.unwrap_err();
        assert_eq!(again.kind(), "already_executed");
        assert_eq!(executor.calls(), 1);

        let state = body(
            &server
                .call_tool("get_confirmation_state", json!({"request_id": id}))
                .await,
        );
        assert_eq!(state["status"], "APPROVED");
        assert_eq!(state["resolved_by"], "alice");
        assert_eq!(state["executed"], true);
        assert_eq!(state["rows_affected"], 1);
        assert!(state["executed_at"].is_string());
    }

    #[tokio::test]
    async fn test_denied_request_never_runs() {
        let executor = Arc::new(RecordingExecutor::default());
        let server = recording_server(
            PermissionConfig::fine_grained(CategorySelection::None),
            Arc::clone(&executor),
        );
        let id = park(&server, "DROP TABLE").await;

        server
            .call_tool(
                "resolve_confirmation",
                json!({"request_id": id, "decision": "deny"}),
            )
            .await;
        let err = server
            .execute_confirmed(&cql_gate::RequestId::from(id.as_str()))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "not_approved");
        assert_eq!(executor.calls(), 0);

        assert_eq!(server.prune_confirmations().len(), 1);
        let denied = body(&server.call_tool("get_denied_confirmations", json!({})).await);
        assert_eq!(denied["count"], 0);
    }

    #[tokio::test]
    async fn test_unknown_request() {
        let server = server(PermissionConfig::default());
        let output = server
            .call_tool("cancel_confirmation", json!({"request_id": "req_404"}))
            .await;
        assert_eq!(output.as_error().unwrap().error_type(), "request_not_found");
    }

    #[tokio::test]
    async fn test_resolve_gated_by_settings() {
        let locked = server(PermissionConfig::fine_grained(CategorySelection::None));
        let id = park(&locked, "GRANT").await;
        let output = locked
            .call_tool(
                "resolve_confirmation",
                json!({"request_id": id, "decision": "approve"}),
            )
            .await;
        assert_eq!(output.as_error().unwrap().error_type(), "approval_disabled");

        let open = GateServer::builder()
            .permissions(PermissionConfig::fine_grained(CategorySelection::None))
            .allow_request_approval(true)
            .build()
            .unwrap();
        let id = park(&open, "GRANT").await;

        let approved = body(
            &open
                .call_tool(
                    "resolve_confirmation",
                    json!({"request_id": id, "decision": "approve"}),
                )
                .await,
        );
        assert_eq!(approved["request"]["status"], "APPROVED");

        let again = open
            .call_tool(
                "resolve_confirmation",
                json!({"request_id": id, "decision": "deny"}),
            )
            .await;
        assert_eq!(again.as_error().unwrap().error_type(), "already_resolved");

        let approved = body(&open.call_tool("get_approved_confirmations", json!({})).await);
        assert_eq!(approved["count"], 1);
        let denied = body(&open.call_tool("get_denied_confirmations", json!({})).await);
        assert_eq!(denied["count"], 0);
    }
}

// =============================================================================
// Metrics & Definitions
// =============================================================================

mod metrics_tests {
    use super::*;

    #[tokio::test]
    async fn test_one_count_per_dispatch() {
        let server = server(PermissionConfig::preset_with(
            PresetMode::Readwrite,
            CategorySelection::explicit([OperationCategory::Dml]),
        ));

        server
            .call_tool("submit_query_plan", json!({"operation": "SELECT"}))
            .await;
        server
            .call_tool("submit_query_plan", json!({"operation": "UPDATE"}))
            .await;
        server
            .call_tool("submit_query_plan", json!({"operation": "DROP KEYSPACE"}))
            .await;
        server
            .call_tool("submit_query_plan", json!({"operation": "NOPE"}))
            .await;

        let status = body(&server.call_tool("get_mcp_status", json!({})).await);
        let metrics = &status["metrics"];
        assert_eq!(metrics["total_requests"], 4);
        assert_eq!(metrics["successful_requests"], 1);
        assert_eq!(metrics["failed_requests"], 3);
        assert_eq!(metrics["success_rate"], 25.0);
        assert_eq!(metrics["tool_calls"]["submit_query_plan"], 4);

        assert_eq!(server.metrics().summary().total_requests, 5);
        assert_eq!(server.metrics().tool_calls("get_mcp_status"), 1);
    }

    #[test]
    fn test_definitions_cover_closed_set() {
        let server = server(PermissionConfig::default());
        let definitions = server.definitions();
        let names: Vec<&str> = definitions.iter().map(|d| d.name.as_str()).collect();
        let expected: Vec<&str> = ToolName::ALL.iter().map(|n| n.as_str()).collect();
        assert_eq!(names, expected);

        let submit = &definitions[0];
        assert!(submit.input_schema["properties"]["operation"].is_object());
        let update = definitions
            .iter()
            .find(|d| d.name == "update_mcp_permissions")
            .unwrap();
        assert!(update.input_schema["properties"]["user_confirmed"].is_object());
    }
}

// =============================================================================
// Configuration
// =============================================================================

mod config_tests {
    use super::*;
    use cql_gate::config::{ConfigBuilder, MemoryConfigProvider};
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_server_from_file_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cql-gate.json");
        std::fs::write(
            &path,
            r#"{
                "mode": "readwrite",
                "confirm_queries": ["dml"],
                "disable_runtime_permission_changes": true
            }"#,
        )
        .unwrap();

        let provider = ConfigBuilder::new().file(&path).build().await.unwrap();
        let server = GateServer::from_config(&provider).await.unwrap();

        let config = server.policy().snapshot();
        assert_eq!(config.preset_mode(), Some(PresetMode::Readwrite));
        assert_eq!(config.confirm_queries().to_strings(), vec!["dml"]);
        assert!(config.lockdown);
    }

    #[tokio::test]
    async fn test_memory_overrides_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("cql-gate.json");
        std::fs::write(&path, r#"{"mode": "dba"}"#).unwrap();

        let memory = MemoryConfigProvider::new().value("skip_confirmation", "dql, session");
        let provider = ConfigBuilder::new()
            .memory(memory)
            .file(&path)
            .build()
            .await
            .unwrap();
        let server = GateServer::from_config(&provider).await.unwrap();

        let config = server.policy().snapshot();
        assert!(config.is_fine_grained());
        assert_eq!(config.skip_confirmation(), vec!["dql", "session"]);
    }

    #[tokio::test]
    async fn test_invalid_mode_fails_startup() {
        let memory = MemoryConfigProvider::new().value("mode", "superuser");
        let provider = ConfigBuilder::new().memory(memory).build().await.unwrap();

        let err = GateServer::from_config(&provider).await.unwrap_err();
        assert_eq!(err.kind(), "configuration");
    }
}

// =============================================================================
// Concurrency
// =============================================================================

mod concurrency_tests {
    use super::*;
    use futures::future::join_all;
    use std::collections::HashSet;

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_submissions_get_distinct_ids() {
        let server = Arc::new(server(PermissionConfig::preset_with(
            PresetMode::Readwrite,
            CategorySelection::explicit([OperationCategory::Dml]),
        )));
        const N: usize = 64;

        let handles: Vec<_> = (0..N)
            .map(|i| {
                let server = Arc::clone(&server);
                tokio::spawn(async move {
                    server
                        .call_tool(
                            "submit_query_plan",
                            json!({"operation": "INSERT", "table": format!("t{}", i)}),
                        )
                        .await
                })
            })
            .collect();

        for result in join_all(handles).await {
            let output = result.unwrap();
            assert_eq!(
                output.as_error().unwrap().error_type(),
                "confirmation_required"
            );
        }

        let pending = body(&server.call_tool("get_pending_confirmations", json!({})).await);
        assert_eq!(pending["count"], N);
        let ids: HashSet<&str> = pending["requests"]
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["request_id"].as_str().unwrap())
            .collect();
        assert_eq!(ids.len(), N);
        assert_eq!(server.metrics().tool_calls("submit_query_plan"), N as u64);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_resolution_has_one_winner() {
        let server = Arc::new(
            GateServer::builder()
                .permissions(PermissionConfig::fine_grained(CategorySelection::None))
                .allow_request_approval(true)
                .build()
                .unwrap(),
        );
        server
            .call_tool("submit_query_plan", json!({"operation": "DROP ROLE"}))
            .await;

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let server = Arc::clone(&server);
                let decision = if i % 2 == 0 { "approve" } else { "deny" };
                tokio::spawn(async move {
                    server
                        .call_tool(
                            "resolve_confirmation",
                            json!({"request_id": "req_001", "decision": decision}),
                        )
                        .await
                })
            })
            .collect();

        let outputs: Vec<ToolOutput> = join_all(handles)
            .await
            .into_iter()
            .map(|r| r.unwrap())
            .collect();
        let winners = outputs.iter().filter(|o| !o.is_error()).count();
        assert_eq!(winners, 1);
        assert!(
            outputs
                .iter()
                .filter_map(|o| o.as_error())
                .all(|e| e.error_type() == "already_resolved")
        );
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_execution_runs_once() {
        let executor = Arc::new(RecordingExecutor::default());
        let server = Arc::new(recording_server(
            PermissionConfig::fine_grained(CategorySelection::None),
            Arc::clone(&executor),
        ));
        server
            .call_tool("submit_query_plan", json!({"operation": "DELETE", "table": "t"}))
            .await;
        server
            .call_tool(
                "resolve_confirmation",
                json!({"request_id": "req_001", "decision": "approve"}),
            )
            .await;

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let server = Arc::clone(&server);
                tokio::spawn(async move {
                    server
                        .execute_confirmed(&cql_gate::RequestId::from("req_001"))
                        .await
                        .is_ok()
                })
            })
            .collect();

        let winners = join_all(handles)
            .await
            .into_iter()
            .filter(|r| *r.as_ref().unwrap())
            .count();
        assert_eq!(winners, 1);
        assert_eq!(executor.calls(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_updates_during_submissions() {
        let server = Arc::new(server(PermissionConfig::default()));

        let submissions: Vec<_> = (0..32)
            .map(|_| {
                let server = Arc::clone(&server);
                tokio::spawn(async move {
                    server
                        .call_tool("submit_query_plan", json!({"operation": "DELETE", "table": "t"}))
                        .await
                })
            })
            .collect();
        let update = {
            let server = Arc::clone(&server);
            tokio::spawn(async move {
                server
                    .call_tool(
                        "update_mcp_permissions",
                        json!({"mode": "readwrite", "user_confirmed": true}),
                    )
                    .await
            })
        };

        assert!(!update.await.unwrap().is_error());
        for result in join_all(submissions).await {
            let output = result.unwrap();
            if let Some(error) = output.as_error() {
                assert_eq!(error.error_type(), "permission_denied");
            } else {
                assert_eq!(body(&output)["status"], "executed");
            }
        }

        assert_eq!(server.policy().snapshot().version, 1);
        assert_eq!(server.metrics().summary().total_requests, 33);
    }
}
