//! Structured refusals for denied and confirmation-gated submissions.

use serde::Serialize;

use super::ToolError;
use crate::classifier::OperationCategory;
use crate::orchestrator::Outcome;
use crate::permissions::{
    self, CategorySelection, Decision, PermissionConfig, PermissionShape, PresetMode,
};

const LOCKDOWN_REMEDIATION: &str = "Runtime permission changes are disabled (lockdown). \
     Stop the server and restart it with the required configuration.";

/// How the caller could change the configuration to get past a refusal.
#[derive(Debug, Clone, Serialize)]
pub struct ConfigurationHints {
    pub message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub suggested_modes: Vec<PresetMode>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub suggested_skip_list: Vec<String>,
    pub can_update_runtime: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update_command_example: Option<String>,
}

/// Machine-readable refusal, rendered for agents as text plus JSON.
#[derive(Debug, Clone, Serialize)]
pub struct Refusal {
    pub error: String,
    pub error_type: &'static str,
    pub current_mode: String,
    pub operation: String,
    pub operation_category: OperationCategory,
    pub configuration_hints: ConfigurationHints,
}

impl Refusal {
    /// Builds the refusal for a non-allowed outcome. Returns `None` when the
    /// outcome was allowed.
    pub fn from_outcome(outcome: &Outcome) -> Option<Self> {
        let config = outcome.config.as_ref();
        let category = outcome.classification.category;

        let (error_type, mut hints) = match &outcome.decision {
            Decision::Allowed => return None,
            Decision::Denied(denial) => (
                "permission_denied",
                denied_hints(config, category, denial.mode, |mode| {
                    mode.allows(category, denial.direction)
                }),
            ),
            Decision::NeedsConfirmation => ("confirmation_required", confirmation_hints(config, category)),
        };

        if config.lockdown {
            hints.can_update_runtime = false;
            hints.update_command_example = None;
            hints.message = format!("{}\n\n{}", hints.message, LOCKDOWN_REMEDIATION);
        }

        Some(Self {
            error: outcome.message(),
            error_type,
            current_mode: current_mode(config),
            operation: outcome.classification.operation.clone(),
            operation_category: category,
            configuration_hints: hints,
        })
    }

    /// Human-readable text followed by the JSON form.
    pub fn render(&self) -> String {
        let mut text = String::new();
        text.push_str(&self.error);
        text.push_str("\n\n");
        text.push_str(&self.configuration_hints.message);
        text.push_str("\n\n");
        if let Some(example) = &self.configuration_hints.update_command_example {
            text.push_str("Suggestion: ");
            text.push_str(example);
            text.push_str("\n\n");
        }

        match serde_json::to_string_pretty(self) {
            Ok(json) => {
                text.push_str("---\nStructured error (for programmatic access):\n");
                text.push_str(&json);
            }
            Err(e) => tracing::warn!(error = %e, "Failed to serialize refusal"),
        }
        text
    }

    pub fn into_tool_error(self) -> ToolError {
        ToolError::Refused {
            error_type: self.error_type,
            rendered: self.render(),
        }
    }
}

/// `dba`, `dba (confirm: ddl,dcl)`, `fine-grained (skip: dql,session)`.
fn current_mode(config: &PermissionConfig) -> String {
    match &config.shape {
        PermissionShape::Preset { mode, confirm } if confirm.is_none() => mode.to_string(),
        PermissionShape::Preset { mode, confirm } => {
            format!("{} (confirm: {})", mode, confirm.to_strings().join(","))
        }
        PermissionShape::FineGrained { .. } => {
            let skip = config.skip_confirmation();
            if skip.is_empty() {
                "fine-grained".to_string()
            } else {
                format!("fine-grained (skip: {})", skip.join(","))
            }
        }
    }
}

fn update_example(argument: &str) -> Option<String> {
    Some(format!(
        "Use update_mcp_permissions tool with {} and user_confirmed=true (ask the user first)",
        argument
    ))
}

fn denied_hints(
    config: &PermissionConfig,
    category: OperationCategory,
    mode: PresetMode,
    admits: impl Fn(PresetMode) -> bool,
) -> ConfigurationHints {
    let suggested_modes: Vec<PresetMode> = PresetMode::ALL
        .into_iter()
        .filter(|candidate| *candidate > mode && admits(*candidate))
        .collect();

    let names: Vec<String> = suggested_modes.iter().map(ToString::to_string).collect();
    let message = match names.as_slice() {
        [] => format!("No preset mode allows {} operations", category),
        [only] => format!("This operation requires {} mode", only),
        many => format!("This operation requires {} mode", many.join(" or ")),
    };

    ConfigurationHints {
        message,
        update_command_example: names
            .first()
            .and_then(|first| update_example(&format!("mode='{}'", first))),
        suggested_modes,
        suggested_skip_list: Vec::new(),
        can_update_runtime: !config.lockdown,
    }
}

fn confirmation_hints(config: &PermissionConfig, category: OperationCategory) -> ConfigurationHints {
    let base = format!(
        "A human must approve this {} operation before it runs. \
         Poll get_confirmation_state until it leaves PENDING.",
        category
    );

    match &config.shape {
        PermissionShape::Preset { mode, confirm } => {
            let remaining = confirm.clone().without(category);
            let remaining = match remaining {
                CategorySelection::All | CategorySelection::None => "none".to_string(),
                explicit => explicit.to_strings().join(","),
            };
            let skip_list: Vec<String> = permissions::suggested_skip_list(*mode)
                .into_iter()
                .map(|c| c.as_str().to_string())
                .collect();

            ConfigurationHints {
                message: format!(
                    "{}\n\nTo stop confirming {} operations, narrow confirm_queries, or switch \
                     to fine-grained mode with skip_confirmation='{}'.",
                    base,
                    category,
                    skip_list.join(",")
                ),
                update_command_example: update_example(&format!("confirm_queries='{}'", remaining)),
                suggested_modes: Vec::new(),
                suggested_skip_list: skip_list,
                can_update_runtime: !config.lockdown,
            }
        }
        PermissionShape::FineGrained { skip } => {
            let skip_list = skip.clone().with(category).to_strings();
            let joined = skip_list.join(",");
            ConfigurationHints {
                message: format!("{}\n\nTo skip confirmations for {}:", base, category),
                update_command_example: update_example(&format!("skip_confirmation='{}'", joined)),
                suggested_modes: Vec::new(),
                suggested_skip_list: skip_list,
                can_update_runtime: !config.lockdown,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::classifier::OperationClassifier;
    use crate::confirmation::ConfirmationStore;
    use crate::orchestrator::{OperationPlan, RequestOrchestrator};
    use crate::permissions::PolicyManager;

    fn submit(config: PermissionConfig, operation: &str) -> Outcome {
        RequestOrchestrator::new(
            OperationClassifier::new(),
            Arc::new(PolicyManager::new(config)),
            Arc::new(ConfirmationStore::new()),
        )
        .submit(&OperationPlan::new(operation).table("users"))
        .unwrap()
    }

    #[test]
    fn test_allowed_has_no_refusal() {
        let outcome = submit(PermissionConfig::default(), "SELECT");
        assert!(Refusal::from_outcome(&outcome).is_none());
    }

    #[test]
    fn test_denied_suggests_escalation() {
        let outcome = submit(PermissionConfig::default(), "INSERT");
        let refusal = Refusal::from_outcome(&outcome).unwrap();

        assert_eq!(refusal.error_type, "permission_denied");
        assert_eq!(refusal.current_mode, "readonly");
        assert_eq!(
            refusal.configuration_hints.suggested_modes,
            vec![PresetMode::Readwrite, PresetMode::Dba]
        );
        assert_eq!(
            refusal.configuration_hints.message,
            "This operation requires readwrite or dba mode"
        );
        assert!(refusal.configuration_hints.can_update_runtime);

        let text = refusal.render();
        assert!(text.contains("Suggestion: Use update_mcp_permissions tool with mode='readwrite'"));
        assert!(text.contains("Structured error (for programmatic access)"));
        assert!(text.contains("\"error_type\": \"permission_denied\""));
    }

    #[test]
    fn test_ddl_needs_dba() {
        let outcome = submit(PermissionConfig::preset(PresetMode::Readwrite), "DROP TABLE");
        let refusal = Refusal::from_outcome(&outcome).unwrap();
        assert_eq!(refusal.configuration_hints.suggested_modes, vec![PresetMode::Dba]);
        assert_eq!(
            refusal.configuration_hints.message,
            "This operation requires dba mode"
        );
    }

    #[test]
    fn test_lockdown_names_restart() {
        let outcome = submit(PermissionConfig::default().with_lockdown(true), "INSERT");
        let refusal = Refusal::from_outcome(&outcome).unwrap();
        let hints = &refusal.configuration_hints;
        assert!(!hints.can_update_runtime);
        assert!(hints.update_command_example.is_none());
        assert!(hints.message.contains("restart"));
        assert!(!refusal.render().contains("Suggestion:"));
    }

    #[test]
    fn test_preset_confirmation_hints() {
        let config = PermissionConfig::preset_with(
            PresetMode::Dba,
            CategorySelection::explicit([OperationCategory::Ddl, OperationCategory::Dcl]),
        );
        let outcome = submit(config, "TRUNCATE");
        let refusal = Refusal::from_outcome(&outcome).unwrap();

        assert_eq!(refusal.error_type, "confirmation_required");
        assert_eq!(refusal.current_mode, "dba (confirm: ddl,dcl)");
        assert!(refusal.error.contains("req_001"));
        assert_eq!(
            refusal.configuration_hints.update_command_example.as_deref(),
            Some(
                "Use update_mcp_permissions tool with confirm_queries='dcl' and user_confirmed=true (ask the user first)"
            )
        );
        assert!(
            refusal
                .configuration_hints
                .suggested_skip_list
                .contains(&"ddl".to_string())
        );
    }

    #[test]
    fn test_fine_grained_confirmation_hints() {
        let config =
            PermissionConfig::fine_grained(CategorySelection::explicit([OperationCategory::Dql]));
        let outcome = submit(config, "GRANT");
        let refusal = Refusal::from_outcome(&outcome).unwrap();

        assert_eq!(refusal.current_mode, "fine-grained (skip: dql,session)");
        assert_eq!(
            refusal.configuration_hints.suggested_skip_list,
            vec!["dql", "dcl", "session"]
        );
        assert!(
            refusal
                .configuration_hints
                .update_command_example
                .as_deref()
                .unwrap()
                .contains("skip_confirmation='dql,dcl,session'")
        );
    }
}
