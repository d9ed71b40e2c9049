//! Startup settings for the gate.

use serde::{Deserialize, Serialize};

use super::provider::{ConfigProvider, ConfigProviderExt};
use super::{ConfigError, ConfigResult};
use crate::observability::LoggingSettings;
use crate::permissions::{CategorySelection, PermissionConfig, PresetMode};

pub const KEY_MODE: &str = "mode";
pub const KEY_CONFIRM_QUERIES: &str = "confirm_queries";
pub const KEY_SKIP_CONFIRMATION: &str = "skip_confirmation";
pub const KEY_LOCKDOWN: &str = "disable_runtime_permission_changes";
pub const KEY_ALLOW_REQUEST_APPROVAL: &str = "allow_request_approval";
pub const KEY_LOG_LEVEL: &str = "log_level";

/// Everything the gate reads at startup.
///
/// A `skip_confirmation` value selects the fine-grained shape and overrides
/// `mode` and `confirm_queries`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateSettings {
    pub mode: PresetMode,
    pub confirm_queries: CategorySelection,
    pub skip_confirmation: Option<CategorySelection>,
    pub disable_runtime_permission_changes: bool,
    pub allow_request_approval: bool,
    pub logging: LoggingSettings,
}

impl GateSettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads every known key from `provider`; absent keys keep defaults.
    pub async fn load(provider: &dyn ConfigProvider) -> ConfigResult<Self> {
        let mut settings = Self::default();
        let mut preset_keys = Vec::new();

        if let Some(mode) = provider.get_parsed::<PresetMode>(KEY_MODE).await? {
            settings.mode = mode;
            preset_keys.push(KEY_MODE);
        }
        if let Some(confirm) = load_selection(provider, KEY_CONFIRM_QUERIES).await? {
            settings.confirm_queries = confirm;
            preset_keys.push(KEY_CONFIRM_QUERIES);
        }
        settings.skip_confirmation = load_selection(provider, KEY_SKIP_CONFIRMATION).await?;
        if let Some(lockdown) = provider.get_bool(KEY_LOCKDOWN).await? {
            settings.disable_runtime_permission_changes = lockdown;
        }
        if let Some(allow) = provider.get_bool(KEY_ALLOW_REQUEST_APPROVAL).await? {
            settings.allow_request_approval = allow;
        }
        if let Some(level) = provider.get_str(KEY_LOG_LEVEL).await? {
            settings.logging.level = level;
        }

        let ignored = settings.ignored_keys(&preset_keys);
        if !ignored.is_empty() {
            tracing::warn!(
                provider = provider.name(),
                ignored = %ignored.join(", "),
                "skip_confirmation is set; ignoring preset keys"
            );
        }

        tracing::debug!(
            provider = provider.name(),
            mode = %settings.mode,
            lockdown = settings.disable_runtime_permission_changes,
            "Gate settings loaded"
        );

        Ok(settings)
    }

    pub fn mode(mut self, mode: PresetMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn confirm_queries(mut self, selection: CategorySelection) -> Self {
        self.confirm_queries = selection;
        self
    }

    pub fn skip_confirmation(mut self, selection: CategorySelection) -> Self {
        self.skip_confirmation = Some(selection);
        self
    }

    pub fn lockdown(mut self, lockdown: bool) -> Self {
        self.disable_runtime_permission_changes = lockdown;
        self
    }

    pub fn allow_request_approval(mut self, allow: bool) -> Self {
        self.allow_request_approval = allow;
        self
    }

    pub fn log_level(mut self, level: impl Into<String>) -> Self {
        self.logging.level = level.into();
        self
    }

    /// Preset keys among `provided` that a fine-grained shape overrides.
    fn ignored_keys<'a>(&self, provided: &[&'a str]) -> Vec<&'a str> {
        if self.skip_confirmation.is_none() {
            return Vec::new();
        }
        provided.to_vec()
    }

    /// Initial permission configuration described by these settings.
    pub fn permission_config(&self) -> PermissionConfig {
        let config = match &self.skip_confirmation {
            Some(skip) => PermissionConfig::fine_grained(skip.clone()),
            None => PermissionConfig::preset_with(self.mode, self.confirm_queries.clone()),
        };
        config.with_lockdown(self.disable_runtime_permission_changes)
    }
}

/// Accepts a JSON array or a comma-separated string.
async fn load_selection(
    provider: &dyn ConfigProvider,
    key: &str,
) -> ConfigResult<Option<CategorySelection>> {
    let Some(raw) = provider.get_str(key).await? else {
        return Ok(None);
    };

    let parsed = if raw.starts_with('[') {
        let items: Vec<String> = serde_json::from_str(&raw).map_err(|e| invalid(key, e))?;
        CategorySelection::parse_items(items)
    } else {
        CategorySelection::parse(&raw)
    };

    parsed.map(Some).map_err(|e| invalid(key, e))
}

fn invalid(key: &str, message: impl std::fmt::Display) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        message: message.to_string(),
    }
}
