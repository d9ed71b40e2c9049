//! Environment Variable Configuration Provider
//!
//! Environment variables are read at lookup time and never written.

use super::provider::ConfigProvider;
use super::{ConfigError, ConfigResult, DEFAULT_ENV_PREFIX};

/// Read-only environment variable configuration provider.
///
/// `confirm_queries` is looked up as `CQLGATE_CONFIRM_QUERIES` under the
/// default prefix.
#[derive(Debug, Clone)]
pub struct EnvConfigProvider {
    prefix: Option<String>,
}

impl EnvConfigProvider {
    /// Create a provider with the default `CQLGATE_` prefix
    pub fn new() -> Self {
        Self::prefixed(DEFAULT_ENV_PREFIX)
    }

    /// Create a provider that reads unprefixed variables
    pub fn unprefixed() -> Self {
        Self { prefix: None }
    }

    pub fn prefixed(prefix: impl Into<String>) -> Self {
        Self {
            prefix: Some(prefix.into()),
        }
    }

    fn env_key(&self, key: &str) -> String {
        let key = key.to_uppercase().replace(['.', '-'], "_");
        match &self.prefix {
            Some(prefix) => format!("{}{}", prefix, key),
            None => key,
        }
    }

    fn key_from_env(&self, env_name: &str) -> Option<String> {
        let bare = match &self.prefix {
            Some(prefix) => env_name.strip_prefix(prefix.as_str())?,
            None => env_name,
        };
        Some(bare.to_lowercase())
    }
}

impl Default for EnvConfigProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl ConfigProvider for EnvConfigProvider {
    fn name(&self) -> &str {
        "env"
    }

    async fn get_raw(&self, key: &str) -> ConfigResult<Option<String>> {
        match std::env::var(self.env_key(key)) {
            Ok(value) => Ok(Some(value)),
            Err(std::env::VarError::NotPresent) => Ok(None),
            Err(e) => Err(ConfigError::Env(e)),
        }
    }

    async fn list_keys(&self, prefix: &str) -> ConfigResult<Vec<String>> {
        let env_prefix = self.env_key(prefix);
        Ok(std::env::vars()
            .filter(|(k, _)| k.starts_with(&env_prefix))
            .filter_map(|(k, _)| self.key_from_env(&k))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_key_conversion() {
        let provider = EnvConfigProvider::new();
        assert_eq!(provider.env_key("mode"), "CQLGATE_MODE");
        assert_eq!(
            provider.env_key("confirm_queries"),
            "CQLGATE_CONFIRM_QUERIES"
        );

        let provider = EnvConfigProvider::unprefixed();
        assert_eq!(provider.env_key("log.level"), "LOG_LEVEL");
        assert_eq!(provider.key_from_env("LOG_LEVEL").as_deref(), Some("log_level"));
    }

    #[tokio::test]
    async fn test_env_provider_get() {
        let provider = EnvConfigProvider::prefixed("CQLGATE_TEST_ENV_GET_");

        // SAFETY: Test-only environment setup with a variable unique to this test
        unsafe { std::env::set_var("CQLGATE_TEST_ENV_GET_MODE", "dba") };
        let value = provider.get_raw("mode").await.unwrap();
        assert_eq!(value, Some("dba".to_string()));

        let keys = provider.list_keys("").await.unwrap();
        assert!(keys.contains(&"mode".to_string()));
        unsafe { std::env::remove_var("CQLGATE_TEST_ENV_GET_MODE") };
    }

    #[tokio::test]
    async fn test_env_provider_not_found() {
        let provider = EnvConfigProvider::prefixed("NONEXISTENT_PREFIX_");
        let value = provider.get_raw("some_key").await.unwrap();
        assert_eq!(value, None);
    }
}
