//! Pluggable configuration provider system.
//!
//! ```rust,no_run
//! use cql_gate::config::{ConfigBuilder, GateSettings};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let provider = ConfigBuilder::new()
//!     .env()
//!     .file("cql-gate.json")
//!     .build()
//!     .await?;
//! let settings = GateSettings::load(&provider).await?;
//! # Ok(())
//! # }
//! ```

pub mod composite;
pub mod env;
pub mod file;
pub mod memory;
pub mod provider;
pub mod settings;

pub use composite::CompositeConfigProvider;
pub use env::EnvConfigProvider;
pub use file::FileConfigProvider;
pub use memory::MemoryConfigProvider;
pub use provider::{ConfigProvider, ConfigProviderExt};
pub use settings::GateSettings;

use thiserror::Error;

/// Prefix for environment variables, e.g. `CQLGATE_MODE`.
pub const DEFAULT_ENV_PREFIX: &str = "CQLGATE_";

/// Errors that can occur in configuration operations
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error (file operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Environment error: {0}")]
    Env(#[from] std::env::VarError),
}

/// Result type for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Configuration builder for fluent API
pub struct ConfigBuilder {
    providers: Vec<Box<dyn ConfigProvider>>,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            providers: Vec::new(),
        }
    }

    /// Add environment variables under [`DEFAULT_ENV_PREFIX`]
    pub fn env(mut self) -> Self {
        self.providers.push(Box::new(EnvConfigProvider::new()));
        self
    }

    pub fn env_with_prefix(mut self, prefix: &str) -> Self {
        self.providers
            .push(Box::new(EnvConfigProvider::prefixed(prefix)));
        self
    }

    /// Add a JSON settings file
    pub fn file(mut self, path: impl AsRef<std::path::Path>) -> Self {
        self.providers
            .push(Box::new(FileConfigProvider::new(path.as_ref())));
        self
    }

    pub fn memory(mut self, provider: MemoryConfigProvider) -> Self {
        self.providers.push(Box::new(provider));
        self
    }

    /// Add a custom provider
    pub fn provider(mut self, provider: Box<dyn ConfigProvider>) -> Self {
        self.providers.push(provider);
        self
    }

    /// Build the composite configuration; earlier providers win.
    pub async fn build(self) -> ConfigResult<CompositeConfigProvider> {
        let mut composite = CompositeConfigProvider::new();
        for provider in self.providers {
            composite.add_provider(provider);
        }
        Ok(composite)
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::InvalidValue {
            key: "mode".to_string(),
            message: "invalid preset mode: root".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid value for mode: invalid preset mode: root"
        );
    }

    #[tokio::test]
    async fn test_config_builder() {
        let provider = ConfigBuilder::new()
            .memory(MemoryConfigProvider::named("overrides").value("mode", "dba"))
            .env_with_prefix("CQLGATE_BUILDER_TEST_")
            .build()
            .await
            .unwrap();
        assert_eq!(provider.provider_names(), vec!["overrides", "env"]);

        let settings = GateSettings::load(&provider).await.unwrap();
        assert_eq!(settings.mode, crate::permissions::PresetMode::Dba);
    }
}
