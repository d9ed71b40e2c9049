//! Configuration Provider Trait

use std::str::FromStr;

use serde::de::DeserializeOwned;

use super::{ConfigError, ConfigResult};

/// Read-only source of startup configuration.
#[async_trait::async_trait]
pub trait ConfigProvider: Send + Sync {
    /// Provider name for logging
    fn name(&self) -> &str;

    /// Get a raw configuration value
    async fn get_raw(&self, key: &str) -> ConfigResult<Option<String>>;

    /// List keys matching a prefix
    async fn list_keys(&self, prefix: &str) -> ConfigResult<Vec<String>>;
}

/// Extension methods for typed configuration access
pub trait ConfigProviderExt: ConfigProvider {
    /// Get a JSON-encoded configuration value
    fn get<T: DeserializeOwned + Send>(
        &self,
        key: &str,
    ) -> impl std::future::Future<Output = ConfigResult<Option<T>>> + Send
    where
        Self: Sync,
    {
        async move {
            match self.get_raw(key).await? {
                Some(raw) => {
                    let value: T =
                        serde_json::from_str(&raw).map_err(|e| invalid(key, e.to_string()))?;
                    Ok(Some(value))
                }
                None => Ok(None),
            }
        }
    }

    /// Get a trimmed string; blank values count as absent.
    fn get_str(
        &self,
        key: &str,
    ) -> impl std::future::Future<Output = ConfigResult<Option<String>>> + Send
    where
        Self: Sync,
    {
        async move {
            Ok(self
                .get_raw(key)
                .await?
                .map(|raw| raw.trim().to_string())
                .filter(|raw| !raw.is_empty()))
        }
    }

    /// Get a value through its `FromStr` implementation
    fn get_parsed<T>(
        &self,
        key: &str,
    ) -> impl std::future::Future<Output = ConfigResult<Option<T>>> + Send
    where
        Self: Sync,
        T: FromStr + Send,
        T::Err: std::fmt::Display,
    {
        async move {
            match self.get_str(key).await? {
                Some(raw) => raw
                    .parse::<T>()
                    .map(Some)
                    .map_err(|e| invalid(key, e.to_string())),
                None => Ok(None),
            }
        }
    }

    /// Get a boolean flag (`true`/`false`, `1`/`0`, `yes`/`no`, `on`/`off`)
    fn get_bool(
        &self,
        key: &str,
    ) -> impl std::future::Future<Output = ConfigResult<Option<bool>>> + Send
    where
        Self: Sync,
    {
        async move {
            match self.get_str(key).await? {
                Some(raw) => match raw.to_lowercase().as_str() {
                    "true" | "1" | "yes" | "on" => Ok(Some(true)),
                    "false" | "0" | "no" | "off" => Ok(Some(false)),
                    _ => Err(invalid(key, format!("expected a boolean, got {:?}", raw))),
                },
                None => Ok(None),
            }
        }
    }
}

impl<P: ConfigProvider + ?Sized> ConfigProviderExt for P {}

fn invalid(key: &str, message: String) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        message,
    }
}
