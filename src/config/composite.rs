//! Composite Configuration Provider
//!
//! Chains multiple configuration providers with priority ordering.
//! Earlier providers have higher priority.

use std::collections::BTreeSet;

use super::ConfigResult;
use super::provider::ConfigProvider;

pub struct CompositeConfigProvider {
    providers: Vec<Box<dyn ConfigProvider>>,
}

impl CompositeConfigProvider {
    pub fn new() -> Self {
        Self {
            providers: Vec::new(),
        }
    }

    /// Add a provider (first added = highest priority)
    pub fn add_provider(&mut self, provider: Box<dyn ConfigProvider>) {
        self.providers.push(provider);
    }

    pub fn provider(mut self, provider: Box<dyn ConfigProvider>) -> Self {
        self.providers.push(provider);
        self
    }

    pub fn provider_count(&self) -> usize {
        self.providers.len()
    }

    pub fn provider_names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }
}

impl Default for CompositeConfigProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl ConfigProvider for CompositeConfigProvider {
    fn name(&self) -> &str {
        "composite"
    }

    async fn get_raw(&self, key: &str) -> ConfigResult<Option<String>> {
        for provider in &self.providers {
            if let Some(value) = provider.get_raw(key).await? {
                tracing::trace!(key, provider = provider.name(), "Config value resolved");
                return Ok(Some(value));
            }
        }
        Ok(None)
    }

    async fn list_keys(&self, prefix: &str) -> ConfigResult<Vec<String>> {
        let mut all_keys = BTreeSet::new();
        for provider in &self.providers {
            all_keys.extend(provider.list_keys(prefix).await?);
        }
        Ok(all_keys.into_iter().collect())
    }
}

impl std::fmt::Debug for CompositeConfigProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompositeConfigProvider")
            .field("provider_count", &self.providers.len())
            .field("provider_names", &self.provider_names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::memory::MemoryConfigProvider;

    #[tokio::test]
    async fn test_composite_provider_priority() {
        let high_priority = MemoryConfigProvider::named("high").value("mode", "dba");
        let low_priority = MemoryConfigProvider::named("low")
            .value("mode", "readonly")
            .value("log_level", "warn");

        let composite = CompositeConfigProvider::new()
            .provider(Box::new(high_priority))
            .provider(Box::new(low_priority));

        assert_eq!(
            composite.get_raw("mode").await.unwrap(),
            Some("dba".to_string())
        );
        assert_eq!(
            composite.get_raw("log_level").await.unwrap(),
            Some("warn".to_string())
        );
        assert_eq!(composite.get_raw("missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_composite_provider_list_keys() {
        let p1 = MemoryConfigProvider::new()
            .value("confirm_queries", "dml")
            .value("mode", "dba");
        let p2 = MemoryConfigProvider::new()
            .value("confirm_queries", "ddl")
            .value("confirm_timeout", "5");

        let composite = CompositeConfigProvider::new()
            .provider(Box::new(p1))
            .provider(Box::new(p2));

        let keys = composite.list_keys("confirm").await.unwrap();
        assert_eq!(keys, vec!["confirm_queries", "confirm_timeout"]);
    }

    #[test]
    fn test_composite_provider_names() {
        let composite = CompositeConfigProvider::new()
            .provider(Box::new(MemoryConfigProvider::named("first")))
            .provider(Box::new(MemoryConfigProvider::named("second")));

        assert_eq!(composite.provider_names(), vec!["first", "second"]);
        assert_eq!(composite.provider_count(), 2);
    }
}
