//! In-Memory Configuration Provider
//!
//! Code-defined configuration, mostly for embedders and tests.

use std::collections::HashMap;

use super::ConfigResult;
use super::provider::ConfigProvider;

#[derive(Debug, Clone)]
pub struct MemoryConfigProvider {
    data: HashMap<String, String>,
    name: String,
}

impl MemoryConfigProvider {
    pub fn new() -> Self {
        Self::named("memory")
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self {
            data: HashMap::new(),
            name: name.into(),
        }
    }

    pub fn from_data(data: HashMap<String, String>) -> Self {
        Self {
            data,
            name: "memory".to_string(),
        }
    }

    pub fn value(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl Default for MemoryConfigProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl ConfigProvider for MemoryConfigProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn get_raw(&self, key: &str) -> ConfigResult<Option<String>> {
        Ok(self.data.get(key).cloned())
    }

    async fn list_keys(&self, prefix: &str) -> ConfigResult<Vec<String>> {
        Ok(self
            .data
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect())
    }
}
