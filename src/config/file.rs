//! File-based Configuration Provider
//!
//! Reads settings from a JSON object file. Nested objects are addressed
//! with dotted keys.

use std::path::PathBuf;

use serde_json::{Map, Value};
use tokio::sync::OnceCell;

use super::ConfigResult;
use super::provider::ConfigProvider;

pub struct FileConfigProvider {
    path: PathBuf,
    data: OnceCell<Map<String, Value>>,
}

impl FileConfigProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            data: OnceCell::new(),
        }
    }

    /// A missing file reads as empty.
    async fn load(&self) -> ConfigResult<Map<String, Value>> {
        if !tokio::fs::try_exists(&self.path).await? {
            tracing::debug!(path = %self.path.display(), "Config file not found; using defaults");
            return Ok(Map::new());
        }

        let content = tokio::fs::read_to_string(&self.path).await?;
        let data: Map<String, Value> = serde_json::from_str(&content)?;
        tracing::debug!(path = %self.path.display(), keys = data.len(), "Config file loaded");
        Ok(data)
    }

    async fn data(&self) -> ConfigResult<&Map<String, Value>> {
        self.data.get_or_try_init(|| self.load()).await
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

fn lookup<'a>(map: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    let mut parts = key.split('.');
    let first = map.get(parts.next()?)?;
    parts.try_fold(first, |value, part| value.get(part))
}

#[async_trait::async_trait]
impl ConfigProvider for FileConfigProvider {
    fn name(&self) -> &str {
        "file"
    }

    async fn get_raw(&self, key: &str) -> ConfigResult<Option<String>> {
        let map = self.data().await?;
        Ok(match lookup(map, key) {
            Some(Value::String(s)) => Some(s.clone()),
            Some(Value::Null) | None => None,
            Some(v) => Some(v.to_string()),
        })
    }

    async fn list_keys(&self, prefix: &str) -> ConfigResult<Vec<String>> {
        let map = self.data().await?;
        Ok(map
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect())
    }
}

impl std::fmt::Debug for FileConfigProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileConfigProvider")
            .field("path", &self.path)
            .field("loaded", &self.data.initialized())
            .finish()
    }
}
