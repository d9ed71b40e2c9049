//! Tool trait definitions.

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::de::DeserializeOwned;

use super::context::GateContext;
use super::{ToolDefinition, ToolName, ToolOutput};

/// Core trait for every tool handler.
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> ToolName;
    fn description(&self) -> &str;
    fn input_schema(&self) -> serde_json::Value;
    async fn execute(&self, input: serde_json::Value, context: &GateContext) -> ToolOutput;

    fn definition(&self) -> ToolDefinition {
        ToolDefinition::new(self.name().as_str(), self.description(), self.input_schema())
    }
}

/// Typed tool with a schema derived from its input struct.
///
/// The blanket [`Tool`] impl deserializes arguments before calling
/// [`handle`](Self::handle) and reports malformed input as
/// [`ToolError::InvalidInput`](super::ToolError::InvalidInput).
#[async_trait]
pub trait SchemaTool: Send + Sync {
    type Input: JsonSchema + DeserializeOwned + Send;
    const NAME: ToolName;
    const DESCRIPTION: &'static str;

    async fn handle(&self, input: Self::Input, context: &GateContext) -> ToolOutput;

    fn input_schema() -> serde_json::Value {
        schema_value(schemars::schema_for!(Self::Input))
    }
}

pub(crate) fn schema_value(schema: schemars::Schema) -> serde_json::Value {
    let mut value =
        serde_json::to_value(schema).unwrap_or_else(|_| serde_json::json!({"type": "object"}));

    if let Some(obj) = value.as_object_mut() {
        if !obj.contains_key("properties") {
            obj.insert(
                "properties".to_string(),
                serde_json::Value::Object(serde_json::Map::new()),
            );
        }
        obj.remove("$schema");
    }

    value
}

#[async_trait]
impl<T: SchemaTool + 'static> Tool for T {
    fn name(&self) -> ToolName {
        T::NAME
    }

    fn description(&self) -> &str {
        T::DESCRIPTION
    }

    fn input_schema(&self) -> serde_json::Value {
        T::input_schema()
    }

    async fn execute(&self, input: serde_json::Value, context: &GateContext) -> ToolOutput {
        let input = if input.is_null() {
            serde_json::Value::Object(serde_json::Map::new())
        } else {
            input
        };
        match serde_json::from_value::<T::Input>(input) {
            Ok(typed) => SchemaTool::handle(self, typed, context).await,
            Err(e) => ToolOutput::invalid_input(e.to_string()),
        }
    }
}
