//! Tool results.

use serde::Serialize;
use thiserror::Error;

/// Failure reported back to the calling agent.
#[derive(Debug, Clone, Error)]
pub enum ToolError {
    #[error("invalid input: {message}")]
    InvalidInput { message: String },

    #[error("unknown tool: {name}")]
    UnknownTool { name: String },

    /// Policy refusal, already rendered with configuration hints.
    #[error("{rendered}")]
    Refused {
        error_type: &'static str,
        rendered: String,
    },

    /// Domain failure from one of the gate components.
    #[error("{message}")]
    Failed { kind: &'static str, message: String },
}

impl ToolError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    pub fn unknown_tool(name: impl Into<String>) -> Self {
        Self::UnknownTool { name: name.into() }
    }

    /// Stable identifier matching [`crate::Error::kind`] where one applies.
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::InvalidInput { .. } => "invalid_input",
            Self::UnknownTool { .. } => "unknown_tool",
            Self::Refused { error_type, .. } => *error_type,
            Self::Failed { kind, .. } => *kind,
        }
    }
}

impl From<crate::Error> for ToolError {
    fn from(error: crate::Error) -> Self {
        match error {
            crate::Error::InvalidInput(message) => Self::InvalidInput { message },
            other => Self::Failed {
                kind: other.kind(),
                message: other.to_string(),
            },
        }
    }
}

#[derive(Debug, Clone)]
pub enum ToolOutput {
    Success(String),
    Error(ToolError),
}

impl ToolOutput {
    pub fn success(content: impl Into<String>) -> Self {
        Self::Success(content.into())
    }

    /// Pretty-printed JSON success.
    pub fn json<T: Serialize>(value: &T) -> Self {
        match serde_json::to_string_pretty(value) {
            Ok(text) => Self::Success(text),
            Err(e) => Self::Error(crate::Error::Json(e).into()),
        }
    }

    pub fn error(error: impl Into<ToolError>) -> Self {
        Self::Error(error.into())
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::Error(ToolError::invalid_input(message))
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    pub fn as_error(&self) -> Option<&ToolError> {
        match self {
            Self::Error(e) => Some(e),
            Self::Success(_) => None,
        }
    }

    pub fn text(&self) -> String {
        match self {
            Self::Success(content) => content.clone(),
            Self::Error(e) => e.to_string(),
        }
    }
}

impl From<ToolError> for ToolOutput {
    fn from(error: ToolError) -> Self {
        Self::Error(error)
    }
}

impl From<crate::Result<ToolOutput>> for ToolOutput {
    fn from(result: crate::Result<ToolOutput>) -> Self {
        result.unwrap_or_else(|e| Self::Error(e.into()))
    }
}
