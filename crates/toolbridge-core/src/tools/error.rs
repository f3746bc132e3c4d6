//! Capability table errors

use crate::error::UnifiedError;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ToolError {
    /// No tool published under this name
    #[error("Tool '{name}' not found")]
    NotFound { name: String },
}

impl ToolError {
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound { name: name.into() }
    }
}

impl UnifiedError for ToolError {
    fn error_code(&self) -> &str {
        match self {
            Self::NotFound { .. } => "TOOL_NOT_FOUND",
        }
    }

    fn message(&self) -> &str {
        match self {
            Self::NotFound { .. } => "Tool not found",
        }
    }

    fn context(&self) -> Option<&str> {
        match self {
            Self::NotFound { name } => Some(name),
        }
    }
}
