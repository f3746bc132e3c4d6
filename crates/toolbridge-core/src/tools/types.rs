//! Uniform tool result envelope

use crate::mcp::{McpContent, McpToolResult};
use serde::{Deserialize, Serialize};

/// Result of invoking a tool.
///
/// Success and failure share one shape so the host table never has to
/// special-case errors. Failures set `is_error` and usually `error_code`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolOutput {
    pub content: Vec<McpContent>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_error: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
}

impl ToolOutput {
    /// Successful output with the given content
    pub fn success(content: Vec<McpContent>) -> Self {
        Self {
            content,
            is_error: false,
            error_code: None,
        }
    }

    /// Successful single-text output
    pub fn text(text: impl Into<String>) -> Self {
        Self::success(vec![McpContent::text(text)])
    }

    /// Flagged failure with a code and a human-readable message
    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            content: vec![McpContent::text(message)],
            is_error: true,
            error_code: Some(code.into()),
        }
    }

    /// All text content joined with newlines
    pub fn text_content(&self) -> String {
        self.content
            .iter()
            .filter_map(McpContent::as_text)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl From<McpToolResult> for ToolOutput {
    fn from(result: McpToolResult) -> Self {
        Self {
            content: result.content,
            is_error: result.is_error,
            error_code: None,
        }
    }
}
