//! Live control channel to a managed server

use crate::mcp::{McpClient, McpError, McpTool, McpToolResult};
use async_trait::async_trait;
use serde_json::Value;

/// Connection handle owned by a running server entry.
///
/// `McpClient` is the production implementation; tests substitute
/// in-memory fakes.
#[async_trait]
pub trait ServerConnection: Send + Sync {
    /// Fetch the operations the server currently advertises
    async fn list_tools(&self) -> Result<Vec<McpTool>, McpError>;

    /// Invoke one operation
    async fn call_tool(&self, name: &str, arguments: Value) -> Result<McpToolResult, McpError>;

    /// Tear the channel down
    async fn close(&self) -> Result<(), McpError>;

    /// Whether the underlying stream is still open
    fn is_alive(&self) -> bool {
        true
    }
}

#[async_trait]
impl ServerConnection for McpClient {
    async fn list_tools(&self) -> Result<Vec<McpTool>, McpError> {
        McpClient::list_tools(self).await
    }

    async fn call_tool(&self, name: &str, arguments: Value) -> Result<McpToolResult, McpError> {
        McpClient::call_tool(self, name, arguments).await
    }

    async fn close(&self) -> Result<(), McpError> {
        McpClient::close(self).await
    }

    fn is_alive(&self) -> bool {
        self.is_connected()
    }
}
