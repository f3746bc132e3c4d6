//! MCP protocol operations (handshake, tools, ping)

use super::McpClient;
use super::super::error::McpError;
use super::super::protocol::{MCP_PROTOCOL_VERSION, methods};
use super::super::types::{
    ClientInfo, InitializeParams, InitializeResult, McpServerInfo, McpTool, McpToolResult,
};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::instrument;

/// Guard against servers that never stop paginating
const MAX_TOOL_PAGES: usize = 64;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ToolsPage {
    #[serde(default)]
    tools: Vec<McpTool>,
    #[serde(default)]
    next_cursor: Option<String>,
}

impl McpClient {
    /// Perform the `initialize` handshake
    #[instrument(skip(self), level = "debug")]
    pub async fn initialize(&self) -> Result<McpServerInfo, McpError> {
        if self.is_initialized() {
            return Err(McpError::AlreadyInitialized);
        }

        let params = InitializeParams {
            protocol_version: MCP_PROTOCOL_VERSION.to_string(),
            capabilities: json!({}),
            client_info: ClientInfo::default(),
        };

        let result: InitializeResult = self
            .call(methods::INITIALIZE, Some(serde_json::to_value(&params)?))
            .await?;

        *self.server_info_slot().write().await = Some(result.server_info.clone());
        self.mark_initialized();

        self.notify(methods::INITIALIZED).await?;

        Ok(result.server_info)
    }

    /// List every tool the server advertises, following pagination cursors
    #[instrument(skip(self), level = "debug")]
    pub async fn list_tools(&self) -> Result<Vec<McpTool>, McpError> {
        self.ensure_initialized()?;

        let mut tools = Vec::new();
        let mut cursor: Option<String> = None;

        for _ in 0..MAX_TOOL_PAGES {
            let params = cursor.as_ref().map(|c| json!({ "cursor": c }));
            let page: ToolsPage = self.call(methods::TOOLS_LIST, params).await?;
            tools.extend(page.tools);

            match page.next_cursor {
                Some(next) if !next.is_empty() => cursor = Some(next),
                _ => {
                    *self.tools_slot().write().await = tools.clone();
                    return Ok(tools);
                }
            }
        }

        Err(McpError::protocol(format!(
            "tools/list did not finish after {} pages",
            MAX_TOOL_PAGES
        )))
    }

    /// Call a tool
    #[instrument(skip(self, arguments), fields(tool_name = %name))]
    pub async fn call_tool(&self, name: &str, arguments: Value) -> Result<McpToolResult, McpError> {
        self.ensure_initialized()?;

        let params = json!({
            "name": name,
            "arguments": arguments
        });

        self.call(methods::TOOLS_CALL, Some(params)).await
    }

    /// Ping the server
    pub async fn ping(&self) -> Result<(), McpError> {
        let _: Value = self.call(methods::PING, None).await?;
        Ok(())
    }
}
