//! Proxy tool forwarding calls to a managed server

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use toolbridge_core::tools::codes::{TOOL_GHOST, TOOL_INVOCATION_FAILED, TOOL_SERVER_UNAVAILABLE};
use toolbridge_core::{McpTool, RegistryError, ServerRegistry, Tool, ToolOutput};
use tracing::{debug, warn};

use super::types::proxy_identifier;

/// Bookkeeping shared between the dynamic registry and its proxies
pub(crate) type Bookkeeping = Arc<RwLock<HashMap<String, Vec<String>>>>;

/// Published stand-in for one operation of one server.
///
/// Holds no connection: the registry is asked for the live one on every
/// call, so a restarted server is picked up without republishing.
pub struct ProxyTool {
    identifier: String,
    server: String,
    operation: McpTool,
    description: String,
    registry: Arc<ServerRegistry>,
    registered: Bookkeeping,
}

impl ProxyTool {
    pub(crate) fn new(
        server: &str,
        operation: McpTool,
        registry: Arc<ServerRegistry>,
        registered: Bookkeeping,
    ) -> Self {
        let description = match &operation.description {
            Some(text) => format!("[{}] {}", server, text),
            None => format!("[{}] {}", server, operation.name),
        };
        Self {
            identifier: proxy_identifier(server, &operation.name),
            server: server.to_string(),
            operation,
            description,
            registry,
            registered,
        }
    }

    pub fn server(&self) -> &str {
        &self.server
    }

    pub fn operation(&self) -> &str {
        &self.operation.name
    }

    fn is_registered(&self) -> bool {
        self.registered
            .read()
            .get(&self.server)
            .is_some_and(|ids| ids.contains(&self.identifier))
    }
}

impl std::fmt::Debug for ProxyTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProxyTool")
            .field("identifier", &self.identifier)
            .field("server", &self.server)
            .finish()
    }
}

#[async_trait]
impl Tool for ProxyTool {
    fn name(&self) -> &str {
        &self.identifier
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn input_schema(&self) -> Value {
        self.operation.input_schema.clone()
    }

    async fn execute(&self, arguments: Value) -> ToolOutput {
        if !self.is_registered() {
            debug!(tool = %self.identifier, "Invoked a stale proxy");
            return ToolOutput::error(
                TOOL_GHOST,
                format!(
                    "Tool '{}' is no longer registered for server '{}'",
                    self.identifier, self.server
                ),
            );
        }

        match self
            .registry
            .call_operation(&self.server, &self.operation.name, arguments)
            .await
        {
            Ok(result) => ToolOutput::from(result),
            Err(
                err @ (RegistryError::NotRunning { .. }
                | RegistryError::NotFound { .. }
                | RegistryError::Closed),
            ) => ToolOutput::error(TOOL_SERVER_UNAVAILABLE, err.to_string()),
            Err(err) => {
                warn!(tool = %self.identifier, "Proxy invocation failed: {}", err);
                ToolOutput::error(TOOL_INVOCATION_FAILED, err.to_string())
            }
        }
    }
}
