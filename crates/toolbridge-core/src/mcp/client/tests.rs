use super::*;
use crate::mcp::protocol::{McpResponse, McpRpcError, methods};
use crate::mcp::transport::McpTransport;
use async_trait::async_trait;
use serde_json::json;
use tokio::sync::mpsc as tmpsc;

type Handler = Box<dyn Fn(&McpRequest) -> Option<McpResponse> + Send + Sync>;

/// In-memory server: answers each request through `handler`
struct ScriptedTransport {
    outbox: tmpsc::UnboundedSender<McpMessage>,
    inbox: tmpsc::UnboundedReceiver<McpMessage>,
    handler: Handler,
    connected: bool,
}

impl ScriptedTransport {
    fn new(handler: Handler) -> Self {
        let (outbox, inbox) = tmpsc::unbounded_channel();
        Self {
            outbox,
            inbox,
            handler,
            connected: true,
        }
    }
}

#[async_trait]
impl McpTransport for ScriptedTransport {
    async fn send(&mut self, message: McpMessage) -> Result<(), McpError> {
        if let McpMessage::Request(request) = message {
            if let Some(response) = (self.handler)(&request) {
                let _ = self.outbox.send(McpMessage::Response(response));
            }
        }
        Ok(())
    }

    async fn receive(&mut self) -> Result<McpMessage, McpError> {
        self.inbox
            .recv()
            .await
            .ok_or_else(|| McpError::connection("Connection closed"))
    }

    async fn close(&mut self) -> Result<(), McpError> {
        self.connected = false;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }
}

fn fs_server() -> Handler {
    Box::new(|req: &McpRequest| {
        let result = match req.method.as_str() {
            methods::INITIALIZE => json!({
                "protocolVersion": "2024-11-05",
                "capabilities": {"tools": {}},
                "serverInfo": {"name": "fs", "version": "1.0.0"}
            }),
            methods::TOOLS_LIST => {
                let cursor = req
                    .params
                    .as_ref()
                    .and_then(|p| p.get("cursor"))
                    .and_then(|c| c.as_str());
                match cursor {
                    None => json!({"tools": [{"name": "read"}], "nextCursor": "page-2"}),
                    Some(_) => json!({"tools": [{"name": "write", "description": "Write a file"}]}),
                }
            }
            methods::TOOLS_CALL => {
                let name = req.params.as_ref().and_then(|p| p["name"].as_str()).unwrap_or("");
                if name == "explode" {
                    return Some(McpResponse::error(
                        req.id.clone(),
                        McpRpcError::new(-32000, "boom"),
                    ));
                }
                if name == "hang" {
                    return None;
                }
                json!({"content": [{"type": "text", "text": format!("called {}", name)}]})
            }
            _ => json!({}),
        };
        Some(McpResponse::success(req.id.clone(), result))
    })
}

async fn connected_client(timeout: Duration) -> McpClient {
    let client = McpClient::with_timeout(Box::new(ScriptedTransport::new(fs_server())), timeout);
    client.initialize().await.unwrap();
    client
}

#[tokio::test]
async fn test_initialize_records_server_info() {
    let client = connected_client(Duration::from_secs(5)).await;

    assert!(client.is_initialized());
    let info = client.server_info().await.unwrap();
    assert_eq!(info.name, "fs");
    assert!(matches!(
        client.initialize().await,
        Err(McpError::AlreadyInitialized)
    ));
}

#[tokio::test]
async fn test_list_tools_follows_cursor() {
    let client = connected_client(Duration::from_secs(5)).await;

    let tools = client.list_tools().await.unwrap();
    let names: Vec<_> = tools.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["read", "write"]);
    assert_eq!(client.cached_tools().await.len(), 2);
}

#[tokio::test]
async fn test_call_tool_and_server_error() {
    let client = connected_client(Duration::from_secs(5)).await;

    let result = client.call_tool("read", json!({"path": "/tmp/a"})).await.unwrap();
    assert_eq!(result.content[0].as_text(), Some("called read"));
    assert!(!result.is_error);

    let err = client.call_tool("explode", json!({})).await.unwrap_err();
    assert!(matches!(err, McpError::Server { code: -32000, .. }));
}

#[tokio::test]
async fn test_unanswered_request_times_out() {
    let client = connected_client(Duration::from_millis(50)).await;

    let err = client.call_tool("hang", json!({})).await.unwrap_err();
    assert!(matches!(err, McpError::Timeout { millis: 50 }));

    // The connection stays usable after a timeout
    assert!(client.call_tool("read", json!({})).await.is_ok());
}

#[tokio::test]
async fn test_requests_require_initialize() {
    let client = McpClient::new(Box::new(ScriptedTransport::new(fs_server())));
    assert!(matches!(
        client.list_tools().await,
        Err(McpError::NotInitialized)
    ));
}

#[tokio::test]
async fn test_close_is_idempotent_and_disconnects() {
    let client = connected_client(Duration::from_secs(5)).await;

    client.close().await.unwrap();
    client.close().await.unwrap();

    assert!(!client.is_connected());
    assert!(client.ping().await.is_err());
}
