//! Model Context Protocol (MCP) control channel
//!
//! Every managed server is reached over MCP: newline-delimited JSON-RPC 2.0
//! on the server's stdin/stdout. Container-kind servers are attached the same
//! way through the container runtime's interactive stdio.
//!
//! ## Example
//!
//! ```rust,ignore
//! use toolbridge_core::mcp::{McpClient, StdioTransport};
//!
//! let transport = StdioTransport::spawn("node", &["fs.js"]).await?;
//! let client = McpClient::new(Box::new(transport));
//! client.initialize().await?;
//!
//! let tools = client.list_tools().await?;
//! let result = client.call_tool("read", json!({"path": "/tmp/test.txt"})).await?;
//! ```

pub mod client;
pub mod error;
pub mod protocol;
pub mod transport;
pub mod types;

pub use client::McpClient;
pub use error::McpError;
pub use protocol::{McpMessage, McpNotification, McpRequest, McpResponse, McpRpcError, RequestId};
pub use transport::{McpTransport, StdioTransport};
pub use types::{McpContent, McpResourceRef, McpServerInfo, McpTool, McpToolResult};
