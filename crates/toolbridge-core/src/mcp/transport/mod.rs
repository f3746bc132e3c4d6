//! MCP transport layer
//!
//! Managed servers speak MCP over their standard streams. The container
//! runtime's `run -i` attaches the same streams, so one transport covers both
//! server kinds.

pub mod stdio;

pub use stdio::StdioTransport;

use super::error::McpError;
use super::protocol::McpMessage;
use async_trait::async_trait;

/// Transport trait for MCP communication
#[async_trait]
pub trait McpTransport: Send + Sync {
    /// Send a message
    async fn send(&mut self, message: McpMessage) -> Result<(), McpError>;

    /// Receive the next message
    async fn receive(&mut self) -> Result<McpMessage, McpError>;

    /// Close the transport
    async fn close(&mut self) -> Result<(), McpError>;

    /// Check if the transport is connected
    fn is_connected(&self) -> bool;
}
