//! MCP client implementation
//!
//! # Features
//! - Concurrent requests routed by id through a background I/O task
//! - Per-request timeout
//! - Server-initiated pings are answered automatically

mod io_loop;
mod operations;

use super::error::McpError;
use super::protocol::{McpMessage, McpNotification, McpRequest, RequestId};
use super::transport::McpTransport;
use super::types::{McpServerInfo, McpTool};
use io_loop::IoCommand;
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::{RwLock, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::timeout;

/// Default request timeout
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// MCP client for communicating with one server
pub struct McpClient {
    /// Command channel to the I/O task
    commands: mpsc::Sender<IoCommand>,
    /// Server info from `initialize`
    server_info: RwLock<Option<McpServerInfo>>,
    /// Tools from the last `tools/list`
    tools: RwLock<Vec<McpTool>>,
    request_id: AtomicU64,
    initialized: AtomicBool,
    /// Cleared by the I/O task when the transport fails or closes
    running: Arc<AtomicBool>,
    request_timeout: Duration,
    io_handle: Mutex<Option<JoinHandle<()>>>,
}

impl McpClient {
    /// Create a new MCP client with the given transport
    pub fn new(transport: Box<dyn McpTransport>) -> Self {
        Self::with_timeout(transport, DEFAULT_REQUEST_TIMEOUT)
    }

    /// Create a new MCP client with a custom request timeout
    pub fn with_timeout(transport: Box<dyn McpTransport>, request_timeout: Duration) -> Self {
        let (commands, command_rx) = mpsc::channel(100);
        let running = Arc::new(AtomicBool::new(true));
        let io_handle = tokio::spawn(io_loop::run(
            transport,
            command_rx,
            Arc::clone(&running),
        ));

        Self {
            commands,
            server_info: RwLock::new(None),
            tools: RwLock::new(Vec::new()),
            request_id: AtomicU64::new(1),
            initialized: AtomicBool::new(false),
            running,
            request_timeout,
            io_handle: Mutex::new(Some(io_handle)),
        }
    }

    /// Request timeout in effect for this client
    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    /// Check if the client is initialized
    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    /// Check if the underlying connection is still alive
    pub fn is_connected(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Get server info
    pub async fn server_info(&self) -> Option<McpServerInfo> {
        self.server_info.read().await.clone()
    }

    /// Get the tools returned by the last `tools/list`
    pub async fn cached_tools(&self) -> Vec<McpTool> {
        self.tools.read().await.clone()
    }

    /// Close the connection. Safe to call more than once.
    pub async fn close(&self) -> Result<(), McpError> {
        self.initialized.store(false, Ordering::SeqCst);

        let (done, done_rx) = oneshot::channel();
        let outcome = if self.commands.send(IoCommand::Shutdown { done }).await.is_ok() {
            done_rx.await.unwrap_or(Ok(()))
        } else {
            Ok(())
        };

        let handle = self.io_handle.lock().take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }

        outcome
    }

    /// Make a request and wait for its response
    pub(crate) async fn call<T>(&self, method: &str, params: Option<Value>) -> Result<T, McpError>
    where
        T: serde::de::DeserializeOwned,
    {
        let id = self.next_request_id();
        let key = id.to_string();

        let mut request = McpRequest::new(id, method);
        if let Some(p) = params {
            request = request.with_params(p);
        }

        let (reply, reply_rx) = oneshot::channel();
        self.commands
            .send(IoCommand::Request {
                id: key.clone(),
                message: McpMessage::Request(request),
                reply,
            })
            .await
            .map_err(|_| McpError::connection("Connection closed"))?;

        let response = match timeout(self.request_timeout, reply_rx).await {
            Ok(Ok(result)) => result?,
            Ok(Err(_)) => return Err(McpError::connection("Response channel closed")),
            Err(_) => {
                let _ = self.commands.try_send(IoCommand::Forget { id: key });
                return Err(McpError::timeout(self.request_timeout));
            }
        };

        match response.into_result() {
            Ok(value) => serde_json::from_value(value).map_err(McpError::from),
            Err(e) => Err(McpError::server(e.code, e.message)),
        }
    }

    /// Send a notification (no response expected)
    pub(crate) async fn notify(&self, method: &str) -> Result<(), McpError> {
        let (ack, ack_rx) = oneshot::channel();
        self.commands
            .send(IoCommand::Notify {
                message: McpMessage::Notification(McpNotification::new(method)),
                ack,
            })
            .await
            .map_err(|_| McpError::connection("Connection closed"))?;

        ack_rx
            .await
            .map_err(|_| McpError::connection("Connection closed"))?
    }

    fn next_request_id(&self) -> RequestId {
        let id = self.request_id.fetch_add(1, Ordering::SeqCst);
        match i64::try_from(id) {
            Ok(n) => RequestId::Number(n),
            Err(_) => RequestId::String(format!("req-{}", id)),
        }
    }

    pub(crate) fn ensure_initialized(&self) -> Result<(), McpError> {
        if !self.is_initialized() {
            return Err(McpError::NotInitialized);
        }
        Ok(())
    }

    pub(crate) fn mark_initialized(&self) {
        self.initialized.store(true, Ordering::SeqCst);
    }

    pub(crate) fn server_info_slot(&self) -> &RwLock<Option<McpServerInfo>> {
        &self.server_info
    }

    pub(crate) fn tools_slot(&self) -> &RwLock<Vec<McpTool>> {
        &self.tools
    }
}

impl Drop for McpClient {
    fn drop(&mut self) {
        if let Some(handle) = self.io_handle.lock().take() {
            handle.abort();
        }
    }
}

#[cfg(test)]
mod tests;
