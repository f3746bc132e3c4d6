//! Standard I/O transport for MCP
//!
//! Spawns a subprocess and exchanges newline-delimited JSON over its
//! stdin/stdout. The server's stderr is forwarded to `tracing`.

use super::McpTransport;
use crate::mcp::error::McpError;
use crate::mcp::protocol::McpMessage;
use async_trait::async_trait;
use futures::StreamExt;
use std::collections::HashMap;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio_util::codec::{FramedRead, LinesCodec};
use tracing::{debug, warn};

/// Upper bound for a single JSON-RPC line
const MAX_LINE_BYTES: usize = 16 * 1024 * 1024;

/// How long `close` waits for the child to exit after stdin is closed
const EXIT_GRACE: Duration = Duration::from_secs(5);

/// Stdio transport for MCP communication
pub struct StdioTransport {
    child: Option<Child>,
    stdin: Option<ChildStdin>,
    stdout: Option<FramedRead<ChildStdout, LinesCodec>>,
    connected: bool,
}

impl StdioTransport {
    /// Spawn a new MCP server process
    pub async fn spawn(
        command: impl AsRef<str>,
        args: &[impl AsRef<str>],
    ) -> Result<Self, McpError> {
        Self::spawn_with_env(command, args, &HashMap::new()).await
    }

    /// Spawn with extra environment variables
    pub async fn spawn_with_env(
        command: impl AsRef<str>,
        args: &[impl AsRef<str>],
        env: &HashMap<String, String>,
    ) -> Result<Self, McpError> {
        let program = command.as_ref();
        let mut cmd = Command::new(program);

        cmd.args(args.iter().map(|a| a.as_ref()))
            .envs(env)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = cmd.spawn().map_err(|e| {
            McpError::connection(format!("Failed to spawn MCP server '{}': {}", program, e))
        })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| McpError::connection("Failed to get stdin handle"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| McpError::connection("Failed to get stdout handle"))?;

        if let Some(stderr) = child.stderr.take() {
            let label = program.to_string();
            tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    debug!(server = %label, "{}", line);
                }
            });
        }

        Ok(Self {
            child: Some(child),
            stdin: Some(stdin),
            stdout: Some(FramedRead::new(
                stdout,
                LinesCodec::new_with_max_length(MAX_LINE_BYTES),
            )),
            connected: true,
        })
    }
}

#[async_trait]
impl McpTransport for StdioTransport {
    async fn send(&mut self, message: McpMessage) -> Result<(), McpError> {
        let stdin = self.stdin.as_mut().ok_or(McpError::NotInitialized)?;

        let mut line = serde_json::to_string(&message)?;
        line.push('\n');
        stdin.write_all(line.as_bytes()).await?;
        stdin.flush().await?;

        Ok(())
    }

    // Cancel-safe: partial lines stay buffered inside the codec.
    async fn receive(&mut self) -> Result<McpMessage, McpError> {
        let stdout = self.stdout.as_mut().ok_or(McpError::NotInitialized)?;

        loop {
            match stdout.next().await {
                Some(Ok(line)) => {
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }
                    match serde_json::from_str::<McpMessage>(trimmed) {
                        Ok(message) => return Ok(message),
                        // Servers occasionally print banners on stdout.
                        Err(e) => warn!("Skipping non JSON-RPC line from server: {}", e),
                    }
                }
                Some(Err(e)) => return Err(McpError::transport(e.to_string())),
                None => {
                    self.connected = false;
                    return Err(McpError::connection("Connection closed"));
                }
            }
        }
    }

    async fn close(&mut self) -> Result<(), McpError> {
        self.connected = false;

        // Closing stdin signals EOF to the server
        self.stdin.take();
        self.stdout.take();

        if let Some(mut child) = self.child.take() {
            tokio::select! {
                result = child.wait() => {
                    result.map_err(|e| McpError::transport(e.to_string()))?;
                }
                _ = tokio::time::sleep(EXIT_GRACE) => {
                    child.kill().await.ok();
                }
            }
        }

        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }
}

impl Drop for StdioTransport {
    fn drop(&mut self) {
        if let Some(mut child) = self.child.take() {
            let _ = child.start_kill();
        }
    }
}
