//! Background I/O task for the MCP client
//!
//! The task owns the transport exclusively. Outgoing messages arrive as
//! commands; incoming responses are routed to the waiting caller by id.

use super::super::error::McpError;
use super::super::protocol::{McpMessage, McpResponse, McpRpcError, methods};
use super::super::transport::McpTransport;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, warn};

pub(super) type ResponseSender = oneshot::Sender<Result<McpResponse, McpError>>;

/// Commands sent from the client handle to the I/O task
pub(super) enum IoCommand {
    /// Send a request and route its response to `reply`
    Request {
        id: String,
        message: McpMessage,
        reply: ResponseSender,
    },
    /// Send a notification; `ack` reports the write outcome
    Notify {
        message: McpMessage,
        ack: oneshot::Sender<Result<(), McpError>>,
    },
    /// Drop interest in a request that timed out
    Forget { id: String },
    /// Close the transport and stop the task
    Shutdown {
        done: oneshot::Sender<Result<(), McpError>>,
    },
}

pub(super) async fn run(
    mut transport: Box<dyn McpTransport>,
    mut commands: mpsc::Receiver<IoCommand>,
    running: Arc<AtomicBool>,
) {
    let mut pending: HashMap<String, ResponseSender> = HashMap::new();

    loop {
        tokio::select! {
            cmd = commands.recv() => {
                match cmd {
                    Some(IoCommand::Request { id, message, reply }) => {
                        match transport.send(message).await {
                            Ok(()) => {
                                pending.insert(id, reply);
                            }
                            Err(e) => {
                                let _ = reply.send(Err(e));
                            }
                        }
                    }
                    Some(IoCommand::Notify { message, ack }) => {
                        let _ = ack.send(transport.send(message).await);
                    }
                    Some(IoCommand::Forget { id }) => {
                        pending.remove(&id);
                    }
                    Some(IoCommand::Shutdown { done }) => {
                        fail_pending(&mut pending, &McpError::connection("Connection closed"));
                        let _ = done.send(transport.close().await);
                        break;
                    }
                    None => {
                        debug!("MCP client handle dropped, closing transport");
                        let _ = transport.close().await;
                        break;
                    }
                }
            }
            result = transport.receive() => {
                match result {
                    Ok(McpMessage::Response(response)) => {
                        let id = response.id.to_string();
                        match pending.remove(&id) {
                            Some(sender) => {
                                if sender.send(Ok(response)).is_err() {
                                    warn!("Caller for request {} went away", id);
                                }
                            }
                            None => warn!("Received response for unknown request: {}", id),
                        }
                    }
                    Ok(McpMessage::Notification(notification)) => {
                        debug!("Received notification: {}", notification.method);
                    }
                    Ok(McpMessage::Request(request)) => {
                        let reply = if request.method == methods::PING {
                            McpResponse::success(request.id, json!({}))
                        } else {
                            warn!("Rejecting server request: {}", request.method);
                            McpResponse::error(request.id, McpRpcError::method_not_found())
                        };
                        if let Err(e) = transport.send(McpMessage::Response(reply)).await {
                            warn!("Failed to answer server request: {}", e);
                        }
                    }
                    Err(e) => {
                        if running.load(Ordering::SeqCst) {
                            error!("MCP connection failed: {}", e);
                        }
                        fail_pending(&mut pending, &e);
                        break;
                    }
                }
            }
        }
    }

    running.store(false, Ordering::SeqCst);
}

fn fail_pending(pending: &mut HashMap<String, ResponseSender>, cause: &McpError) {
    for (id, sender) in pending.drain() {
        debug!("Failing pending request {}: {}", id, cause);
        let _ = sender.send(Err(cause.clone()));
    }
}
