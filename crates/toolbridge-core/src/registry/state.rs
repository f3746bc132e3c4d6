//! Per-server lifecycle state

use super::error::RegistryError;
use super::types::{HealthReport, ServerSnapshot, ServerSpec, ServerStatus};
use crate::mcp::McpTool;
use crate::runtime::ServerConnection;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::{Mutex, MutexGuard, RwLock};
use tokio_util::sync::CancellationToken;

/// Lifecycle state. The connection only exists in `Running`.
///
/// The operation list has its own lock so a refresh never needs the
/// state write lock.
pub(crate) enum Lifecycle {
    Stopped,
    Installing,
    Running {
        connection: Box<dyn ServerConnection>,
        operations: parking_lot::RwLock<Vec<McpTool>>,
    },
    Error,
}

impl Lifecycle {
    pub(crate) fn status(&self) -> ServerStatus {
        match self {
            Lifecycle::Stopped => ServerStatus::Stopped,
            Lifecycle::Installing => ServerStatus::Installing,
            Lifecycle::Running { .. } => ServerStatus::Running,
            Lifecycle::Error => ServerStatus::Error,
        }
    }

    pub(crate) fn running(
        connection: Box<dyn ServerConnection>,
        operations: Vec<McpTool>,
    ) -> Self {
        Lifecycle::Running {
            connection,
            operations: parking_lot::RwLock::new(operations),
        }
    }

    pub(crate) fn operation_count(&self) -> usize {
        match self {
            Lifecycle::Running { operations, .. } => operations.read().len(),
            _ => 0,
        }
    }

    pub(crate) fn operation_names(&self) -> Vec<String> {
        match self {
            Lifecycle::Running { operations, .. } => {
                operations.read().iter().map(|t| t.name.clone()).collect()
            }
            _ => Vec::new(),
        }
    }

    /// Move to `next`, handing back a live connection if there was one
    pub(crate) fn replace(&mut self, next: Lifecycle) -> Option<Box<dyn ServerConnection>> {
        match std::mem::replace(self, next) {
            Lifecycle::Running { connection, .. } => Some(connection),
            _ => None,
        }
    }
}

pub(crate) struct ServerState {
    pub(crate) lifecycle: Lifecycle,
    pub(crate) last_error: Option<String>,
}

impl ServerState {
    pub(crate) fn report(&self) -> HealthReport {
        HealthReport {
            status: self.lifecycle.status(),
            operation_count: self.lifecycle.operation_count(),
            last_error: self.last_error.clone(),
        }
    }

    /// Record a failure; any live connection is handed back for closing
    pub(crate) fn fail(&mut self, message: impl Into<String>) -> Option<Box<dyn ServerConnection>> {
        self.last_error = Some(message.into());
        self.lifecycle.replace(Lifecycle::Error)
    }
}

/// One registry entry.
///
/// `lifecycle` serializes state transitions for this server. `state` is
/// read by in-flight operation calls; `calls` is cancelled before any
/// transition takes the write lock so those readers let go first.
pub(crate) struct ServerSlot {
    pub(crate) spec: ServerSpec,
    pub(crate) unit: String,
    lifecycle: Mutex<()>,
    pub(crate) state: RwLock<ServerState>,
    calls: parking_lot::Mutex<CancellationToken>,
    retired: AtomicBool,
}

impl ServerSlot {
    pub(crate) fn new(spec: ServerSpec, unit: String) -> Self {
        Self {
            spec,
            unit,
            lifecycle: Mutex::new(()),
            state: RwLock::new(ServerState {
                lifecycle: Lifecycle::Stopped,
                last_error: None,
            }),
            calls: parking_lot::Mutex::new(CancellationToken::new()),
            retired: AtomicBool::new(false),
        }
    }

    pub(crate) fn name(&self) -> &str {
        &self.spec.name
    }

    /// Take the lifecycle lock. Fails if the entry was removed while waiting.
    pub(crate) async fn lock(&self) -> Result<MutexGuard<'_, ()>, RegistryError> {
        let guard = self.lifecycle.lock().await;
        if self.is_retired() {
            return Err(RegistryError::not_found(self.name()));
        }
        Ok(guard)
    }

    /// Token for calls over the current connection. Read it while holding
    /// `state`, so it belongs to the connection seen there.
    pub(crate) fn call_token(&self) -> CancellationToken {
        self.calls.lock().clone()
    }

    /// Abort in-flight calls. Later calls get the cancelled token until
    /// the next connection arrives.
    pub(crate) fn cancel_calls(&self) {
        self.calls.lock().cancel();
    }

    /// Fresh token for a new connection. Caller holds the `state` write lock.
    pub(crate) fn renew_calls(&self) {
        *self.calls.lock() = CancellationToken::new();
    }

    pub(crate) fn retire(&self) {
        self.retired.store(true, Ordering::SeqCst);
    }

    pub(crate) fn is_retired(&self) -> bool {
        self.retired.load(Ordering::SeqCst)
    }

    pub(crate) async fn status(&self) -> ServerStatus {
        self.state.read().await.lifecycle.status()
    }

    pub(crate) async fn snapshot(&self) -> ServerSnapshot {
        let state = self.state.read().await;
        ServerSnapshot {
            name: self.spec.name.clone(),
            kind: self.spec.kind,
            launch: self.spec.launch.clone(),
            unit: self.unit.clone(),
            status: state.lifecycle.status(),
            operations: state.lifecycle.operation_names(),
            last_error: state.last_error.clone(),
        }
    }
}
