//! Server registry: lifecycle operations

use super::error::RegistryError;
use super::state::{Lifecycle, ServerSlot};
use super::types::{ServerKind, ServerSnapshot, ServerSpec, ServerStatus, SupervisorTimeouts};
use crate::config::BridgeConfig;
use crate::error::BridgeResult;
use crate::mcp::{McpTool, McpToolResult};
use crate::runtime::{RuntimeDriver, ServerConnection};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use futures::future::join_all;
use serde_json::Value;
use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};

/// Registry of managed servers.
///
/// Lifecycle operations on one server are serialized by a per-server lock;
/// operations on different servers run in parallel. The registry is an
/// explicit context object: build one at startup and share it by `Arc`.
pub struct ServerRegistry {
    servers: DashMap<String, Arc<ServerSlot>>,
    driver: Arc<dyn RuntimeDriver>,
    timeouts: SupervisorTimeouts,
    closed: AtomicBool,
}

impl ServerRegistry {
    /// Create an empty registry with default timeouts
    pub fn new(driver: Arc<dyn RuntimeDriver>) -> Self {
        Self::with_timeouts(driver, SupervisorTimeouts::default())
    }

    /// Create an empty registry with custom timeouts
    pub fn with_timeouts(driver: Arc<dyn RuntimeDriver>, timeouts: SupervisorTimeouts) -> Self {
        Self {
            servers: DashMap::new(),
            driver,
            timeouts,
            closed: AtomicBool::new(false),
        }
    }

    /// Build a registry and register every enabled server from the
    /// configuration. Nothing is started.
    pub fn from_config(
        config: &BridgeConfig,
        driver: Arc<dyn RuntimeDriver>,
    ) -> BridgeResult<Self> {
        let registry = Self::with_timeouts(driver, SupervisorTimeouts::from(&config.supervisor));

        for (name, server) in config.enabled_servers() {
            let spec = server.to_spec(name)?;
            if let Err(e) = registry.add(spec) {
                warn!("Skipping server '{}': {}", name, e);
            }
        }

        Ok(registry)
    }

    /// Timeouts applied to driver and connection calls
    pub fn timeouts(&self) -> SupervisorTimeouts {
        self.timeouts
    }

    /// Whether `close` has run
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Register a server in `stopped` state
    pub fn add(&self, spec: ServerSpec) -> Result<(), RegistryError> {
        self.ensure_open()?;

        match self.servers.entry(spec.name.clone()) {
            Entry::Occupied(_) => Err(RegistryError::already_exists(spec.name)),
            Entry::Vacant(entry) => {
                let unit = self.driver.unit_name(&spec);
                debug!("Registered server '{}' ({}, unit {})", spec.name, spec.kind, unit);
                entry.insert(Arc::new(ServerSlot::new(spec, unit)));
                Ok(())
            }
        }
    }

    /// Drop the bookkeeping entry without stopping anything.
    ///
    /// Use [`ServerRegistry::remove_completely`] for an orderly teardown.
    pub fn remove(&self, name: &str) -> Result<ServerSpec, RegistryError> {
        self.ensure_open()?;

        let (_, slot) = self
            .servers
            .remove(name)
            .ok_or_else(|| RegistryError::not_found(name))?;
        slot.retire();
        debug!("Removed server '{}' from the registry", name);
        Ok(slot.spec.clone())
    }

    pub fn has_server(&self, name: &str) -> bool {
        self.servers.contains_key(name)
    }

    /// Registered server names, sorted
    pub fn server_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.servers.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.servers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.servers.is_empty()
    }

    /// Snapshot of one server
    pub async fn server(&self, name: &str) -> Option<ServerSnapshot> {
        let slot = self.servers.get(name).map(|e| Arc::clone(e.value()))?;
        Some(slot.snapshot().await)
    }

    /// Snapshots of every server, sorted by name
    pub async fn servers(&self) -> Vec<ServerSnapshot> {
        let mut snapshots = Vec::new();
        for slot in self.slots() {
            snapshots.push(slot.snapshot().await);
        }
        snapshots
    }

    /// Start a server: `stopped|error → installing → running|error`
    #[instrument(skip(self))]
    pub async fn start(&self, name: &str) -> Result<(), RegistryError> {
        self.ensure_open()?;
        let slot = self.slot(name)?;
        let _guard = slot.lock().await?;
        self.start_locked(&slot).await
    }

    /// Stop a server. Idempotent: always ends in `stopped`.
    #[instrument(skip(self))]
    pub async fn stop(&self, name: &str) -> Result<(), RegistryError> {
        self.ensure_open()?;
        let slot = self.slot(name)?;
        let _guard = slot.lock().await?;
        self.stop_locked(&slot).await;
        Ok(())
    }

    /// Stop then start
    #[instrument(skip(self))]
    pub async fn restart(&self, name: &str) -> Result<(), RegistryError> {
        self.ensure_open()?;
        let slot = self.slot(name)?;
        let _guard = slot.lock().await?;
        self.stop_locked(&slot).await;
        self.start_locked(&slot).await
    }

    /// Stop if running, remove the container unit, and drop the entry.
    ///
    /// The entry is removed even when the runtime refuses to remove the
    /// unit; that failure is still returned.
    #[instrument(skip(self))]
    pub async fn remove_completely(&self, name: &str) -> Result<(), RegistryError> {
        self.ensure_open()?;
        let slot = self.slot(name)?;
        let _guard = slot.lock().await?;

        if slot.status().await == ServerStatus::Running {
            self.stop_locked(&slot).await;
        }

        let removal = match slot.spec.kind {
            ServerKind::Container => {
                bounded(self.timeouts.driver, "remove", self.driver.remove(&slot.unit)).await
            }
            ServerKind::Process => Ok(()),
        };

        slot.retire();
        self.servers
            .remove_if(name, |_, current| Arc::ptr_eq(current, &slot));
        info!("Server '{}' removed", name);

        removal.map_err(|message| RegistryError::external(name, message))
    }

    /// Start every stopped server concurrently and report each outcome
    pub async fn start_all(&self) -> Vec<(String, Result<(), RegistryError>)> {
        let mut pending = Vec::new();
        for slot in self.slots() {
            if slot.status().await == ServerStatus::Stopped {
                pending.push(slot.name().to_string());
            }
        }

        let outcomes = join_all(pending.iter().map(|name| self.start(name))).await;
        pending.into_iter().zip(outcomes).collect()
    }

    /// Invoke one operation on a running server
    #[instrument(skip(self, arguments))]
    pub async fn call_operation(
        &self,
        server: &str,
        operation: &str,
        arguments: Value,
    ) -> Result<McpToolResult, RegistryError> {
        self.ensure_open()?;
        let slot = self.slot(server)?;
        let state = slot.state.read().await;

        let Lifecycle::Running { connection, .. } = &state.lifecycle else {
            return Err(RegistryError::not_running(server));
        };
        let stopped = slot.call_token();
        let call = bounded(
            self.timeouts.call,
            operation,
            connection.call_tool(operation, arguments),
        );

        let outcome = tokio::select! {
            result = call => result.map_err(|message| RegistryError::external(server, message)),
            _ = stopped.cancelled() => Err(RegistryError::not_running(server)),
        };
        outcome
    }

    /// Re-list operations over the live connection and store the result
    pub async fn live_tools(&self, server: &str) -> Result<Vec<McpTool>, RegistryError> {
        self.ensure_open()?;
        let slot = self.slot(server)?;
        let state = slot.state.read().await;

        let Lifecycle::Running {
            connection,
            operations,
        } = &state.lifecycle
        else {
            return Err(RegistryError::not_running(server));
        };
        let stopped = slot.call_token();
        let listing = bounded(self.timeouts.call, "tools/list", connection.list_tools());

        let tools = tokio::select! {
            result = listing => result.map_err(|message| RegistryError::external(server, message))?,
            _ = stopped.cancelled() => return Err(RegistryError::not_running(server)),
        };
        *operations.write() = tools.clone();
        Ok(tools)
    }

    pub(crate) fn ensure_open(&self) -> Result<(), RegistryError> {
        if self.is_closed() {
            return Err(RegistryError::Closed);
        }
        Ok(())
    }

    pub(crate) fn driver(&self) -> &Arc<dyn RuntimeDriver> {
        &self.driver
    }

    pub(crate) fn mark_closed(&self) -> bool {
        self.closed.swap(true, Ordering::SeqCst)
    }

    pub(crate) fn clear(&self) {
        for entry in self.servers.iter() {
            entry.value().retire();
        }
        self.servers.clear();
    }

    pub(crate) fn slot(&self, name: &str) -> Result<Arc<ServerSlot>, RegistryError> {
        self.servers
            .get(name)
            .map(|e| Arc::clone(e.value()))
            .ok_or_else(|| RegistryError::not_found(name))
    }

    /// Current entries, sorted by name
    pub(crate) fn slots(&self) -> Vec<Arc<ServerSlot>> {
        let mut slots: Vec<_> = self.servers.iter().map(|e| Arc::clone(e.value())).collect();
        slots.sort_by(|a, b| a.name().cmp(b.name()));
        slots
    }

    /// Caller holds the slot's lifecycle lock
    pub(crate) async fn start_locked(&self, slot: &ServerSlot) -> Result<(), RegistryError> {
        let name = slot.name();
        {
            let mut state = slot.state.write().await;
            if matches!(
                state.lifecycle.status(),
                ServerStatus::Running | ServerStatus::Installing
            ) {
                return Err(RegistryError::already_running(name));
            }
            state.lifecycle = Lifecycle::Installing;
        }
        info!("Starting server '{}' ({})", name, slot.spec.kind);

        match self.bring_up(slot).await {
            Ok((connection, operations)) => {
                let count = operations.len();
                let mut state = slot.state.write().await;
                slot.renew_calls();
                state.lifecycle = Lifecycle::running(connection, operations);
                state.last_error = None;
                info!("Server '{}' running with {} operation(s)", name, count);
                Ok(())
            }
            Err(message) => {
                error!("Server '{}' failed to start: {}", name, message);
                slot.state.write().await.fail(message.clone());
                Err(RegistryError::external(name, message))
            }
        }
    }

    /// Caller holds the slot's lifecycle lock
    pub(crate) async fn stop_locked(&self, slot: &ServerSlot) {
        let name = slot.name();
        slot.cancel_calls();
        let connection = slot.state.write().await.lifecycle.replace(Lifecycle::Stopped);

        if let Some(connection) = connection {
            self.close_connection(name, connection).await;
        }

        if let ServerKind::Container = slot.spec.kind {
            if let Err(message) =
                bounded(self.timeouts.driver, "stop", self.driver.stop(&slot.unit)).await
            {
                warn!("Could not stop unit '{}': {}", slot.unit, message);
            }
        }

        info!("Server '{}' stopped", name);
    }

    pub(crate) async fn close_connection(&self, name: &str, connection: Box<dyn ServerConnection>) {
        if let Err(message) = bounded(self.timeouts.shutdown, "close", connection.close()).await {
            warn!("Error closing connection to '{}': {}", name, message);
        }
    }

    async fn bring_up(
        &self,
        slot: &ServerSlot,
    ) -> Result<(Box<dyn ServerConnection>, Vec<McpTool>), String> {
        let connection =
            bounded(self.timeouts.startup, "launch", self.driver.launch(&slot.spec)).await?;

        match bounded(self.timeouts.call, "tools/list", connection.list_tools()).await {
            Ok(operations) => Ok((connection, operations)),
            Err(message) => {
                self.close_connection(slot.name(), connection).await;
                Err(message)
            }
        }
    }
}

/// Run an external call under a deadline, flattening failures into a message
pub(crate) async fn bounded<T, E, F>(limit: Duration, what: &str, call: F) -> Result<T, String>
where
    F: Future<Output = Result<T, E>>,
    E: Display,
{
    match tokio::time::timeout(limit, call).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(format!("{} failed: {}", what, e)),
        Err(_) => Err(format!("{} timed out after {:?}", what, limit)),
    }
}
