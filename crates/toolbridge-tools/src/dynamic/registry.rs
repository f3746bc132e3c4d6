//! Dynamic tool registry
//!
//! Publishes one proxy per live operation of a managed server into the
//! host capability table and keeps track of which identifiers belong to
//! which server.

use super::proxy::{Bookkeeping, ProxyTool};
use super::types::{DynamicToolState, DynamicToolStats, proxy_identifier};
use async_trait::async_trait;
use chrono::Utc;
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use toolbridge_core::{CapabilityTable, RecoveryListener, ServerRegistry};
use tracing::{debug, info, instrument, warn};

/// Tracks proxies published on behalf of managed servers.
///
/// The capability table cannot retract entries, so removing a server only
/// drops its bookkeeping. Proxies left behind in the table answer with
/// `TOOL_GHOST`.
#[derive(Clone)]
pub struct DynamicToolRegistry {
    registry: Arc<ServerRegistry>,
    table: Arc<dyn CapabilityTable>,
    registered: Bookkeeping,
}

impl DynamicToolRegistry {
    pub fn new(registry: Arc<ServerRegistry>, table: Arc<dyn CapabilityTable>) -> Self {
        Self {
            registry,
            table,
            registered: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Publish a proxy for every live operation of `server`.
    ///
    /// Returns the number of proxies published. A server that is not
    /// running, or whose listing fails, is logged and skipped.
    #[instrument(skip(self))]
    pub async fn add_server_tools(&self, server: &str) -> usize {
        self.publish(server).await.unwrap_or(0)
    }

    /// Re-list a server's operations and republish them.
    ///
    /// The new identifier set replaces the old one in a single step, so
    /// proxies that survive the refresh never look unregistered. A server
    /// that can no longer be listed loses its bookkeeping.
    pub async fn refresh_server_tools(&self, server: &str) -> usize {
        match self.publish(server).await {
            Some(count) => count,
            None => {
                self.remove_server_tools(server);
                0
            }
        }
    }

    async fn publish(&self, server: &str) -> Option<usize> {
        let operations = match self.registry.live_tools(server).await {
            Ok(operations) => operations,
            Err(e) => {
                warn!("Cannot publish tools for server '{}': {}", server, e);
                return None;
            }
        };

        let mut identifiers = Vec::with_capacity(operations.len());
        for operation in operations {
            let identifier = proxy_identifier(server, &operation.name);
            if identifiers.contains(&identifier) {
                continue;
            }
            identifiers.push(identifier);

            let proxy = ProxyTool::new(
                server,
                operation,
                Arc::clone(&self.registry),
                Arc::clone(&self.registered),
            );
            self.table.publish(Arc::new(proxy));
        }

        let count = identifiers.len();
        self.registered.write().insert(server.to_string(), identifiers);
        info!("Published {} tools for server '{}'", count, server);
        Some(count)
    }

    /// Drop the bookkeeping for `server`, returning its identifiers
    pub fn remove_server_tools(&self, server: &str) -> Vec<String> {
        let removed = self.registered.write().remove(server).unwrap_or_default();
        if !removed.is_empty() {
            debug!("Unregistered {} tools of server '{}'", removed.len(), server);
        }
        removed
    }

    /// Identifiers registered for `server`
    pub fn get_server_tools(&self, server: &str) -> Vec<String> {
        self.registered.read().get(server).cloned().unwrap_or_default()
    }

    /// Every registered identifier, sorted
    pub fn get_all_dynamic_tools(&self) -> Vec<String> {
        let mut all: Vec<String> = self.registered.read().values().flatten().cloned().collect();
        all.sort();
        all
    }

    pub fn is_tool_registered(&self, identifier: &str) -> bool {
        self.registered
            .read()
            .values()
            .any(|ids| ids.iter().any(|id| id == identifier))
    }

    pub fn get_stats(&self) -> DynamicToolStats {
        let registered = self.registered.read();
        let tools_by_server: BTreeMap<String, usize> = registered
            .iter()
            .map(|(server, ids)| (server.clone(), ids.len()))
            .collect();

        DynamicToolStats {
            total_servers: tools_by_server.len(),
            total_tools: tools_by_server.values().sum(),
            tools_by_server,
        }
    }

    pub fn export_state(&self) -> DynamicToolState {
        let servers: BTreeMap<String, Vec<String>> = self
            .registered
            .read()
            .iter()
            .map(|(server, ids)| (server.clone(), ids.clone()))
            .collect();

        DynamicToolState {
            total_tools: servers.values().map(Vec::len).sum(),
            servers,
            exported_at: Utc::now(),
        }
    }

    /// Forget everything; published proxies turn into ghosts
    pub fn clear_all(&self) {
        self.registered.write().clear();
    }
}

#[async_trait]
impl RecoveryListener for DynamicToolRegistry {
    async fn servers_recovered(&self, _registry: &ServerRegistry, names: &[String]) {
        for name in names {
            self.refresh_server_tools(name).await;
        }
    }
}
