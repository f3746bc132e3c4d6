//! Health reconciliation and batch maintenance

use super::error::RegistryError;
use super::server::{ServerRegistry, bounded};
use super::state::{Lifecycle, ServerSlot};
use super::types::{HealthReport, RegistryStats, ServerHealthCheck, ServerStatus};
use crate::runtime::UnitStatus;
use futures::future::join_all;
use std::collections::BTreeMap;
use tracing::{debug, info, instrument, warn};

/// `last_error` recorded when the runtime no longer runs a unit
pub const UNIT_NOT_RUNNING: &str = "unit not running";

/// `last_error` recorded when a running server's control channel died
pub const CONNECTION_LOST: &str = "connection closed";

impl ServerRegistry {
    /// Report a server's health, reconciling it with reality first.
    ///
    /// This is not a pure read: a running server whose connection has died,
    /// or a running container the runtime reports as not running, is moved
    /// to `error` and its connection closed. A runtime that cannot be
    /// queried leaves the status untouched.
    #[instrument(skip(self))]
    pub async fn reconcile_health(&self, name: &str) -> Result<HealthReport, RegistryError> {
        self.ensure_open()?;
        let slot = self.slot(name)?;

        // Only running servers can drift; skip the lock otherwise
        if slot.status().await == ServerStatus::Running {
            let _guard = slot.lock().await?;
            self.reconcile_locked(&slot).await;
        }

        let report = slot.state.read().await.report();
        Ok(report)
    }

    /// Reconciling health check of every server.
    ///
    /// Servers are checked concurrently; one failing check never aborts the
    /// others. A running server that advertises no operations is unhealthy.
    pub async fn health_check_all(&self) -> BTreeMap<String, ServerHealthCheck> {
        let names = self.server_names();
        let reports = join_all(names.iter().map(|name| self.reconcile_health(name))).await;

        names
            .into_iter()
            .zip(reports)
            .filter_map(|(name, report)| match report {
                Ok(report) => Some((name, ServerHealthCheck::from(report))),
                Err(e) => {
                    debug!("Skipping health of '{}': {}", name, e);
                    None
                }
            })
            .collect()
    }

    /// Counts per status and the total number of advertised operations
    pub async fn stats(&self) -> RegistryStats {
        let mut stats = RegistryStats::default();
        for slot in self.slots() {
            let state = slot.state.read().await;
            stats.record(state.lifecycle.status(), state.lifecycle.operation_count());
        }
        stats
    }

    /// Restart every server that is in `error` right now.
    ///
    /// Returns the names that came back to `running`. Failures are logged and
    /// do not hold up the other restarts.
    pub async fn auto_restart(&self) -> Vec<String> {
        if self.is_closed() {
            return Vec::new();
        }

        let mut failed = Vec::new();
        for slot in self.slots() {
            if slot.status().await == ServerStatus::Error {
                failed.push(slot);
            }
        }
        if failed.is_empty() {
            return Vec::new();
        }

        info!("Restarting {} failed server(s)", failed.len());
        let outcomes = join_all(failed.iter().map(|slot| self.restart_failed(slot))).await;

        failed
            .iter()
            .zip(outcomes)
            .filter(|(_, recovered)| *recovered)
            .map(|(slot, _)| slot.name().to_string())
            .collect()
    }

    /// Remove container units of stopped servers that the runtime also
    /// reports as stopped. Returns the names cleaned.
    pub async fn cleanup(&self) -> Vec<String> {
        if self.is_closed() {
            return Vec::new();
        }
        self.cleanup_units().await
    }

    /// Stop every running server, clean up units, and drop all entries.
    ///
    /// Terminal: every later lifecycle call fails with `Closed`.
    pub async fn close(&self) {
        if self.mark_closed() {
            return;
        }

        let slots = self.slots();
        info!("Closing registry with {} server(s)", slots.len());

        join_all(slots.iter().map(|slot| async move {
            if let Ok(_guard) = slot.lock().await {
                if slot.status().await == ServerStatus::Running {
                    self.stop_locked(slot).await;
                }
            }
        }))
        .await;

        let cleaned = self.cleanup_units().await;
        if !cleaned.is_empty() {
            debug!("Removed units for: {}", cleaned.join(", "));
        }

        self.clear();
    }

    /// Caller holds the slot's lifecycle lock
    async fn reconcile_locked(&self, slot: &ServerSlot) {
        let connection_alive = {
            let state = slot.state.read().await;
            match &state.lifecycle {
                Lifecycle::Running { connection, .. } => connection.is_alive(),
                _ => return,
            }
        };

        let drift = if !connection_alive {
            Some(CONNECTION_LOST)
        } else if slot.spec.is_container() {
            match bounded(
                self.timeouts().driver,
                "status",
                self.driver().status(&slot.unit),
            )
            .await
            {
                Ok(UnitStatus::Running) => None,
                Ok(status) => {
                    debug!("Unit '{}' reported {}", slot.unit, status);
                    Some(UNIT_NOT_RUNNING)
                }
                Err(message) => {
                    warn!("Could not query unit '{}': {}", slot.unit, message);
                    None
                }
            }
        } else {
            None
        };

        if let Some(reason) = drift {
            warn!("Server '{}' marked as failed: {}", slot.name(), reason);
            slot.cancel_calls();
            let connection = slot.state.write().await.fail(reason);
            if let Some(connection) = connection {
                self.close_connection(slot.name(), connection).await;
            }
        }
    }

    async fn restart_failed(&self, slot: &ServerSlot) -> bool {
        let Ok(_guard) = slot.lock().await else {
            return false;
        };
        // Someone else may have dealt with it while we waited
        if slot.status().await != ServerStatus::Error {
            return false;
        }

        self.stop_locked(slot).await;
        match self.start_locked(slot).await {
            Ok(()) => true,
            Err(e) => {
                warn!("Auto-restart of '{}' failed: {}", slot.name(), e);
                false
            }
        }
    }

    async fn cleanup_units(&self) -> Vec<String> {
        let mut cleaned = Vec::new();

        for slot in self.slots() {
            if !slot.spec.is_container() {
                continue;
            }
            let Ok(_guard) = slot.lock().await else {
                continue;
            };
            if slot.status().await != ServerStatus::Stopped {
                continue;
            }

            let timeout = self.timeouts().driver;
            match bounded(timeout, "status", self.driver().status(&slot.unit)).await {
                Ok(UnitStatus::Stopped) => {
                    match bounded(timeout, "remove", self.driver().remove(&slot.unit)).await {
                        Ok(()) => {
                            debug!("Removed stopped unit '{}'", slot.unit);
                            cleaned.push(slot.name().to_string());
                        }
                        Err(message) => warn!("Could not remove unit '{}': {}", slot.unit, message),
                    }
                }
                Ok(_) => {}
                Err(message) => warn!("Could not query unit '{}': {}", slot.unit, message),
            }
        }

        cleaned
    }
}
