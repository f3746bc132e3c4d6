//! Background health supervision

use super::server::ServerRegistry;
use super::types::ServerHealthCheck;
use crate::config::HealthConfig;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Notified after the monitor brought servers back to `running`
#[async_trait]
pub trait RecoveryListener: Send + Sync {
    async fn servers_recovered(&self, registry: &ServerRegistry, names: &[String]);
}

/// Outcome of one monitor pass
#[derive(Debug, Clone, Default)]
pub struct MonitorTick {
    pub checks: BTreeMap<String, ServerHealthCheck>,
    pub recovered: Vec<String>,
}

impl MonitorTick {
    pub fn unhealthy(&self) -> impl Iterator<Item = (&String, &ServerHealthCheck)> {
        self.checks.iter().filter(|(_, check)| !check.healthy)
    }
}

/// Periodically reconciles health and optionally restarts failed servers
pub struct HealthMonitor {
    registry: Arc<ServerRegistry>,
    interval: Duration,
    auto_restart: bool,
    listener: Option<Arc<dyn RecoveryListener>>,
}

impl HealthMonitor {
    pub fn new(registry: Arc<ServerRegistry>, interval: Duration) -> Self {
        Self {
            registry,
            interval,
            auto_restart: false,
            listener: None,
        }
    }

    pub fn from_config(registry: Arc<ServerRegistry>, config: &HealthConfig) -> Self {
        Self::new(registry, config.interval).with_auto_restart(config.auto_restart)
    }

    pub fn with_auto_restart(mut self, enabled: bool) -> Self {
        self.auto_restart = enabled;
        self
    }

    pub fn with_listener(mut self, listener: Arc<dyn RecoveryListener>) -> Self {
        self.listener = Some(listener);
        self
    }

    /// Run one pass: health check, then auto-restart when enabled
    pub async fn tick(&self) -> MonitorTick {
        let checks = self.registry.health_check_all().await;
        for (name, check) in checks.iter().filter(|(_, c)| !c.healthy) {
            warn!(
                status = %check.status,
                "Server '{}' unhealthy: {}",
                name,
                check.issues.join("; ")
            );
        }

        let recovered = if self.auto_restart {
            self.registry.auto_restart().await
        } else {
            Vec::new()
        };

        if !recovered.is_empty() {
            info!("Recovered server(s): {}", recovered.join(", "));
            if let Some(listener) = &self.listener {
                listener
                    .servers_recovered(&self.registry, &recovered)
                    .await;
            }
        }

        MonitorTick { checks, recovered }
    }

    /// Run until `shutdown` is cancelled or the registry closes
    pub async fn run(self, shutdown: CancellationToken) {
        let mut ticker = tokio::time::interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!("Health monitor started (every {:?})", self.interval);

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    if self.registry.is_closed() {
                        break;
                    }
                    let tick = self.tick().await;
                    debug!(
                        "Health pass: {} checked, {} unhealthy, {} recovered",
                        tick.checks.len(),
                        tick.unhealthy().count(),
                        tick.recovered.len()
                    );
                }
            }
        }

        info!("Health monitor stopped");
    }

    /// Spawn [`HealthMonitor::run`] on the current runtime
    pub fn spawn(self, shutdown: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }
}
