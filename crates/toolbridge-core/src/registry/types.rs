//! Registry data types

use crate::config::SupervisorConfig;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

/// How a server is hosted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ServerKind {
    /// Spawned subprocess
    #[default]
    Process,
    /// Container run through the runtime CLI
    Container,
}

impl fmt::Display for ServerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerKind::Process => write!(f, "process"),
            ServerKind::Container => write!(f, "container"),
        }
    }
}

/// Immutable description of a managed server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerSpec {
    /// Unique key within the registry
    pub name: String,
    pub kind: ServerKind,
    /// Executable and arguments, or image and arguments for containers
    pub launch: Vec<String>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub env: HashMap<String, String>,
}

impl ServerSpec {
    /// Create a spec
    pub fn new(name: impl Into<String>, kind: ServerKind, launch: Vec<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            launch,
            env: HashMap::new(),
        }
    }

    /// Create a process-kind spec
    pub fn process(name: impl Into<String>, launch: Vec<String>) -> Self {
        Self::new(name, ServerKind::Process, launch)
    }

    /// Create a container-kind spec; `launch[0]` is the image
    pub fn container(name: impl Into<String>, launch: Vec<String>) -> Self {
        Self::new(name, ServerKind::Container, launch)
    }

    /// Set environment variables passed to the server
    pub fn with_env(mut self, env: HashMap<String, String>) -> Self {
        self.env = env;
        self
    }

    pub fn is_container(&self) -> bool {
        self.kind == ServerKind::Container
    }
}

/// Lifecycle status of a managed server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServerStatus {
    Stopped,
    Installing,
    Running,
    Error,
}

impl fmt::Display for ServerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerStatus::Stopped => write!(f, "stopped"),
            ServerStatus::Installing => write!(f, "installing"),
            ServerStatus::Running => write!(f, "running"),
            ServerStatus::Error => write!(f, "error"),
        }
    }
}

/// Result of a reconciling health check for one server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    pub status: ServerStatus,
    pub operation_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

/// Per-server entry of `health_check_all`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerHealthCheck {
    pub status: ServerStatus,
    pub healthy: bool,
    pub operation_count: usize,
    #[serde(default)]
    pub issues: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

impl From<HealthReport> for ServerHealthCheck {
    fn from(report: HealthReport) -> Self {
        let mut issues = Vec::new();
        match report.status {
            ServerStatus::Running if report.operation_count == 0 => {
                issues.push("running but advertises no operations".to_string());
            }
            ServerStatus::Running | ServerStatus::Stopped => {}
            ServerStatus::Error => issues.push(format!(
                "server is in error state: {}",
                report.last_error.as_deref().unwrap_or("unknown error")
            )),
            ServerStatus::Installing => issues.push("server is still starting".to_string()),
        }

        Self {
            status: report.status,
            healthy: issues.is_empty(),
            operation_count: report.operation_count,
            issues,
            last_error: report.last_error,
        }
    }
}

/// Aggregate counts across the registry
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryStats {
    pub total: usize,
    pub running: usize,
    pub stopped: usize,
    pub error: usize,
    pub installing: usize,
    pub total_tools: usize,
}

impl RegistryStats {
    pub(crate) fn record(&mut self, status: ServerStatus, operations: usize) {
        self.total += 1;
        self.total_tools += operations;
        match status {
            ServerStatus::Running => self.running += 1,
            ServerStatus::Stopped => self.stopped += 1,
            ServerStatus::Error => self.error += 1,
            ServerStatus::Installing => self.installing += 1,
        }
    }
}

/// Point-in-time view of one server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerSnapshot {
    pub name: String,
    pub kind: ServerKind,
    pub launch: Vec<String>,
    pub unit: String,
    pub status: ServerStatus,
    pub operations: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

/// Timeouts applied to driver and connection calls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SupervisorTimeouts {
    /// Launch plus handshake
    pub startup: Duration,
    /// Closing a connection
    pub shutdown: Duration,
    /// Status/stop/remove against the runtime
    pub driver: Duration,
    /// Operation listing and invocation
    pub call: Duration,
}

impl Default for SupervisorTimeouts {
    fn default() -> Self {
        Self {
            startup: Duration::from_secs(30),
            shutdown: Duration::from_secs(10),
            driver: Duration::from_secs(30),
            call: Duration::from_secs(60),
        }
    }
}

impl From<&SupervisorConfig> for SupervisorTimeouts {
    fn from(config: &SupervisorConfig) -> Self {
        Self {
            startup: config.startup_timeout,
            shutdown: config.shutdown_timeout,
            driver: config.driver_timeout,
            call: config.call_timeout,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_check_flags_running_without_operations() {
        let check = ServerHealthCheck::from(HealthReport {
            status: ServerStatus::Running,
            operation_count: 0,
            last_error: None,
        });
        assert!(!check.healthy);
        assert_eq!(check.issues.len(), 1);

        let check = ServerHealthCheck::from(HealthReport {
            status: ServerStatus::Running,
            operation_count: 3,
            last_error: None,
        });
        assert!(check.healthy);
        assert!(check.issues.is_empty());
    }

    #[test]
    fn test_health_check_stopped_server_is_healthy() {
        let check = ServerHealthCheck::from(HealthReport {
            status: ServerStatus::Stopped,
            operation_count: 0,
            last_error: None,
        });
        assert!(check.healthy);
        assert!(check.issues.is_empty());
    }

    #[test]
    fn test_health_check_error_mentions_last_error() {
        let check = ServerHealthCheck::from(HealthReport {
            status: ServerStatus::Error,
            operation_count: 0,
            last_error: Some("unit not running".to_string()),
        });
        assert!(!check.healthy);
        assert!(check.issues[0].contains("unit not running"));
    }

    #[test]
    fn test_stats_serialize_camel_case() {
        let mut stats = RegistryStats::default();
        stats.record(ServerStatus::Running, 2);
        stats.record(ServerStatus::Error, 0);

        let json = serde_json::to_value(stats).unwrap();
        assert_eq!(json["total"], 2);
        assert_eq!(json["totalTools"], 2);
        assert_eq!(json["error"], 1);
    }

    #[test]
    fn test_spec_kind_parses_lowercase() {
        let spec: ServerSpec = serde_json::from_value(serde_json::json!({
            "name": "fs",
            "kind": "container",
            "launch": ["ghcr.io/acme/fs:1"]
        }))
        .unwrap();
        assert!(spec.is_container());
        assert!(spec.env.is_empty());
    }
}
