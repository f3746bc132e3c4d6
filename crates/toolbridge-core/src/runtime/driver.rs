//! Runtime driver trait

use super::connection::ServerConnection;
use super::error::DriverError;
use crate::registry::ServerSpec;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Status of a unit as reported by the runtime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitStatus {
    Running,
    Stopped,
    NotFound,
}

impl fmt::Display for UnitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnitStatus::Running => write!(f, "running"),
            UnitStatus::Stopped => write!(f, "stopped"),
            UnitStatus::NotFound => write!(f, "not_found"),
        }
    }
}

/// Issues lifecycle commands against the process or container runtime.
///
/// `stop` and `remove` must succeed when the unit is already stopped or
/// absent.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RuntimeDriver: Send + Sync {
    /// Runtime-scoped unit name for a server. Pure and deterministic.
    fn unit_name(&self, spec: &ServerSpec) -> String;

    /// Start the server and return an initialized control channel
    async fn launch(&self, spec: &ServerSpec) -> Result<Box<dyn ServerConnection>, DriverError>;

    /// Query the runtime for a unit's status
    async fn status(&self, unit: &str) -> Result<UnitStatus, DriverError>;

    /// Stop a unit
    async fn stop(&self, unit: &str) -> Result<(), DriverError>;

    /// Remove a unit
    async fn remove(&self, unit: &str) -> Result<(), DriverError>;
}

/// Build a unit name: `prefix` followed by the server name with every
/// character outside `[A-Za-z0-9_.-]` replaced by `-`.
pub fn sanitize_unit_name(prefix: &str, server_name: &str) -> String {
    let mut unit = String::with_capacity(prefix.len() + server_name.len());
    unit.push_str(prefix);
    unit.extend(server_name.chars().map(|c| {
        if c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-') {
            c
        } else {
            '-'
        }
    }));
    unit
}
