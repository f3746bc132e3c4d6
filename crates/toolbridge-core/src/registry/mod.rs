//! Server registry
//!
//! Owns every managed server, drives its lifecycle state machine
//! (`stopped → installing → running | error`) through a [`RuntimeDriver`],
//! and aggregates health and maintenance across all servers.
//!
//! [`RuntimeDriver`]: crate::runtime::RuntimeDriver

mod error;
mod maintenance;
mod monitor;
mod server;
mod state;
mod types;

#[cfg(test)]
mod test_support;

pub use error::RegistryError;
pub use maintenance::{CONNECTION_LOST, UNIT_NOT_RUNNING};
pub use monitor::{HealthMonitor, MonitorTick, RecoveryListener};
pub use server::ServerRegistry;
pub use types::{
    HealthReport, RegistryStats, ServerHealthCheck, ServerKind, ServerSnapshot, ServerSpec,
    ServerStatus, SupervisorTimeouts,
};
