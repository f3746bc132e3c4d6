//! Toolbridge Core Library
//!
//! This crate supervises third-party MCP tool servers that run either as
//! spawned subprocesses or as containers, including:
//! - the MCP control channel (protocol, transports, client)
//! - the runtime driver that starts, stops and inspects managed units
//! - the server registry with its lifecycle state machine and health reconciliation
//! - the capability table that hosts published tools

pub mod config;
pub mod error;
pub mod mcp;
pub mod registry;
pub mod runtime;
pub mod tools;

// Re-export commonly used types
pub use config::{BridgeConfig, ConfigLoader, ServerConfig};
pub use error::{BridgeError, BridgeResult, UnifiedError};
pub use mcp::{McpClient, McpError, McpTool, McpToolResult};
pub use registry::{
    HealthMonitor, HealthReport, MonitorTick, RecoveryListener, RegistryError, RegistryStats,
    ServerHealthCheck, ServerKind, ServerRegistry, ServerSnapshot, ServerSpec, ServerStatus,
    SupervisorTimeouts,
};
pub use runtime::{
    CommandDriver, CommandDriverConfig, DriverError, RuntimeDriver, ServerConnection, UnitStatus,
};
pub use tools::{CapabilityTable, Tool, ToolError, ToolOutput, ToolRegistry};
