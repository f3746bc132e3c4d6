//! Error types for Toolbridge
//!
//! Every layer has its own `thiserror` enum (`McpError`, `DriverError`,
//! `RegistryError`, `ToolError`). All of them implement [`UnifiedError`] so
//! callers get a stable error code regardless of where a failure started.

mod types;

pub use types::{BridgeError, BridgeResult, UnifiedError};
