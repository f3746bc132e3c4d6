//! Toolbridge
//!
//! Supervisor for MCP tool servers run as local processes or containers.
//! This crate re-exports the public API of the workspace:
//!
//! - [`toolbridge_core`]: configuration, MCP client, runtime driver, server
//!   registry and the capability table
//! - [`toolbridge_tools`]: dynamic proxy tools and the HTTP tool invoker

pub use toolbridge_core::*;
pub use toolbridge_tools::*;
