//! Capability table
//!
//! A [`Tool`] is one named, invocable capability. The host owns a
//! [`CapabilityTable`] that tools are published into; [`ToolRegistry`] is
//! the in-process implementation.

mod base;
pub mod codes;
mod error;
mod registry;
mod types;

pub use base::Tool;
pub use error::ToolError;
pub use registry::{CapabilityTable, ToolDefinition, ToolRegistry};
pub use types::ToolOutput;
