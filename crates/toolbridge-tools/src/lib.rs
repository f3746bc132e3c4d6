//! Toolbridge Tools
//!
//! - [`dynamic`]: publishes operations of managed servers as proxy tools
//! - [`invoker`]: one-shot `tools/call` against external HTTP endpoints

pub mod dynamic;
pub mod invoker;

#[cfg(test)]
mod test_support;

pub use dynamic::{DynamicToolRegistry, DynamicToolState, DynamicToolStats, ProxyTool};
pub use invoker::{InvokeError, InvokeRequest, ToolInvoker};
