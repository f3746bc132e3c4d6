//! Stateless HTTP tool invoker
//!
//! Sends a single JSON-RPC `tools/call` to an external endpoint and
//! normalizes the answer into a [`ToolOutput`](toolbridge_core::ToolOutput).

mod client;
mod error;
mod sse;

pub use client::{DEFAULT_INVOKE_TIMEOUT, InvokeRequest, ToolInvoker};
pub use error::InvokeError;
pub use sse::{SseEvent, parse_sse_events};
