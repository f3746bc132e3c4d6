//! Proxies for operations of managed servers
//!
//! Every operation a running server advertises is published into the host
//! capability table as `<server>_<operation>`. Invoking the proxy forwards
//! the call through the server registry.

mod proxy;
mod registry;
mod types;

pub use proxy::ProxyTool;
pub use registry::DynamicToolRegistry;
pub use types::{DynamicToolState, DynamicToolStats, proxy_identifier};
