//! Error codes carried in flagged [`ToolOutput`](super::ToolOutput) results

/// The identifier is published but no longer backed by a registration
pub const TOOL_GHOST: &str = "TOOL_GHOST";

/// The owning server is not running
pub const TOOL_SERVER_UNAVAILABLE: &str = "TOOL_SERVER_UNAVAILABLE";

/// The remote call failed
pub const TOOL_INVOCATION_FAILED: &str = "TOOL_INVOCATION_FAILED";
