//! Core Tool trait definition

use super::types::ToolOutput;
use async_trait::async_trait;
use serde_json::Value;

/// A named capability that can be published and invoked.
///
/// `execute` never fails at the Rust level: failures are returned as a
/// flagged [`ToolOutput`].
#[async_trait]
pub trait Tool: Send + Sync {
    /// Unique identifier within the capability table
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// JSON schema of the arguments
    fn input_schema(&self) -> Value;

    /// Invoke the tool
    async fn execute(&self, arguments: Value) -> ToolOutput;
}
