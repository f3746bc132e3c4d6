//! Ad hoc call through the HTTP tool invoker

use super::parse_pairs;
use anyhow::Context;
use serde_json::Value;
use std::time::Duration;
use toolbridge_tools::{InvokeRequest, ToolInvoker};

pub async fn run(
    endpoint: &str,
    operation: &str,
    args: &str,
    headers: &[String],
    timeout_secs: u64,
) -> anyhow::Result<()> {
    let arguments: Value = serde_json::from_str(args).context("--args must be a JSON value")?;
    let request =
        InvokeRequest::new(endpoint, operation, arguments).with_headers(parse_pairs(headers)?);

    let invoker = ToolInvoker::with_timeout(Duration::from_secs(timeout_secs))?;
    let output = invoker.invoke(&request).await;

    println!("{}", serde_json::to_string_pretty(&output)?);
    if output.is_error {
        anyhow::bail!("Operation '{}' failed", operation);
    }
    Ok(())
}
