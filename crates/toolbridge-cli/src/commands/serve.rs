//! Long-running supervision

use super::build_registry;
use crate::console::CliConsole;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use toolbridge_core::{BridgeConfig, HealthMonitor, ServerStatus, ToolRegistry};
use toolbridge_tools::DynamicToolRegistry;
use tracing::{info, warn};

/// Start servers, publish their tools, monitor until Ctrl-C, then close
pub async fn run(config: &BridgeConfig, auto_restart: bool) -> anyhow::Result<()> {
    let console = CliConsole;
    let registry = build_registry(config)?;
    let table = Arc::new(ToolRegistry::new());
    let dynamic = DynamicToolRegistry::new(Arc::clone(&registry), table.clone());

    if config.supervisor.auto_start {
        for (name, outcome) in registry.start_all().await {
            if let Err(e) = outcome {
                console.warn(&format!("Server '{}' failed to start: {}", name, e));
            }
        }
    }

    for server in registry.servers().await {
        if server.status == ServerStatus::Running {
            dynamic.add_server_tools(&server.name).await;
        }
    }
    console.success(&format!(
        "Supervising {} server(s), {} tool(s) published",
        registry.len(),
        table.len()
    ));
    for name in table.tool_names() {
        console.info(&name);
    }

    let shutdown = CancellationToken::new();
    let monitor = HealthMonitor::from_config(Arc::clone(&registry), &config.health)
        .with_auto_restart(config.health.auto_restart || auto_restart)
        .with_listener(Arc::new(dynamic.clone()))
        .spawn(shutdown.clone());

    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl-C: {}", e);
    }
    info!("Shutting down");

    shutdown.cancel();
    if let Err(e) = monitor.await {
        warn!("Health monitor task failed: {}", e);
    }

    dynamic.clear_all();
    registry.close().await;
    console.success("All servers stopped");
    Ok(())
}
