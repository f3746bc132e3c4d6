//! One-shot health check of the configured servers

use super::build_registry;
use crate::console::CliConsole;
use colored::*;
use serde::Serialize;
use std::collections::BTreeMap;
use toolbridge_core::{BridgeConfig, RegistryStats, ServerHealthCheck};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CheckReport {
    servers: BTreeMap<String, ServerHealthCheck>,
    start_failures: BTreeMap<String, String>,
    stats: RegistryStats,
}

/// Start everything, report, shut down.
///
/// Fails when any server is unhealthy.
pub async fn run(config: &BridgeConfig, json: bool) -> anyhow::Result<()> {
    let registry = build_registry(config)?;

    let start_failures: BTreeMap<String, String> = registry
        .start_all()
        .await
        .into_iter()
        .filter_map(|(name, outcome)| outcome.err().map(|e| (name, e.to_string())))
        .collect();

    let report = CheckReport {
        servers: registry.health_check_all().await,
        start_failures,
        stats: registry.stats().await,
    };
    registry.close().await;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }

    let unhealthy = report.servers.values().filter(|check| !check.healthy).count();
    if unhealthy > 0 {
        anyhow::bail!("{} of {} server(s) unhealthy", unhealthy, report.servers.len());
    }
    Ok(())
}

fn print_report(report: &CheckReport) {
    let console = CliConsole;
    console.print_header("Server Health");

    if report.servers.is_empty() {
        console.warn("No servers configured");
        return;
    }

    for (name, check) in &report.servers {
        let line = format!(
            "{} [{}] {} operation(s)",
            name.bold(),
            check.status,
            check.operation_count
        );
        if check.healthy {
            console.success(&line);
        } else {
            console.warn(&line);
            for issue in &check.issues {
                println!("    {}", issue.dimmed());
            }
        }
    }

    let stats = &report.stats;
    console.print_header("Stats");
    console.info(&format!(
        "{} total: {} running, {} stopped, {} error, {} installing; {} tools",
        stats.total, stats.running, stats.stopped, stats.error, stats.installing, stats.total_tools
    ));
}
