//! Configuration validation

use super::types::BridgeConfig;
use crate::error::{BridgeError, BridgeResult};
use crate::runtime::sanitize_unit_name;
use std::collections::HashMap;
use std::time::Duration;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a merged configuration
pub fn validate(config: &BridgeConfig) -> BridgeResult<()> {
    let mut units: HashMap<String, &str> = HashMap::new();

    for (name, server) in &config.servers {
        if name.trim().is_empty() {
            return Err(BridgeError::config("Server names must not be empty"));
        }

        let launch = server.command.to_args()?;
        if launch.first().map_or(true, |program| program.trim().is_empty()) {
            return Err(BridgeError::config_with_context(
                "Launch command must not be empty",
                format!("server '{}'", name),
            ));
        }

        // Distinct names can sanitize to the same unit
        let unit = sanitize_unit_name(&config.runtime.unit_prefix, name);
        if let Some(other) = units.insert(unit.clone(), name) {
            return Err(BridgeError::config_with_context(
                format!("Servers '{}' and '{}' map to the same unit '{}'", other, name, unit),
                format!("server '{}'", name),
            ));
        }
    }

    let timeouts = [
        ("supervisor.startup_timeout", config.supervisor.startup_timeout),
        ("supervisor.shutdown_timeout", config.supervisor.shutdown_timeout),
        ("supervisor.driver_timeout", config.supervisor.driver_timeout),
        ("supervisor.call_timeout", config.supervisor.call_timeout),
        ("health.interval", config.health.interval),
    ];
    for (field, value) in timeouts {
        if value == Duration::ZERO {
            return Err(BridgeError::config(format!("{} must be greater than zero", field)));
        }
    }

    if config.runtime.binary.trim().is_empty() {
        return Err(BridgeError::config("runtime.binary must not be empty"));
    }

    if !LOG_LEVELS.contains(&config.logging.level.to_ascii_lowercase().as_str()) {
        return Err(BridgeError::config(format!(
            "Invalid log level '{}' (expected one of {})",
            config.logging.level,
            LOG_LEVELS.join(", ")
        )));
    }

    Ok(())
}
