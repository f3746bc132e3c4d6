//! Command implementations

pub mod check;
pub mod config;
pub mod invoke;
pub mod serve;

use crate::args::Cli;
use anyhow::Context;
use std::collections::HashMap;
use std::sync::Arc;
use toolbridge_core::config::default_config_path;
use toolbridge_core::{
    BridgeConfig, CommandDriver, CommandDriverConfig, ConfigLoader, ServerRegistry,
};
use tracing::debug;

/// Resolve configuration: defaults, file, environment, then CLI flags
pub fn load_config(cli: &Cli) -> anyhow::Result<BridgeConfig> {
    let mut loader = ConfigLoader::new().with_defaults();

    if let Some(path) = cli.config.clone().or_else(default_config_path) {
        debug!("Using config file {}", path.display());
        loader = loader.with_file(path);
    }

    let mut flags = HashMap::new();
    if let Some(level) = &cli.log_level {
        flags.insert("TOOLBRIDGE_LOG_LEVEL".to_string(), level.clone());
    }
    if let Some(format) = cli.log_format {
        let format: toolbridge_core::config::LogFormat = format.into();
        flags.insert("TOOLBRIDGE_LOG_FORMAT".to_string(), format.to_string());
    }

    loader
        .with_env()
        .with_overrides(flags)
        .load()
        .context("Failed to load configuration")
}

/// Registry over the command-line runtime driver, with every enabled server added
pub fn build_registry(config: &BridgeConfig) -> anyhow::Result<Arc<ServerRegistry>> {
    let driver = CommandDriver::new(CommandDriverConfig::from_config(config));
    let registry = ServerRegistry::from_config(config, Arc::new(driver))
        .context("Failed to build server registry")?;
    Ok(Arc::new(registry))
}

/// Split `KEY=VALUE` pairs
pub fn parse_pairs(pairs: &[String]) -> anyhow::Result<HashMap<String, String>> {
    pairs
        .iter()
        .map(|pair| {
            pair.split_once('=')
                .map(|(key, value)| (key.trim().to_string(), value.to_string()))
                .filter(|(key, _)| !key.is_empty())
                .with_context(|| format!("Expected KEY=VALUE, got '{}'", pair))
        })
        .collect()
}
