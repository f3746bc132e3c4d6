//! Configuration loading from files and the environment

use super::types::{BridgeConfig, LogFormat};
use super::validation::validate;
use crate::error::{BridgeError, BridgeResult};
use humantime_serde::re::humantime;
use std::collections::HashMap;
use std::env;
use std::fmt::Display;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Prefix of environment overrides
pub const ENV_PREFIX: &str = "TOOLBRIDGE_";

/// File name looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "toolbridge.toml";

/// Source of configuration data
#[derive(Debug, Clone)]
pub enum ConfigSource {
    /// Built-in defaults
    Default,
    /// TOML, YAML or JSON file, chosen by extension
    File(PathBuf),
    /// `TOOLBRIDGE_*` environment variables
    Environment,
    /// Explicit `TOOLBRIDGE_*` style key/value overrides
    Overrides(HashMap<String, String>),
}

/// Configuration loader with support for multiple sources.
///
/// Sources are applied in the order they were added; later ones win.
#[derive(Debug, Default)]
pub struct ConfigLoader {
    sources: Vec<ConfigSource>,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a configuration source
    pub fn add_source(mut self, source: ConfigSource) -> Self {
        self.sources.push(source);
        self
    }

    pub fn with_defaults(self) -> Self {
        self.add_source(ConfigSource::Default)
    }

    pub fn with_file<P: AsRef<Path>>(self, path: P) -> Self {
        self.add_source(ConfigSource::File(path.as_ref().to_path_buf()))
    }

    pub fn with_env(self) -> Self {
        self.add_source(ConfigSource::Environment)
    }

    pub fn with_overrides(self, overrides: HashMap<String, String>) -> Self {
        self.add_source(ConfigSource::Overrides(overrides))
    }

    /// Load, merge and validate
    pub fn load(self) -> BridgeResult<BridgeConfig> {
        let mut config = BridgeConfig::default();

        for source in &self.sources {
            match source {
                ConfigSource::Default => {}
                ConfigSource::File(path) => {
                    debug!("Loading config from file: {}", path.display());
                    config.merge(load_file(path)?);
                }
                ConfigSource::Environment => {
                    debug!("Loading config from environment");
                    let vars: HashMap<String, String> = env::vars()
                        .filter(|(key, _)| key.starts_with(ENV_PREFIX))
                        .collect();
                    apply_overrides(&mut config, &vars)?;
                }
                ConfigSource::Overrides(vars) => apply_overrides(&mut config, vars)?,
            }
        }

        validate(&config)?;
        Ok(config)
    }
}

/// Config file to use when none is given: `./toolbridge.toml`, then the
/// user config directory
pub fn default_config_path() -> Option<PathBuf> {
    let local = PathBuf::from(DEFAULT_CONFIG_FILE);
    if local.exists() {
        return Some(local);
    }

    dirs::config_dir()
        .map(|dir| dir.join("toolbridge").join("config.toml"))
        .filter(|path| path.exists())
}

/// Parse one file. A missing file yields the defaults.
pub fn load_file(path: &Path) -> BridgeResult<BridgeConfig> {
    if !path.exists() {
        debug!("Config file {} not found, using defaults", path.display());
        return Ok(BridgeConfig::default());
    }

    let content = fs::read_to_string(path).map_err(|e| {
        BridgeError::io_with_path(
            format!("Failed to read config file: {}", e),
            path.display().to_string(),
        )
    })?;

    let parse_error = |format: &str, e: &dyn Display| {
        BridgeError::config_with_context(
            format!("Failed to parse {} config: {}", format, e),
            format!(
                "Deserializing {} configuration from '{}'",
                format,
                path.display()
            ),
        )
    };

    match path.extension().and_then(|s| s.to_str()) {
        Some("toml") => toml::from_str(&content).map_err(|e| parse_error("TOML", &e)),
        Some("yaml") | Some("yml") => {
            serde_yaml::from_str(&content).map_err(|e| parse_error("YAML", &e))
        }
        _ => serde_json::from_str(&content).map_err(|e| parse_error("JSON", &e)),
    }
}

fn apply_overrides(config: &mut BridgeConfig, vars: &HashMap<String, String>) -> BridgeResult<()> {
    for (key, value) in vars {
        let Some(setting) = key.strip_prefix(ENV_PREFIX) else {
            continue;
        };

        match setting {
            "LOG_LEVEL" => config.logging.level = value.clone(),
            "LOG_FORMAT" => config.logging.format = value.parse::<LogFormat>()?,
            "RUNTIME" => config.runtime.binary = value.clone(),
            "UNIT_PREFIX" => config.runtime.unit_prefix = value.clone(),
            "AUTO_START" => config.supervisor.auto_start = parse_bool(key, value)?,
            "AUTO_RESTART" => config.health.auto_restart = parse_bool(key, value)?,
            "HEALTH_INTERVAL" => config.health.interval = parse_duration(key, value)?,
            "STARTUP_TIMEOUT" => config.supervisor.startup_timeout = parse_duration(key, value)?,
            "SHUTDOWN_TIMEOUT" => config.supervisor.shutdown_timeout = parse_duration(key, value)?,
            "DRIVER_TIMEOUT" => config.supervisor.driver_timeout = parse_duration(key, value)?,
            "CALL_TIMEOUT" => config.supervisor.call_timeout = parse_duration(key, value)?,
            _ => debug!("Ignoring unknown setting {}", key),
        }
    }
    Ok(())
}

fn parse_bool(key: &str, value: &str) -> BridgeResult<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(BridgeError::config(format!("Invalid {} value: {}", key, value))),
    }
}

fn parse_duration(key: &str, value: &str) -> BridgeResult<Duration> {
    humantime::parse_duration(value)
        .map_err(|e| BridgeError::config(format!("Invalid {} value '{}': {}", key, value, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::ServerKind;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(suffix: &str, content: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_toml_file() {
        let file = write_config(
            ".toml",
            r#"
[supervisor]
startup_timeout = "45s"
call_timeout = "2m"

[health]
interval = "10s"
auto_restart = true

[servers.fs]
command = "npx -y @acme/server-filesystem /tmp"

[servers.git]
kind = "container"
command = ["ghcr.io/acme/git:1", "--stdio"]
env = { TOKEN = "abc" }
"#,
        );

        let config = ConfigLoader::new().with_defaults().with_file(file.path()).load().unwrap();

        assert_eq!(config.supervisor.startup_timeout, Duration::from_secs(45));
        assert_eq!(config.supervisor.call_timeout, Duration::from_secs(120));
        assert!(config.health.auto_restart);
        assert_eq!(config.servers.len(), 2);

        let fs = config.servers["fs"].to_spec("fs").unwrap();
        assert_eq!(fs.launch, vec!["npx", "-y", "@acme/server-filesystem", "/tmp"]);
        assert_eq!(config.servers["git"].kind, ServerKind::Container);
    }

    #[test]
    fn test_load_yaml_and_json_files() {
        let yaml = write_config(
            ".yaml",
            "servers:\n  fs:\n    command: [node, fs.js]\nruntime:\n  binary: podman\n",
        );
        let config = ConfigLoader::new().with_file(yaml.path()).load().unwrap();
        assert_eq!(config.runtime.binary, "podman");

        let json = write_config(
            ".json",
            r#"{"servers": {"fs": {"command": ["node", "fs.js"], "enabled": false}}}"#,
        );
        let config = ConfigLoader::new().with_file(json.path()).load().unwrap();
        assert_eq!(config.enabled_servers().count(), 0);
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = ConfigLoader::new()
            .with_file(dir.path().join("absent.toml"))
            .load()
            .unwrap();
        assert_eq!(config, BridgeConfig::default());
    }

    #[test]
    fn test_parse_error_has_context() {
        let file = write_config(".toml", "[servers.fs\ncommand = 1");
        let err = ConfigLoader::new().with_file(file.path()).load().unwrap_err();
        assert!(err.to_string().contains("TOML"));
    }

    #[test]
    fn test_overrides_apply_after_file() {
        let file = write_config(".toml", "[runtime]\nbinary = \"podman\"\n");
        let mut vars = HashMap::new();
        vars.insert("TOOLBRIDGE_RUNTIME".to_string(), "nerdctl".to_string());
        vars.insert("TOOLBRIDGE_CALL_TIMEOUT".to_string(), "5s".to_string());
        vars.insert("TOOLBRIDGE_AUTO_RESTART".to_string(), "yes".to_string());
        vars.insert("TOOLBRIDGE_LOG_FORMAT".to_string(), "json".to_string());

        let config = ConfigLoader::new()
            .with_file(file.path())
            .with_overrides(vars)
            .load()
            .unwrap();

        assert_eq!(config.runtime.binary, "nerdctl");
        assert_eq!(config.supervisor.call_timeout, Duration::from_secs(5));
        assert!(config.health.auto_restart);
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_invalid_override_is_rejected() {
        let mut vars = HashMap::new();
        vars.insert("TOOLBRIDGE_HEALTH_INTERVAL".to_string(), "soon".to_string());
        assert!(ConfigLoader::new().with_overrides(vars).load().is_err());
    }
}
