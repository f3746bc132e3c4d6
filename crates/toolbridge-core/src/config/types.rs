//! Configuration model

use crate::error::{BridgeError, BridgeResult};
use crate::registry::{ServerKind, ServerSpec};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

fn default_true() -> bool {
    true
}

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Managed servers by name
    pub servers: BTreeMap<String, ServerConfig>,
    pub supervisor: SupervisorConfig,
    pub health: HealthConfig,
    pub runtime: RuntimeConfig,
    pub logging: LoggingConfig,
}

impl BridgeConfig {
    /// Servers with `enabled = true`
    pub fn enabled_servers(&self) -> impl Iterator<Item = (&String, &ServerConfig)> {
        self.servers.iter().filter(|(_, server)| server.enabled)
    }

    /// Merge another config into this one; `other` wins.
    ///
    /// Servers are merged by name. Sections left at their defaults in
    /// `other` do not override this config.
    pub fn merge(&mut self, other: BridgeConfig) {
        self.servers.extend(other.servers);

        if other.supervisor != SupervisorConfig::default() {
            self.supervisor = other.supervisor;
        }
        if other.health != HealthConfig::default() {
            self.health = other.health;
        }
        if other.runtime != RuntimeConfig::default() {
            self.runtime = other.runtime;
        }
        self.logging.merge(other.logging);
    }
}

/// Launch command: an argument array, or one shell-style string
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CommandLine {
    Args(Vec<String>),
    Shell(String),
}

impl CommandLine {
    /// Split into executable (or image) plus arguments
    pub fn to_args(&self) -> BridgeResult<Vec<String>> {
        match self {
            CommandLine::Args(args) => Ok(args.clone()),
            CommandLine::Shell(line) => shell_words::split(line).map_err(|e| {
                BridgeError::config_with_context(
                    format!("Invalid command line: {}", e),
                    format!("Parsing '{}'", line),
                )
            }),
        }
    }
}

/// Configuration for a single managed server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default)]
    pub kind: ServerKind,
    /// Executable and arguments; for containers the image and its arguments
    pub command: CommandLine,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub env: HashMap<String, String>,
}

impl ServerConfig {
    pub fn new(kind: ServerKind, command: Vec<String>) -> Self {
        Self {
            kind,
            command: CommandLine::Args(command),
            enabled: true,
            env: HashMap::new(),
        }
    }

    /// Build the registry spec for this server
    pub fn to_spec(&self, name: &str) -> BridgeResult<ServerSpec> {
        let launch = self.command.to_args()?;
        Ok(ServerSpec::new(name, self.kind, launch).with_env(self.env.clone()))
    }
}

/// Lifecycle timeouts and startup behaviour
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SupervisorConfig {
    /// Launch plus handshake
    #[serde(with = "humantime_serde")]
    pub startup_timeout: Duration,
    /// Closing a connection
    #[serde(with = "humantime_serde")]
    pub shutdown_timeout: Duration,
    /// Status/stop/remove against the runtime
    #[serde(with = "humantime_serde")]
    pub driver_timeout: Duration,
    /// Operation listing and invocation
    #[serde(with = "humantime_serde")]
    pub call_timeout: Duration,
    /// Start every configured server at boot
    pub auto_start: bool,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            startup_timeout: Duration::from_secs(30),
            shutdown_timeout: Duration::from_secs(10),
            driver_timeout: Duration::from_secs(30),
            call_timeout: Duration::from_secs(60),
            auto_start: true,
        }
    }
}

/// Background health monitoring
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthConfig {
    #[serde(with = "humantime_serde")]
    pub interval: Duration,
    /// Restart servers found in `error`
    pub auto_restart: bool,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(30),
            auto_restart: false,
        }
    }
}

/// Container runtime settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Runtime CLI binary
    pub binary: String,
    /// Prefix for unit names
    pub unit_prefix: String,
    /// Extra `run` arguments placed before the image
    pub extra_run_args: Vec<String>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            binary: "docker".to_string(),
            unit_prefix: "toolbridge-".to_string(),
            extra_run_args: Vec::new(),
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Compact,
    Json,
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogFormat::Pretty => write!(f, "pretty"),
            LogFormat::Compact => write!(f, "compact"),
            LogFormat::Json => write!(f, "json"),
        }
    }
}

impl FromStr for LogFormat {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "compact" => Ok(LogFormat::Compact),
            "json" => Ok(LogFormat::Json),
            other => Err(BridgeError::config(format!(
                "Unknown log format '{}' (expected pretty, compact or json)",
                other
            ))),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

impl LoggingConfig {
    /// Merge with another logging config
    pub fn merge(&mut self, other: LoggingConfig) {
        let defaults = LoggingConfig::default();
        if !other.level.is_empty() && other.level != defaults.level {
            self.level = other.level;
        }
        if other.format != defaults.format {
            self.format = other.format;
        }
    }
}
