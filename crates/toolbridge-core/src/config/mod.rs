//! Configuration
//!
//! Loaded from ordered sources (defaults, a TOML/YAML/JSON file, then
//! `TOOLBRIDGE_*` environment overrides), merged, and validated.

mod loader;
mod types;
mod validation;

pub use loader::{
    ConfigLoader, ConfigSource, DEFAULT_CONFIG_FILE, ENV_PREFIX, default_config_path, load_file,
};
pub use types::{
    BridgeConfig, CommandLine, HealthConfig, LogFormat, LoggingConfig, RuntimeConfig,
    ServerConfig, SupervisorConfig,
};
pub use validation::validate;
