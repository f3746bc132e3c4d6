//! Driver backed by `tokio::process` and a container runtime CLI

use super::connection::ServerConnection;
use super::driver::{RuntimeDriver, UnitStatus, sanitize_unit_name};
use super::error::DriverError;
use crate::config::BridgeConfig;
use crate::mcp::client::DEFAULT_REQUEST_TIMEOUT;
use crate::mcp::{McpClient, StdioTransport};
use crate::registry::{ServerKind, ServerSpec};
use async_trait::async_trait;
use std::process::{Output, Stdio};
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, info, instrument};

/// Settings for [`CommandDriver`]
#[derive(Debug, Clone)]
pub struct CommandDriverConfig {
    /// Container runtime binary (`docker`, `podman`, ...)
    pub binary: String,
    /// Prefix prepended to every unit name
    pub unit_prefix: String,
    /// Extra arguments inserted into `run` before the image
    pub extra_run_args: Vec<String>,
    /// Per-request timeout for launched MCP clients
    pub request_timeout: Duration,
}

impl Default for CommandDriverConfig {
    fn default() -> Self {
        Self {
            binary: "docker".to_string(),
            unit_prefix: "toolbridge-".to_string(),
            extra_run_args: Vec::new(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl CommandDriverConfig {
    /// Derive driver settings from the loaded configuration
    pub fn from_config(config: &BridgeConfig) -> Self {
        Self {
            binary: config.runtime.binary.clone(),
            unit_prefix: config.runtime.unit_prefix.clone(),
            extra_run_args: config.runtime.extra_run_args.clone(),
            request_timeout: config.supervisor.call_timeout,
        }
    }
}

/// Launches processes directly and containers through the runtime CLI.
///
/// Container units are run attached (`run -i`), so the runtime CLI's
/// standard streams carry the MCP control channel.
#[derive(Debug, Clone, Default)]
pub struct CommandDriver {
    config: CommandDriverConfig,
}

impl CommandDriver {
    /// Create a driver with the given settings
    pub fn new(config: CommandDriverConfig) -> Self {
        Self { config }
    }

    /// Driver settings
    pub fn config(&self) -> &CommandDriverConfig {
        &self.config
    }

    /// Arguments for `<runtime> run` for a container server
    fn run_args(&self, spec: &ServerSpec, unit: &str) -> Result<Vec<String>, DriverError> {
        let (image, image_args) = spec
            .launch
            .split_first()
            .ok_or_else(|| DriverError::launch(unit, "container image is missing"))?;

        let mut args = vec![
            "run".to_string(),
            "-i".to_string(),
            "--name".to_string(),
            unit.to_string(),
        ];

        // Sorted so the command line is stable across runs
        let mut env: Vec<_> = spec.env.iter().collect();
        env.sort();
        for (key, value) in env {
            args.push("-e".to_string());
            args.push(format!("{}={}", key, value));
        }

        args.extend(self.config.extra_run_args.iter().cloned());
        args.push(image.clone());
        args.extend(image_args.iter().cloned());
        Ok(args)
    }

    /// Run a runtime subcommand and capture its output
    async fn runtime(&self, args: &[&str]) -> Result<Output, DriverError> {
        let rendered = format!("{} {}", self.config.binary, args.join(" "));
        debug!("Running {}", rendered);

        Command::new(&self.config.binary)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| DriverError::command(rendered, e.to_string()))
    }

    async fn spawn(&self, spec: &ServerSpec, unit: &str) -> Result<StdioTransport, DriverError> {
        match spec.kind {
            ServerKind::Process => {
                let (program, args) = spec
                    .launch
                    .split_first()
                    .ok_or_else(|| DriverError::launch(unit, "launch command is empty"))?;
                StdioTransport::spawn_with_env(program, args, &spec.env)
                    .await
                    .map_err(|e| DriverError::launch(unit, e.to_string()))
            }
            ServerKind::Container => {
                // A unit left over from a previous run would block `--name`
                self.remove(unit).await?;
                let args = self.run_args(spec, unit)?;
                StdioTransport::spawn(&self.config.binary, args.as_slice())
                    .await
                    .map_err(|e| DriverError::launch(unit, e.to_string()))
            }
        }
    }
}

/// Runtimes answer "No such container" / "no such object" for absent units
fn is_missing_unit(stderr: &[u8]) -> bool {
    String::from_utf8_lossy(stderr)
        .to_ascii_lowercase()
        .contains("no such")
}

fn stderr_text(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).trim().to_string()
}

#[async_trait]
impl RuntimeDriver for CommandDriver {
    fn unit_name(&self, spec: &ServerSpec) -> String {
        sanitize_unit_name(&self.config.unit_prefix, &spec.name)
    }

    #[instrument(skip(self, spec), fields(server = %spec.name, kind = %spec.kind))]
    async fn launch(&self, spec: &ServerSpec) -> Result<Box<dyn ServerConnection>, DriverError> {
        let unit = self.unit_name(spec);
        let transport = self.spawn(spec, &unit).await?;

        let client = McpClient::with_timeout(Box::new(transport), self.config.request_timeout);
        match client.initialize().await {
            Ok(info) => {
                info!(
                    "Connected to '{}' ({} {})",
                    spec.name, info.name, info.version
                );
                Ok(Box::new(client))
            }
            Err(e) => {
                let _ = client.close().await;
                Err(DriverError::handshake(unit, e))
            }
        }
    }

    async fn status(&self, unit: &str) -> Result<UnitStatus, DriverError> {
        let output = self
            .runtime(&["inspect", "--format", "{{.State.Running}}", unit])
            .await?;

        if output.status.success() {
            let running = String::from_utf8_lossy(&output.stdout).trim() == "true";
            return Ok(if running {
                UnitStatus::Running
            } else {
                UnitStatus::Stopped
            });
        }

        if is_missing_unit(&output.stderr) {
            Ok(UnitStatus::NotFound)
        } else {
            Err(DriverError::command(
                format!("{} inspect {}", self.config.binary, unit),
                stderr_text(&output),
            ))
        }
    }

    async fn stop(&self, unit: &str) -> Result<(), DriverError> {
        let output = self.runtime(&["stop", unit]).await?;
        if output.status.success() || is_missing_unit(&output.stderr) {
            return Ok(());
        }
        Err(DriverError::command(
            format!("{} stop {}", self.config.binary, unit),
            stderr_text(&output),
        ))
    }

    async fn remove(&self, unit: &str) -> Result<(), DriverError> {
        let output = self.runtime(&["rm", "-f", unit]).await?;
        if output.status.success() || is_missing_unit(&output.stderr) {
            return Ok(());
        }
        Err(DriverError::command(
            format!("{} rm -f {}", self.config.binary, unit),
            stderr_text(&output),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn container_spec() -> ServerSpec {
        let mut env = HashMap::new();
        env.insert("TOKEN".to_string(), "abc".to_string());
        env.insert("DEBUG".to_string(), "1".to_string());
        ServerSpec::container("git hub", vec!["ghcr.io/acme/git:1".into(), "--stdio".into()])
            .with_env(env)
    }

    #[test]
    fn test_unit_name_uses_prefix() {
        let driver = CommandDriver::default();
        assert_eq!(driver.unit_name(&container_spec()), "toolbridge-git-hub");
    }

    #[test]
    fn test_run_args_layout() {
        let driver = CommandDriver::new(CommandDriverConfig {
            extra_run_args: vec!["--rm".to_string()],
            ..Default::default()
        });
        let args = driver.run_args(&container_spec(), "toolbridge-git-hub").unwrap();
        assert_eq!(
            args,
            vec![
                "run",
                "-i",
                "--name",
                "toolbridge-git-hub",
                "-e",
                "DEBUG=1",
                "-e",
                "TOKEN=abc",
                "--rm",
                "ghcr.io/acme/git:1",
                "--stdio",
            ]
        );
    }

    #[test]
    fn test_run_args_require_image() {
        let driver = CommandDriver::default();
        let spec = ServerSpec::container("empty", Vec::new());
        let err = driver.run_args(&spec, "toolbridge-empty").unwrap_err();
        assert!(matches!(err, DriverError::Launch { .. }));
    }

    #[test]
    fn test_missing_unit_detection() {
        assert!(is_missing_unit(b"Error: No such container: toolbridge-fs"));
        assert!(is_missing_unit(b"Error: no such object: toolbridge-fs"));
        assert!(!is_missing_unit(b"Cannot connect to the Docker daemon"));
    }

    #[tokio::test]
    async fn test_launch_empty_process_command_fails() {
        let driver = CommandDriver::default();
        let spec = ServerSpec::process("fs", Vec::new());
        let err = driver.launch(&spec).await.err().unwrap();
        assert!(matches!(err, DriverError::Launch { .. }));
    }

    #[tokio::test]
    async fn test_missing_runtime_binary_is_command_error() {
        let driver = CommandDriver::new(CommandDriverConfig {
            binary: "toolbridge-no-such-runtime".to_string(),
            ..Default::default()
        });
        let err = driver.status("toolbridge-fs").await.unwrap_err();
        assert!(matches!(err, DriverError::Command { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_launch_process_that_exits_fails_handshake() {
        let driver = CommandDriver::new(CommandDriverConfig {
            request_timeout: Duration::from_secs(5),
            ..Default::default()
        });
        let spec = ServerSpec::process("quiet", vec!["true".into()]);
        let err = driver.launch(&spec).await.err().unwrap();
        assert!(matches!(err, DriverError::Handshake { .. }));
    }
}
