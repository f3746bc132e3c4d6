//! CLI argument definitions using clap

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use toolbridge_core::config::LogFormat;

#[derive(Parser, Debug)]
#[command(name = "toolbridge")]
#[command(about = "Supervise MCP tool servers running as processes or containers")]
#[command(
    long_about = r#"Toolbridge - supervisor for MCP tool servers

USAGE:
  toolbridge check               # Start configured servers, report health, stop
  toolbridge serve               # Supervise servers until Ctrl-C
  toolbridge invoke <url> <op>   # Call one operation on an HTTP endpoint
  toolbridge config              # Print the resolved configuration

Configuration is read from --config, ./toolbridge.toml, or the user config
directory, then overridden by TOOLBRIDGE_* environment variables."#
)]
#[command(version)]
pub struct Cli {
    /// Path to configuration file (TOML, YAML or JSON)
    #[arg(long, short, global = true, env = "TOOLBRIDGE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log level, overrides the configured one
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Log output format, overrides the configured one
    #[arg(long, global = true, value_enum)]
    pub log_format: Option<LogFormatArg>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start every configured server once, print health and stats, then shut down
    Check {
        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Start servers, publish their tools and supervise them until Ctrl-C
    Serve {
        /// Restart servers found in error, overriding the configuration
        #[arg(long)]
        auto_restart: bool,
    },

    /// Invoke one operation on an external HTTP tool endpoint
    Invoke {
        /// Endpoint URL
        endpoint: String,

        /// Operation name
        operation: String,

        /// Arguments as a JSON object
        #[arg(long, short, default_value = "{}")]
        args: String,

        /// Extra request header as KEY=VALUE (repeatable)
        #[arg(long = "header", short = 'H')]
        headers: Vec<String>,

        /// Request timeout in seconds
        #[arg(long, default_value_t = 60)]
        timeout: u64,
    },

    /// Print the resolved configuration
    Config {
        /// Print as JSON instead of TOML
        #[arg(long)]
        json: bool,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}

impl From<LogFormatArg> for LogFormat {
    fn from(arg: LogFormatArg) -> Self {
        match arg {
            LogFormatArg::Pretty => LogFormat::Pretty,
            LogFormatArg::Compact => LogFormat::Compact,
            LogFormatArg::Json => LogFormat::Json,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_invoke_with_headers() {
        let cli = Cli::try_parse_from([
            "toolbridge",
            "invoke",
            "http://localhost:8080/mcp",
            "search",
            "--args",
            r#"{"q":"rust"}"#,
            "-H",
            "Authorization=Bearer x",
            "--log-format",
            "json",
        ])
        .unwrap();

        assert_eq!(cli.log_format, Some(LogFormatArg::Json));
        match cli.command {
            Commands::Invoke {
                operation, headers, timeout, ..
            } => {
                assert_eq!(operation, "search");
                assert_eq!(headers, vec!["Authorization=Bearer x"]);
                assert_eq!(timeout, 60);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
