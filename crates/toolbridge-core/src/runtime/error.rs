//! Driver error types

use crate::error::UnifiedError;
use crate::mcp::McpError;
use thiserror::Error;

/// Errors raised while driving a process or container unit
#[derive(Debug, Error, Clone)]
pub enum DriverError {
    /// The unit could not be launched
    #[error("Failed to launch '{unit}': {message}")]
    Launch { unit: String, message: String },

    /// A runtime command exited unsuccessfully or could not be run
    #[error("Runtime command '{command}' failed: {message}")]
    Command { command: String, message: String },

    /// The unit started but the MCP handshake failed
    #[error("Handshake with '{unit}' failed: {source}")]
    Handshake {
        unit: String,
        #[source]
        source: McpError,
    },
}

impl DriverError {
    /// Create a new Launch error
    pub fn launch(unit: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Launch {
            unit: unit.into(),
            message: message.into(),
        }
    }

    /// Create a new Command error
    pub fn command(command: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Command {
            command: command.into(),
            message: message.into(),
        }
    }

    /// Create a new Handshake error
    pub fn handshake(unit: impl Into<String>, source: McpError) -> Self {
        Self::Handshake {
            unit: unit.into(),
            source,
        }
    }
}

impl UnifiedError for DriverError {
    fn error_code(&self) -> &str {
        match self {
            Self::Launch { .. } => "DRIVER_LAUNCH",
            Self::Command { .. } => "DRIVER_COMMAND",
            Self::Handshake { .. } => "DRIVER_HANDSHAKE",
        }
    }

    fn message(&self) -> &str {
        match self {
            Self::Launch { message, .. } | Self::Command { message, .. } => message,
            Self::Handshake { source, .. } => source.message(),
        }
    }

    fn context(&self) -> Option<&str> {
        match self {
            Self::Launch { unit, .. } | Self::Handshake { unit, .. } => Some(unit),
            Self::Command { command, .. } => Some(command),
        }
    }

    fn is_retryable(&self) -> bool {
        match self {
            Self::Handshake { source, .. } => source.is_retryable(),
            _ => false,
        }
    }
}
