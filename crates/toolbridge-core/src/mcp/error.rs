//! MCP error types

use crate::error::UnifiedError;
use thiserror::Error;

/// Errors raised on the MCP control channel
#[derive(Debug, Error, Clone)]
pub enum McpError {
    /// Connection could not be established or was lost
    #[error("Connection error: {message}")]
    Connection { message: String },

    /// Peer sent something that is not valid MCP
    #[error("Protocol error: {message}")]
    Protocol { message: String },

    /// Underlying byte stream failed
    #[error("Transport error: {message}")]
    Transport { message: String },

    /// JSON-RPC error returned by the server
    #[error("Server error {code}: {message}")]
    Server { code: i32, message: String },

    /// No response within the request timeout
    #[error("Request timeout after {millis}ms")]
    Timeout { millis: u64 },

    /// Serialization error
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    /// Request issued before `initialize` completed
    #[error("Client not initialized")]
    NotInitialized,

    /// `initialize` called twice
    #[error("Client already initialized")]
    AlreadyInitialized,
}

impl McpError {
    /// Create a new Connection error
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Create a new Protocol error
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol {
            message: message.into(),
        }
    }

    /// Create a new Transport error
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Create a new Server error
    pub fn server(code: i32, message: impl Into<String>) -> Self {
        Self::Server {
            code,
            message: message.into(),
        }
    }

    /// Create a new Timeout error
    pub fn timeout(duration: std::time::Duration) -> Self {
        Self::Timeout {
            millis: u64::try_from(duration.as_millis()).unwrap_or(u64::MAX),
        }
    }

    /// Create a new Serialization error
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }
}

impl UnifiedError for McpError {
    fn error_code(&self) -> &str {
        match self {
            Self::Connection { .. } => "MCP_CONNECTION",
            Self::Protocol { .. } => "MCP_PROTOCOL",
            Self::Transport { .. } => "MCP_TRANSPORT",
            Self::Server { .. } => "MCP_SERVER",
            Self::Timeout { .. } => "MCP_TIMEOUT",
            Self::Serialization { .. } => "MCP_SERIALIZATION",
            Self::NotInitialized => "MCP_NOT_INITIALIZED",
            Self::AlreadyInitialized => "MCP_ALREADY_INITIALIZED",
        }
    }

    fn message(&self) -> &str {
        match self {
            Self::Connection { message }
            | Self::Protocol { message }
            | Self::Transport { message }
            | Self::Server { message, .. }
            | Self::Serialization { message } => message,
            Self::Timeout { .. } => "Request timeout",
            Self::NotInitialized => "Client not initialized",
            Self::AlreadyInitialized => "Client already initialized",
        }
    }

    fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Connection { .. } | Self::Transport { .. } | Self::Timeout { .. }
        )
    }
}

impl From<serde_json::Error> for McpError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization(err.to_string())
    }
}

impl From<std::io::Error> for McpError {
    fn from(err: std::io::Error) -> Self {
        Self::transport(err.to_string())
    }
}
