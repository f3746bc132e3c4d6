//! Invoker errors

use thiserror::Error;
use toolbridge_core::UnifiedError;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InvokeError {
    /// HTTP client could not be built
    #[error("Failed to create HTTP client: {message}")]
    Client { message: String },

    /// Request could not be sent or the body could not be read
    #[error("Request to {endpoint} failed: {message}")]
    Transport { endpoint: String, message: String },

    #[error("Request to {endpoint} timed out")]
    Timeout { endpoint: String },

    /// Non-success HTTP status
    #[error("HTTP {status} from {endpoint}: {body}")]
    Status {
        endpoint: String,
        status: u16,
        body: String,
    },

    /// JSON-RPC error object in the response
    #[error("Remote error {code}: {message}")]
    Rpc { code: i32, message: String },

    /// Response body was not a usable JSON-RPC response
    #[error("Invalid response: {message}")]
    Decode { message: String },
}

impl InvokeError {
    pub fn transport(endpoint: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Transport {
            endpoint: endpoint.into(),
            message: message.into(),
        }
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }
}

impl UnifiedError for InvokeError {
    fn error_code(&self) -> &str {
        match self {
            Self::Client { .. } => "INVOKE_CLIENT",
            Self::Transport { .. } => "INVOKE_TRANSPORT",
            Self::Timeout { .. } => "INVOKE_TIMEOUT",
            Self::Status { .. } => "INVOKE_HTTP_STATUS",
            Self::Rpc { .. } => "INVOKE_RPC",
            Self::Decode { .. } => "INVOKE_DECODE",
        }
    }

    fn message(&self) -> &str {
        match self {
            Self::Client { message } | Self::Transport { message, .. } => message,
            Self::Timeout { .. } => "Request timed out",
            Self::Status { body, .. } => body,
            Self::Rpc { message, .. } => message,
            Self::Decode { message } => message,
        }
    }

    fn context(&self) -> Option<&str> {
        match self {
            Self::Transport { endpoint, .. }
            | Self::Timeout { endpoint }
            | Self::Status { endpoint, .. } => Some(endpoint),
            Self::Client { .. } | Self::Rpc { .. } | Self::Decode { .. } => None,
        }
    }

    fn is_retryable(&self) -> bool {
        match self {
            Self::Transport { .. } | Self::Timeout { .. } => true,
            Self::Status { status, .. } => *status >= 500,
            Self::Client { .. } | Self::Rpc { .. } | Self::Decode { .. } => false,
        }
    }
}
