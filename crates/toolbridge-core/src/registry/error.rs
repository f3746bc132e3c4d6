//! Registry error types

use crate::error::UnifiedError;
use thiserror::Error;

/// Errors returned by lifecycle operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// Unknown server name
    #[error("Server '{name}' not found")]
    NotFound { name: String },

    /// Duplicate `add`
    #[error("Server '{name}' already exists")]
    AlreadyExists { name: String },

    /// `start` on a running or installing server
    #[error("Server '{name}' is already running")]
    AlreadyRunning { name: String },

    /// Operation needs a live connection
    #[error("Server '{name}' is not running")]
    NotRunning { name: String },

    /// Driver or connection failure
    #[error("Server '{name}' failed: {message}")]
    ExternalFailure { name: String, message: String },

    /// Registry was closed
    #[error("Registry is closed")]
    Closed,
}

impl RegistryError {
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound { name: name.into() }
    }

    pub fn already_exists(name: impl Into<String>) -> Self {
        Self::AlreadyExists { name: name.into() }
    }

    pub fn already_running(name: impl Into<String>) -> Self {
        Self::AlreadyRunning { name: name.into() }
    }

    pub fn not_running(name: impl Into<String>) -> Self {
        Self::NotRunning { name: name.into() }
    }

    pub fn external(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ExternalFailure {
            name: name.into(),
            message: message.into(),
        }
    }
}

impl UnifiedError for RegistryError {
    fn error_code(&self) -> &str {
        match self {
            Self::NotFound { .. } => "REGISTRY_NOT_FOUND",
            Self::AlreadyExists { .. } => "REGISTRY_ALREADY_EXISTS",
            Self::AlreadyRunning { .. } => "REGISTRY_ALREADY_RUNNING",
            Self::NotRunning { .. } => "REGISTRY_NOT_RUNNING",
            Self::ExternalFailure { .. } => "REGISTRY_EXTERNAL_FAILURE",
            Self::Closed => "REGISTRY_CLOSED",
        }
    }

    fn message(&self) -> &str {
        match self {
            Self::ExternalFailure { message, .. } => message,
            Self::NotFound { .. } => "Server not found",
            Self::AlreadyExists { .. } => "Server already exists",
            Self::AlreadyRunning { .. } => "Server already running",
            Self::NotRunning { .. } => "Server not running",
            Self::Closed => "Registry is closed",
        }
    }

    fn context(&self) -> Option<&str> {
        match self {
            Self::NotFound { name }
            | Self::AlreadyExists { name }
            | Self::AlreadyRunning { name }
            | Self::NotRunning { name }
            | Self::ExternalFailure { name, .. } => Some(name),
            Self::Closed => None,
        }
    }

    fn is_retryable(&self) -> bool {
        matches!(self, Self::ExternalFailure { .. })
    }
}
