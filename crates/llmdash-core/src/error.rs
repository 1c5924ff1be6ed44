//! Error types for llmdash startup and configuration.
//!
//! [`DashError`] covers failures that happen outside a single query: loading
//! configuration, preparing log directories, binding the HTTP listener.
//! Per-query failures live in `llmdash_usage::UsageError`.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using [`DashError`].
pub type Result<T> = std::result::Result<T, DashError>;

/// Process-level error type for llmdash.
#[derive(Debug, Error)]
pub enum DashError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Configuration file not found
    #[error("Configuration not found at {path}")]
    ConfigNotFound {
        path: PathBuf,
        #[source]
        source: Option<std::io::Error>,
    },

    /// Configuration file is invalid YAML
    #[error("Invalid configuration at {path}: {message}")]
    ConfigInvalid { path: PathBuf, message: String },

    /// Configuration validation failed
    #[error("Configuration validation failed: {message}")]
    ConfigValidation { message: String },

    // =========================================================================
    // I/O Errors
    // =========================================================================
    /// Generic I/O error with context
    #[error("I/O error {operation}: {path}")]
    Io {
        operation: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Directory creation failed
    #[error("Failed to create directory: {path}")]
    DirectoryCreation {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // =========================================================================
    // Server Errors
    // =========================================================================
    /// Could not bind the HTTP listener
    #[error("Failed to bind {addr}")]
    ServerBind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// The HTTP server stopped with an error
    #[error("Server error: {message}")]
    Server { message: String },

    // =========================================================================
    // Internal Errors
    // =========================================================================
    /// Internal error (bug in llmdash)
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl DashError {
    /// Create a ConfigNotFound error
    pub fn config_not_found(path: impl Into<PathBuf>) -> Self {
        Self::ConfigNotFound {
            path: path.into(),
            source: None,
        }
    }

    /// Create a ConfigNotFound error with source
    pub fn config_not_found_with_source(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::ConfigNotFound {
            path: path.into(),
            source: Some(source),
        }
    }

    /// Create a ConfigInvalid error from a YAML failure
    pub fn config_invalid(path: impl Into<PathBuf>, source: &serde_yaml::Error) -> Self {
        Self::ConfigInvalid {
            path: path.into(),
            message: source.to_string(),
        }
    }

    /// Create a ConfigValidation error
    pub fn config_validation(message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            message: message.into(),
        }
    }

    /// Create an I/O error
    pub fn io(operation: impl Into<String>, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            operation: operation.into(),
            path: path.into(),
            source,
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns true if this is a configuration error
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            Self::ConfigNotFound { .. } | Self::ConfigInvalid { .. } | Self::ConfigValidation { .. }
        )
    }

    /// Returns actionable guidance for the user
    pub fn guidance(&self) -> Option<&'static str> {
        match self {
            Self::ConfigNotFound { .. } => {
                Some("Create the file or omit --config to run with defaults")
            }
            Self::ConfigInvalid { .. } => Some("Check the YAML syntax of the configuration file"),
            Self::ConfigValidation { .. } => {
                Some("Fix the reported field in the configuration file or on the command line")
            }
            Self::ServerBind { .. } => Some("Pick a free port with --port"),
            Self::DirectoryCreation { .. } => Some("Check permissions or pass --log-dir"),
            _ => None,
        }
    }
}
