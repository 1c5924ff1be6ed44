//! Error types for the usage pipeline.

use std::path::PathBuf;
use thiserror::Error;

/// Broad category of a [`UsageError`], used by callers to pick a response
/// without inspecting messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The caller supplied missing or malformed input
    Client,
    /// The log store could not be opened or does not look like an llm log database
    StoreUnavailable,
    /// Anything else
    Internal,
}

/// Usage pipeline errors.
#[derive(Error, Debug)]
pub enum UsageError {
    /// The log store could not be opened
    #[error("log store unavailable at {path}: {source}")]
    StoreUnavailable {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// The store opened but has no `responses` table
    #[error("the database at {path} does not contain a \"responses\" table")]
    MissingTable { path: PathBuf },

    /// Database error while querying
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Required date parameters were not supplied
    #[error("Start date and end date are required")]
    MissingDates,

    /// A date parameter did not parse
    #[error("Invalid date format for {param}: {value}. Expected YYYY-MM-DD.")]
    InvalidDate { param: &'static str, value: String },

    /// The query string could not be read
    #[error("Invalid query string: {message}")]
    InvalidQuery { message: String },

    /// Start date after end date
    #[error("start_date {start} is after end_date {end}")]
    InvalidRange { start: String, end: String },

    /// A blocking task panicked or was cancelled
    #[error("background task failed: {0}")]
    TaskJoin(String),
}

impl UsageError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            UsageError::MissingDates
            | UsageError::InvalidQuery { .. }
            | UsageError::InvalidDate { .. }
            | UsageError::InvalidRange { .. } => ErrorKind::Client,
            UsageError::StoreUnavailable { .. } | UsageError::MissingTable { .. } => {
                ErrorKind::StoreUnavailable
            }
            UsageError::Database(rusqlite::Error::SqliteFailure(e, _))
                if e.code == rusqlite::ErrorCode::CannotOpen
                    || e.code == rusqlite::ErrorCode::NotADatabase =>
            {
                ErrorKind::StoreUnavailable
            }
            UsageError::Database(_) | UsageError::TaskJoin(_) => ErrorKind::Internal,
        }
    }

    /// Check if this error is the caller's fault.
    pub fn is_client_error(&self) -> bool {
        self.kind() == ErrorKind::Client
    }
}

/// Result type for usage pipeline operations.
pub type Result<T> = std::result::Result<T, UsageError>;
