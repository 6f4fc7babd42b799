//! Error types for sprintboard
//!
//! Exit codes:
//! - 0: Success
//! - 2: User error (validation, unknown id, bad args, bad config)
//! - 3: Invalid state (sprint lifecycle transition not allowed)
//! - 4: Storage failure (io, serialization, lock contention)

use std::path::PathBuf;
use thiserror::Error;

/// Exit codes for the sprintboard CLI
pub mod exit_codes {
    pub const USER_ERROR: i32 = 2;
    pub const INVALID_STATE: i32 = 3;
    pub const STORAGE_FAILED: i32 = 4;
}

/// Main error type for sprintboard operations
#[derive(Error, Debug)]
pub enum Error {
    // User errors (exit code 2)
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    // Lifecycle violations (exit code 3)
    #[error("Sprint {sprint} cannot move from {from} to {to}")]
    InvalidState {
        sprint: String,
        from: String,
        to: String,
    },

    // Storage failures (exit code 4)
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("Lock acquisition failed: {0}")]
    LockFailed(PathBuf),
}

/// Coarse classification of [`Error`] values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    InvalidState,
    Storage,
    Usage,
}

impl ErrorKind {
    /// Snake-case name used in JSON output
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::NotFound => "not_found",
            ErrorKind::InvalidState => "invalid_state",
            ErrorKind::Storage => "storage",
            ErrorKind::Usage => "usage",
        }
    }
}

impl Error {
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        Error::NotFound {
            kind,
            id: id.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Validation(_) => ErrorKind::Validation,
            Error::NotFound { .. } => ErrorKind::NotFound,
            Error::InvalidState { .. } => ErrorKind::InvalidState,
            Error::InvalidConfig(_) | Error::InvalidArgument(_) => ErrorKind::Usage,
            Error::Storage(_)
            | Error::Io(_)
            | Error::Json(_)
            | Error::TomlParse(_)
            | Error::TomlSerialize(_)
            | Error::LockFailed(_) => ErrorKind::Storage,
        }
    }

    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self.kind() {
            ErrorKind::Validation | ErrorKind::NotFound | ErrorKind::Usage => {
                exit_codes::USER_ERROR
            }
            ErrorKind::InvalidState => exit_codes::INVALID_STATE,
            ErrorKind::Storage => exit_codes::STORAGE_FAILED,
        }
    }

    /// Structured details for JSON error output, when the variant has any
    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            Error::NotFound { kind, id } => Some(serde_json::json!({
                "entity": kind,
                "id": id,
            })),
            Error::InvalidState { sprint, from, to } => Some(serde_json::json!({
                "sprint": sprint,
                "from": from,
                "to": to,
            })),
            Error::LockFailed(path) => Some(serde_json::json!({
                "lock": path.display().to_string(),
            })),
            _ => None,
        }
    }
}

/// Result type alias for sprintboard operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error body of a JSON envelope
#[derive(Debug, serde::Serialize)]
pub struct JsonError {
    pub message: String,
    pub code: i32,
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl From<&Error> for JsonError {
    fn from(err: &Error) -> Self {
        JsonError {
            message: err.to_string(),
            code: err.exit_code(),
            kind: err.kind().as_str(),
            details: err.details(),
        }
    }
}
