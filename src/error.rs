//! Error types for trk
//!
//! Exit codes:
//! - 0: Success
//! - 2: User error (bad args, validation failure, unresolved reference)
//! - 4: Operation failed (storage, lock, serialization)

use std::path::PathBuf;
use thiserror::Error;

/// Exit codes for the trk CLI
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const USER_ERROR: i32 = 2;
    pub const OPERATION_FAILED: i32 = 4;
}

/// Main error type for trk operations
#[derive(Error, Debug)]
pub enum Error {
    // User errors (exit code 2)
    #[error("No tracker found from {0} (run `trk init` first)")]
    TrackerNotFound(PathBuf),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Company not found: {0}")]
    CompanyNotFound(String),

    #[error("Project not found: {0}")]
    ProjectNotFound(String),

    #[error("Milestone not found: {0}")]
    MilestoneNotFound(String),

    #[error("Task not found: {0}")]
    TaskNotFound(String),

    #[error("Ambiguous id prefix {id}: matches {}", .candidates.join(", "))]
    AmbiguousId { id: String, candidates: Vec<String> },

    // Operation failures (exit code 4)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("Lock acquisition failed: {0}")]
    LockFailed(PathBuf),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl Error {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            // User errors
            Error::TrackerNotFound(_)
            | Error::InvalidConfig(_)
            | Error::InvalidArgument(_)
            | Error::Validation(_)
            | Error::CompanyNotFound(_)
            | Error::ProjectNotFound(_)
            | Error::MilestoneNotFound(_)
            | Error::TaskNotFound(_)
            | Error::AmbiguousId { .. } => exit_codes::USER_ERROR,

            // Operation failures
            Error::Io(_)
            | Error::Json(_)
            | Error::TomlSerialize(_)
            | Error::LockFailed(_)
            | Error::Storage(_) => exit_codes::OPERATION_FAILED,
        }
    }

    /// Structured payload for JSON error output, where one exists
    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            Error::AmbiguousId { candidates, .. } => Some(serde_json::json!({
                "candidates": candidates,
            })),
            _ => None,
        }
    }
}

/// Result type alias for trk operations
pub type Result<T> = std::result::Result<T, Error>;

/// Wrapper for displaying errors in JSON format
#[derive(serde::Serialize)]
pub struct JsonError {
    pub error: String,
    pub code: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl From<&Error> for JsonError {
    fn from(err: &Error) -> Self {
        JsonError {
            error: err.to_string(),
            code: err.exit_code(),
            details: err.details(),
        }
    }
}
