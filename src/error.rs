// src/error.rs
//! Application error types with structured error handling.
//!
//! Error types form the vocabulary for failure modes in the system.
//! The taxonomy follows the blast radius of each failure: configuration
//! errors abort the run, sub-call errors are recorded and skipped, task
//! failures are isolated at the dispatcher, and sink failures are isolated
//! per table by the caller.

use std::fmt;
use thiserror::Error;

/// Configuration problems detected before any extraction starts.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Schema name must be set (alphanumeric characters and underscores only)")]
    EmptySchemaName,

    #[error("Invalid schema name '{0}': must contain only alphanumeric characters and underscores")]
    InvalidSchemaName(String),

    #[error("Workspace filter cannot be empty; use \"All\" to scan every workspace")]
    EmptyWorkspaceFilter,

    #[error("Workspace filter can contain at most {max} names (got {actual}); use \"All\" to scan every workspace")]
    TooManyWorkspaces { actual: usize, max: usize },

    #[error("Parallel workers must be an integer between {min} and {max} (got {actual})")]
    WorkerCountOutOfRange { actual: usize, min: usize, max: usize },

    #[error("No workspaces found matching: {}", names.join(", "))]
    NoMatchingWorkspaces { names: Vec<String> },

    #[error("Invalid base URL '{url}': {cause}")]
    InvalidBaseUrl { url: String, cause: String },

    #[error("Missing configuration: {0}")]
    Missing(String),
}

/// Main application error type.
#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Configuration(#[from] ConfigError),

    #[error("Network failure: {0}")]
    NetworkFailure(#[from] reqwest::Error),

    #[error("Service returned HTTP {status} for {endpoint}")]
    ServiceStatus { endpoint: String, status: u16 },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Failed to decode payload: {0}")]
    Decode(String),

    #[error("Filesystem IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to write table {table}: {cause}")]
    Sink { table: String, cause: String },

    #[error("Long-running operation did not complete: {0}")]
    OperationIncomplete(String),

    #[error("Internal error: {message}")]
    InternalError {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

// Allow converting from anyhow::Error, preserving the message
impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::InternalError {
            message: err.to_string(),
            source: None,
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::MalformedResponse(err.to_string())
    }
}

impl From<base64::DecodeError> for AppError {
    fn from(err: base64::DecodeError) -> Self {
        AppError::Decode(err.to_string())
    }
}

/// One failed dependent call inside a detail fetch.
///
/// Rendered as `"<subcall>: <cause>"`. Recorded, surfaced in diagnostics,
/// never escalated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubcallError {
    pub subcall: &'static str,
    pub cause: String,
}

impl SubcallError {
    pub fn new(subcall: &'static str, cause: impl fmt::Display) -> Self {
        Self {
            subcall,
            cause: cause.to_string(),
        }
    }
}

impl fmt::Display for SubcallError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.subcall, self.cause)
    }
}

/// Rewrites common introspection failures into short operator-facing messages.
pub fn friendly_message(error: &AppError, context: &str) -> String {
    let message = error.to_string();
    let lower = message.to_lowercase();
    let suffix = if context.is_empty() {
        String::new()
    } else {
        format!(" {}", context)
    };

    if matches!(error, AppError::ServiceStatus { status: 401 | 403, .. })
        || message.contains("does not have permission")
    {
        format!("Insufficient permissions{}", suffix)
    } else if lower.contains("session")
        && (lower.contains("timeout") || lower.contains("expired") || lower.contains("cannot be found"))
    {
        format!("Session timeout or connection lost{}", suffix)
    } else if lower.contains("database is empty") {
        "Database is empty (staging lakehouse or no data)".to_string()
    } else {
        message
    }
}

/// Result type alias for convenience
#[allow(dead_code)]
pub type Result<T, E = AppError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subcall_error_renders_name_and_cause() {
        let err = SubcallError::new("refresh schedule", "HTTP timeout");
        assert_eq!(err.to_string(), "refresh schedule: HTTP timeout");
    }

    #[test]
    fn configuration_errors_are_transparent() {
        let err: AppError = ConfigError::WorkerCountOutOfRange {
            actual: 11,
            min: 1,
            max: 10,
        }
        .into();
        assert_eq!(
            err.to_string(),
            "Parallel workers must be an integer between 1 and 10 (got 11)"
        );
    }

    #[test]
    fn forbidden_status_reads_as_permission_problem() {
        let err = AppError::ServiceStatus {
            endpoint: "v1/workspaces/w/semanticModels/m/getDefinition".to_string(),
            status: 403,
        };
        assert_eq!(
            friendly_message(&err, "opening model"),
            "Insufficient permissions opening model"
        );
    }
}
