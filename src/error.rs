//! Error types for Coderunner

use std::time::Duration;
use thiserror::Error;

/// Result type alias using Coderunner's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for Coderunner
#[derive(Error, Debug)]
pub enum Error {
    /// The requested language has no registered profile
    #[error("Unsupported language: {0}")]
    UnsupportedLanguage(String),

    /// The container runtime could not be reached
    #[error("Container runtime unavailable: {0}")]
    RuntimeUnavailable(String),

    /// The workspace directory could not be allocated
    #[error("Failed to allocate workspace: {0}")]
    ResourceAllocation(String),

    /// The runtime rejected the sandbox configuration
    #[error("Failed to create sandbox: {0}")]
    SandboxCreation(String),

    /// The program ran past its wall-clock limit
    #[error("Execution timed out after {} seconds", .timeout.as_secs_f64())]
    ExecutionTimeout {
        timeout: Duration,
        stdout: String,
        stderr: String,
    },

    /// The program exited non-zero, or its output could not be collected
    #[error("Execution failed: {message}")]
    ExecutionFailed {
        message: String,
        exit_code: Option<i64>,
        stdout: String,
        stderr: String,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Docker/container error
    #[error("Container error: {0}")]
    Container(String),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Generic internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Build an `ExecutionFailed` for a program that exited with `code`
    pub fn exited(code: i64, stdout: String, stderr: String) -> Self {
        Error::ExecutionFailed {
            message: format!("Process exited with code {}", code),
            exit_code: Some(code),
            stdout,
            stderr,
        }
    }

    /// Check if error is a client error (user's fault)
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Error::UnsupportedLanguage(_) | Error::InvalidInput(_)
        )
    }

    /// Check if error originates in the host infrastructure rather than the
    /// submitted program
    pub fn is_infrastructure_error(&self) -> bool {
        matches!(
            self,
            Error::RuntimeUnavailable(_)
                | Error::ResourceAllocation(_)
                | Error::SandboxCreation(_)
                | Error::Container(_)
                | Error::Io(_)
        )
    }
}

impl Error {
    /// HTTP status used when this error ends a batch request. Program and
    /// sandbox failures are reported in-band with 200.
    pub fn status_code(&self) -> u16 {
        match self {
            Error::UnsupportedLanguage(_) | Error::InvalidInput(_) => 400,
            Error::RuntimeUnavailable(_) => 500,
            _ => 200,
        }
    }
}

impl From<bollard::errors::Error> for Error {
    fn from(err: bollard::errors::Error) -> Self {
        Error::Container(err.to_string())
    }
}
