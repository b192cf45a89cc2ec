//! CLI-specific error types
//!
//! Request errors (bad JSON, parse or resolution failures) are reported
//! as an error response on stdout. Configuration and I/O errors end the
//! process.

use std::io;

use thiserror::Error;

use crate::config::ConfigError;
use crate::selection::SelectionError;

/// CLI error
#[derive(Debug, Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid request JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid request: {0}")]
    Request(String),

    #[error(transparent)]
    Selection(#[from] SelectionError),
}

impl CliError {
    pub fn request(msg: impl Into<String>) -> Self {
        CliError::Request(msg.into())
    }

    /// Stable error code for responses
    pub fn code(&self) -> &'static str {
        match self {
            CliError::Config(_) => "CLI_CONFIG_ERROR",
            CliError::Io(_) => "CLI_IO_ERROR",
            CliError::Json(_) => "CLI_INVALID_JSON",
            CliError::Request(_) => "CLI_INVALID_REQUEST",
            CliError::Selection(e) => e.code().code(),
        }
    }

    /// Whether the error belongs in a response rather than ending the process
    pub fn is_request_error(&self) -> bool {
        matches!(
            self,
            CliError::Json(_) | CliError::Request(_) | CliError::Selection(_)
        )
    }
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selection_error_keeps_code() {
        let err: CliError = SelectionError::unknown_variable("x").into();
        assert_eq!(err.code(), "SEL_UNKNOWN_VARIABLE");
        assert!(err.is_request_error());
        assert!(err.to_string().contains("'x'"));
    }

    #[test]
    fn test_io_error_is_not_request_error() {
        let err: CliError = io::Error::new(io::ErrorKind::BrokenPipe, "closed").into();
        assert_eq!(err.code(), "CLI_IO_ERROR");
        assert!(!err.is_request_error());
    }
}
