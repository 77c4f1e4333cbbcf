//! Linter error types.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while probing or running ShellCheck.
#[derive(Debug, Error)]
pub enum LinterError {
    /// The executable could not be found or is not executable.
    #[error("ShellCheck executable not found: {}", path.display())]
    ToolNotFound { path: PathBuf },

    /// The process started but failed unexpectedly.
    #[error("ShellCheck execution failed: {0}")]
    ExecutionFailed(String),

    /// Output did not decode as the expected format.
    #[error("Parse error: {0}")]
    Parse(String),

    /// The reported version could not be understood.
    #[error("Version error: {0}")]
    Version(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl LinterError {
    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates a parse error.
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }

    /// Creates an execution error.
    pub fn execution(message: impl Into<String>) -> Self {
        Self::ExecutionFailed(message.into())
    }

    /// Returns true for the "tool missing" class of failures.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::ToolNotFound { .. })
    }
}
