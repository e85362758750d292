//! Shared error and exit-code types for CLI commands.

use thiserror::Error;

/// Process exit codes used by the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    /// Command completed successfully
    Success = 0,
    /// Invalid input or configuration
    ValidationError = 1,
    /// File system or terminal failure
    IoError = 2,
    /// A console command ran and reported failure
    CommandFailed = 3,
}

impl ExitCode {
    /// Numeric process exit status.
    #[must_use]
    pub const fn code(self) -> i32 {
        self as i32
    }
}

/// Error returned by a CLI command.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct CliError {
    /// Exit status the process ends with
    pub exit_code: ExitCode,
    /// Message printed after `Error:`
    pub message: String,
}

impl CliError {
    /// Input or configuration problem.
    pub fn validation(message: impl Into<String>) -> Self {
        Self {
            exit_code: ExitCode::ValidationError,
            message: message.into(),
        }
    }

    /// File system or terminal problem.
    pub fn io(message: impl Into<String>) -> Self {
        Self {
            exit_code: ExitCode::IoError,
            message: message.into(),
        }
    }

    /// Console command failure carrying its status.
    pub fn command(status: i32) -> Self {
        Self {
            exit_code: ExitCode::CommandFailed,
            message: format!("command failed with status {status}"),
        }
    }
}

/// Result type for CLI commands.
pub type CliResult<T> = Result<T, CliError>;
