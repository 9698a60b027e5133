//! Structured error handling and exit codes.

use serde::Serialize;

use crate::config::ConfigError;

/// Exit codes for the tarsort application.
///
/// - 0: Success
/// - 1: General error (unsupported file, I/O failure, bad settings)
/// - 2: Invalid flag combination, nothing was scanned or written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExitCode {
    /// The run completed.
    Success = 0,
    /// The run was aborted by an error.
    GeneralError = 1,
    /// The command line was rejected before the run started.
    Usage = 2,
}

impl ExitCode {
    /// Get the numeric exit code.
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Get the machine-readable code prefix.
    #[must_use]
    pub fn code_prefix(self) -> &'static str {
        match self {
            Self::Success => "TS000",
            Self::GeneralError => "TS001",
            Self::Usage => "TS002",
        }
    }

    /// Pick the exit code for an error returned by [`run_app`](crate::run_app).
    #[must_use]
    pub fn for_error(err: &anyhow::Error) -> Self {
        if err
            .downcast_ref::<ConfigError>()
            .is_some_and(ConfigError::is_usage)
        {
            Self::Usage
        } else {
            Self::GeneralError
        }
    }
}

/// Structured error information for JSON output.
#[derive(Debug, Serialize)]
pub struct StructuredError {
    /// The error code (e.g., "TS001")
    pub code: String,
    /// The exit code number
    pub exit_code: i32,
    /// Human-readable error message, including its causes
    pub message: String,
}

impl StructuredError {
    /// Create a new structured error from an anyhow error and an exit code.
    #[must_use]
    pub fn new(err: &anyhow::Error, exit_code: ExitCode) -> Self {
        Self {
            code: exit_code.code_prefix().to_string(),
            exit_code: exit_code.as_i32(),
            message: format!("{err:#}"),
        }
    }
}
