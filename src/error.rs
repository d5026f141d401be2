//! Process exit codes and structured error output.

use serde::Serialize;

use crate::duplicates::FinderError;

/// Exit codes for the dupscan binary.
///
/// - 0: scan completed, whether or not duplicates were found or files skipped
/// - 1: unexpected failure (e.g. the report could not be written)
/// - 2: the scan root is missing or not a directory
/// - 130: interrupted by Ctrl+C
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExitCode {
    /// Scan completed and the report was written.
    Success = 0,
    /// An unexpected error occurred.
    GeneralError = 1,
    /// The root directory is unusable; nothing was scanned or written.
    InvalidRoot = 2,
    /// The scan was interrupted by the user.
    Interrupted = 130,
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
            Self::Success => "DS000",
            Self::GeneralError => "DS001",
            Self::InvalidRoot => "DS002",
            Self::Interrupted => "DS130",
        }
    }

    /// Pick the exit code for an error returned by [`run_app`](crate::run_app).
    #[must_use]
    pub fn for_error(err: &anyhow::Error) -> Self {
        match err.downcast_ref::<FinderError>() {
            Some(FinderError::Interrupted) => Self::Interrupted,
            Some(FinderError::PathNotFound(_) | FinderError::NotADirectory(_)) => {
                Self::InvalidRoot
            }
            _ => Self::GeneralError,
        }
    }
}

/// Structured error information for JSON output.
#[derive(Debug, Serialize)]
pub struct StructuredError {
    /// The error code (e.g., "DS001")
    pub code: String,
    /// The exit code number
    pub exit_code: i32,
    /// Human-readable error message, including its causes
    pub message: String,
    /// Whether the operation was interrupted
    pub interrupted: bool,
}

impl StructuredError {
    /// Create a new structured error from an anyhow error and an exit code.
    #[must_use]
    pub fn new(err: &anyhow::Error, exit_code: ExitCode) -> Self {
        Self {
            code: exit_code.code_prefix().to_string(),
            exit_code: exit_code.as_i32(),
            message: format!("{:#}", err),
            interrupted: exit_code == ExitCode::Interrupted,
        }
    }
}
