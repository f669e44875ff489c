//! Structured error handling and exit codes.

use serde::Serialize;

/// Exit codes for the linkdupe application.
///
/// - 0: Success (run completed, all resolvable pairs consolidated)
/// - 1: General error (fatal failure before or during setup)
/// - 2: Partial failure (run completed but some pairs failed to link)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExitCode {
    /// Success: every pair was resolved.
    Success = 0,
    /// General error: a fatal error aborted the run. Fatal errors occur
    /// before any mutation has begun for the affected item, so no cleanup
    /// is required.
    GeneralError = 1,
    /// Partial failure: the run finished but one or more identical pairs
    /// could not be consolidated.
    PartialFailure = 2,
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
            Self::Success => "LD000",
            Self::GeneralError => "LD001",
            Self::PartialFailure => "LD002",
        }
    }
}

/// Structured error information for JSON output.
#[derive(Debug, Serialize)]
pub struct StructuredError {
    /// The error code (e.g., "LD001")
    pub code: String,
    /// The exit code number
    pub exit_code: i32,
    /// Human-readable error message
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
