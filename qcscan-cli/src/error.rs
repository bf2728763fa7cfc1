// ============================================================================
// qcscan-cli/src/error.rs
// ============================================================================
//
// CLI ERROR HANDLING: Error types and utilities for the CLI
//
// The CLI reuses the core error type and adds context to it where a failure
// needs to say which input or output file it concerns.

use qcscan_core::{CoreError, CoreResult};
use std::fmt;

/// Type alias for CLI results using CoreError.
pub type CliResult<T> = CoreResult<T>;

/// Extension trait for adding context to errors in the CLI.
///
/// Works like anyhow's `with_context` but stays within `CoreError`.
pub trait CliErrorContext<T> {
    /// Add context using a closure (for lazy evaluation).
    fn cli_with_context<C, F>(self, f: F) -> CliResult<T>
    where
        C: fmt::Display,
        F: FnOnce() -> C;
}

impl<T, E> CliErrorContext<T> for Result<T, E>
where
    E: Into<CoreError>,
{
    fn cli_with_context<C, F>(self, f: F) -> CliResult<T>
    where
        C: fmt::Display,
        F: FnOnce() -> C,
    {
        self.map_err(|e| {
            let core_error: CoreError = e.into();
            CoreError::OperationFailed(format!("{}: {}", f(), core_error))
        })
    }
}

/// A mode that could not produce a result.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ModeFailure {
    pub mode: String,
    pub message: String,
}

impl ModeFailure {
    pub fn new(mode: impl Into<String>, error: &CoreError) -> Self {
        Self {
            mode: mode.into(),
            message: error.to_string(),
        }
    }
}
