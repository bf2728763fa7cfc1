// ============================================================================
// qcscan-core/src/error.rs
// ============================================================================
//
// ERROR HANDLING: Error Types for the qcscan Core Library
//
// This module defines the error taxonomy of the analysis engine. Reader and
// normalizer failures abort a pass; mode preconditions are reported per mode
// so that callers can continue with the remaining modes.

use std::path::{Path, PathBuf};
use std::process::ExitStatus;
use std::time::Duration;
use thiserror::Error;

/// Errors produced by the qcscan core library.
#[derive(Error, Debug)]
pub enum CoreError {
    /// The report is missing, unreadable or cannot be decompressed.
    #[error("Report unavailable: {}: {reason}", .path.display())]
    ReportUnavailable { path: PathBuf, reason: String },

    /// The report decompressed but its content is not a usable frame stream.
    #[error("Malformed report {}: {reason}", .path.display())]
    MalformedReport { path: PathBuf, reason: String },

    /// A frame value could not be interpreted by a consumer.
    /// Entry points convert this into `MalformedReport` with the report path.
    #[error("Malformed frame at {timestamp}: {reason}")]
    MalformedFrame { timestamp: String, reason: String },

    /// A required external capability cannot be used.
    #[error("Required dependency unavailable: {0}")]
    DependencyUnavailable(String),

    /// A mode cannot run because its input conditions are not met.
    #[error("{mode} cannot run: {reason}")]
    Precondition { mode: String, reason: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Path error: {0}")]
    PathError(String),

    #[error("Failed to start {0}: {1}")]
    CommandStart(String, std::io::Error),

    #[error("Failed waiting for {0}: {1}")]
    CommandWait(String, std::io::Error),

    #[error("{0} exited with {1}: {2}")]
    CommandFailed(String, ExitStatus, String),

    #[error("{0} timed out after {1:?}")]
    CommandTimeout(String, Duration),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    OperationFailed(String),
}

/// Result type used throughout the core library.
pub type CoreResult<T> = Result<T, CoreError>;

impl CoreError {
    /// Attaches the report path to frame-level errors.
    ///
    /// Consumers parse frame values without knowing which file they came from;
    /// the pass entry points call this so the final message names the file.
    pub fn in_report(self, path: &Path) -> Self {
        match self {
            CoreError::MalformedFrame { timestamp, reason } => CoreError::MalformedReport {
                path: path.to_path_buf(),
                reason: format!("frame at {timestamp}: {reason}"),
            },
            other => other,
        }
    }

    /// True for errors that make every remaining mode on the same report pointless.
    pub fn is_report_fatal(&self) -> bool {
        matches!(
            self,
            CoreError::ReportUnavailable { .. }
                | CoreError::MalformedReport { .. }
                | CoreError::DependencyUnavailable(_)
        )
    }
}

pub(crate) fn report_unavailable(path: &Path, reason: impl Into<String>) -> CoreError {
    CoreError::ReportUnavailable {
        path: path.to_path_buf(),
        reason: reason.into(),
    }
}

pub(crate) fn malformed_report(path: &Path, reason: impl Into<String>) -> CoreError {
    CoreError::MalformedReport {
        path: path.to_path_buf(),
        reason: reason.into(),
    }
}

pub(crate) fn command_start_error(cmd: &str, err: std::io::Error) -> CoreError {
    CoreError::CommandStart(cmd.to_string(), err)
}

pub(crate) fn command_wait_error(cmd: &str, err: std::io::Error) -> CoreError {
    CoreError::CommandWait(cmd.to_string(), err)
}

pub(crate) fn command_failed_error(cmd: &str, status: ExitStatus, stderr: impl Into<String>) -> CoreError {
    CoreError::CommandFailed(cmd.to_string(), status, stderr.into())
}
