//! Run logging through log4rs.
//!
//! The library itself only uses the `log` macros; binaries call
//! `setup_logging` once at startup.

pub mod setup;

pub use setup::{FILE_LOG_PATTERN, setup_logging};

/// File name of the log for a run started at `timestamp` (`YYYYMMDD_HHMMSS`).
pub fn run_log_file_name(timestamp: &str) -> String {
    format!("qcscan_run_{timestamp}.log")
}
