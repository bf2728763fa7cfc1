// ============================================================================
// qcscan-cli/src/logging.rs
// ============================================================================
//
// LOGGING UTILITIES: Helper Functions for Logging
//
// The run logger itself is configured by qcscan_core::file_logging (log4rs).
// This file decides the level and where the run log file goes.

use log::LevelFilter;
use qcscan_core::file_logging::run_log_file_name;
use std::path::{Path, PathBuf};

/// Returns the current local timestamp formatted as "YYYYMMDD_HHMMSS".
pub fn get_timestamp() -> String {
    chrono::Local::now().format("%Y%m%d_%H%M%S").to_string()
}

/// Debug with `--verbose`, Info otherwise.
pub fn level_for(verbose: bool) -> LevelFilter {
    if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    }
}

/// Path of this run's log file inside `log_dir`.
pub fn run_log_path(log_dir: &Path) -> PathBuf {
    log_dir.join(run_log_file_name(&get_timestamp()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_log_path_shape() {
        let path = run_log_path(Path::new("/tmp/logs"));
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("qcscan_run_"));
        assert!(name.ends_with(".log"));
        // qcscan_run_ + YYYYMMDD_HHMMSS + .log
        assert_eq!(name.len(), "qcscan_run_".len() + 15 + ".log".len());
    }

    #[test]
    fn test_level_for() {
        assert_eq!(level_for(true), LevelFilter::Debug);
        assert_eq!(level_for(false), LevelFilter::Info);
    }
}
