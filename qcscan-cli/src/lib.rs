// qcscan-cli/src/lib.rs
//
// Library portion of the qcscan CLI application.
// Contains argument definitions and command logic.

pub mod cli;
pub mod commands;
pub mod error;
pub mod logging;
pub mod output;
pub mod progress;

// Re-export items needed by the binary or integration tests
pub use cli::{AnalyzeArgs, Cli, Commands, ProfilesArgs};
pub use commands::analyze::{RunReport, print_run_report, run_analyze};
pub use commands::profiles::run_profiles;
