//! Command implementations for the CLI.
//!
//! Each submodule contains the implementation of a specific command.

/// Module containing the implementation of the `analyze` command.
/// Runs the selected analysis modes over one report and exports CSV tables.
pub mod analyze;

/// Lists the configured profiles and content filters.
pub mod profiles;
