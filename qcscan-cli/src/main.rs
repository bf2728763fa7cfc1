// qcscan-cli/src/main.rs
//
// Entry point of the qcscan command-line tool.
//
// Responsibilities include:
// - Parsing user-provided arguments.
// - Setting up logging to the console and, with --log-dir, to a run log file.
// - Dispatching to the selected command.
// - Managing process exit codes based on success or failure.

use clap::Parser;
use qcscan::logging::{level_for, run_log_path};
use qcscan::output::print_error;
use qcscan::{Cli, Commands, print_run_report, run_analyze, run_profiles};
use qcscan_core::file_logging::setup_logging;
use std::path::PathBuf;
use std::process;

fn main() {
    let cli = Cli::parse();

    let log_file: Option<PathBuf> = match &cli.command {
        Commands::Analyze(args) => args.log_dir.as_deref().map(run_log_path),
        Commands::Profiles(_) => None,
    };
    if let Err(e) = setup_logging(log_file.as_deref(), level_for(cli.verbose)) {
        eprintln!("Failed to initialize logging: {e:#}");
        process::exit(1);
    }
    if let Some(path) = &log_file {
        log::debug!("Logging to {}", path.display());
    }

    let exit_code = match cli.command {
        Commands::Analyze(args) => {
            let json = args.json;
            match run_analyze(args) {
                Ok(run) => {
                    if let Err(e) = print_run_report(&run, json) {
                        print_error(&e.to_string());
                        1
                    } else if run.has_failures() {
                        1
                    } else {
                        0
                    }
                }
                Err(e) => {
                    log::error!("{e}");
                    print_error(&e.to_string());
                    1
                }
            }
        }
        Commands::Profiles(args) => match run_profiles(args) {
            Ok(()) => 0,
            Err(e) => {
                print_error(&e.to_string());
                1
            }
        },
    };

    process::exit(exit_code);
}
