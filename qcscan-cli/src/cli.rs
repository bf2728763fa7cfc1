// qcscan-cli/src/cli.rs
//
// Defines the command-line argument structures using clap.

use clap::{Args, Parser, Subcommand};
use qcscan_core::processing::ThresholdCheck;
use std::path::PathBuf;

// --- CLI Argument Definition ---

#[derive(Parser, Debug)]
#[command(
    author,
    version, // Reads from Cargo.toml via "cargo" feature in clap
    about = "qcscan: quality-control analysis of QCTools reports",
    long_about = "Streams QCTools frame reports and reports threshold violations, \
                  color bars and content segments via the qcscan-core library."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose (debug) logging
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Analyzes one QCTools report with the selected modes
    Analyze(AnalyzeArgs),
    /// Lists the available profiles and content filters
    Profiles(ProfilesArgs),
}

#[derive(Args, Debug, Clone)]
pub struct AnalyzeArgs {
    /// QCTools report (.qctools.xml.gz)
    #[arg(short = 'i', long = "input", required = true, value_name = "REPORT")]
    pub report: PathBuf,

    /// Video the report describes (defaults to the file next to the report)
    #[arg(long, value_name = "VIDEO")]
    pub video: Option<PathBuf>,

    /// Directory for CSV tables and thumbnails (defaults to the report's directory)
    #[arg(short = 'o', long = "output", value_name = "OUTPUT_DIR")]
    pub output_dir: Option<PathBuf>,

    /// TOML configuration layered over the built-in profiles and filters
    #[arg(short, long, value_name = "CONFIG", env = "QCSCAN_CONFIG")]
    pub config: Option<PathBuf>,

    // --- Modes ---
    /// Detect SMPTE color bars
    #[arg(long)]
    pub bars_detect: bool,

    /// Measure the detected color bars and check the rest of the report against them
    #[arg(long)]
    pub bars_evaluate: bool,

    /// Check against a named profile (e.g. default, highTolerance)
    #[arg(short, long, value_name = "NAME")]
    pub profile: Option<String>,

    /// Ad hoc check written as TAG:OP:VALUE, e.g. YMAX:gt:940 (repeatable)
    #[arg(short, long = "tag", value_name = "TAG:OP:VALUE")]
    pub tags: Vec<ThresholdCheck>,

    /// Locate segments matching a named content filter (repeatable)
    #[arg(long = "content-filter", value_name = "NAME")]
    pub content_filters: Vec<String>,

    // --- Bounds ---
    /// Start of the analyzed range in seconds (defaults to the end of detected bars)
    #[arg(long, value_name = "SECONDS")]
    pub start: Option<f64>,

    /// End of the analyzed range in seconds
    #[arg(long, value_name = "SECONDS")]
    pub end: Option<f64>,

    // --- Thumbnails ---
    /// Export thumbnails of failing frames with ffmpeg
    #[arg(long)]
    pub thumbnails: bool,

    /// Minimum frames between two thumbnails of the same check, for every kind of check
    #[arg(long, value_name = "FRAMES")]
    pub thumb_delay: Option<u64>,

    /// Thumbnail cooldown for --profile checks (overrides --thumb-delay)
    #[arg(long, value_name = "FRAMES")]
    pub profile_thumb_delay: Option<u64>,

    /// Thumbnail cooldown for --tag checks (overrides --thumb-delay)
    #[arg(long, value_name = "FRAMES")]
    pub tag_thumb_delay: Option<u64>,

    /// Thumbnail cooldown for the bars-derived check (overrides --thumb-delay)
    #[arg(long, value_name = "FRAMES")]
    pub bars_thumb_delay: Option<u64>,

    /// Sliding window size for the color bars passes (odd)
    #[arg(long, value_name = "FRAMES")]
    pub buffer_size: Option<usize>,

    // --- Output ---
    /// Print all results as one JSON document
    #[arg(long)]
    pub json: bool,

    /// Directory for the run log file
    #[arg(short, long, value_name = "LOG_DIR")]
    pub log_dir: Option<PathBuf>,
}

impl AnalyzeArgs {
    /// True when at least one analysis mode was requested.
    pub fn has_mode(&self) -> bool {
        self.bars_detect
            || self.bars_evaluate
            || self.profile.is_some()
            || !self.tags.is_empty()
            || !self.content_filters.is_empty()
    }
}

#[derive(Args, Debug, Clone)]
pub struct ProfilesArgs {
    /// TOML configuration layered over the built-ins
    #[arg(short, long, value_name = "CONFIG", env = "QCSCAN_CONFIG")]
    pub config: Option<PathBuf>,
}
