//! Core library for streaming quality-control analysis of QCTools reports.
//!
//! A QCTools report is a gzip-compressed XML document with one element per
//! frame carrying signal statistics (luma/chroma ranges, temporal outliers,
//! PSNR/MSE). This crate streams such reports frame by frame and checks them
//! against threshold profiles, finds and measures color bars, and locates
//! segments that match multi-tag content signatures.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use qcscan_core::{DurationWindow, QcConfig, QcSession, ReportSource};
//!
//! let config = QcConfig::default();
//! let session = QcSession::new(ReportSource::new("/archive/tape01.mkv.qctools.xml.gz"), &config);
//!
//! let bars = session.detect_bars().unwrap();
//! let profile = config.profile("default").unwrap();
//! let analysis = session.check_profile(&profile, DurationWindow::full()).unwrap();
//! println!("{} of {} frames failed", analysis.overall_failures, analysis.total_frames);
//! # let _ = bars;
//! ```

pub mod config;
pub mod error;
pub mod external;
pub mod file_logging;
pub mod processing;
pub mod report;
pub mod reporting;
pub mod utils;

// Re-exports for public API
pub use config::QcConfig;
pub use error::{CoreError, CoreResult};
pub use external::{FfmpegThumbnailExporter, ThumbnailExporter, ensure_ffmpeg_available};
pub use processing::{
    BarsDetection, BarsEvaluation, CancelCheck, CancelToken, ContentDetection, ContentFilterSpec,
    ContentOutcome, DurationWindow, PassStatus, Profile, ProfileAnalysis, QcSession, ReportSource,
};
pub use report::{FrameRecord, MediaFilter, MediaType, ReportReader};
pub use utils::{format_timestamp, parse_timestamp, video_id_from_report};
