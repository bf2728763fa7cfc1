//! Streaming analysis passes.
//!
//! Each pass consumes a frame iterator once and returns an aggregate. The
//! `session` module wires the passes to a report file.

/// Threshold analysis against resolved profiles
pub mod analysis;

/// Bit depth, color bars detection and bars evaluation
pub mod bars;

/// Cooperative cancellation
pub mod cancel;

/// Multi-tag content segments
pub mod content;

/// Profile shapes and comparison resolution
pub mod profile;

/// Per-mode entry points over one report
pub mod session;

/// Bounded sliding window
pub mod window;

pub use analysis::{DurationWindow, FailureRecord, ProfileAnalysis, TagFailures, analyze_frames};
pub use bars::{BarPeak, BarsDetection, BarsEvaluation, BarsSegment, BitDepth};
pub use cancel::{CancelCheck, CancelToken, NeverCancel, PassStatus};
pub use content::{ContentDetection, ContentFilterSpec, ContentOutcome, TimeRange, merge_ranges};
pub use profile::{Comparison, Profile, ProfileKind, ResolvedProfile, ThresholdCheck};
pub use session::{QcSession, ReportSource};
pub use window::SlidingWindow;
