//! Utility functions for timestamps and report naming.
//!
//! This module provides general-purpose helpers used throughout the
//! qcscan-core library: formatting frame timestamps the way reports and
//! thumbnails expect them, parsing them back, and deriving the video
//! identifier from a report file name.

use std::path::{Path, PathBuf};

/// Report file suffixes, longest first.
const REPORT_SUFFIXES: &[&str] = &[".qctools.xml.gz", ".xml.gz", ".gz"];

/// Formats seconds as HH:MM:SS.ffff (e.g., 3725.5 -> "01:02:05.5000").
/// Returns "??:??:??.????" for invalid inputs.
#[must_use]
pub fn format_timestamp(seconds: f64) -> String {
    if seconds < 0.0 || !seconds.is_finite() {
        return "??:??:??.????".to_string();
    }

    // Round once at the output precision so 59.99996 carries into the minute
    let ticks = (seconds * 10_000.0).round() as u64;
    let fraction = ticks % 10_000;
    let total_seconds = ticks / 10_000;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let secs = total_seconds % 60;
    format!("{hours:02}:{minutes:02}:{secs:02}.{fraction:04}")
}

/// Formats a raw report timestamp (fractional seconds as text).
/// Text that is not a number is returned unchanged.
#[must_use]
pub fn format_report_time(raw: &str) -> String {
    match raw.trim().parse::<f64>() {
        Ok(seconds) => format_timestamp(seconds),
        Err(_) => raw.to_string(),
    }
}

/// Parses an HH:MM:SS(.fff) timestamp to seconds. Returns None if invalid.
#[must_use]
pub fn parse_timestamp(time: &str) -> Option<f64> {
    let parts: Vec<&str> = time.split(':').collect();
    if parts.len() == 3 {
        let hours = parts[0].parse::<f64>().ok()?;
        let minutes = parts[1].parse::<f64>().ok()?;
        let seconds = parts[2].parse::<f64>().ok()?;
        Some(hours * 3600.0 + minutes * 60.0 + seconds)
    } else {
        None
    }
}

/// Derives the video identifier from a report path by stripping the report suffix.
///
/// `/archive/tape01.mkv.qctools.xml.gz` -> `tape01.mkv`
#[must_use]
pub fn video_id_from_report(report: &Path) -> String {
    let name = report
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    for suffix in REPORT_SUFFIXES {
        if let Some(stripped) = name.strip_suffix(suffix) {
            if !stripped.is_empty() {
                return stripped.to_string();
            }
        }
    }
    name
}

/// Returns the video that sits next to a report, if there is one.
///
/// QCTools writes `<video>.qctools.xml.gz` beside `<video>`.
#[must_use]
pub fn sibling_video_path(report: &Path) -> Option<PathBuf> {
    let video = report.with_file_name(video_id_from_report(report));
    (video != report && video.is_file()).then_some(video)
}
