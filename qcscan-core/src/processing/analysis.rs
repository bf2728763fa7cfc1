//! Threshold analysis of a frame stream against a resolved profile.
//!
//! Used for named profiles, ad hoc tag checks and bars-derived profiles
//! alike. Produces per-tag failure counts, an overall count of failing
//! frames and a detail map of every violation keyed by timestamp.

use crate::config::PROGRESS_LOG_INTERVAL_FRAMES;
use crate::error::{CoreError, CoreResult};
use crate::external::thumbnail::{ThumbnailSampler, ThumbnailStats};
use crate::processing::cancel::{CancelCheck, PassStatus};
use crate::processing::profile::{ProfileKind, ResolvedProfile};
use crate::report::frame::{FrameRecord, MediaType};
use crate::utils::format_timestamp;
use log::{debug, info, warn};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};

/// Inclusive time bounds of a pass, in seconds. `end: None` runs to the end
/// of the report.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DurationWindow {
    pub start: f64,
    pub end: Option<f64>,
}

impl Default for DurationWindow {
    fn default() -> Self {
        Self::full()
    }
}

impl DurationWindow {
    pub const fn full() -> Self {
        Self {
            start: 0.0,
            end: None,
        }
    }

    /// Builds a window from optional caller bounds.
    pub fn new(start: Option<f64>, end: Option<f64>) -> CoreResult<Self> {
        let start = start.unwrap_or(0.0);
        if !start.is_finite() || start < 0.0 {
            return Err(CoreError::Config(format!("invalid start time {start}")));
        }
        if let Some(end) = end {
            if !end.is_finite() || end < start {
                return Err(CoreError::Config(format!(
                    "end time {end} must be a number not before the start time {start}"
                )));
            }
        }
        Ok(Self { start, end })
    }

    pub fn is_before(&self, t: f64) -> bool {
        t < self.start
    }

    pub fn is_past(&self, t: f64) -> bool {
        self.end.is_some_and(|end| t > end)
    }
}

/// One violated threshold in one frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailureRecord {
    pub timestamp: String,
    pub tag: String,
    pub value: f64,
    pub threshold: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagFailures {
    pub tag: String,
    pub count: u64,
}

/// Aggregate of one profile or tag check pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfileAnalysis {
    pub profile_name: String,
    pub kind: ProfileKind,
    pub window: DurationWindow,
    pub total_frames: u64,
    /// Per-tag counts in profile order.
    pub tag_failures: Vec<TagFailures>,
    /// Frames with at least one violation.
    pub overall_failures: u64,
    /// Formatted timestamp -> violations in that frame.
    pub failures: BTreeMap<String, Vec<FailureRecord>>,
    pub status: PassStatus,
    pub thumbnails: ThumbnailStats,
}

impl ProfileAnalysis {
    /// Number of failure records across all timestamps.
    pub fn failure_record_count(&self) -> usize {
        self.failures.values().map(Vec::len).sum()
    }

    pub fn failures_for(&self, tag: &str) -> u64 {
        self.tag_failures
            .iter()
            .find(|t| t.tag == tag)
            .map_or(0, |t| t.count)
    }
}

/// Checks every video frame inside `window` against the profile.
///
/// Cancellation is polled before each frame is counted. A cancelled pass
/// returns the counts of the frames it processed.
pub fn analyze_frames<I>(
    frames: I,
    profile: &ResolvedProfile,
    window: DurationWindow,
    mut sampler: Option<&mut ThumbnailSampler<'_>>,
    cancel: &dyn CancelCheck,
) -> CoreResult<ProfileAnalysis>
where
    I: IntoIterator<Item = CoreResult<FrameRecord>>,
{
    info!(
        "Checking {} '{}' from {}",
        profile.kind.label().to_lowercase(),
        profile.name,
        format_timestamp(window.start)
    );

    let mut tag_counts = vec![0u64; profile.checks.len()];
    let mut failures: BTreeMap<String, Vec<FailureRecord>> = BTreeMap::new();
    let mut failed_frames: HashSet<String> = HashSet::new();
    let mut total_frames: u64 = 0;
    let mut status = PassStatus::Completed;

    for frame in frames {
        if cancel.is_cancelled() {
            status = PassStatus::Cancelled;
            info!("Check '{}' cancelled after {total_frames} frames", profile.name);
            break;
        }
        let frame = frame?;
        if frame.media_type() != MediaType::Video {
            continue;
        }
        let t = frame.seconds()?;
        if window.is_before(t) {
            continue;
        }
        if window.is_past(t) {
            break;
        }

        total_frames += 1;
        if let Some(sampler) = sampler.as_deref_mut() {
            sampler.tick();
        }
        if total_frames % PROGRESS_LOG_INTERVAL_FRAMES == 0 {
            debug!("Check '{}': {total_frames} frames analyzed", profile.name);
        }

        let mut timestamp: Option<String> = None;
        for (check, count) in profile.checks.iter().zip(tag_counts.iter_mut()) {
            let Some(value) = frame.metric(&check.tag)? else {
                continue;
            };
            if !check.is_violated_by(value) {
                continue;
            }

            let formatted = timestamp.get_or_insert_with(|| frame.formatted_timestamp());
            *count += 1;
            warn!(
                "{} {} {} at {formatted}: {value}",
                check.tag,
                check.comparison.symbol(),
                check.threshold
            );
            failures.entry(formatted.clone()).or_default().push(FailureRecord {
                timestamp: formatted.clone(),
                tag: check.tag.clone(),
                value,
                threshold: check.threshold,
            });
            failed_frames.insert(frame.timestamp().to_string());
            if let Some(sampler) = sampler.as_deref_mut() {
                sampler.offer(&check.tag, value, formatted);
            }
        }
    }

    let overall_failures = failed_frames.len() as u64;
    info!(
        "Check '{}' finished: {overall_failures} of {total_frames} frames failed",
        profile.name
    );

    Ok(ProfileAnalysis {
        profile_name: profile.name.clone(),
        kind: profile.kind,
        window,
        total_frames,
        tag_failures: profile
            .checks
            .iter()
            .zip(tag_counts)
            .map(|(check, count)| TagFailures {
                tag: check.tag.clone(),
                count,
            })
            .collect(),
        overall_failures,
        failures,
        status,
        thumbnails: sampler.map(|s| s.stats()).unwrap_or_default(),
    })
}
