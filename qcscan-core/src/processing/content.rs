//! Content-segment detection.
//!
//! A content filter is a set of threshold checks that must all be violated in
//! the same frame, e.g. "very dark" for black frames. Each check collects the
//! timestamps at which it fired on its own; the intersection of those sets is
//! merged into time ranges.

use crate::config::{PROGRESS_LOG_INTERVAL_FRAMES, SEGMENT_MERGE_GAP_SECS};
use crate::error::{CoreError, CoreResult};
use crate::external::thumbnail::{ThumbnailSampler, ThumbnailStats};
use crate::processing::analysis::DurationWindow;
use crate::processing::cancel::{CancelCheck, PassStatus};
use crate::processing::profile::{ThresholdCheck, validate_checks};
use crate::report::frame::{FrameRecord, MediaType};
use crate::utils::{format_timestamp, parse_timestamp};
use log::{debug, info};
use serde::Serialize;
use std::collections::BTreeSet;

/// Mode label used for content-filter thumbnails.
pub const CONTENT_MODE: &str = "content";

/// Named multi-tag signature; a frame matches when every check is violated.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentFilterSpec {
    pub name: String,
    pub checks: Vec<ThresholdCheck>,
}

impl ContentFilterSpec {
    pub fn validate(&self) -> CoreResult<()> {
        validate_checks(&self.name, &self.checks)
    }
}

/// A merged run of matching frames, in seconds. `start == end` for a single
/// matching frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TimeRange {
    pub start: f64,
    pub end: f64,
}

impl TimeRange {
    pub fn point(t: f64) -> Self {
        Self { start: t, end: t }
    }

    pub fn is_point(&self) -> bool {
        self.start == self.end
    }

    pub fn formatted_start(&self) -> String {
        format_timestamp(self.start)
    }

    pub fn formatted_end(&self) -> String {
        format_timestamp(self.end)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", content = "segments", rename_all = "snake_case")]
pub enum ContentOutcome {
    NoSegmentFound,
    Segments(Vec<TimeRange>),
}

/// Result of one content-filter pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContentDetection {
    pub filter: String,
    pub total_frames: u64,
    /// Frames where every check fired.
    pub matching_frames: usize,
    pub outcome: ContentOutcome,
    pub status: PassStatus,
    pub thumbnails: ThumbnailStats,
}

/// Merges ranges sorted by start; a gap under `gap_secs` joins two ranges.
///
/// Merging an already merged list returns it unchanged.
pub fn merge_ranges<I>(ranges: I, gap_secs: f64) -> Vec<TimeRange>
where
    I: IntoIterator<Item = TimeRange>,
{
    let mut merged: Vec<TimeRange> = Vec::new();
    for range in ranges {
        match merged.last_mut() {
            Some(current) if range.start - current.end < gap_secs => {
                current.end = current.end.max(range.end);
            }
            _ => merged.push(range),
        }
    }
    merged
}

/// Streams the frames inside `window` and reports where the filter matches.
///
/// One thumbnail is exported at the start of each merged range when a
/// sampler is given.
pub fn detect_content_frames<I>(
    frames: I,
    filter: &ContentFilterSpec,
    window: DurationWindow,
    mut sampler: Option<&mut ThumbnailSampler<'_>>,
    cancel: &dyn CancelCheck,
) -> CoreResult<ContentDetection>
where
    I: IntoIterator<Item = CoreResult<FrameRecord>>,
{
    filter.validate()?;
    info!("Searching for '{}' content", filter.name);

    let mut per_tag: Vec<BTreeSet<String>> = vec![BTreeSet::new(); filter.checks.len()];
    let mut total_frames: u64 = 0;
    let mut status = PassStatus::Completed;

    for frame in frames {
        if cancel.is_cancelled() {
            status = PassStatus::Cancelled;
            info!("Content filter '{}' cancelled after {total_frames} frames", filter.name);
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
        if total_frames % PROGRESS_LOG_INTERVAL_FRAMES == 0 {
            debug!("Content filter '{}': {total_frames} frames scanned", filter.name);
        }

        for (check, hits) in filter.checks.iter().zip(per_tag.iter_mut()) {
            if let Some(value) = frame.metric(&check.tag)? {
                if check.is_violated_by(value) {
                    hits.insert(frame.formatted_timestamp());
                }
            }
        }
    }

    let matching = intersect(per_tag);
    let mut points = matching
        .iter()
        .map(|ts| {
            parse_timestamp(ts)
                .ok_or_else(|| CoreError::OperationFailed(format!("unparseable timestamp {ts}")))
        })
        .collect::<CoreResult<Vec<f64>>>()?;
    points.sort_by(f64::total_cmp);

    let ranges = merge_ranges(points.into_iter().map(TimeRange::point), SEGMENT_MERGE_GAP_SECS);
    let outcome = if ranges.is_empty() {
        info!("No segments found for '{}'", filter.name);
        ContentOutcome::NoSegmentFound
    } else {
        info!("Found {} '{}' segment(s)", ranges.len(), filter.name);
        if status == PassStatus::Completed {
            if let Some(sampler) = sampler.as_deref_mut() {
                for range in &ranges {
                    sampler.export_now(&filter.name, None, &range.formatted_start());
                }
            }
        }
        ContentOutcome::Segments(ranges)
    };

    Ok(ContentDetection {
        filter: filter.name.clone(),
        total_frames,
        matching_frames: matching.len(),
        outcome,
        status,
        thumbnails: sampler.map(|s| s.stats()).unwrap_or_default(),
    })
}

/// Intersection of every set; empty when there are no sets.
fn intersect(mut sets: Vec<BTreeSet<String>>) -> BTreeSet<String> {
    sets.sort_by_key(BTreeSet::len);
    let mut iter = sets.into_iter();
    let Some(mut result) = iter.next() else {
        return BTreeSet::new();
    };
    for other in iter {
        result.retain(|ts| other.contains(ts));
    }
    result
}
