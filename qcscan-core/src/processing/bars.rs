// ============================================================================
// qcscan-core/src/processing/bars.rs
// ============================================================================
//
// COLOR BARS: Bit-Depth Detection, Bars Detection and Bars Evaluation
//
// Archival transfers usually open with SMPTE color bars. This module finds
// that segment and measures the signal envelope inside it so the rest of the
// tape can be checked against what the deck actually produced.
//
// All three passes push video frames through a sliding window and look at the
// middle frame only, which smooths over single-frame glitches at segment
// edges.

use crate::config::{BARS_MIN_DURATION_SECS, BIT_DEPTH_10_YMAX_CUTOFF, PROGRESS_LOG_INTERVAL_FRAMES};
use crate::error::{CoreError, CoreResult};
use crate::processing::cancel::{CancelCheck, PassStatus};
use crate::processing::profile::{BarsProfile, Profile};
use crate::processing::window::SlidingWindow;
use crate::report::frame::{FrameRecord, MediaType};
use crate::utils::format_timestamp;
use log::{debug, info, trace};
use serde::Serialize;
use std::fmt;

/// Mode label used in precondition errors and exports.
pub const BARS_DETECTION_MODE: &str = "colorbars";
pub const BARS_EVALUATION_MODE: &str = "colorbars_eval";

/// Tags measured inside the bars with their SMPTE reference values (10-bit).
pub const SMPTE_BAR_VALUES: &[(&str, f64)] = &[
    ("YMAX", 940.0),
    ("YMIN", 64.0),
    ("UMIN", 64.0),
    ("UMAX", 960.0),
    ("VMIN", 64.0),
    ("VMAX", 960.0),
    ("SATMIN", 0.0),
    ("SATMAX", 181.02),
];

/// Starting value for running maxima.
const PEAK_MAX_SEED: f64 = 0.0;
/// Starting value for running minima; the top of the 10-bit range.
const PEAK_MIN_SEED: f64 = 1023.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BitDepth {
    #[serde(rename = "8-bit")]
    Eight,
    #[serde(rename = "10-bit")]
    Ten,
}

impl fmt::Display for BitDepth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BitDepth::Eight => f.write_str("8-bit"),
            BitDepth::Ten => f.write_str("10-bit"),
        }
    }
}

/// Signal conditions that identify color bars in the middle frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BarThresholds {
    /// YMAX must be above this.
    pub ymax_above: f64,
    /// YMIN must be below this.
    pub ymin_below: f64,
    /// YDIF must be below this.
    pub ydif_below: f64,
}

impl BarThresholds {
    pub const fn for_bit_depth(bit_depth: BitDepth) -> Self {
        match bit_depth {
            BitDepth::Ten => Self {
                ymax_above: 800.0,
                ymin_below: 10.0,
                ydif_below: 10.0,
            },
            BitDepth::Eight => Self {
                ymax_above: 210.0,
                ymin_below: 10.0,
                ydif_below: 3.0,
            },
        }
    }

    /// A frame missing any of the three metrics does not match.
    pub fn matches(&self, frame: &FrameRecord) -> CoreResult<bool> {
        let (Some(ymax), Some(ymin), Some(ydif)) =
            (frame.metric("YMAX")?, frame.metric("YMIN")?, frame.metric("YDIF")?)
        else {
            return Ok(false);
        };
        Ok(ymax > self.ymax_above && ymin < self.ymin_below && ydif < self.ydif_below)
    }
}

/// Outcome of the bit-depth probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitDepthDetection {
    pub bit_depth: BitDepth,
    pub frames_sampled: usize,
    pub status: PassStatus,
}

/// Fills a window with the first video frames and classifies the source as
/// 10-bit if any buffered `YMAX` exceeds the 8-bit range.
pub fn detect_bit_depth<I>(
    frames: I,
    buffer_size: usize,
    cancel: &dyn CancelCheck,
) -> CoreResult<BitDepthDetection>
where
    I: IntoIterator<Item = CoreResult<FrameRecord>>,
{
    let mut window = SlidingWindow::new(buffer_size)?;
    let mut status = PassStatus::Completed;

    for frame in frames {
        if cancel.is_cancelled() {
            status = PassStatus::Cancelled;
            break;
        }
        let frame = frame?;
        if frame.media_type() != MediaType::Video {
            continue;
        }
        window.push(frame);
        if window.is_full() {
            break;
        }
    }

    let mut bit_depth = BitDepth::Eight;
    for frame in window.iter() {
        if frame.metric("YMAX")?.is_some_and(|ymax| ymax > BIT_DEPTH_10_YMAX_CUTOFF) {
            bit_depth = BitDepth::Ten;
            break;
        }
    }
    debug!("Detected {bit_depth} source from {} frames", window.len());

    Ok(BitDepthDetection {
        bit_depth,
        frames_sampled: window.len(),
        status,
    })
}

/// Time range covered by color bars, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BarsSegment {
    pub start: f64,
    pub end: f64,
}

impl BarsSegment {
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    pub fn formatted_start(&self) -> String {
        format_timestamp(self.start)
    }

    pub fn formatted_end(&self) -> String {
        format_timestamp(self.end)
    }
}

/// Result of a bars detection pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarsDetection {
    pub segment: Option<BarsSegment>,
    pub bit_depth: BitDepth,
    pub status: PassStatus,
}

/// Scans the video frames for a color bars segment lasting over two seconds.
///
/// The first frame whose window middle matches sets the start; later matches
/// advance the end. The pass stops at the first non-matching middle frame
/// once the run is long enough. A shorter run does not reset the start.
pub fn detect_bars<I>(
    frames: I,
    bit_depth: BitDepth,
    buffer_size: usize,
    cancel: &dyn CancelCheck,
) -> CoreResult<BarsDetection>
where
    I: IntoIterator<Item = CoreResult<FrameRecord>>,
{
    let thresholds = BarThresholds::for_bit_depth(bit_depth);
    let mut window = SlidingWindow::new(buffer_size)?;
    let mut run: Option<BarsSegment> = None;
    let mut status = PassStatus::Completed;
    let mut frame_count: u64 = 0;

    for frame in frames {
        if cancel.is_cancelled() {
            status = PassStatus::Cancelled;
            break;
        }
        let frame = frame?;
        if frame.media_type() != MediaType::Video {
            continue;
        }
        frame_count += 1;
        if frame_count % PROGRESS_LOG_INTERVAL_FRAMES == 0 {
            debug!("Bars detection: {frame_count} frames scanned");
        }

        window.push(frame);
        if !window.is_full() {
            continue;
        }
        let Some(middle) = window.middle() else {
            continue;
        };

        if thresholds.matches(middle)? {
            let t = middle.seconds()?;
            trace!("Bars candidate at {}", format_timestamp(t));
            match run.as_mut() {
                Some(segment) => segment.end = t,
                None => run = Some(BarsSegment { start: t, end: t }),
            }
        } else if run.is_some_and(|segment| segment.duration() > BARS_MIN_DURATION_SECS) {
            break;
        }
    }

    let segment = run.filter(|segment| segment.duration() > BARS_MIN_DURATION_SECS);
    match &segment {
        Some(found) => info!(
            "Color bars found from {} to {}",
            found.formatted_start(),
            found.formatted_end()
        ),
        None if status == PassStatus::Completed => info!("No color bars found"),
        None => {}
    }

    Ok(BarsDetection {
        segment,
        bit_depth,
        status,
    })
}

/// Observed peak of one tag inside the bars next to its reference value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarPeak {
    pub tag: String,
    pub smpte: f64,
    /// `None` when no middle frame carried the tag.
    pub observed: Option<f64>,
}

/// Result of a bars evaluation pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BarsEvaluation {
    pub segment: BarsSegment,
    pub peaks: Vec<BarPeak>,
    pub status: PassStatus,
}

impl BarsEvaluation {
    /// Profile whose thresholds are the observed peaks.
    pub fn into_profile(self) -> CoreResult<Profile> {
        let peaks: Vec<(String, f64)> = self
            .peaks
            .into_iter()
            .filter_map(|peak| peak.observed.map(|value| (peak.tag, value)))
            .collect();
        if peaks.is_empty() {
            return Err(CoreError::Precondition {
                mode: BARS_EVALUATION_MODE.to_string(),
                reason: "no bar values were observed".to_string(),
            });
        }
        Ok(Profile::BarsDerived(BarsProfile { peaks }))
    }
}

/// Measures the peak envelope of the bars segment.
///
/// `*MAX` tags track the running maximum, `*MIN` tags the running minimum of
/// the window's middle frame. Frames before `segment.start` are skipped and
/// the pass stops at the first frame past `segment.end`.
pub fn evaluate_bars<I>(
    frames: I,
    segment: BarsSegment,
    buffer_size: usize,
    cancel: &dyn CancelCheck,
) -> CoreResult<BarsEvaluation>
where
    I: IntoIterator<Item = CoreResult<FrameRecord>>,
{
    let mut window = SlidingWindow::new(buffer_size)?;
    let mut observed: Vec<Option<f64>> = vec![None; SMPTE_BAR_VALUES.len()];
    let mut middles_seen: u64 = 0;
    let mut status = PassStatus::Completed;

    for frame in frames {
        if cancel.is_cancelled() {
            status = PassStatus::Cancelled;
            break;
        }
        let frame = frame?;
        if frame.media_type() != MediaType::Video {
            continue;
        }
        let t = frame.seconds()?;
        if t < segment.start {
            continue;
        }
        if t > segment.end {
            break;
        }

        window.push(frame);
        if !window.is_full() {
            continue;
        }
        let Some(middle) = window.middle() else {
            continue;
        };
        middles_seen += 1;

        for ((tag, _), peak) in SMPTE_BAR_VALUES.iter().zip(observed.iter_mut()) {
            let Some(value) = middle.metric(tag)? else {
                continue;
            };
            *peak = Some(if tag.contains("MAX") {
                peak.unwrap_or(PEAK_MAX_SEED).max(value)
            } else {
                peak.unwrap_or(PEAK_MIN_SEED).min(value)
            });
        }
    }

    if status == PassStatus::Completed && middles_seen == 0 {
        return Err(CoreError::Precondition {
            mode: BARS_EVALUATION_MODE.to_string(),
            reason: format!(
                "the bars segment {} - {} holds fewer than {buffer_size} frames",
                segment.formatted_start(),
                segment.formatted_end()
            ),
        });
    }

    let peaks = SMPTE_BAR_VALUES
        .iter()
        .zip(observed)
        .map(|((tag, smpte), observed)| BarPeak {
            tag: (*tag).to_string(),
            smpte: *smpte,
            observed,
        })
        .collect();
    info!("Evaluated color bars over {middles_seen} frames");

    Ok(BarsEvaluation {
        segment,
        peaks,
        status,
    })
}
