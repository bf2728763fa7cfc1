//! Row layouts for each pass result.

use super::{Table, format_percentage};
use crate::processing::analysis::ProfileAnalysis;
use crate::processing::bars::{BarsDetection, BarsEvaluation};
use crate::processing::content::{ContentDetection, ContentOutcome};

pub const NO_BARS_MARKER: &str = "No color bars detected";
pub const NO_SEGMENTS_MARKER: &str = "No segments found";

/// Label row, `TotalFrames`, one `(tag, count, percentage)` row per tag and a
/// `Total` row for frames with any violation.
pub fn summary_table(analysis: &ProfileAnalysis) -> Table {
    let mut table = Table::new();
    table.push_row([analysis.kind.label().to_string(), analysis.profile_name.clone()]);
    table.push_row(["TotalFrames".to_string(), analysis.total_frames.to_string()]);
    for tag in &analysis.tag_failures {
        table.push_row([
            tag.tag.clone(),
            tag.count.to_string(),
            format_percentage(tag.count, analysis.total_frames),
        ]);
    }
    table.push_row([
        "Total".to_string(),
        analysis.overall_failures.to_string(),
        format_percentage(analysis.overall_failures, analysis.total_frames),
    ]);
    table
}

/// `Timestamp,Tag,Value,Threshold` rows in timestamp order.
pub fn failures_table(analysis: &ProfileAnalysis) -> Table {
    let mut table = Table::new();
    table.push_row(["Timestamp", "Tag", "Value", "Threshold"]);
    for records in analysis.failures.values() {
        for record in records {
            table.push_row([
                record.timestamp.clone(),
                record.tag.clone(),
                record.value.to_string(),
                record.threshold.to_string(),
            ]);
        }
    }
    table
}

pub fn bars_detection_table(detection: &BarsDetection) -> Table {
    let mut table = Table::new();
    match &detection.segment {
        Some(segment) => {
            table.push_row(["Start", "End"]);
            table.push_row([segment.formatted_start(), segment.formatted_end()]);
        }
        None => table.push_row([NO_BARS_MARKER]),
    }
    table
}

/// `Tag,SMPTE,Observed`; the observed cell is empty for tags never seen.
pub fn bars_evaluation_table(evaluation: &BarsEvaluation) -> Table {
    let mut table = Table::new();
    table.push_row(["Tag", "SMPTE", "Observed"]);
    for peak in &evaluation.peaks {
        table.push_row([
            peak.tag.clone(),
            peak.smpte.to_string(),
            peak.observed.map(|v| v.to_string()).unwrap_or_default(),
        ]);
    }
    table
}

/// Filter name, then one `start,end` row per range (a single cell for a
/// single frame).
pub fn content_table(detection: &ContentDetection) -> Table {
    let mut table = Table::new();
    table.push_row([detection.filter.as_str()]);
    match &detection.outcome {
        ContentOutcome::NoSegmentFound => table.push_row([NO_SEGMENTS_MARKER]),
        ContentOutcome::Segments(ranges) => {
            for range in ranges {
                if range.is_point() {
                    table.push_row([range.formatted_start()]);
                } else {
                    table.push_row([range.formatted_start(), range.formatted_end()]);
                }
            }
        }
    }
    table
}
