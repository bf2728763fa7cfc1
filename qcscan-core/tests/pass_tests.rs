mod common;

use common::{PROGRAM, bars_then_program, run_of, write_report};
use qcscan_core::processing::bars::{detect_bars, detect_bit_depth};
use qcscan_core::processing::content::detect_content_frames;
use qcscan_core::processing::{
    BitDepth, CancelToken, DurationWindow, NeverCancel, PassStatus, analyze_frames,
};
use qcscan_core::{FrameRecord, MediaFilter, MediaType, QcConfig, ReportReader};
use std::cell::Cell;
use tempfile::tempdir;

fn video_frames(path: &std::path::Path) -> Vec<FrameRecord> {
    ReportReader::open(path, MediaFilter::Video)
        .unwrap()
        .collect::<Result<Vec<_>, _>>()
        .unwrap()
}

#[test]
fn test_reader_filters_media_types() {
    let dir = tempdir().unwrap();
    let report = write_report(dir.path(), "tape.mkv", &run_of(0.0, 1.0, 25, PROGRAM));

    let video = video_frames(&report);
    assert_eq!(video.len(), 25);
    assert!(video.iter().all(|f| f.media_type() == MediaType::Video));
    assert_eq!(video[3].metric("YMAX").unwrap(), Some(700.0));

    let audio: Vec<_> = ReportReader::open(&report, MediaFilter::Audio)
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    // One audio frame is written ahead of every tenth video frame.
    assert_eq!(audio.len(), 3);
    assert_eq!(audio[0].raw_metric("Overall_Peak_level"), Some("-6.0"));

    let all = ReportReader::open(&report, MediaFilter::All)
        .unwrap()
        .count();
    assert_eq!(all, 28);
}

/// A pass cancelled after `n` frames reports what a pass over only those
/// frames reports.
#[test]
fn test_cancelled_analysis_matches_truncated_stream() {
    let dir = tempdir().unwrap();
    let report = write_report(dir.path(), "tape.mkv", &bars_then_program());
    let frames = video_frames(&report);
    let config = QcConfig::default();
    let profile = config
        .tag_check(vec!["YMIN:lt:10".parse().unwrap()])
        .unwrap()
        .resolve()
        .unwrap();

    for n in [0usize, 5, 19, 20, 33] {
        let polls = Cell::new(0usize);
        let cancel_after_n = || {
            polls.set(polls.get() + 1);
            polls.get() > n
        };
        let cancelled = analyze_frames(
            frames.iter().cloned().map(Ok),
            &profile,
            DurationWindow::full(),
            None,
            &cancel_after_n,
        )
        .unwrap();
        let truncated = analyze_frames(
            frames.iter().take(n).cloned().map(Ok),
            &profile,
            DurationWindow::full(),
            None,
            &NeverCancel,
        )
        .unwrap();

        assert_eq!(cancelled.status, PassStatus::Cancelled);
        assert_eq!(truncated.status, PassStatus::Completed);
        assert_eq!(cancelled.total_frames, truncated.total_frames);
        assert_eq!(cancelled.tag_failures, truncated.tag_failures);
        assert_eq!(cancelled.overall_failures, truncated.overall_failures);
        assert_eq!(cancelled.failures, truncated.failures);
    }
}

#[test]
fn test_cancel_token_stops_every_pass() {
    let dir = tempdir().unwrap();
    let report = write_report(dir.path(), "tape.mkv", &bars_then_program());
    let frames = video_frames(&report);
    let config = QcConfig::default();
    let token = CancelToken::new();
    token.cancel();

    let depth = detect_bit_depth(frames.iter().cloned().map(Ok), 11, &token).unwrap();
    assert_eq!(depth.status, PassStatus::Cancelled);
    assert_eq!(depth.frames_sampled, 0);

    let bars = detect_bars(frames.iter().cloned().map(Ok), BitDepth::Ten, 11, &token).unwrap();
    assert_eq!(bars.status, PassStatus::Cancelled);
    assert_eq!(bars.segment, None);

    let filter = config.content_filter("allBlack").unwrap();
    let content = detect_content_frames(
        frames.iter().cloned().map(Ok),
        &filter,
        DurationWindow::full(),
        None,
        &token,
    )
    .unwrap();
    assert_eq!(content.status, PassStatus::Cancelled);
    assert_eq!(content.total_frames, 0);
}

#[test]
fn test_bars_found_by_pass_and_reader_agree() {
    let dir = tempdir().unwrap();
    let report = write_report(dir.path(), "tape.mkv", &bars_then_program());
    let reader = ReportReader::open(&report, MediaFilter::Video).unwrap();

    let depth = detect_bit_depth(video_frames(&report).into_iter().map(Ok), 11, &NeverCancel).unwrap();
    assert_eq!(depth.bit_depth, BitDepth::Ten);
    assert_eq!(depth.frames_sampled, 11);

    let bars = detect_bars(reader, depth.bit_depth, 11, &NeverCancel).unwrap();
    let segment = bars.segment.unwrap();
    assert_eq!((segment.start, segment.end), (3.0, 9.5));
}
