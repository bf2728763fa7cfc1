mod common;

use common::{BARS, BLACK, Frame, PROGRAM, bars_then_program, run_of, write_gz, write_report};
use qcscan_core::external::{ThumbnailExporter, ThumbnailRequest};
use qcscan_core::processing::{
    BitDepth, ContentOutcome, DurationWindow, PassStatus, ProfileKind, QcSession, ReportSource,
    TimeRange,
};
use qcscan_core::{CoreError, CoreResult, QcConfig};
use std::cell::RefCell;
use std::path::PathBuf;
use tempfile::tempdir;

#[test]
fn test_bars_detection_and_evaluation() {
    let dir = tempdir().unwrap();
    let report = write_report(dir.path(), "tape01.mkv", &bars_then_program());
    let config = QcConfig::default();
    let session = QcSession::new(ReportSource::new(&report), &config);

    let detection = session.detect_bars().unwrap();
    assert_eq!(detection.bit_depth, BitDepth::Ten);
    assert_eq!(detection.status, PassStatus::Completed);
    let segment = detection.segment.expect("bars should be found");
    // The first full window of 11 frames has its middle at frame 6.
    assert_eq!(segment.start, 3.0);
    assert_eq!(segment.end, 9.5);

    let evaluation = session.evaluate_bars(&detection).unwrap();
    let peak = |tag: &str| {
        evaluation
            .peaks
            .iter()
            .find(|p| p.tag == tag)
            .and_then(|p| p.observed)
    };
    assert_eq!(peak("YMAX"), Some(950.0));
    assert_eq!(peak("YMIN"), Some(4.0));
    assert_eq!(peak("UMAX"), None);

    let profile = evaluation.into_profile().unwrap();
    let analysis = session
        .check_profile(&profile, DurationWindow::new(Some(segment.end), None).unwrap())
        .unwrap();
    assert_eq!(analysis.kind, ProfileKind::BarsEvaluation);
    assert_eq!(analysis.overall_failures, 0);
    // The last bars frame sits on the window start.
    assert_eq!(analysis.total_frames, 41);
}

#[test]
fn test_bars_detection_is_repeatable() {
    let dir = tempdir().unwrap();
    let report = write_report(dir.path(), "tape01.mkv", &bars_then_program());
    let config = QcConfig::default();
    let session = QcSession::new(ReportSource::new(&report), &config);

    let first = session.detect_bars().unwrap();
    let second = session.detect_bars().unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_short_bars_are_ignored() {
    let dir = tempdir().unwrap();
    let mut frames = run_of(0.0, 0.5, 8, BARS);
    frames.extend(run_of(4.0, 0.5, 30, PROGRAM));
    let report = write_report(dir.path(), "short.mkv", &frames);
    let config = QcConfig::default();
    let session = QcSession::new(ReportSource::new(&report), &config);

    let detection = session.detect_bars().unwrap();
    assert_eq!(detection.segment, None);

    let err = session.evaluate_bars(&detection).unwrap_err();
    assert!(matches!(err, CoreError::Precondition { .. }));
    assert!(!err.is_report_fatal());
}

#[test]
fn test_single_violation_produces_one_record() {
    let dir = tempdir().unwrap();
    let mut frames = run_of(0.0, 0.5, 20, PROGRAM);
    frames[7] = Frame::new(3.5, &[("YMAX", 700.0), ("YHIGH", 1000.0), ("YLOW", 100.0)]);
    let report = write_report(dir.path(), "tape02.mkv", &frames);
    let config = QcConfig::default();
    let session = QcSession::new(ReportSource::new(&report), &config);

    let profile = config.profile("default").unwrap();
    let analysis = session.check_profile(&profile, DurationWindow::full()).unwrap();
    assert_eq!(analysis.total_frames, 20);
    assert_eq!(analysis.overall_failures, 1);
    assert_eq!(analysis.failure_record_count(), 1);
    assert_eq!(analysis.failures_for("YHIGH"), 1);
    assert_eq!(analysis.failures_for("YLOW"), 0);

    let records = &analysis.failures["00:00:03.5000"];
    assert_eq!(records[0].tag, "YHIGH");
    assert_eq!(records[0].value, 1000.0);
    assert_eq!(records[0].threshold, 940.0);
}

#[test]
fn test_tag_check_with_explicit_operators() {
    let dir = tempdir().unwrap();
    let report = write_report(dir.path(), "tape03.mkv", &bars_then_program());
    let config = QcConfig::default();
    let session = QcSession::new(ReportSource::new(&report), &config);

    let profile = config
        .tag_check(vec!["YMIN:lt:10".parse().unwrap(), "YDIF:gt:15".parse().unwrap()])
        .unwrap();
    let window = DurationWindow::new(None, Some(9.5)).unwrap();
    let analysis = session.check_profile(&profile, window).unwrap();
    assert_eq!(analysis.kind, ProfileKind::TagCheck);
    assert_eq!(analysis.total_frames, 20);
    assert_eq!(analysis.failures_for("YMIN"), 20);
    assert_eq!(analysis.failures_for("YDIF"), 0);
}

#[test]
fn test_content_segments_are_merged() {
    let dir = tempdir().unwrap();
    let mut frames = run_of(0.0, 1.0, 3, BLACK);
    frames.extend(run_of(3.0, 1.0, 20, PROGRAM));
    frames.extend(run_of(23.0, 1.0, 2, BLACK));
    frames.extend(run_of(25.0, 1.0, 2, PROGRAM));
    frames.extend(run_of(27.0, 1.0, 1, BLACK));
    let report = write_report(dir.path(), "tape04.mkv", &frames);
    let config = QcConfig::default();
    let session = QcSession::new(ReportSource::new(&report), &config);

    let filter = config.content_filter("allBlack").unwrap();
    let detection = session.detect_content(&filter, DurationWindow::full()).unwrap();
    assert_eq!(detection.total_frames, 28);
    assert_eq!(detection.matching_frames, 6);
    assert_eq!(
        detection.outcome,
        ContentOutcome::Segments(vec![
            TimeRange { start: 0.0, end: 2.0 },
            TimeRange { start: 23.0, end: 27.0 },
        ])
    );
}

#[test]
fn test_content_result_does_not_depend_on_check_order() {
    let dir = tempdir().unwrap();
    let mut frames = run_of(0.0, 1.0, 5, PROGRAM);
    frames.extend(run_of(5.0, 1.0, 4, BLACK));
    frames.extend(run_of(9.0, 1.0, 20, PROGRAM));
    let report = write_report(dir.path(), "tape05.mkv", &frames);
    let config = QcConfig::default();
    let session = QcSession::new(ReportSource::new(&report), &config);

    let filter = config.content_filter("allBlack").unwrap();
    let mut reversed = filter.clone();
    reversed.checks.reverse();

    let a = session.detect_content(&filter, DurationWindow::full()).unwrap();
    let b = session.detect_content(&reversed, DurationWindow::full()).unwrap();
    assert_eq!(a.outcome, b.outcome);
    assert_eq!(a.matching_frames, b.matching_frames);
}

#[test]
fn test_content_without_match() {
    let dir = tempdir().unwrap();
    let report = write_report(dir.path(), "tape06.mkv", &run_of(0.0, 1.0, 10, PROGRAM));
    let config = QcConfig::default();
    let session = QcSession::new(ReportSource::new(&report), &config);

    let filter = config.content_filter("allBlack").unwrap();
    let detection = session.detect_content(&filter, DurationWindow::full()).unwrap();
    assert_eq!(detection.outcome, ContentOutcome::NoSegmentFound);
}

#[test]
fn test_missing_report_is_fatal() {
    let dir = tempdir().unwrap();
    let config = QcConfig::default();
    let session = QcSession::new(
        ReportSource::new(dir.path().join("nothing.mkv.qctools.xml.gz")),
        &config,
    );
    let err = session.detect_bars().unwrap_err();
    assert!(matches!(err, CoreError::ReportUnavailable { .. }));
    assert!(err.is_report_fatal());
}

#[test]
fn test_bad_metric_names_the_report() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("broken.mkv.qctools.xml.gz");
    common::write_gz(
        &path,
        r#"<frames><frame media_type="video" pkt_dts_time="0.0"><tag key="lavfi.signalstats.YHIGH" value="abc"/></frame></frames>"#,
    );
    let config = QcConfig::default();
    let session = QcSession::new(ReportSource::new(&path), &config);

    let profile = config.profile("default").unwrap();
    match session.check_profile(&profile, DurationWindow::full()) {
        Err(CoreError::MalformedReport { path: reported, .. }) => assert_eq!(reported, path),
        other => panic!("expected a malformed report, got {other:?}"),
    }
}

#[test]
fn test_8_bit_bars_after_program_start() {
    let dir = tempdir().unwrap();
    // 25 frames half a second apart; frames 6 to 20 are 8-bit bars.
    let frames: Vec<Frame> = (0..25)
        .map(|i| {
            let tags: &[(&'static str, f64)] = if (6..=20).contains(&i) {
                &[("YMAX", 235.0), ("YMIN", 5.0), ("YDIF", 1.0)]
            } else {
                &[("YMAX", 200.0), ("YMIN", 40.0), ("YDIF", 20.0)]
            };
            Frame::new(i as f64 * 0.5, tags)
        })
        .collect();
    let report = write_report(dir.path(), "tape09.mkv", &frames);
    let config = QcConfig::default();
    let session = QcSession::new(ReportSource::new(&report), &config);

    let detection = session.detect_bars().unwrap();
    assert_eq!(detection.bit_depth, BitDepth::Eight);
    assert_eq!(detection.status, PassStatus::Completed);
    let segment = detection.segment.expect("bars should be found");
    assert_eq!((segment.start, segment.end), (3.0, 10.0));
}

#[test]
fn test_report_without_video_frames_is_malformed() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("audio.wav.qctools.xml.gz");
    let mut xml = String::from("<ffprobe><frames>\n");
    for i in 0..20 {
        xml.push_str(&format!(
            "<frame media_type=\"audio\" pkt_pts_time=\"{i}.0\"><tag key=\"lavfi.astats.Overall.Peak_level\" value=\"-6.0\"/></frame>\n"
        ));
    }
    xml.push_str("</frames></ffprobe>\n");
    write_gz(&path, &xml);

    let config = QcConfig::default();
    let session = QcSession::new(ReportSource::new(&path), &config);
    let profile = config.profile("default").unwrap();
    assert!(matches!(
        session.check_profile(&profile, DurationWindow::full()),
        Err(CoreError::MalformedReport { .. })
    ));
    assert!(matches!(session.detect_bars(), Err(CoreError::MalformedReport { .. })));
}

struct RecordingExporter {
    requests: RefCell<Vec<ThumbnailRequest>>,
}

impl ThumbnailExporter for RecordingExporter {
    fn export(&self, request: &ThumbnailRequest) -> CoreResult<PathBuf> {
        self.requests.borrow_mut().push(request.clone());
        Ok(request.output_path())
    }
}

#[test]
fn test_thumbnails_follow_the_cooldown() {
    let dir = tempdir().unwrap();
    let frames: Vec<Frame> = (0..30)
        .map(|i| Frame::new(i as f64, &[("YHIGH", 1000.0), ("YLOW", 100.0)]))
        .collect();
    let report = write_report(dir.path(), "tape07.mkv", &frames);
    std::fs::write(dir.path().join("tape07.mkv"), b"video").unwrap();

    let mut config = QcConfig::default();
    config.thumbnails.profile_delay_frames = 10;
    let exporter = RecordingExporter {
        requests: RefCell::new(Vec::new()),
    };
    let session = QcSession::new(ReportSource::new(&report), &config)
        .with_thumbnails(&exporter, dir.path().join("thumbnails"))
        .unwrap();

    let profile = config.profile("default").unwrap();
    let analysis = session.check_profile(&profile, DurationWindow::full()).unwrap();
    assert_eq!(analysis.overall_failures, 30);
    assert_eq!(analysis.thumbnails.exported, 3);

    let requests = exporter.requests.borrow();
    let times: Vec<&str> = requests.iter().map(|r| r.timestamp.as_str()).collect();
    assert_eq!(times, ["00:00:00.0000", "00:00:10.0000", "00:00:20.0000"]);
    assert!(requests.iter().all(|r| r.mode == "default" && r.tag == "YHIGH"));
    assert_eq!(requests[0].video_path, dir.path().join("tape07.mkv"));
}

#[test]
fn test_cooldown_is_chosen_per_kind_of_check() {
    let dir = tempdir().unwrap();
    let frames: Vec<Frame> = (0..30)
        .map(|i| Frame::new(i as f64, &[("YHIGH", 1000.0), ("YLOW", 100.0)]))
        .collect();
    let report = write_report(dir.path(), "tape08.mkv", &frames);
    std::fs::write(dir.path().join("tape08.mkv"), b"video").unwrap();

    let mut config = QcConfig::default();
    config.thumbnails.profile_delay_frames = 10;
    config.thumbnails.tag_check_delay_frames = 15;
    let exporter = RecordingExporter {
        requests: RefCell::new(Vec::new()),
    };
    let session = QcSession::new(ReportSource::new(&report), &config)
        .with_thumbnails(&exporter, dir.path().join("thumbnails"))
        .unwrap();

    let profile = config.profile("default").unwrap();
    let analysis = session.check_profile(&profile, DurationWindow::full()).unwrap();
    assert_eq!(analysis.thumbnails.exported, 3);

    let tags = config.tag_check(vec!["YHIGH:gt:900".parse().unwrap()]).unwrap();
    assert_eq!(tags.kind(), ProfileKind::TagCheck);
    let analysis = session.check_profile(&tags, DurationWindow::full()).unwrap();
    assert_eq!(analysis.overall_failures, 30);
    assert_eq!(analysis.thumbnails.exported, 2);

    let requests = exporter.requests.borrow();
    let tag_times: Vec<&str> = requests
        .iter()
        .filter(|r| r.mode == "tags")
        .map(|r| r.timestamp.as_str())
        .collect();
    assert_eq!(tag_times, ["00:00:00.0000", "00:00:15.0000"]);
}

#[test]
fn test_thumbnails_need_a_video() {
    let dir = tempdir().unwrap();
    let report = write_report(dir.path(), "novideo.mkv", &run_of(0.0, 1.0, 3, PROGRAM));
    let config = QcConfig::default();
    let exporter = RecordingExporter {
        requests: RefCell::new(Vec::new()),
    };
    let result = QcSession::new(ReportSource::new(&report), &config)
        .with_thumbnails(&exporter, dir.path().join("thumbnails"));
    assert!(matches!(result, Err(CoreError::PathError(_))));
}
