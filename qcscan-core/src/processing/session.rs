// ============================================================================
// qcscan-core/src/processing/session.rs
// ============================================================================
//
// QC SESSION: Per-Mode Entry Points over One Report
//
// A session binds one report (and optionally its video) to an explicit
// configuration, a cancellation source and an optional thumbnail exporter.
// Every mode opens its own reader, so modes share no stream state and a
// failure in one mode leaves the others usable.
//
// Frame-level errors raised by the consumers are rewritten here to name the
// report file.

use crate::config::QcConfig;
use crate::error::{CoreError, CoreResult};
use crate::external::thumbnail::{ThumbnailContext, ThumbnailExporter, ThumbnailSampler};
use crate::processing::analysis::{DurationWindow, ProfileAnalysis, analyze_frames};
use crate::processing::bars::{
    BARS_EVALUATION_MODE, BarsDetection, BarsEvaluation, detect_bars, detect_bit_depth,
    evaluate_bars,
};
use crate::processing::cancel::{CancelCheck, NeverCancel, PassStatus};
use crate::processing::content::{CONTENT_MODE, ContentDetection, ContentFilterSpec, detect_content_frames};
use crate::processing::profile::Profile;
use crate::report::frame::MediaFilter;
use crate::report::reader::{GzReportStream, ReportReader};
use crate::utils::{sibling_video_path, video_id_from_report};
use std::path::{Path, PathBuf};

/// A report and the video it describes.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportSource {
    report_path: PathBuf,
    video_path: Option<PathBuf>,
}

impl ReportSource {
    /// Uses the video next to the report when one exists.
    pub fn new(report_path: impl Into<PathBuf>) -> Self {
        let report_path = report_path.into();
        let video_path = sibling_video_path(&report_path);
        Self {
            report_path,
            video_path,
        }
    }

    pub fn with_video(mut self, video_path: impl Into<PathBuf>) -> Self {
        self.video_path = Some(video_path.into());
        self
    }

    pub fn report_path(&self) -> &Path {
        &self.report_path
    }

    pub fn video_path(&self) -> Option<&Path> {
        self.video_path.as_deref()
    }

    /// Identifier used as the prefix of every exported file.
    pub fn video_id(&self) -> String {
        video_id_from_report(&self.report_path)
    }

    /// Opens a fresh video-frame reader.
    pub fn open(&self) -> CoreResult<ReportReader<GzReportStream>> {
        ReportReader::open(&self.report_path, MediaFilter::Video)
    }
}

struct ThumbnailTarget<'a> {
    exporter: &'a dyn ThumbnailExporter,
    output_dir: PathBuf,
    video_path: PathBuf,
}

/// Runs analysis modes over one report.
pub struct QcSession<'a> {
    source: ReportSource,
    config: &'a QcConfig,
    cancel: &'a dyn CancelCheck,
    thumbnails: Option<ThumbnailTarget<'a>>,
}

impl<'a> QcSession<'a> {
    pub fn new(source: ReportSource, config: &'a QcConfig) -> Self {
        Self {
            source,
            config,
            cancel: &NeverCancel,
            thumbnails: None,
        }
    }

    pub fn with_cancel(mut self, cancel: &'a dyn CancelCheck) -> Self {
        self.cancel = cancel;
        self
    }

    /// Enables thumbnail export into `output_dir`. The source needs a video.
    pub fn with_thumbnails(
        mut self,
        exporter: &'a dyn ThumbnailExporter,
        output_dir: impl Into<PathBuf>,
    ) -> CoreResult<Self> {
        let video_path = self.source.video_path().map(Path::to_path_buf).ok_or_else(|| {
            CoreError::PathError(format!(
                "no video found for {}; pass the video path to export thumbnails",
                self.source.report_path().display()
            ))
        })?;
        self.thumbnails = Some(ThumbnailTarget {
            exporter,
            output_dir: output_dir.into(),
            video_path,
        });
        Ok(self)
    }

    pub fn source(&self) -> &ReportSource {
        &self.source
    }

    pub fn config(&self) -> &QcConfig {
        self.config
    }

    /// Classifies the bit depth from the first window, then scans for bars.
    pub fn detect_bars(&self) -> CoreResult<BarsDetection> {
        let report = self.source.report_path();
        let depth = detect_bit_depth(self.source.open()?, self.config.buffer_size, self.cancel)
            .map_err(|e| e.in_report(report))?;
        if depth.status == PassStatus::Cancelled {
            return Ok(BarsDetection {
                segment: None,
                bit_depth: depth.bit_depth,
                status: PassStatus::Cancelled,
            });
        }
        detect_bars(
            self.source.open()?,
            depth.bit_depth,
            self.config.buffer_size,
            self.cancel,
        )
        .map_err(|e| e.in_report(report))
    }

    /// Measures the bars found by `detect_bars`.
    pub fn evaluate_bars(&self, detection: &BarsDetection) -> CoreResult<BarsEvaluation> {
        let segment = detection.segment.ok_or_else(|| CoreError::Precondition {
            mode: BARS_EVALUATION_MODE.to_string(),
            reason: "no color bars were detected".to_string(),
        })?;
        evaluate_bars(self.source.open()?, segment, self.config.buffer_size, self.cancel)
            .map_err(|e| e.in_report(self.source.report_path()))
    }

    /// Checks the frames inside `window` against a profile of any shape.
    pub fn check_profile(&self, profile: &Profile, window: DurationWindow) -> CoreResult<ProfileAnalysis> {
        let resolved = profile.resolve()?;
        let delay = self.config.thumbnails.delay_for(resolved.kind);
        let mut sampler = self.sampler(resolved.mode_label(), delay);
        analyze_frames(
            self.source.open()?,
            &resolved,
            window,
            sampler.as_mut(),
            self.cancel,
        )
        .map_err(|e| e.in_report(self.source.report_path()))
    }

    /// Locates the segments matching a content filter.
    pub fn detect_content(
        &self,
        filter: &ContentFilterSpec,
        window: DurationWindow,
    ) -> CoreResult<ContentDetection> {
        // Content exports once per merged range, so no cooldown applies.
        let mut sampler = self.sampler(CONTENT_MODE, 0);
        detect_content_frames(self.source.open()?, filter, window, sampler.as_mut(), self.cancel)
            .map_err(|e| e.in_report(self.source.report_path()))
    }

    fn sampler(&self, mode: &str, delay_frames: u64) -> Option<ThumbnailSampler<'a>> {
        self.thumbnails.as_ref().map(|target| {
            ThumbnailSampler::new(
                target.exporter,
                ThumbnailContext {
                    video_path: target.video_path.clone(),
                    report_path: self.source.report_path().to_path_buf(),
                    output_dir: target.output_dir.clone(),
                    mode: mode.to_string(),
                },
                delay_frames,
            )
        })
    }
}
