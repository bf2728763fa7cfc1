//! Thumbnail export for failing frames.
//!
//! Passes never call ffmpeg themselves. They hand a `ThumbnailRequest` to a
//! `ThumbnailExporter` through a `ThumbnailSampler`, which applies the cooldown
//! between exports and records failures without aborting the pass.

use crate::config::ThumbnailConfig;
use crate::error::{CoreError, CoreResult, command_failed_error};
use crate::external::ffmpeg_executor::{FfmpegSpawner, SidecarSpawner, wait_with_timeout};
use crate::utils::video_id_from_report;
use ffmpeg_sidecar::command::FfmpegCommand;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Where a pass exports its thumbnails and under which label.
#[derive(Debug, Clone, PartialEq)]
pub struct ThumbnailContext {
    pub video_path: PathBuf,
    pub report_path: PathBuf,
    pub output_dir: PathBuf,
    /// Profile name, `tags`, `bars` or `content`.
    pub mode: String,
}

/// One frame to export.
#[derive(Debug, Clone, PartialEq)]
pub struct ThumbnailRequest {
    pub video_path: PathBuf,
    pub report_path: PathBuf,
    pub output_dir: PathBuf,
    pub mode: String,
    pub tag: String,
    /// Omitted from the file name when `None`.
    pub value: Option<f64>,
    /// Formatted as HH:MM:SS.ffff.
    pub timestamp: String,
}

impl ThumbnailRequest {
    pub fn output_path(&self) -> PathBuf {
        self.output_dir.join(thumbnail_file_name(self))
    }
}

/// `{video_id}.{mode}.{tag}.{value}.{timestamp}.png`, with the timestamp's
/// colons replaced by dots.
pub fn thumbnail_file_name(request: &ThumbnailRequest) -> String {
    let video_id = video_id_from_report(&request.report_path);
    let timestamp = request.timestamp.replace(':', ".");
    match request.value {
        Some(value) => format!(
            "{video_id}.{}.{}.{value}.{timestamp}.png",
            request.mode, request.tag
        ),
        None => format!("{video_id}.{}.{}.{timestamp}.png", request.mode, request.tag),
    }
}

/// Collaborator that turns a request into an image file.
pub trait ThumbnailExporter {
    fn export(&self, request: &ThumbnailRequest) -> CoreResult<PathBuf>;
}

/// Exports one frame with ffmpeg, killing it when it runs past the timeout.
#[derive(Debug, Clone)]
pub struct FfmpegThumbnailExporter<S: FfmpegSpawner = SidecarSpawner> {
    spawner: S,
    timeout: Duration,
    frame_size: String,
}

impl FfmpegThumbnailExporter<SidecarSpawner> {
    pub fn from_config(config: &ThumbnailConfig) -> Self {
        Self::with_spawner(SidecarSpawner, config)
    }
}

impl<S: FfmpegSpawner> FfmpegThumbnailExporter<S> {
    pub fn with_spawner(spawner: S, config: &ThumbnailConfig) -> Self {
        Self {
            spawner,
            timeout: config.timeout(),
            frame_size: config.frame_size.clone(),
        }
    }

    fn build_command(&self, request: &ThumbnailRequest, output: &Path) -> FfmpegCommand {
        let mut cmd = FfmpegCommand::new();
        cmd.arg("-ss");
        cmd.arg(&request.timestamp);
        cmd.input(request.video_path.to_string_lossy().as_ref());
        cmd.args(["-frames:v", "1"]);
        cmd.arg("-s");
        cmd.arg(&self.frame_size);
        cmd.overwrite();
        cmd.output(output.to_string_lossy().as_ref());
        cmd
    }
}

impl<S: FfmpegSpawner> ThumbnailExporter for FfmpegThumbnailExporter<S> {
    fn export(&self, request: &ThumbnailRequest) -> CoreResult<PathBuf> {
        std::fs::create_dir_all(&request.output_dir)?;
        let output = request.output_path();
        let cmd = self.build_command(request, &output);
        log::debug!(
            "Exporting {} at {} from {}",
            output.display(),
            request.timestamp,
            request.video_path.display()
        );

        let mut process = self.spawner.spawn(cmd)?;
        let status = wait_with_timeout(&mut process, self.timeout)?
            .ok_or_else(|| CoreError::CommandTimeout("ffmpeg (thumbnail)".to_string(), self.timeout))?;
        if !status.success() {
            return Err(command_failed_error(
                "ffmpeg (thumbnail)",
                status,
                format!("no frame exported at {}", request.timestamp),
            ));
        }
        Ok(output)
    }
}

/// Export outcomes of one pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ThumbnailStats {
    pub exported: u64,
    pub failed: u64,
    pub files: Vec<PathBuf>,
}

/// Rate-limits exports within one pass.
///
/// The first offered frame is exported right away. Later offers are exported
/// only once at least `delay_frames` frames have been ticked since the last
/// export attempt.
pub struct ThumbnailSampler<'a> {
    exporter: &'a dyn ThumbnailExporter,
    context: ThumbnailContext,
    delay_frames: u64,
    frames_since_export: u64,
    attempted: bool,
    stats: ThumbnailStats,
}

impl<'a> ThumbnailSampler<'a> {
    pub fn new(exporter: &'a dyn ThumbnailExporter, context: ThumbnailContext, delay_frames: u64) -> Self {
        Self {
            exporter,
            context,
            delay_frames,
            frames_since_export: 0,
            attempted: false,
            stats: ThumbnailStats::default(),
        }
    }

    /// Counts one analyzed frame toward the cooldown.
    pub fn tick(&mut self) {
        self.frames_since_export += 1;
    }

    pub fn is_ready(&self) -> bool {
        !self.attempted || self.frames_since_export >= self.delay_frames
    }

    /// Exports the frame if the cooldown allows it. Returns whether an export
    /// was attempted.
    pub fn offer(&mut self, tag: &str, value: f64, timestamp: &str) -> bool {
        if !self.is_ready() {
            return false;
        }
        self.export_now(tag, Some(value), timestamp);
        true
    }

    /// Exports regardless of the cooldown, then restarts it.
    pub fn export_now(&mut self, tag: &str, value: Option<f64>, timestamp: &str) {
        let request = ThumbnailRequest {
            video_path: self.context.video_path.clone(),
            report_path: self.context.report_path.clone(),
            output_dir: self.context.output_dir.clone(),
            mode: self.context.mode.clone(),
            tag: tag.to_string(),
            value,
            timestamp: timestamp.to_string(),
        };
        self.attempted = true;
        self.frames_since_export = 0;

        match self.exporter.export(&request) {
            Ok(path) => {
                log::debug!("Exported thumbnail {}", path.display());
                self.stats.exported += 1;
                self.stats.files.push(path);
            }
            Err(e) => {
                log::warn!("Thumbnail export at {timestamp} failed: {e}");
                self.stats.failed += 1;
            }
        }
    }

    pub fn stats(&self) -> ThumbnailStats {
        self.stats.clone()
    }
}
