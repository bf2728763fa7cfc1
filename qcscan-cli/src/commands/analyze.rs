// ============================================================================
// qcscan-cli/src/commands/analyze.rs
// ============================================================================
//
// ANALYZE COMMAND: Runs the Selected Modes over One Report
//
// Modes run in a fixed order: color bars detection, bars evaluation, the
// named profile, the ad hoc tag check, then each content filter. A mode that
// fails is recorded and the next one runs, unless the failure concerns the
// report itself, in which case the remaining modes are skipped.

use crate::cli::AnalyzeArgs;
use crate::error::{CliErrorContext, CliResult, ModeFailure};
use crate::output;
use crate::progress::FrameSpinner;
use log::{error, info};
use qcscan_core::external::{FfmpegThumbnailExporter, ensure_ffmpeg_available};
use qcscan_core::processing::bars::{BARS_DETECTION_MODE, BARS_EVALUATION_MODE};
use qcscan_core::processing::profile::TAG_CHECK_NAME;
use qcscan_core::processing::{
    BarsDetection, BarsEvaluation, ContentDetection, DurationWindow, Profile, ProfileAnalysis,
    QcSession, ReportSource,
};
use qcscan_core::reporting::{
    Table, bars_detection_table, bars_evaluation_table, content_table, failures_table,
    summary_table,
};
use qcscan_core::{CoreError, QcConfig};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Everything one `analyze` invocation produced.
#[derive(Debug, Default, Serialize)]
pub struct RunReport {
    pub report: PathBuf,
    pub bars: Option<BarsDetection>,
    pub bars_evaluation: Option<BarsEvaluation>,
    pub profiles: Vec<ProfileAnalysis>,
    pub content: Vec<ContentDetection>,
    pub outputs: Vec<PathBuf>,
    pub errors: Vec<ModeFailure>,
}

impl RunReport {
    pub fn has_failures(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// Loads the configuration and applies command-line overrides.
pub fn load_config(path: Option<&Path>, args: &AnalyzeArgs) -> CliResult<QcConfig> {
    let mut config = match path {
        Some(path) => QcConfig::from_file(path)?,
        None => QcConfig::default(),
    };
    if let Some(buffer_size) = args.buffer_size {
        config.buffer_size = buffer_size;
    }
    let thumbnails = &mut config.thumbnails;
    if let Some(delay) = args.thumb_delay {
        thumbnails.set_all_delays(delay);
    }
    if let Some(delay) = args.profile_thumb_delay {
        thumbnails.profile_delay_frames = delay;
    }
    if let Some(delay) = args.tag_thumb_delay {
        thumbnails.tag_check_delay_frames = delay;
    }
    if let Some(delay) = args.bars_thumb_delay {
        thumbnails.bars_delay_frames = delay;
    }
    config.validate()?;
    Ok(config)
}

/// Directory for exported files: the explicit one, else the report's directory.
pub fn resolve_output_dir(args: &AnalyzeArgs) -> PathBuf {
    args.output_dir.clone().unwrap_or_else(|| {
        args.report
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."))
    })
}

/// Runs every requested mode and returns the collected results.
///
/// Argument and configuration problems are returned as errors; failures
/// inside individual modes are recorded in the returned report.
pub fn run_analyze(args: AnalyzeArgs) -> CliResult<RunReport> {
    if !args.has_mode() {
        return Err(CoreError::Config(
            "No analysis mode selected. Use --bars-detect, --bars-evaluate, --profile, --tag or --content-filter"
                .to_string(),
        ));
    }
    let config = load_config(args.config.as_deref(), &args)?;
    // Validated up front so a bad range fails before any report is read.
    DurationWindow::new(args.start, args.end)?;

    let output_dir = resolve_output_dir(&args);
    std::fs::create_dir_all(&output_dir)
        .cli_with_context(|| format!("Creating output directory {}", output_dir.display()))?;

    let mut source = ReportSource::new(&args.report);
    if let Some(video) = &args.video {
        source = source.with_video(video);
    }

    let exporter = FfmpegThumbnailExporter::from_config(&config.thumbnails);
    let progress = FrameSpinner::new();
    let mut session = QcSession::new(source, &config).with_cancel(&progress);
    if args.thumbnails {
        ensure_ffmpeg_available()?;
        session = session.with_thumbnails(&exporter, output_dir.join("thumbnails"))?;
    }

    info!("Analyzing {}", args.report.display());
    let mut report = RunReport {
        report: args.report.clone(),
        ..RunReport::default()
    };
    let outcome = run_modes(&session, &progress, &args, &output_dir, &mut report);
    progress.finish();
    if let Err(failure) = outcome {
        error!("Stopping after {}: {}", failure.mode, failure.message);
        report.errors.push(failure);
    }
    Ok(report)
}

/// Unwraps a mode result, recording recoverable failures.
fn settle<T>(report: &mut RunReport, mode: &str, result: CliResult<T>) -> Result<Option<T>, ModeFailure> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.is_report_fatal() => Err(ModeFailure::new(mode, &e)),
        Err(e) => {
            error!("{mode}: {e}");
            report.errors.push(ModeFailure::new(mode, &e));
            Ok(None)
        }
    }
}

fn write_table(
    report: &mut RunReport,
    mode: &str,
    table: &Table,
    path: PathBuf,
) -> Result<(), ModeFailure> {
    let written = table
        .write_csv(&path)
        .cli_with_context(|| format!("Writing {}", path.display()));
    if settle(report, mode, written)?.is_some() {
        info!("Wrote {}", path.display());
        report.outputs.push(path);
    }
    Ok(())
}

fn export_path(output_dir: &Path, video_id: &str, suffix: &str) -> PathBuf {
    output_dir.join(format!("{video_id}.{suffix}.csv"))
}

fn run_modes(
    session: &QcSession<'_>,
    progress: &FrameSpinner,
    args: &AnalyzeArgs,
    output_dir: &Path,
    report: &mut RunReport,
) -> Result<(), ModeFailure> {
    let video_id = session.source().video_id();

    // Color bars
    let mut bars_end = None;
    if args.bars_detect || args.bars_evaluate {
        progress.start(BARS_DETECTION_MODE);
        if let Some(detection) = settle(report, BARS_DETECTION_MODE, session.detect_bars())? {
            write_table(
                report,
                BARS_DETECTION_MODE,
                &bars_detection_table(&detection),
                export_path(output_dir, &video_id, BARS_DETECTION_MODE),
            )?;
            bars_end = detection.segment.map(|s| s.end);

            if args.bars_evaluate {
                evaluate_bars(session, progress, args, &detection, output_dir, &video_id, report)?;
            }
            report.bars = Some(detection);
        }
    }

    // Checks after the bars unless the caller fixed the start.
    let check_window = || DurationWindow::new(args.start.or(bars_end), args.end);

    if let Some(name) = &args.profile {
        let profile = session.config().profile(name);
        progress.start(name);
        run_check(session, name, profile, check_window(), output_dir, &video_id, report)?;
    }

    if !args.tags.is_empty() {
        let profile = session.config().tag_check(args.tags.clone());
        progress.start(TAG_CHECK_NAME);
        run_check(session, TAG_CHECK_NAME, profile, check_window(), output_dir, &video_id, report)?;
    }

    for name in &args.content_filters {
        progress.start(name);
        let result = DurationWindow::new(args.start, args.end).and_then(|window| {
            let filter = session.config().content_filter(name)?;
            session.detect_content(&filter, window)
        });
        if let Some(detection) = settle(report, name, result)? {
            write_table(
                report,
                name,
                &content_table(&detection),
                export_path(output_dir, &video_id, &format!("{name}.content")),
            )?;
            report.content.push(detection);
        }
    }

    Ok(())
}

fn evaluate_bars(
    session: &QcSession<'_>,
    progress: &FrameSpinner,
    args: &AnalyzeArgs,
    detection: &BarsDetection,
    output_dir: &Path,
    video_id: &str,
    report: &mut RunReport,
) -> Result<(), ModeFailure> {
    progress.start(BARS_EVALUATION_MODE);
    let Some(evaluation) =
        settle(report, BARS_EVALUATION_MODE, session.evaluate_bars(detection))?
    else {
        return Ok(());
    };
    write_table(
        report,
        BARS_EVALUATION_MODE,
        &bars_evaluation_table(&evaluation),
        export_path(output_dir, video_id, BARS_EVALUATION_MODE),
    )?;

    if !evaluation.status.is_cancelled() {
        let window = DurationWindow::new(Some(args.start.unwrap_or(evaluation.segment.end)), args.end);
        let profile = evaluation.clone().into_profile();
        progress.start(BARS_EVALUATION_MODE);
        run_check(session, BARS_EVALUATION_MODE, profile, window, output_dir, video_id, report)?;
    }
    report.bars_evaluation = Some(evaluation);
    Ok(())
}

fn run_check(
    session: &QcSession<'_>,
    mode: &str,
    profile: CliResult<Profile>,
    window: CliResult<DurationWindow>,
    output_dir: &Path,
    video_id: &str,
    report: &mut RunReport,
) -> Result<(), ModeFailure> {
    let result = profile.and_then(|profile| session.check_profile(&profile, window?));
    let Some(analysis) = settle(report, mode, result)? else {
        return Ok(());
    };
    let label = analysis.profile_name.clone();
    write_table(
        report,
        mode,
        &summary_table(&analysis),
        export_path(output_dir, video_id, &format!("{label}.summary")),
    )?;
    write_table(
        report,
        mode,
        &failures_table(&analysis),
        export_path(output_dir, video_id, &format!("{label}.failures")),
    )?;
    report.profiles.push(analysis);
    Ok(())
}

/// Prints a finished run to stdout.
pub fn print_run_report(run: &RunReport, json: bool) -> CliResult<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(run)?);
        return Ok(());
    }

    output::print_heading(&format!("qcscan: {}", run.report.display()));
    if let Some(bars) = &run.bars {
        output::print_bars_detection(bars);
    }
    if let Some(evaluation) = &run.bars_evaluation {
        output::print_bars_evaluation(evaluation);
    }
    for analysis in &run.profiles {
        output::print_profile_analysis(analysis);
    }
    for detection in &run.content {
        output::print_content_detection(detection);
    }

    if !run.outputs.is_empty() {
        output::print_section("Exports");
        for path in &run.outputs {
            output::print_written(path);
        }
    }
    for failure in &run.errors {
        output::print_error(&format!("{}: {}", failure.mode, failure.message));
    }
    Ok(())
}
