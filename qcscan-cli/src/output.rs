// qcscan-cli/src/output.rs
//
// Console rendering of pass results. Logging goes to stderr through log4rs;
// everything printed here goes to stdout.

use console::style;
use qcscan_core::processing::{
    BarsDetection, BarsEvaluation, ContentDetection, ContentOutcome, PassStatus, ProfileAnalysis,
};
use qcscan_core::reporting::format_percentage;
use std::fmt::Display;
use std::path::Path;

/// Print a heading with clear separation
pub fn print_heading(text: &str) {
    let line = style("=".repeat(50)).blue().bright();
    println!("\n{}", line);
    println!("{}", style(format!(" {} ", text)).bold().white().bright());
    println!("{}\n", line);
}

/// Print a section heading (smaller than main heading)
pub fn print_section(text: &str) {
    let line = style("-".repeat(40)).blue();
    println!("\n{}", line);
    println!("{}", style(format!(" {} ", text)).bold().white());
    println!("{}", line);
}

/// Print an info line with label and value, with the label colored
pub fn print_info<T: Display>(label: &str, value: T) {
    println!("{}: {}", style(label).cyan().bright(), value);
}

pub fn print_success(message: &str) {
    println!("{} {}", style("✓").green().bold(), message);
}

pub fn print_warning(message: &str) {
    println!("{} {}", style("!").yellow().bold(), style(message).yellow());
}

pub fn print_error(message: &str) {
    eprintln!("{} {}", style("✗").red().bold(), style(message).red().bright());
}

fn print_status(status: PassStatus) {
    if status.is_cancelled() {
        print_warning("Pass cancelled; results cover the frames read so far");
    }
}

pub fn print_written(path: &Path) {
    print_info("Written", path.display());
}

pub fn print_bars_detection(detection: &BarsDetection) {
    print_section("Color bars detection");
    print_info("Bit depth", detection.bit_depth);
    match &detection.segment {
        Some(segment) => {
            print_info("Start", segment.formatted_start());
            print_info("End", segment.formatted_end());
            print_info("Duration", format!("{:.2}s", segment.duration()));
        }
        None => print_warning("No color bars detected"),
    }
    print_status(detection.status);
}

pub fn print_bars_evaluation(evaluation: &BarsEvaluation) {
    print_section("Color bars evaluation");
    for peak in &evaluation.peaks {
        let observed = peak
            .observed
            .map(|v| v.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "  {:<8} SMPTE {:>8}  observed {:>8}",
            style(&peak.tag).cyan(),
            peak.smpte,
            observed
        );
    }
    print_status(evaluation.status);
}

pub fn print_profile_analysis(analysis: &ProfileAnalysis) {
    print_section(&format!("{} '{}'", analysis.kind.label(), analysis.profile_name));
    print_info("Frames analyzed", analysis.total_frames);
    for tag in &analysis.tag_failures {
        let line = format!(
            "  {:<8} {:>8} frames ({}%)",
            tag.tag,
            tag.count,
            format_percentage(tag.count, analysis.total_frames)
        );
        if tag.count > 0 {
            println!("{}", style(line).yellow());
        } else {
            println!("{}", line);
        }
    }
    let total = format!(
        "{} of {} frames outside thresholds ({}%)",
        analysis.overall_failures,
        analysis.total_frames,
        format_percentage(analysis.overall_failures, analysis.total_frames)
    );
    if analysis.overall_failures == 0 {
        print_success(&total);
    } else {
        print_warning(&total);
    }
    if analysis.thumbnails.exported + analysis.thumbnails.failed > 0 {
        print_info(
            "Thumbnails",
            format!(
                "{} exported, {} failed",
                analysis.thumbnails.exported, analysis.thumbnails.failed
            ),
        );
    }
    print_status(analysis.status);
}

pub fn print_content_detection(detection: &ContentDetection) {
    print_section(&format!("Content filter '{}'", detection.filter));
    print_info(
        "Matching frames",
        format!("{} of {}", detection.matching_frames, detection.total_frames),
    );
    match &detection.outcome {
        ContentOutcome::NoSegmentFound => print_info("Segments", "none"),
        ContentOutcome::Segments(ranges) => {
            for range in ranges {
                if range.is_point() {
                    println!("  {}", range.formatted_start());
                } else {
                    println!("  {} - {}", range.formatted_start(), range.formatted_end());
                }
            }
        }
    }
    print_status(detection.status);
}
