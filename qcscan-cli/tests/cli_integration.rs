use assert_cmd::Command;
use flate2::Compression;
use flate2::write::GzEncoder;
use predicates::str::contains;
use std::error::Error;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

// Helper function to get the path to the compiled binary
fn qcscan_cmd() -> Command {
    let mut cmd = Command::cargo_bin("qcscan").expect("Failed to find qcscan binary");
    cmd.env_remove("QCSCAN_CONFIG");
    cmd
}

fn frame(time: f64, tags: &[(&str, f64)]) -> String {
    let mut xml = format!("<frame media_type=\"video\" pkt_dts_time=\"{time:.6}\">");
    for (tag, value) in tags {
        xml.push_str(&format!("<tag key=\"lavfi.signalstats.{tag}\" value=\"{value}\"/>"));
    }
    xml.push_str("</frame>\n");
    xml
}

/// 10 seconds of 10-bit bars followed by 20 seconds of program, two frames a second.
fn write_report(dir: &Path) -> Result<PathBuf, Box<dyn Error>> {
    let mut xml = String::from("<ffprobe><frames>\n");
    for i in 0..60 {
        let t = i as f64 * 0.5;
        if i < 20 {
            xml.push_str(&frame(t, &[("YMAX", 950.0), ("YMIN", 4.0), ("YDIF", 1.0)]));
        } else {
            xml.push_str(&frame(
                t,
                &[("YMAX", 700.0), ("YMIN", 70.0), ("YDIF", 20.0), ("YHIGH", 600.0), ("YLOW", 100.0)],
            ));
        }
    }
    xml.push_str("</frames></ffprobe>\n");

    let path = dir.join("tape.mkv.qctools.xml.gz");
    let mut encoder = GzEncoder::new(std::fs::File::create(&path)?, Compression::default());
    encoder.write_all(xml.as_bytes())?;
    encoder.finish()?;
    Ok(path)
}

#[test]
fn test_profiles_lists_builtins() -> Result<(), Box<dyn Error>> {
    qcscan_cmd()
        .arg("profiles")
        .assert()
        .success()
        .stdout(contains("default"))
        .stdout(contains("highTolerance"))
        .stdout(contains("allBlack"));
    Ok(())
}

#[test]
fn test_analyze_writes_tables() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let out = dir.path().join("out");
    let report = write_report(dir.path())?;

    qcscan_cmd()
        .arg("analyze")
        .arg("-i")
        .arg(&report)
        .arg("-o")
        .arg(&out)
        .arg("--bars-detect")
        .arg("--profile")
        .arg("default")
        .arg("--content-filter")
        .arg("allBlack")
        .assert()
        .success()
        .stdout(contains("Color bars detection"));

    let bars = std::fs::read_to_string(out.join("tape.mkv.colorbars.csv"))?;
    assert_eq!(bars, "Start,End\n00:00:03.0000,00:00:09.5000\n");

    let summary = std::fs::read_to_string(out.join("tape.mkv.default.summary.csv"))?;
    assert!(summary.starts_with("Profile,default\nTotalFrames,41\n"), "{summary}");
    assert!(summary.ends_with("Total,0,0\n"), "{summary}");

    let failures = std::fs::read_to_string(out.join("tape.mkv.default.failures.csv"))?;
    assert_eq!(failures, "Timestamp,Tag,Value,Threshold\n");

    let content = std::fs::read_to_string(out.join("tape.mkv.allBlack.content.csv"))?;
    assert_eq!(content, "allBlack\nNo segments found\n");
    Ok(())
}

#[test]
fn test_analyze_json_output() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let report = write_report(dir.path())?;

    let output = qcscan_cmd()
        .arg("analyze")
        .arg("-i")
        .arg(&report)
        .arg("--bars-evaluate")
        .arg("--json")
        .output()?;
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(json["bars"]["bit_depth"], "10-bit");
    assert_eq!(json["bars"]["segment"]["start"], 3.0);
    assert_eq!(json["bars_evaluation"]["status"], "completed");
    assert_eq!(json["profiles"][0]["profile_name"], "bars");
    assert!(json["errors"].as_array().is_some_and(|e| e.is_empty()));

    // Tables land next to the report without -o.
    assert!(dir.path().join("tape.mkv.colorbars_eval.csv").is_file());
    assert!(dir.path().join("tape.mkv.bars.summary.csv").is_file());
    Ok(())
}

#[test]
fn test_analyze_missing_report_fails() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    qcscan_cmd()
        .arg("analyze")
        .arg("-i")
        .arg(dir.path().join("missing.mkv.qctools.xml.gz"))
        .arg("--bars-detect")
        .assert()
        .failure()
        .stderr(contains("Report unavailable"));
    Ok(())
}

#[test]
fn test_analyze_without_mode_fails() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let report = write_report(dir.path())?;
    qcscan_cmd()
        .arg("analyze")
        .arg("-i")
        .arg(&report)
        .assert()
        .failure()
        .stderr(contains("No analysis mode selected"));
    Ok(())
}

#[test]
fn test_unknown_profile_does_not_stop_other_modes() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let report = write_report(dir.path())?;
    qcscan_cmd()
        .arg("analyze")
        .arg("-i")
        .arg(&report)
        .arg("--profile")
        .arg("nonexistent")
        .arg("--tag")
        .arg("YMIN:lt:10")
        .assert()
        .failure()
        .stderr(contains("Unknown profile 'nonexistent'"));

    let summary = std::fs::read_to_string(dir.path().join("tape.mkv.tags.summary.csv"))?;
    assert!(summary.starts_with("Tag check,tags\nTotalFrames,60\nYMIN,20,33.33\n"), "{summary}");
    Ok(())
}

#[test]
fn test_invalid_tag_argument_is_rejected() -> Result<(), Box<dyn Error>> {
    qcscan_cmd()
        .arg("analyze")
        .arg("-i")
        .arg("tape.mkv.qctools.xml.gz")
        .arg("--tag")
        .arg("YMAX:sideways:940")
        .assert()
        .failure()
        .stderr(contains("Unknown comparison"));
    Ok(())
}
