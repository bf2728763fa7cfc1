//! Synthetic QCTools reports for integration tests.

#![allow(dead_code)]

use flate2::Compression;
use flate2::write::GzEncoder;
use std::io::Write;
use std::path::{Path, PathBuf};

/// One frame: timestamp in seconds and signalstats tag values.
pub struct Frame {
    pub time: f64,
    pub tags: Vec<(&'static str, f64)>,
}

impl Frame {
    pub fn new(time: f64, tags: &[(&'static str, f64)]) -> Self {
        Self {
            time,
            tags: tags.to_vec(),
        }
    }
}

/// 10-bit color bars.
pub const BARS: &[(&str, f64)] = &[("YMAX", 950.0), ("YMIN", 4.0), ("YDIF", 1.0)];

/// In-range 10-bit picture content.
pub const PROGRAM: &[(&str, f64)] = &[
    ("YMAX", 700.0),
    ("YMIN", 70.0),
    ("YDIF", 20.0),
    ("YHIGH", 600.0),
    ("YLOW", 100.0),
];

/// Black picture, matching the built-in allBlack filter.
pub const BLACK: &[(&str, f64)] = &[
    ("YMAX", 100.0),
    ("YMIN", 4.0),
    ("YDIF", 0.5),
    ("YHIGH", 90.0),
    ("YLOW", 60.0),
];

pub fn render_xml(frames: &[Frame]) -> String {
    let mut xml = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<ffprobe>\n  <frames>\n");
    for (i, frame) in frames.iter().enumerate() {
        // Interleave an audio frame so readers have to skip it.
        if i % 10 == 0 {
            xml.push_str(&format!(
                "    <frame media_type=\"audio\" stream_index=\"1\" pkt_pts_time=\"{0:.6}\" pkt_dts_time=\"{0:.6}\">\n      <tag key=\"lavfi.astats.Overall.Peak_level\" value=\"-6.0\"/>\n    </frame>\n",
                frame.time
            ));
        }
        xml.push_str(&format!(
            "    <frame media_type=\"video\" stream_index=\"0\" pkt_pts_time=\"{0:.6}\" pkt_dts_time=\"{0:.6}\">\n",
            frame.time
        ));
        for (tag, value) in &frame.tags {
            xml.push_str(&format!(
                "      <tag key=\"lavfi.signalstats.{tag}\" value=\"{value}\"/>\n"
            ));
        }
        xml.push_str("    </frame>\n");
    }
    xml.push_str("  </frames>\n</ffprobe>\n");
    xml
}

pub fn write_gz(path: &Path, content: &str) {
    let file = std::fs::File::create(path).unwrap();
    let mut encoder = GzEncoder::new(file, Compression::default());
    encoder.write_all(content.as_bytes()).unwrap();
    encoder.finish().unwrap();
}

/// Writes `<dir>/<video_id>.qctools.xml.gz`.
pub fn write_report(dir: &Path, video_id: &str, frames: &[Frame]) -> PathBuf {
    let path = dir.join(format!("{video_id}.qctools.xml.gz"));
    write_gz(&path, &render_xml(frames));
    path
}

/// `count` frames of `tags` every `step` seconds starting at `start`.
pub fn run_of(start: f64, step: f64, count: usize, tags: &[(&'static str, f64)]) -> Vec<Frame> {
    (0..count)
        .map(|i| Frame::new(start + i as f64 * step, tags))
        .collect()
}

/// 10 seconds of bars followed by 20 seconds of program, two frames a second.
pub fn bars_then_program() -> Vec<Frame> {
    let mut frames = run_of(0.0, 0.5, 20, BARS);
    frames.extend(run_of(10.0, 0.5, 40, PROGRAM));
    frames
}
