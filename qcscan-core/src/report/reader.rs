// ============================================================================
// qcscan-core/src/report/reader.rs
// ============================================================================
//
// REPORT STREAM READER: Pull-Based Traversal of Compressed QCTools Reports
//
// Reports can hold millions of frames, so the reader never builds a document
// tree. It decompresses on the fly, walks XML events with one reusable
// buffer, and hands out one `FrameRecord` per `frame` element. A frame's data
// is dropped as soon as its record has been handed out.
//
// The timestamp attribute name (`pkt_dts_time` or `pkt_pts_time`) is decided
// by the first video frame and then used for every later frame of the pass.

use crate::config::PROGRESS_LOG_INTERVAL_FRAMES;
use crate::error::{CoreResult, malformed_report, report_unavailable};
use crate::report::frame::{FrameRecord, MediaFilter, MediaType};
use flate2::read::MultiGzDecoder;
use quick_xml::events::{BytesStart, Event};
use std::fs::File;
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

/// Decoding timestamp attribute, preferred when present.
pub const DTS_TIME_ATTR: &str = "pkt_dts_time";
/// Presentation timestamp attribute.
pub const PTS_TIME_ATTR: &str = "pkt_pts_time";

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// The concrete stream behind `ReportReader::open`.
pub type GzReportStream = BufReader<MultiGzDecoder<File>>;

/// A frame whose metric children are still being collected.
struct PendingFrame {
    media_type: MediaType,
    timestamp: String,
    raw_metrics: Vec<(String, String)>,
}

impl PendingFrame {
    fn finish(self) -> FrameRecord {
        FrameRecord::from_raw_metrics(self.media_type, self.timestamp, self.raw_metrics)
    }
}

/// Lazy, finite, non-restartable sequence of frames from one report.
///
/// After yielding an error the reader is exhausted.
pub struct ReportReader<R: BufRead> {
    path: PathBuf,
    xml: quick_xml::Reader<R>,
    buf: Vec<u8>,
    filter: MediaFilter,
    time_attr: Option<&'static str>,
    pending: Option<PendingFrame>,
    frames_seen: u64,
    frames_yielded: u64,
    done: bool,
}

impl ReportReader<GzReportStream> {
    /// Opens a gzip-compressed report.
    ///
    /// Fails with `ReportUnavailable` when the file cannot be opened or is not
    /// gzip data. Decompression errors further into the file surface from the
    /// iterator as `ReportUnavailable` as well.
    pub fn open(path: &Path, filter: MediaFilter) -> CoreResult<Self> {
        let mut file = File::open(path)
            .map_err(|e| report_unavailable(path, format!("cannot open: {e}")))?;

        let mut magic = [0u8; 2];
        file.read_exact(&mut magic)
            .map_err(|e| report_unavailable(path, format!("cannot read gzip header: {e}")))?;
        if magic != GZIP_MAGIC {
            return Err(report_unavailable(path, "not a gzip-compressed report"));
        }
        file.seek(SeekFrom::Start(0))
            .map_err(|e| report_unavailable(path, format!("cannot rewind: {e}")))?;

        log::debug!("Opened report {} ({:?} frames)", path.display(), filter);
        Ok(Self::from_buf_read(
            path,
            BufReader::new(MultiGzDecoder::new(file)),
            filter,
        ))
    }
}

impl<R: BufRead> ReportReader<R> {
    /// Wraps an already decompressed XML stream. `path` is only used in messages.
    pub fn from_buf_read(path: &Path, reader: R, filter: MediaFilter) -> Self {
        let mut xml = quick_xml::Reader::from_reader(reader);
        xml.config_mut().trim_text(true);
        Self {
            path: path.to_path_buf(),
            xml,
            buf: Vec::new(),
            filter,
            time_attr: None,
            pending: None,
            frames_seen: 0,
            frames_yielded: 0,
            done: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Timestamp attribute resolved from the first video frame, if seen yet.
    pub fn timestamp_attribute(&self) -> Option<&'static str> {
        self.time_attr
    }

    /// Frame elements encountered so far, including filtered ones.
    pub fn frames_seen(&self) -> u64 {
        self.frames_seen
    }

    fn next_frame(&mut self) -> CoreResult<Option<FrameRecord>> {
        loop {
            self.buf.clear();
            let event = match self.xml.read_event_into(&mut self.buf) {
                Ok(event) => event,
                Err(quick_xml::Error::Io(e)) => {
                    return Err(report_unavailable(
                        &self.path,
                        format!("decompression failed: {e}"),
                    ));
                }
                Err(e) => {
                    return Err(malformed_report(
                        &self.path,
                        format!("XML error after {} frames: {e}", self.frames_seen),
                    ));
                }
            };

            match event {
                Event::Start(e) if e.name().as_ref() == b"frame" => {
                    self.frames_seen += 1;
                    self.pending =
                        begin_frame(&self.path, &mut self.time_attr, self.filter, &e)?;
                }
                Event::Empty(e) if e.name().as_ref() == b"frame" => {
                    self.frames_seen += 1;
                    if let Some(frame) =
                        begin_frame(&self.path, &mut self.time_attr, self.filter, &e)?
                    {
                        return Ok(Some(frame.finish()));
                    }
                }
                Event::Empty(e) | Event::Start(e) if e.name().as_ref() == b"tag" => {
                    // Children of filtered frames are never collected
                    if let Some(pending) = self.pending.as_mut() {
                        let key = required_attr(&self.path, &e, "key")?;
                        let value = required_attr(&self.path, &e, "value")?;
                        pending.raw_metrics.push((key, value));
                    }
                }
                Event::End(e) if e.name().as_ref() == b"frame" => {
                    if let Some(pending) = self.pending.take() {
                        return Ok(Some(pending.finish()));
                    }
                }
                Event::Eof => {
                    if self.pending.is_some() {
                        return Err(malformed_report(&self.path, "report ends inside a frame"));
                    }
                    if self.frames_seen == 0 {
                        return Err(malformed_report(&self.path, "report contains no frame elements"));
                    }
                    if self.time_attr.is_none() && self.filter.accepts(MediaType::Video) {
                        return Err(malformed_report(
                            &self.path,
                            format!("no video frame carries {DTS_TIME_ATTR} or {PTS_TIME_ATTR}"),
                        ));
                    }
                    log::debug!(
                        "Finished reading {}: {} frames, {} yielded",
                        self.path.display(),
                        self.frames_seen,
                        self.frames_yielded
                    );
                    return Ok(None);
                }
                _ => {}
            }
        }
    }
}

impl<R: BufRead> Iterator for ReportReader<R> {
    type Item = CoreResult<FrameRecord>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.next_frame() {
            Ok(Some(frame)) => {
                self.frames_yielded += 1;
                if self.frames_yielded % PROGRESS_LOG_INTERVAL_FRAMES == 0 {
                    log::debug!(
                        "Read {} frames from {}",
                        self.frames_yielded,
                        self.path.display()
                    );
                }
                Some(Ok(frame))
            }
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

/// Reads the frame attributes. Returns `None` for frames the filter excludes.
fn begin_frame(
    path: &Path,
    time_attr: &mut Option<&'static str>,
    filter: MediaFilter,
    element: &BytesStart<'_>,
) -> CoreResult<Option<PendingFrame>> {
    let media = required_attr(path, element, "media_type")?;
    let Some(media_type) = MediaType::from_attr(&media) else {
        // Other stream kinds (e.g. subtitles) carry no metrics we evaluate
        log::trace!("Skipping frame with media_type '{media}'");
        return Ok(None);
    };

    if media_type == MediaType::Video && time_attr.is_none() {
        let resolved = detect_time_attr(path, element)?.ok_or_else(|| {
            malformed_report(
                path,
                format!("first video frame carries neither {DTS_TIME_ATTR} nor {PTS_TIME_ATTR}"),
            )
        })?;
        log::debug!("Using timestamp attribute {resolved} for {}", path.display());
        *time_attr = Some(resolved);
    }

    if !filter.accepts(media_type) {
        return Ok(None);
    }

    let attr_name = match *time_attr {
        Some(name) => name,
        None => detect_time_attr(path, element)?.ok_or_else(|| {
            malformed_report(
                path,
                format!("{media_type} frame carries neither {DTS_TIME_ATTR} nor {PTS_TIME_ATTR}"),
            )
        })?,
    };
    let timestamp = required_attr(path, element, attr_name)?;

    Ok(Some(PendingFrame {
        media_type,
        timestamp,
        raw_metrics: Vec::new(),
    }))
}

fn detect_time_attr(path: &Path, element: &BytesStart<'_>) -> CoreResult<Option<&'static str>> {
    for name in [DTS_TIME_ATTR, PTS_TIME_ATTR] {
        if optional_attr(path, element, name)?.is_some() {
            return Ok(Some(name));
        }
    }
    Ok(None)
}

fn optional_attr(path: &Path, element: &BytesStart<'_>, name: &str) -> CoreResult<Option<String>> {
    let attr = element
        .try_get_attribute(name)
        .map_err(|e| malformed_report(path, format!("invalid attribute on <{}>: {e}", element_name(element))))?;
    attr.map(|a| {
        a.unescape_value()
            .map(|value| value.into_owned())
            .map_err(|e| malformed_report(path, format!("invalid {name} value: {e}")))
    })
    .transpose()
}

fn required_attr(path: &Path, element: &BytesStart<'_>, name: &str) -> CoreResult<String> {
    optional_attr(path, element, name)?.ok_or_else(|| {
        malformed_report(
            path,
            format!("<{}> element lacks the {name} attribute", element_name(element)),
        )
    })
}

fn element_name(element: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(element.name().as_ref()).into_owned()
}
