//! Streaming access to QCTools frame reports.
//!
//! - `reader`: decompresses a report and yields one `FrameRecord` per frame
//! - `frame`: frame records and metric key normalization

pub mod frame;
pub mod reader;

pub use frame::{FrameRecord, MediaFilter, MediaType, normalize_audio_key, normalize_video_key};
pub use reader::{DTS_TIME_ATTR, PTS_TIME_ATTR, ReportReader};
