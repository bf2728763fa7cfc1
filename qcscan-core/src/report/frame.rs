//! Frame records and metric key normalization.

use crate::error::{CoreError, CoreResult};
use crate::utils::format_report_time;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Prefix stripped from audio metric keys before normalization.
pub const AUDIO_KEY_PREFIX: &str = "lavfi.astats.";

/// Media type discriminator carried by every frame element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Video,
    Audio,
}

impl MediaType {
    pub fn from_attr(value: &str) -> Option<Self> {
        match value {
            "video" => Some(MediaType::Video),
            "audio" => Some(MediaType::Audio),
            _ => None,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            MediaType::Video => "video",
            MediaType::Audio => "audio",
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which frames a reader yields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MediaFilter {
    #[default]
    Video,
    Audio,
    All,
}

impl MediaFilter {
    #[must_use]
    pub fn accepts(self, media_type: MediaType) -> bool {
        match self {
            MediaFilter::Video => media_type == MediaType::Video,
            MediaFilter::Audio => media_type == MediaType::Audio,
            MediaFilter::All => true,
        }
    }
}

/// Tag name of a video metric key.
///
/// The last dot-separated segment, unless it is a single letter, in which
/// case the last two segments joined by a dot:
/// `lavfi.signalstats.YMAX` -> `YMAX`, `lavfi.psnr.psnr.y` -> `psnr.y`.
#[must_use]
pub fn normalize_video_key(key: &str) -> String {
    let mut segments = key.rsplit('.');
    let last = segments.next().unwrap_or_default();
    if last.chars().count() == 1 {
        if let Some(previous) = segments.next() {
            return format!("{previous}.{last}");
        }
    }
    last.to_string()
}

/// Tag name of an audio metric key.
///
/// `lavfi.astats.Overall.Peak_level` -> `Overall_Peak_level`
#[must_use]
pub fn normalize_audio_key(key: &str) -> String {
    let stripped = key.strip_prefix(AUDIO_KEY_PREFIX).unwrap_or(key);
    stripped.split('.').collect::<Vec<_>>().join("_")
}

/// One frame of the report: media type, timestamp and raw metric values.
///
/// Values stay as the text the report carries until a consumer parses them.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameRecord {
    media_type: MediaType,
    timestamp: String,
    metrics: BTreeMap<String, String>,
}

impl FrameRecord {
    /// Creates a record from already normalized tag names.
    pub fn new(
        media_type: MediaType,
        timestamp: impl Into<String>,
        metrics: BTreeMap<String, String>,
    ) -> Self {
        Self {
            media_type,
            timestamp: timestamp.into(),
            metrics,
        }
    }

    /// Creates a record from raw `(key, value)` pairs, normalizing each key
    /// with the rule for the frame's media type.
    pub fn from_raw_metrics<I>(media_type: MediaType, timestamp: impl Into<String>, raw: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let normalize: fn(&str) -> String = match media_type {
            MediaType::Video => normalize_video_key,
            MediaType::Audio => normalize_audio_key,
        };
        let metrics = raw
            .into_iter()
            .map(|(key, value)| (normalize(&key), value))
            .collect();
        Self::new(media_type, timestamp, metrics)
    }

    pub fn media_type(&self) -> MediaType {
        self.media_type
    }

    /// Timestamp text exactly as the report carries it.
    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    /// Timestamp formatted as HH:MM:SS.ffff.
    pub fn formatted_timestamp(&self) -> String {
        format_report_time(&self.timestamp)
    }

    /// Timestamp in seconds.
    pub fn seconds(&self) -> CoreResult<f64> {
        self.timestamp
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|s| s.is_finite())
            .ok_or_else(|| CoreError::MalformedFrame {
                timestamp: self.timestamp.clone(),
                reason: "timestamp is not a number".to_string(),
            })
    }

    pub fn raw_metric(&self, tag: &str) -> Option<&str> {
        self.metrics.get(tag).map(String::as_str)
    }

    /// Parsed metric value; `Ok(None)` when the frame does not carry the tag.
    pub fn metric(&self, tag: &str) -> CoreResult<Option<f64>> {
        match self.metrics.get(tag) {
            None => Ok(None),
            Some(raw) => raw
                .trim()
                .parse::<f64>()
                .map(Some)
                .map_err(|_| CoreError::MalformedFrame {
                    timestamp: self.formatted_timestamp(),
                    reason: format!("{tag} value '{raw}' is not numeric"),
                }),
        }
    }

    pub fn metrics(&self) -> impl Iterator<Item = (&str, &str)> {
        self.metrics.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn metric_count(&self) -> usize {
        self.metrics.len()
    }
}
