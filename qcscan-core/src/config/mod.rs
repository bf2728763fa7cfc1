//! Configuration structures and constants for the qcscan-core library.
//!
//! The analysis engine never reads ambient configuration. Callers build a
//! `QcConfig` (defaults, or a TOML file layered over the defaults) and pass
//! it, or values resolved from it, into each entry point.

mod profiles;

use crate::error::{CoreError, CoreResult};
use crate::processing::content::ContentFilterSpec;
use crate::processing::profile::{
    Comparison, Profile, ProfileKind, TAG_CHECK_NAME, ThresholdCheck,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

pub use profiles::{KNOWN_TAGS, builtin_content_filters, builtin_profiles, is_known_tag};

// Default constants

/// Default capacity of the sliding window used by the bars passes.
/// Must be odd so the window has a middle frame.
pub const DEFAULT_BUFFER_SIZE: usize = 11;

/// Default minimum number of frames between two thumbnail exports of a
/// profile or tag check.
pub const DEFAULT_THUMB_DELAY_FRAMES: u64 = 9000;

/// Default cooldown of the check built from measured color bars.
pub const DEFAULT_BARS_THUMB_DELAY_FRAMES: u64 = 9000;

/// Default time allowed for one thumbnail export before ffmpeg is killed.
pub const DEFAULT_THUMB_TIMEOUT_SECS: u64 = 30;

/// Frame size of exported thumbnails.
pub const DEFAULT_THUMB_FRAME_SIZE: &str = "720x486";

/// Any buffered `YMAX` above this value classifies the source as 10-bit.
pub const BIT_DEPTH_10_YMAX_CUTOFF: f64 = 250.0;

/// A bars segment must last longer than this many seconds.
pub const BARS_MIN_DURATION_SECS: f64 = 2.0;

/// Matching timestamps closer than this many seconds belong to one segment.
pub const SEGMENT_MERGE_GAP_SECS: f64 = 5.0;

/// A progress line is logged every this many frames.
pub const PROGRESS_LOG_INTERVAL_FRAMES: u64 = 10_000;

/// Thumbnail export settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThumbnailConfig {
    /// Minimum frames between two exports of a named profile check.
    pub profile_delay_frames: u64,
    /// Minimum frames between two exports of an ad hoc tag check.
    pub tag_check_delay_frames: u64,
    /// Minimum frames between two exports of the bars-derived check.
    pub bars_delay_frames: u64,
    /// Seconds before a stuck export is killed.
    pub timeout_secs: u64,
    /// Output frame size passed to ffmpeg (`WxH`).
    pub frame_size: String,
}

impl Default for ThumbnailConfig {
    fn default() -> Self {
        Self {
            profile_delay_frames: DEFAULT_THUMB_DELAY_FRAMES,
            tag_check_delay_frames: DEFAULT_THUMB_DELAY_FRAMES,
            bars_delay_frames: DEFAULT_BARS_THUMB_DELAY_FRAMES,
            timeout_secs: DEFAULT_THUMB_TIMEOUT_SECS,
            frame_size: DEFAULT_THUMB_FRAME_SIZE.to_string(),
        }
    }
}

impl ThumbnailConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Cooldown for the kind of check being run.
    pub fn delay_for(&self, kind: ProfileKind) -> u64 {
        match kind {
            ProfileKind::Profile => self.profile_delay_frames,
            ProfileKind::TagCheck => self.tag_check_delay_frames,
            ProfileKind::BarsEvaluation => self.bars_delay_frames,
        }
    }

    /// Sets the same cooldown for every kind of check.
    pub fn set_all_delays(&mut self, frames: u64) {
        self.profile_delay_frames = frames;
        self.tag_check_delay_frames = frames;
        self.bars_delay_frames = frames;
    }
}

/// One entry of a content filter as written in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FilterEntry {
    pub threshold: f64,
    pub op: Comparison,
}

/// Main configuration structure for the qcscan-core library.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QcConfig {
    /// Sliding window capacity for bars detection and evaluation
    pub buffer_size: usize,

    /// Named profiles: tag -> threshold, direction implied by the tag name
    pub profiles: BTreeMap<String, BTreeMap<String, f64>>,

    /// Named content filters: tag -> (threshold, operator), AND semantics
    pub content_filters: BTreeMap<String, BTreeMap<String, FilterEntry>>,

    /// Thumbnail export settings
    pub thumbnails: ThumbnailConfig,
}

impl Default for QcConfig {
    fn default() -> Self {
        Self {
            buffer_size: DEFAULT_BUFFER_SIZE,
            profiles: builtin_profiles(),
            content_filters: builtin_content_filters(),
            thumbnails: ThumbnailConfig::default(),
        }
    }
}

/// On-disk layout: every section is optional and layered over the defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct QcConfigFile {
    buffer_size: Option<usize>,
    thumbnails: Option<ThumbnailConfig>,
    #[serde(default)]
    profiles: BTreeMap<String, BTreeMap<String, f64>>,
    #[serde(default)]
    content_filters: BTreeMap<String, BTreeMap<String, FilterEntry>>,
}

impl QcConfig {
    /// Loads a TOML configuration file on top of the built-in defaults.
    ///
    /// Profiles and content filters in the file add to the built-ins; an entry
    /// with a built-in name replaces it.
    pub fn from_file(path: &Path) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            CoreError::Config(format!("Failed to read config file {}: {e}", path.display()))
        })?;
        let config = Self::from_toml_str(&content)
            .map_err(|e| CoreError::Config(format!("{}: {e}", path.display())))?;
        log::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Parses TOML content on top of the built-in defaults.
    pub fn from_toml_str(content: &str) -> CoreResult<Self> {
        let file: QcConfigFile =
            toml::from_str(content).map_err(|e| CoreError::Config(e.to_string()))?;

        let mut config = Self::default();
        if let Some(buffer_size) = file.buffer_size {
            config.buffer_size = buffer_size;
        }
        if let Some(thumbnails) = file.thumbnails {
            config.thumbnails = thumbnails;
        }
        config.profiles.extend(file.profiles);
        config.content_filters.extend(file.content_filters);
        config.validate()?;
        Ok(config)
    }

    /// Checks the configuration before any pass uses it.
    pub fn validate(&self) -> CoreResult<()> {
        validate_buffer_size(self.buffer_size)?;
        for name in self.profiles.keys() {
            self.profile(name)?.resolve()?;
        }
        for name in self.content_filters.keys() {
            self.content_filter(name)?.validate()?;
        }
        if self.thumbnails.timeout_secs == 0 {
            return Err(CoreError::Config(
                "thumbnails.timeout_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Looks up a named profile.
    pub fn profile(&self, name: &str) -> CoreResult<Profile> {
        let thresholds = self.profiles.get(name).ok_or_else(|| {
            CoreError::Config(format!(
                "Unknown profile '{name}'. Available profiles: {}",
                self.profiles.keys().cloned().collect::<Vec<_>>().join(", ")
            ))
        })?;
        Ok(Profile::Implicit {
            name: name.to_string(),
            thresholds: thresholds.iter().map(|(t, v)| (t.clone(), *v)).collect(),
        })
    }

    /// Looks up a named content filter.
    pub fn content_filter(&self, name: &str) -> CoreResult<ContentFilterSpec> {
        let entries = self.content_filters.get(name).ok_or_else(|| {
            CoreError::Config(format!(
                "Unknown content filter '{name}'. Available filters: {}",
                self.content_filters.keys().cloned().collect::<Vec<_>>().join(", ")
            ))
        })?;
        Ok(ContentFilterSpec {
            name: name.to_string(),
            checks: entries
                .iter()
                .map(|(tag, entry)| ThresholdCheck::new(tag.clone(), entry.threshold, entry.op))
                .collect(),
        })
    }

    /// Builds an ad hoc profile; every tag must be one the reports carry.
    pub fn tag_check(&self, entries: Vec<ThresholdCheck>) -> CoreResult<Profile> {
        if let Some(unknown) = entries.iter().find(|c| !is_known_tag(&c.tag)) {
            return Err(CoreError::Config(format!(
                "Unknown tag '{}'. Known tags: {}",
                unknown.tag,
                KNOWN_TAGS.join(", ")
            )));
        }
        Ok(Profile::Explicit {
            name: TAG_CHECK_NAME.to_string(),
            entries,
        })
    }
}

/// The window needs a middle frame, so the capacity must be odd.
pub fn validate_buffer_size(size: usize) -> CoreResult<()> {
    if size == 0 || size % 2 == 0 {
        return Err(CoreError::Config(format!(
            "buffer size must be an odd number greater than zero, got {size}"
        )));
    }
    Ok(())
}
