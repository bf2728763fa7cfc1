// ============================================================================
// qcscan-core/src/external/mod.rs
// ============================================================================
//
// EXTERNAL TOOLS: Interactions with External CLI Tools
//
// The analysis engine reads reports on its own. ffmpeg is only needed to
// export thumbnails of failing frames, and is reached through the traits in
// `ffmpeg_executor` so that tests can substitute it.

use crate::error::{CoreError, CoreResult};
use std::io;
use std::process::{Command, Stdio};

/// Contains traits and implementations for executing ffmpeg commands
pub mod ffmpeg_executor;

/// Thumbnail requests, the exporter seam and the cooldown sampler
pub mod thumbnail;

pub use ffmpeg_executor::{FfmpegProcess, FfmpegSpawner, SidecarProcess, SidecarSpawner};
pub use thumbnail::{
    FfmpegThumbnailExporter, ThumbnailContext, ThumbnailExporter, ThumbnailRequest,
    ThumbnailSampler, ThumbnailStats, thumbnail_file_name,
};

/// Checks that `cmd_name -version` can be executed.
///
/// Returns `DependencyUnavailable` when the command is not installed.
pub fn check_dependency(cmd_name: &str) -> CoreResult<()> {
    let result = Command::new(cmd_name)
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();

    match result {
        Ok(_) => {
            log::debug!("Found dependency: {}", cmd_name);
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            log::warn!("Dependency '{}' not found.", cmd_name);
            Err(CoreError::DependencyUnavailable(format!(
                "'{cmd_name}' is required for thumbnail export but was not found"
            )))
        }
        Err(e) => {
            log::error!("Failed to start dependency check command '{}': {}", cmd_name, e);
            Err(CoreError::CommandStart(cmd_name.to_string(), e))
        }
    }
}

/// Fails with `DependencyUnavailable` unless ffmpeg can be run.
pub fn ensure_ffmpeg_available() -> CoreResult<()> {
    check_dependency("ffmpeg")
}
