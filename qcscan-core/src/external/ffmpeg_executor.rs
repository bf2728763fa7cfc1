// ============================================================================
// qcscan-core/src/external/ffmpeg_executor.rs
// ============================================================================
//
// FFMPEG EXECUTOR: FFmpeg Process Management and Abstraction
//
// Thumbnail export is the only place the library runs ffmpeg. The traits here
// keep process handling behind a seam so exports can be tested without an
// ffmpeg binary, and so a stuck process can be polled and killed.
//
// KEY COMPONENTS:
// - FfmpegProcess: Trait representing an active FFmpeg process
// - FfmpegSpawner: Trait for creating new FFmpeg processes
// - SidecarSpawner: Concrete implementation using ffmpeg-sidecar

use crate::error::{CoreResult, command_start_error, command_wait_error};
use ffmpeg_sidecar::child::FfmpegChild as SidecarChild;
use ffmpeg_sidecar::command::FfmpegCommand;
use std::process::ExitStatus;
use std::thread;
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Trait representing an active ffmpeg process instance.
pub trait FfmpegProcess {
    /// Returns the exit status if the process has finished, without blocking.
    fn try_wait(&mut self) -> CoreResult<Option<ExitStatus>>;

    /// Waits for the command to complete and returns its exit status.
    fn wait(&mut self) -> CoreResult<ExitStatus>;

    /// Terminates the process.
    fn kill(&mut self) -> CoreResult<()>;
}

/// Trait representing something that can spawn an FfmpegProcess.
pub trait FfmpegSpawner {
    type Process: FfmpegProcess;
    /// Spawns the ffmpeg command, consuming the command object.
    fn spawn(&self, cmd: FfmpegCommand) -> CoreResult<Self::Process>;
}

/// Polls `process` until it exits or `timeout` elapses.
///
/// Returns `Ok(None)` after killing a process that ran past the timeout.
pub fn wait_with_timeout<P: FfmpegProcess>(
    process: &mut P,
    timeout: Duration,
) -> CoreResult<Option<ExitStatus>> {
    let started = Instant::now();
    loop {
        if let Some(status) = process.try_wait()? {
            return Ok(Some(status));
        }
        if started.elapsed() >= timeout {
            log::debug!("ffmpeg still running after {timeout:?}, killing it");
            process.kill()?;
            // Reap the killed child; its status carries no information
            if let Err(e) = process.wait() {
                log::debug!("Failed to reap killed ffmpeg process: {e}");
            }
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL.min(timeout.saturating_sub(started.elapsed())));
    }
}

// --- Concrete Implementation using ffmpeg-sidecar ---

/// Wrapper around `ffmpeg_sidecar::child::FfmpegChild` implementing `FfmpegProcess`.
pub struct SidecarProcess(SidecarChild);

impl FfmpegProcess for SidecarProcess {
    fn try_wait(&mut self) -> CoreResult<Option<ExitStatus>> {
        self.0
            .as_inner_mut()
            .try_wait()
            .map_err(|e| command_wait_error("ffmpeg (sidecar)", e))
    }

    fn wait(&mut self) -> CoreResult<ExitStatus> {
        self.0
            .wait()
            .map_err(|e| command_wait_error("ffmpeg (sidecar)", e))
    }

    fn kill(&mut self) -> CoreResult<()> {
        self.0
            .kill()
            .map_err(|e| command_wait_error("ffmpeg (sidecar kill)", e))
    }
}

/// Concrete implementation of `FfmpegSpawner` using `ffmpeg-sidecar`.
#[derive(Debug, Clone, Default)]
pub struct SidecarSpawner;

impl FfmpegSpawner for SidecarSpawner {
    type Process = SidecarProcess;

    fn spawn(&self, mut cmd: FfmpegCommand) -> CoreResult<Self::Process> {
        cmd.spawn()
            .map(SidecarProcess)
            .map_err(|e| command_start_error("ffmpeg (sidecar)", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::os::unix::process::ExitStatusExt;

    struct SlowProcess {
        polls_until_exit: Option<u32>,
        polls: u32,
        killed: Cell<bool>,
    }

    impl FfmpegProcess for SlowProcess {
        fn try_wait(&mut self) -> CoreResult<Option<ExitStatus>> {
            self.polls += 1;
            Ok(match self.polls_until_exit {
                Some(n) if self.polls >= n => Some(ExitStatus::from_raw(0)),
                _ => None,
            })
        }

        fn wait(&mut self) -> CoreResult<ExitStatus> {
            Ok(ExitStatus::from_raw(9))
        }

        fn kill(&mut self) -> CoreResult<()> {
            self.killed.set(true);
            Ok(())
        }
    }

    #[test]
    fn test_wait_returns_status_of_finished_process() {
        let mut process = SlowProcess {
            polls_until_exit: Some(2),
            polls: 0,
            killed: Cell::new(false),
        };
        let status = wait_with_timeout(&mut process, Duration::from_secs(5)).unwrap();
        assert!(status.is_some_and(|s| s.success()));
        assert!(!process.killed.get());
    }

    #[test]
    fn test_wait_kills_process_past_timeout() {
        let mut process = SlowProcess {
            polls_until_exit: None,
            polls: 0,
            killed: Cell::new(false),
        };
        let status = wait_with_timeout(&mut process, Duration::from_millis(120)).unwrap();
        assert!(status.is_none());
        assert!(process.killed.get());
    }
}
