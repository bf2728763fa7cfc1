//! Cooperative cancellation for streaming passes.
//!
//! Every pass polls its `CancelCheck` once per frame. A cancelled pass is not
//! an error: it returns what it has aggregated so far with
//! `PassStatus::Cancelled`.

use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Source of cancellation requests polled by the passes.
pub trait CancelCheck {
    fn is_cancelled(&self) -> bool;
}

impl<F> CancelCheck for F
where
    F: Fn() -> bool,
{
    fn is_cancelled(&self) -> bool {
        self()
    }
}

/// Shared flag; clones observe the same state.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }
}

impl CancelCheck for CancelToken {
    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// A check that never trips.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverCancel;

impl CancelCheck for NeverCancel {
    fn is_cancelled(&self) -> bool {
        false
    }
}

/// How a pass ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PassStatus {
    Completed,
    Cancelled,
}

impl PassStatus {
    pub fn is_cancelled(self) -> bool {
        self == PassStatus::Cancelled
    }
}
