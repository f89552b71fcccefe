//! Progress reporting for triangle fetches and per-force runs.
//!
//! The pipeline only talks to [`ProgressCallback`]; the CLI plugs in
//! `indicatif` bars, tests and library callers use [`NullProgress`].

use std::sync::Arc;

/// Receives progress updates from long-running pipeline stages.
pub trait ProgressCallback: Send + Sync {
    /// Sets the number of units expected (triangles of an area, forces of
    /// a run).
    fn set_total(&self, total: u64);

    /// Advances progress by `delta` units.
    fn inc(&self, delta: u64);

    /// Replaces the message shown next to the indicator.
    fn set_message(&self, msg: String);

    /// Marks the stage as complete, leaving `msg` visible.
    fn finish(&self, msg: String);

    /// Marks the stage as complete and hides the indicator.
    fn finish_and_clear(&self);
}

/// Discards every update.
pub struct NullProgress;

impl ProgressCallback for NullProgress {
    fn set_total(&self, _total: u64) {}
    fn inc(&self, _delta: u64) {}
    fn set_message(&self, _msg: String) {}
    fn finish(&self, _msg: String) {}
    fn finish_and_clear(&self) {}
}

/// Returns a shared [`NullProgress`].
#[must_use]
pub fn null_progress() -> Arc<dyn ProgressCallback> {
    Arc::new(NullProgress)
}
