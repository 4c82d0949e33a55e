//! Progress reporting hooks for a pipeline run.

use crate::fetch::PayloadOrigin;
use crate::ids::RegionId;
use std::path::Path;

/// Receives progress events from a run. All methods default to no-ops.
///
/// The sink is handed to [`crate::pipeline::run`] explicitly; `finish` is
/// called exactly once when the run ends, successfully or not.
pub trait ProgressSink: Send + Sync {
    fn fetch_started(&self, _total: usize) {}

    fn region_fetched(&self, _id: &RegionId, _origin: PayloadOrigin, _done: usize, _total: usize) {}

    fn composing(&self, _records: usize) {}

    fn written(&self, _path: &Path, _bytes: u64) {}

    fn finish(&self) {}
}

/// Sink that discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullProgress;

impl ProgressSink for NullProgress {}
