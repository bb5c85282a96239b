//! Progress reporting for multi-file downloads.
//!
//! Fetchers report through [`ProgressCallback`] without knowing how (or
//! whether) progress is rendered. The CLI plugs in `indicatif` bars; the
//! server and tests use [`null_progress`].

use std::sync::Arc;

/// Observer for snapshot downloads.
pub trait ProgressCallback: Send + Sync {
    /// Called once the number of files to download is known.
    fn set_total(&self, total: u64);

    /// Records that `delta` more files were processed.
    fn inc(&self, delta: u64);

    /// Describes the file currently being downloaded.
    fn set_message(&self, msg: String);

    /// Called after the last file with a closing summary.
    fn finish(&self, msg: String);
}

/// Discards every update.
pub struct NullProgress;

impl ProgressCallback for NullProgress {
    fn set_total(&self, _total: u64) {}
    fn inc(&self, _delta: u64) {}
    fn set_message(&self, _msg: String) {}
    fn finish(&self, _msg: String) {}
}

/// A [`NullProgress`] ready to hand to a fetcher.
#[must_use]
pub fn null_progress() -> Arc<dyn ProgressCallback> {
    Arc::new(NullProgress)
}
