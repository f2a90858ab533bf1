//! Run state: the shared in-memory queue and its on-disk record.

mod snapshot;
mod store;
mod types;

pub use snapshot::{FrontierRecord, PendingSnapshot, PendingTaskRecord, SNAPSHOT_VERSION};
pub use store::{LoadedState, StateError, StateStore, StateSummary, COMPLETED_FILE, PENDING_FILE, STATE_DIR};
pub use types::{CrawlState, DownloadTask, Enqueue, GroupEntry};

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Locks the shared crawl state, ignoring poisoning: every mutation is a
/// single set or map operation.
pub(crate) fn lock(state: &Mutex<CrawlState>) -> MutexGuard<'_, CrawlState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}
