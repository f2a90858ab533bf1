//! RAII guard that retires a queued task when dropped.

use super::Shared;

/// Decrements the outstanding-task count when dropped, including when the
/// worker unwinds, so `wait_idle` cannot hang on a panicked task.
pub(super) struct OutstandingGuard<'a> {
    pub(super) shared: &'a Shared,
}

impl Drop for OutstandingGuard<'_> {
    fn drop(&mut self) {
        self.shared.finish_one();
    }
}
