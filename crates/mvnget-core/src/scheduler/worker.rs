//! Worker thread body: one task at a time until the queue closes.

use std::path::Path;
use std::sync::atomic::Ordering;

use crossbeam_channel::Receiver;

use super::guard::OutstandingGuard;
use super::Shared;
use crate::manifest;
use crate::recursion::Discovery;
use crate::state::{self, DownloadTask};

pub(super) fn worker_loop(shared: &Shared, rx: &Receiver<DownloadTask>) {
    for task in rx.iter() {
        let _guard = OutstandingGuard { shared };
        if shared.config.cancel.is_cancelled() {
            shared.counters.declined.fetch_add(1, Ordering::Relaxed);
            continue;
        }
        run_task(shared, &task);
    }
}

fn run_task(shared: &Shared, task: &DownloadTask) {
    let key = task.key();
    if state::lock(&shared.state).is_completed(&key) {
        shared.counters.skipped.fetch_add(1, Ordering::Relaxed);
        return;
    }

    let dest = task.local_path(&shared.config.output_root);
    let remote = task.remote.as_rel();
    let bytes = match shared
        .config
        .router
        .fetch_to_file(&shared.config.endpoints, &remote, &dest)
    {
        Ok(bytes) => bytes,
        Err(_) => {
            // Router already warned; the task stays pending.
            shared.counters.failed.fetch_add(1, Ordering::Relaxed);
            return;
        }
    };

    if let Err(e) = shared.store.record_completion(&key) {
        tracing::error!(path = %key, error = %e, "could not record completion, leaving task pending");
        shared.counters.failed.fetch_add(1, Ordering::Relaxed);
        return;
    }
    state::lock(&shared.state).complete(&key);
    shared.counters.downloaded.fetch_add(1, Ordering::Relaxed);
    shared.counters.bytes.fetch_add(bytes, Ordering::Relaxed);
    tracing::debug!(path = %key, bytes, "downloaded");

    if task.is_manifest() {
        scan_manifest(shared, task, &dest);
    }
}

/// Extracts dependency groups from a manifest on disk and reports them.
pub(super) fn scan_manifest(shared: &Shared, task: &DownloadTask, path: &Path) {
    let text = match std::fs::read_to_string(path) {
        Ok(t) => t,
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "manifest not readable, skipping dependency scan");
            return;
        }
    };
    report(&shared.discoveries, task, &text);
}

/// Sends the dependencies found in `text` to the recursion controller.
pub(super) fn report(tx: &crossbeam_channel::Sender<Discovery>, task: &DownloadTask, text: &str) {
    let groups = manifest::extract_dependencies(text, &task.manifest_group());
    if groups.is_empty() {
        return;
    }
    tracing::debug!(manifest = %task.key(), found = groups.len(), "manifest dependencies");
    let discovery = Discovery {
        origin: task.group.clone(),
        groups,
    };
    if tx.send(discovery).is_err() {
        tracing::debug!("recursion controller gone, dropping discovery");
    }
}
