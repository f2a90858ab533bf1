//! Task sink for `--dry-run`: enumerate, never write.

use std::collections::HashSet;

use crossbeam_channel::Sender;

use super::worker;
use super::TaskSink;
use crate::mirror::{EndpointSet, MirrorRouter};
use crate::recursion::Discovery;
use crate::state::DownloadTask;

/// Collects every distinct task in discovery order. Manifests are fetched
/// as text so the enumeration expands exactly like a real run.
pub struct DryRunSink<'a> {
    router: &'a MirrorRouter,
    endpoints: &'a EndpointSet,
    discoveries: Sender<Discovery>,
    seen: HashSet<String>,
    tasks: Vec<DownloadTask>,
}

impl<'a> DryRunSink<'a> {
    pub fn new(router: &'a MirrorRouter, endpoints: &'a EndpointSet, discoveries: Sender<Discovery>) -> Self {
        Self {
            router,
            endpoints,
            discoveries,
            seen: HashSet::new(),
            tasks: Vec::new(),
        }
    }

    pub fn into_tasks(self) -> Vec<DownloadTask> {
        self.tasks
    }
}

impl TaskSink for DryRunSink<'_> {
    fn submit(&mut self, task: DownloadTask) {
        if !self.seen.insert(task.key()) {
            return;
        }
        if task.is_manifest() {
            if let Ok(text) = self.router.fetch_text(self.endpoints, &task.remote.as_rel()) {
                worker::report(&self.discoveries, &task, &text);
            }
        }
        self.tasks.push(task);
    }
}
