//! Download tasks and the shared crawl state.

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use crate::url_model::{GroupId, RemotePath};

/// One file to fetch. Identity is the destination path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DownloadTask {
    /// Path relative to the download endpoint.
    pub remote: RemotePath,
    /// Path relative to the output root.
    pub destination: RemotePath,
    /// Group whose crawl discovered this file.
    pub group: GroupId,
}

impl DownloadTask {
    /// A task mirroring the remote layout locally.
    pub fn new(remote: RemotePath, group: GroupId) -> Self {
        Self {
            destination: remote.clone(),
            remote,
            group,
        }
    }

    /// Key used in the completed record and the pending queue.
    pub fn key(&self) -> String {
        self.destination.as_rel()
    }

    pub fn local_path(&self, output_root: &Path) -> PathBuf {
        self.destination.local_path(output_root)
    }

    /// Package-definition documents are scanned for dependencies after download.
    pub fn is_manifest(&self) -> bool {
        self.remote
            .last()
            .is_some_and(|t| t.as_str().ends_with(".pom"))
    }

    /// Group a manifest belongs to by its position in the tree, falling back
    /// to the crawled group for shallow layouts.
    pub fn manifest_group(&self) -> GroupId {
        GroupId::owning(&self.remote).unwrap_or_else(|| self.group.clone())
    }
}

/// A group waiting to be crawled, with its distance from the seed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupEntry {
    pub group: GroupId,
    pub depth: u32,
}

/// Outcome of offering a task to [`CrawlState::enqueue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Enqueue {
    Queued,
    AlreadyPending,
    AlreadyCompleted,
}

/// Everything a run mutates: processed groups, pending tasks, completed
/// destinations. Shared behind a single mutex; the pending queue and the
/// completed set never overlap.
#[derive(Debug, Default)]
pub struct CrawlState {
    processed_groups: HashSet<GroupId>,
    pending: BTreeMap<String, DownloadTask>,
    completed: HashSet<String>,
}

impl CrawlState {
    pub fn with_completed(completed: HashSet<String>) -> Self {
        Self {
            completed,
            ..Self::default()
        }
    }

    /// Marks a group processed. Returns false if it already was.
    pub fn mark_processed(&mut self, group: &GroupId) -> bool {
        self.processed_groups.insert(group.clone())
    }

    /// True if `group` or any enclosing group was already crawled this run;
    /// a group crawl descends into its subgroups.
    pub fn is_covered(&self, group: &GroupId) -> bool {
        group.ancestors().any(|g| self.processed_groups.contains(&g))
    }

    pub fn is_completed(&self, key: &str) -> bool {
        self.completed.contains(key)
    }

    pub fn enqueue(&mut self, task: DownloadTask) -> Enqueue {
        let key = task.key();
        if self.completed.contains(&key) {
            return Enqueue::AlreadyCompleted;
        }
        if self.pending.contains_key(&key) {
            return Enqueue::AlreadyPending;
        }
        self.pending.insert(key, task);
        Enqueue::Queued
    }

    /// Moves `key` from the pending queue into the completed set.
    pub fn complete(&mut self, key: &str) {
        self.pending.remove(key);
        self.completed.insert(key.to_string());
    }

    pub fn pending_tasks(&self) -> Vec<DownloadTask> {
        self.pending.values().cloned().collect()
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn completed_len(&self) -> usize {
        self.completed.len()
    }

}
