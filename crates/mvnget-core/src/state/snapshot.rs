//! On-disk form of the pending snapshot (`pending.json`).
//!
//! Records hold plain strings; everything is re-validated through the path
//! validator when a snapshot is loaded. Groups are stored in slash form so
//! segments containing dots survive the round trip.

use serde::{Deserialize, Serialize};

use super::types::{DownloadTask, GroupEntry};
use crate::url_model::{GroupId, Rejected, RemotePath};

/// Current snapshot format version.
pub const SNAPSHOT_VERSION: u32 = 2;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingSnapshot {
    pub version: u32,
    /// Seed group of the interrupted run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<String>,
    pub tasks: Vec<PendingTaskRecord>,
    /// Groups discovered but not yet crawled.
    #[serde(default)]
    pub frontier: Vec<FrontierRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingTaskRecord {
    pub remote: String,
    pub destination: String,
    pub group: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrontierRecord {
    pub group: String,
    pub depth: u32,
}

impl PendingSnapshot {
    pub fn new(seed: Option<&GroupId>, tasks: &[DownloadTask], frontier: &[GroupEntry]) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            seed: seed.map(GroupId::to_string),
            tasks: tasks.iter().map(PendingTaskRecord::from).collect(),
            frontier: frontier.iter().map(FrontierRecord::from).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty() && self.frontier.is_empty()
    }
}

impl From<&DownloadTask> for PendingTaskRecord {
    fn from(t: &DownloadTask) -> Self {
        Self {
            remote: t.remote.as_rel(),
            destination: t.destination.as_rel(),
            group: t.group.path().as_rel(),
        }
    }
}

impl TryFrom<&PendingTaskRecord> for DownloadTask {
    type Error = Rejected;

    fn try_from(r: &PendingTaskRecord) -> Result<Self, Self::Error> {
        Ok(DownloadTask {
            remote: RemotePath::parse(&r.remote)?,
            destination: RemotePath::parse(&r.destination)?,
            group: GroupId::parse_path(&r.group)?,
        })
    }
}

impl From<&GroupEntry> for FrontierRecord {
    fn from(e: &GroupEntry) -> Self {
        Self {
            group: e.group.path().as_rel(),
            depth: e.depth,
        }
    }
}

impl TryFrom<&FrontierRecord> for GroupEntry {
    type Error = Rejected;

    fn try_from(r: &FrontierRecord) -> Result<Self, Self::Error> {
        Ok(GroupEntry {
            group: GroupId::parse_path(&r.group)?,
            depth: r.depth,
        })
    }
}
