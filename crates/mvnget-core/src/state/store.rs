//! Crash-safe persistence of completed downloads and the pending snapshot.
//!
//! Layout under the output root:
//! - `.mvnget/completed.txt`: append-only, one relative destination per line.
//! - `.mvnget/pending.json`: written once on interruption, removed after a
//!   run that ends with nothing pending.

use std::collections::HashSet;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use super::snapshot::{PendingSnapshot, SNAPSHOT_VERSION};
use super::types::{CrawlState, DownloadTask, GroupEntry};
use crate::url_model::RemotePath;

/// State directory name under the output root.
pub const STATE_DIR: &str = ".mvnget";
pub const COMPLETED_FILE: &str = "completed.txt";
pub const PENDING_FILE: &str = "pending.json";

/// Persisted state is unreadable or untrustworthy. Fatal at startup.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("state I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(
        "corrupt completed record {} (line {line}): {reason}; repair or delete the file to continue",
        path.display()
    )]
    CorruptRecord {
        path: PathBuf,
        line: usize,
        reason: String,
    },
    #[error(
        "corrupt pending snapshot {}: {reason}; delete it or rerun with --fresh to ignore it",
        path.display()
    )]
    CorruptSnapshot { path: PathBuf, reason: String },
}

fn io_err(path: &Path) -> impl FnOnce(io::Error) -> StateError + '_ {
    move |source| StateError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// What a run starts from.
#[derive(Debug, Default)]
pub struct LoadedState {
    /// Completed set from the record; nothing pending yet.
    pub state: CrawlState,
    /// Snapshot tasks not already completed, in snapshot order.
    pub resumed_tasks: Vec<DownloadTask>,
    /// Snapshot frontier groups.
    pub frontier: Vec<GroupEntry>,
    /// A snapshot was found and accepted.
    pub resumed: bool,
    /// A snapshot was found but resume was declined.
    pub snapshot_ignored: bool,
}

/// Read-only view for `status`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateSummary {
    pub completed: usize,
    pub pending_tasks: usize,
    pub frontier: Vec<GroupEntry>,
    pub seed: Option<String>,
    pub has_snapshot: bool,
}

/// Owner of the state files for one output root.
pub struct StateStore {
    dir: PathBuf,
    completed_log: Mutex<Option<File>>,
    flushed: AtomicBool,
}

impl StateStore {
    /// Does no I/O; files are created on first write.
    pub fn new(output_root: &Path) -> Self {
        Self {
            dir: output_root.join(STATE_DIR),
            completed_log: Mutex::new(None),
            flushed: AtomicBool::new(false),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn completed_path(&self) -> PathBuf {
        self.dir.join(COMPLETED_FILE)
    }

    pub fn pending_path(&self) -> PathBuf {
        self.dir.join(PENDING_FILE)
    }

    pub fn has_snapshot(&self) -> bool {
        self.pending_path().exists()
    }

    /// Reads the completed record and, when `accept_resume` is set, the
    /// pending snapshot. Any unreadable or invalid entry fails the load.
    pub fn load(&self, accept_resume: bool) -> Result<LoadedState, StateError> {
        let completed = self.read_completed()?;
        let mut loaded = LoadedState {
            state: CrawlState::with_completed(completed),
            ..LoadedState::default()
        };

        if !self.has_snapshot() {
            return Ok(loaded);
        }
        if !accept_resume {
            tracing::info!(path = %self.pending_path().display(), "pending snapshot present, resume declined");
            loaded.snapshot_ignored = true;
            return Ok(loaded);
        }

        let (_, tasks, frontier) = self.read_snapshot()?;
        loaded.resumed_tasks = tasks
            .into_iter()
            .filter(|t| !loaded.state.is_completed(&t.key()))
            .collect();
        loaded.frontier = frontier;
        loaded.resumed = true;
        tracing::info!(
            tasks = loaded.resumed_tasks.len(),
            frontier = loaded.frontier.len(),
            "resuming from pending snapshot"
        );
        Ok(loaded)
    }

    fn read_completed(&self) -> Result<HashSet<String>, StateError> {
        let path = self.completed_path();
        let data = match fs::read(&path) {
            Ok(d) => d,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(HashSet::new()),
            Err(e) => return Err(io_err(&path)(e)),
        };
        let text = String::from_utf8(data).map_err(|e| StateError::CorruptRecord {
            path: path.clone(),
            line: 0,
            reason: format!("not UTF-8: {e}"),
        })?;

        // A final line without its newline is a torn append. It is ignored
        // here and cut off before the next append.
        let body = match text.rfind('\n') {
            Some(end) => &text[..=end],
            None => "",
        };
        if body.len() < text.len() {
            tracing::warn!(
                path = %path.display(),
                partial = %&text[body.len()..],
                "ignoring incomplete last line of completed record"
            );
        }

        let mut completed = HashSet::new();
        for (i, line) in body.lines().enumerate() {
            let line = line.trim_end_matches('\r');
            if line.is_empty() {
                continue;
            }
            let parsed = RemotePath::parse(line).map_err(|e| StateError::CorruptRecord {
                path: path.clone(),
                line: i + 1,
                reason: e.to_string(),
            })?;
            if parsed.as_rel() != line {
                return Err(StateError::CorruptRecord {
                    path: path.clone(),
                    line: i + 1,
                    reason: format!("non-canonical path {line:?}"),
                });
            }
            completed.insert(parsed.as_rel());
        }
        Ok(completed)
    }

    /// Reads and re-validates the snapshot: every task and frontier group.
    fn read_snapshot(&self) -> Result<(PendingSnapshot, Vec<DownloadTask>, Vec<GroupEntry>), StateError> {
        let path = self.pending_path();
        let corrupt = |reason: String| StateError::CorruptSnapshot {
            path: path.clone(),
            reason,
        };
        let bytes = fs::read(&path).map_err(io_err(&path))?;
        let snapshot: PendingSnapshot = serde_json::from_slice(&bytes).map_err(|e| corrupt(e.to_string()))?;
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(corrupt(format!("unsupported snapshot version {}", snapshot.version)));
        }
        let tasks = snapshot
            .tasks
            .iter()
            .map(|r| DownloadTask::try_from(r).map_err(|e| corrupt(format!("task {:?}: {e}", r.destination))))
            .collect::<Result<Vec<_>, _>>()?;
        let frontier = snapshot
            .frontier
            .iter()
            .map(|r| GroupEntry::try_from(r).map_err(|e| corrupt(format!("group {:?}: {e}", r.group))))
            .collect::<Result<Vec<_>, _>>()?;
        Ok((snapshot, tasks, frontier))
    }

    /// Opens the completed record for appending, first cutting off a torn
    /// final line so the next entry starts on a line of its own.
    fn open_completed_log(&self, path: &Path) -> Result<File, StateError> {
        fs::create_dir_all(&self.dir).map_err(io_err(&self.dir))?;
        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(path)
            .map_err(io_err(path))?;
        let mut data = Vec::new();
        file.read_to_end(&mut data).map_err(io_err(path))?;
        let keep = data.iter().rposition(|&b| b == b'\n').map_or(0, |i| i + 1);
        if keep < data.len() {
            tracing::warn!(path = %path.display(), bytes = data.len() - keep, "truncating incomplete record line");
            file.set_len(keep as u64).map_err(io_err(path))?;
        }
        Ok(file)
    }

    /// Appends one completed destination and syncs it to disk before returning.
    pub fn record_completion(&self, key: &str) -> Result<(), StateError> {
        let path = self.completed_path();
        let mut guard = self
            .completed_log
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if guard.is_none() {
            *guard = Some(self.open_completed_log(&path)?);
        }
        if let Some(file) = guard.as_mut() {
            file.write_all(format!("{key}\n").as_bytes()).map_err(io_err(&path))?;
            file.flush().map_err(io_err(&path))?;
            file.sync_data().map_err(io_err(&path))?;
        }
        Ok(())
    }

    /// Writes the pending snapshot. Only the first call per store writes;
    /// later calls are no-ops. Returns whether this call wrote the file.
    pub fn flush_pending(&self, snapshot: &PendingSnapshot) -> Result<bool, StateError> {
        if self.flushed.swap(true, Ordering::SeqCst) {
            tracing::debug!("pending snapshot already flushed for this run");
            return Ok(false);
        }
        fs::create_dir_all(&self.dir).map_err(io_err(&self.dir))?;
        let path = self.pending_path();
        let tmp = self.dir.join(format!("{PENDING_FILE}.tmp"));
        let json = serde_json::to_vec_pretty(snapshot).map_err(|e| StateError::Io {
            path: tmp.clone(),
            source: io::Error::other(e),
        })?;
        {
            let mut f = File::create(&tmp).map_err(io_err(&tmp))?;
            f.write_all(&json).map_err(io_err(&tmp))?;
            f.sync_all().map_err(io_err(&tmp))?;
        }
        fs::rename(&tmp, &path).map_err(io_err(&path))?;
        tracing::info!(
            path = %path.display(),
            tasks = snapshot.tasks.len(),
            frontier = snapshot.frontier.len(),
            "saved pending snapshot"
        );
        Ok(true)
    }

    /// Removes the pending snapshot, if any.
    pub fn clear(&self) -> Result<(), StateError> {
        let path = self.pending_path();
        match fs::remove_file(&path) {
            Ok(()) => {
                tracing::info!(path = %path.display(), "removed pending snapshot");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_err(&path)(e)),
        }
    }

    /// Counts for `status`, without starting a run.
    pub fn summary(&self) -> Result<StateSummary, StateError> {
        let completed = self.read_completed()?;
        if !self.has_snapshot() {
            return Ok(StateSummary {
                completed: completed.len(),
                pending_tasks: 0,
                frontier: Vec::new(),
                seed: None,
                has_snapshot: false,
            });
        }
        let (snapshot, tasks, frontier) = self.read_snapshot()?;
        let pending_tasks = tasks.iter().filter(|t| !completed.contains(&t.key())).count();
        Ok(StateSummary {
            completed: completed.len(),
            pending_tasks,
            frontier,
            seed: snapshot.seed,
            has_snapshot: true,
        })
    }
}

#[cfg(test)]
#[path = "tests.rs"]
mod tests;
