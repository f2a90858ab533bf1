//! Download scheduler.
//!
//! A fixed pool of OS threads pulls [`DownloadTask`]s from a channel and
//! streams them to disk through the mirror router. The shared
//! [`CrawlState`] is locked only to check or update the pending queue and
//! the completed set, never across a transfer. A completion is recorded on
//! disk before it is visible in memory.

mod dry_run;
mod guard;
mod worker;

pub use dry_run::DryRunSink;

use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::thread::JoinHandle;

use crossbeam_channel::{self as channel, Sender};

use crate::control::CancelToken;
use crate::mirror::{EndpointSet, MirrorRouter};
use crate::recursion::Discovery;
use crate::state::{self, CrawlState, DownloadTask, Enqueue, StateStore};

/// Destination for tasks produced by the crawler.
pub trait TaskSink {
    fn submit(&mut self, task: DownloadTask);

    /// Blocks until everything submitted so far has been handled.
    fn settle(&mut self) {}
}

impl TaskSink for Vec<DownloadTask> {
    fn submit(&mut self, task: DownloadTask) {
        self.push(task);
    }
}

/// Counters for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub downloaded: u64,
    /// Already in the completed set when offered or picked up.
    pub skipped: u64,
    /// Left pending after both fetch attempts failed.
    pub failed: u64,
    /// Left pending because cancellation was requested first.
    pub declined: u64,
    pub bytes: u64,
}

#[derive(Debug, Default)]
struct Counters {
    downloaded: AtomicU64,
    skipped: AtomicU64,
    failed: AtomicU64,
    declined: AtomicU64,
    bytes: AtomicU64,
}

impl Counters {
    fn snapshot(&self) -> RunSummary {
        RunSummary {
            downloaded: self.downloaded.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            declined: self.declined.load(Ordering::Relaxed),
            bytes: self.bytes.load(Ordering::Relaxed),
        }
    }
}

/// Inputs for [`DownloadScheduler::start`].
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub workers: usize,
    pub output_root: PathBuf,
    /// Download endpoints; never the browse set.
    pub endpoints: EndpointSet,
    pub router: MirrorRouter,
    pub cancel: CancelToken,
}

/// State shared between the scheduler handle and its workers.
struct Shared {
    config: SchedulerConfig,
    state: Arc<Mutex<CrawlState>>,
    store: Arc<StateStore>,
    discoveries: Sender<Discovery>,
    counters: Counters,
    outstanding: Mutex<usize>,
    idle: Condvar,
}

impl Shared {
    fn begin_one(&self) {
        *self.outstanding.lock().unwrap_or_else(PoisonError::into_inner) += 1;
    }

    fn finish_one(&self) {
        let mut n = self.outstanding.lock().unwrap_or_else(PoisonError::into_inner);
        *n = n.saturating_sub(1);
        if *n == 0 {
            self.idle.notify_all();
        }
    }
}

/// Bounded worker pool executing each destination at most once per run.
pub struct DownloadScheduler {
    shared: Arc<Shared>,
    tx: Option<Sender<DownloadTask>>,
    handles: Vec<JoinHandle<()>>,
}

impl DownloadScheduler {
    /// Spawns `config.workers` threads (at least one). Dependencies found in
    /// downloaded manifests are sent on `discoveries`.
    pub fn start(
        config: SchedulerConfig,
        state: Arc<Mutex<CrawlState>>,
        store: Arc<StateStore>,
        discoveries: Sender<Discovery>,
    ) -> Self {
        let workers = config.workers.max(1);
        let (tx, rx) = channel::unbounded::<DownloadTask>();
        let shared = Arc::new(Shared {
            config,
            state,
            store,
            discoveries,
            counters: Counters::default(),
            outstanding: Mutex::new(0),
            idle: Condvar::new(),
        });

        let mut handles = Vec::with_capacity(workers);
        for id in 0..workers {
            let rx = rx.clone();
            let shared = Arc::clone(&shared);
            let spawned = std::thread::Builder::new()
                .name(format!("mvnget-dl-{id}"))
                .spawn(move || worker::worker_loop(&shared, &rx));
            match spawned {
                Ok(h) => handles.push(h),
                Err(e) => tracing::error!(worker = id, error = %e, "failed to spawn download worker"),
            }
        }
        tracing::debug!(workers = handles.len(), "download scheduler started");

        Self {
            shared,
            tx: Some(tx),
            handles,
        }
    }

    /// Offers a task. Returns how the shared state received it; only
    /// [`Enqueue::Queued`] tasks reach a worker.
    ///
    /// A manifest that is already complete is scanned from disk so that a
    /// resumed or repeated run still expands its dependencies.
    pub fn submit(&self, task: DownloadTask) -> Enqueue {
        let outcome = state::lock(&self.shared.state).enqueue(task.clone());
        match outcome {
            Enqueue::Queued => {
                self.shared.begin_one();
                let sent = self.tx.as_ref().is_some_and(|tx| tx.send(task).is_ok());
                if !sent {
                    self.shared.finish_one();
                }
            }
            Enqueue::AlreadyCompleted => {
                self.shared.counters.skipped.fetch_add(1, Ordering::Relaxed);
                if task.is_manifest() {
                    let path = task.local_path(&self.shared.config.output_root);
                    worker::scan_manifest(&self.shared, &task, &path);
                }
            }
            Enqueue::AlreadyPending => {}
        }
        outcome
    }

    /// Blocks until every queued task has been downloaded, failed, or
    /// declined. Discoveries from those tasks are in the channel on return.
    pub fn wait_idle(&self) {
        let mut n = self
            .shared
            .outstanding
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        while *n > 0 {
            n = self
                .shared
                .idle
                .wait(n)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    pub fn summary(&self) -> RunSummary {
        self.shared.counters.snapshot()
    }

    /// Closes the queue, joins every worker, and returns the final counters.
    pub fn shutdown(mut self) -> RunSummary {
        self.tx = None;
        for h in self.handles.drain(..) {
            if h.join().is_err() {
                tracing::error!("download worker panicked");
            }
        }
        self.summary()
    }
}

impl TaskSink for DownloadScheduler {
    fn submit(&mut self, task: DownloadTask) {
        DownloadScheduler::submit(self, task);
    }

    fn settle(&mut self) {
        self.wait_idle();
    }
}

impl Drop for DownloadScheduler {
    fn drop(&mut self) {
        self.tx = None;
        for h in self.handles.drain(..) {
            let _ = h.join();
        }
    }
}
