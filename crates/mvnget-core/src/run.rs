//! One crawl from a seed group: load state, crawl and download, then either
//! clear or snapshot the pending work.

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use crate::control::CancelToken;
use crate::crawler::{ExclusionRules, GroupCrawler};
use crate::mirror::{EndpointSet, MirrorRouter, Timeouts};
use crate::recursion::{RecursionController, RecursionOutcome};
use crate::scheduler::{DownloadScheduler, DryRunSink, RunSummary, SchedulerConfig};
use crate::state::{self, CrawlState, DownloadTask, PendingSnapshot, StateStore};
use crate::url_model::GroupId;

/// Everything the core needs for a run, resolved by the CLI from config
/// file and flags.
#[derive(Debug, Clone)]
pub struct CrawlConfig {
    pub output_root: PathBuf,
    pub workers: usize,
    pub max_depth: u32,
    pub exclude: Vec<String>,
    pub allowed_suffixes: Vec<String>,
    pub browse: EndpointSet,
    pub download: EndpointSet,
    pub timeouts: Timeouts,
    /// Accept a pending snapshot left by an interrupted run.
    pub resume: bool,
    /// Enumerate tasks without downloading or touching state files.
    pub dry_run: bool,
    pub cancel: CancelToken,
}

/// What a run did and what it left behind.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub crawl: RecursionOutcome,
    pub downloads: RunSummary,
    /// A pending snapshot was accepted at startup.
    pub resumed: bool,
    pub cancelled: bool,
    /// Tasks still pending when the run ended.
    pub pending: usize,
    /// Groups queued but not crawled when the run ended.
    pub frontier: usize,
    /// A pending snapshot was written by this run.
    pub snapshot_written: bool,
    /// Every task enumerated, in discovery order (dry run only).
    pub planned: Vec<DownloadTask>,
}

/// Runs a full crawl from `seed`. State corruption is fatal before any
/// network access; individual fetch failures are not.
pub fn run_crawl(config: &CrawlConfig, seed: &GroupId) -> Result<RunReport> {
    if config.dry_run {
        return Ok(run_dry(config, seed));
    }

    let store = Arc::new(StateStore::new(&config.output_root));
    let loaded = store.load(config.resume).context("loading crawl state")?;
    tracing::info!(
        seed = %seed,
        output = %config.output_root.display(),
        completed = loaded.state.completed_len(),
        resumed = loaded.resumed,
        "starting crawl"
    );

    let router = MirrorRouter::new(config.timeouts);
    let exclude = ExclusionRules::new(config.exclude.iter().cloned());
    let shared_state = Arc::new(Mutex::new(loaded.state));
    let (disc_tx, disc_rx) = crossbeam_channel::unbounded();

    let mut scheduler = DownloadScheduler::start(
        SchedulerConfig {
            workers: config.workers,
            output_root: config.output_root.clone(),
            endpoints: config.download.clone(),
            router: router.clone(),
            cancel: config.cancel.clone(),
        },
        Arc::clone(&shared_state),
        Arc::clone(&store),
        disc_tx,
    );
    let crawler = GroupCrawler::new(
        &router,
        &config.browse,
        &exclude,
        &config.allowed_suffixes,
        &config.cancel,
    );
    let mut controller = RecursionController::new(
        config.max_depth,
        exclude.clone(),
        Arc::clone(&shared_state),
        disc_rx,
    );

    controller.seed(seed.clone());
    controller.restore(loaded.frontier);
    for task in loaded.resumed_tasks {
        scheduler.submit(task);
    }

    let crawl = controller.run(&crawler, &mut scheduler, &config.cancel);

    // In-flight transfers finish; queued ones are declined once cancelled.
    scheduler.wait_idle();
    let downloads = scheduler.shutdown();
    let cancelled = crawl.cancelled || config.cancel.is_cancelled();
    if cancelled {
        controller.merge_discoveries();
    }

    let pending = state::lock(&shared_state).pending_tasks();
    let frontier = controller.frontier();
    let mut report = RunReport {
        crawl,
        downloads,
        resumed: loaded.resumed,
        cancelled,
        pending: pending.len(),
        frontier: frontier.len(),
        ..RunReport::default()
    };

    if cancelled {
        let snapshot = PendingSnapshot::new(Some(seed), &pending, &frontier);
        report.snapshot_written = store
            .flush_pending(&snapshot)
            .context("saving pending snapshot")?;
    } else if pending.is_empty() {
        store.clear().context("removing pending snapshot")?;
    } else {
        tracing::warn!(
            pending = pending.len(),
            "run finished with failed downloads; rerun to retry them"
        );
    }

    tracing::info!(
        downloaded = report.downloads.downloaded,
        skipped = report.downloads.skipped,
        failed = report.downloads.failed,
        bytes = report.downloads.bytes,
        groups = report.crawl.groups_crawled,
        cancelled,
        "crawl finished"
    );
    Ok(report)
}

/// Same traversal as a real run, collecting tasks instead of downloading.
fn run_dry(config: &CrawlConfig, seed: &GroupId) -> RunReport {
    let router = MirrorRouter::new(config.timeouts);
    let exclude = ExclusionRules::new(config.exclude.iter().cloned());
    let shared_state = Arc::new(Mutex::new(CrawlState::default()));
    let (disc_tx, disc_rx) = crossbeam_channel::unbounded();

    let crawler = GroupCrawler::new(
        &router,
        &config.browse,
        &exclude,
        &config.allowed_suffixes,
        &config.cancel,
    );
    let mut controller = RecursionController::new(config.max_depth, exclude.clone(), shared_state, disc_rx);
    controller.seed(seed.clone());

    let mut sink = DryRunSink::new(&router, &config.download, disc_tx);
    let crawl = controller.run(&crawler, &mut sink, &config.cancel);
    let planned = sink.into_tasks();
    tracing::info!(tasks = planned.len(), groups = crawl.groups_crawled, "dry run finished");

    let cancelled = crawl.cancelled;
    RunReport {
        crawl,
        cancelled,
        frontier: controller.frontier().len(),
        planned,
        ..RunReport::default()
    }
}
