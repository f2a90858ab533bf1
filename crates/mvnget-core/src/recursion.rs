//! Outer loop over groups: seed, crawl, settle, merge discovered groups.
//!
//! Groups are crawled in batches. A batch is the frontier as it stands when
//! the previous merge finished; after every group of the batch has been
//! crawled and its downloads have settled, manifest discoveries are merged
//! one level deeper than the group that produced them.

use std::collections::{BTreeSet, HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use crossbeam_channel::Receiver;

use crate::control::CancelToken;
use crate::crawler::{ExclusionRules, GroupCrawler};
use crate::scheduler::TaskSink;
use crate::state::{self, CrawlState, GroupEntry};
use crate::url_model::GroupId;

/// Dependency groups named by a manifest found while crawling `origin`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Discovery {
    pub origin: GroupId,
    pub groups: BTreeSet<GroupId>,
}

/// Totals for one [`RecursionController::run`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecursionOutcome {
    pub groups_crawled: usize,
    pub listings: usize,
    pub failed_listings: usize,
    pub tasks: usize,
    pub cancelled: bool,
}

pub struct RecursionController {
    max_depth: u32,
    exclude: ExclusionRules,
    state: Arc<Mutex<CrawlState>>,
    discoveries: Receiver<Discovery>,
    /// Every group ever queued this run, with the depth it was queued at.
    depths: HashMap<GroupId, u32>,
    frontier: VecDeque<GroupEntry>,
    /// Discoveries whose origin has no known depth yet.
    deferred: Vec<Discovery>,
}

impl RecursionController {
    pub fn new(
        max_depth: u32,
        exclude: ExclusionRules,
        state: Arc<Mutex<CrawlState>>,
        discoveries: Receiver<Discovery>,
    ) -> Self {
        Self {
            max_depth,
            exclude,
            state,
            discoveries,
            depths: HashMap::new(),
            frontier: VecDeque::new(),
            deferred: Vec::new(),
        }
    }

    /// Queues the requested group at depth 0.
    pub fn seed(&mut self, group: GroupId) -> bool {
        let queued = self.offer(group.clone(), 0);
        if !queued {
            tracing::warn!(group = %group, "seed group is excluded, nothing to crawl");
        }
        queued
    }

    /// Re-queues the frontier saved by an interrupted run.
    pub fn restore(&mut self, frontier: Vec<GroupEntry>) {
        for entry in frontier {
            self.offer(entry.group, entry.depth);
        }
    }

    /// Groups queued but not crawled, in crawl order.
    pub fn frontier(&self) -> Vec<GroupEntry> {
        self.frontier.iter().cloned().collect()
    }

    fn offer(&mut self, group: GroupId, depth: u32) -> bool {
        if depth > self.max_depth {
            tracing::debug!(group = %group, depth, "beyond depth bound, not expanding");
            return false;
        }
        if self.depths.contains_key(&group) {
            return false;
        }
        if state::lock(&self.state).is_covered(&group) {
            return false;
        }
        if self.exclude.excludes(group.path()) {
            tracing::debug!(group = %group, "group excluded");
            return false;
        }
        self.depths.insert(group.clone(), depth);
        self.frontier.push_back(GroupEntry { group, depth });
        true
    }

    /// Drains the discovery channel into the frontier. Returns how many
    /// groups were newly queued.
    pub fn merge_discoveries(&mut self) -> usize {
        let mut pending = std::mem::take(&mut self.deferred);
        pending.extend(self.discoveries.try_iter());

        let mut queued = 0;
        loop {
            let before = pending.len();
            for discovery in std::mem::take(&mut pending) {
                let Some(&origin_depth) = self.depths.get(&discovery.origin) else {
                    pending.push(discovery);
                    continue;
                };
                for group in discovery.groups {
                    if self.offer(group, origin_depth + 1) {
                        queued += 1;
                    }
                }
            }
            // Stop once a pass resolves no further origins.
            if pending.is_empty() || pending.len() == before {
                break;
            }
        }
        self.deferred = pending;
        if queued > 0 {
            tracing::info!(queued, frontier = self.frontier.len(), "merged discovered groups");
        }
        queued
    }

    /// Crawls until the frontier is exhausted or `cancel` is observed.
    ///
    /// On cancellation the group being crawled goes back to the front of the
    /// frontier. Tasks already handed to `sink` are not waited for.
    pub fn run(&mut self, crawler: &GroupCrawler<'_>, sink: &mut dyn TaskSink, cancel: &CancelToken) -> RecursionOutcome {
        let mut outcome = RecursionOutcome::default();

        loop {
            let batch = self.frontier.len();
            for _ in 0..batch {
                if cancel.is_cancelled() {
                    outcome.cancelled = true;
                    return outcome;
                }
                let Some(entry) = self.frontier.pop_front() else {
                    break;
                };
                {
                    let mut st = state::lock(&self.state);
                    if st.is_covered(&entry.group) {
                        tracing::debug!(group = %entry.group, "already crawled as part of an enclosing group");
                        continue;
                    }
                    st.mark_processed(&entry.group);
                }

                tracing::info!(group = %entry.group, depth = entry.depth, "crawling group");
                let crawl = crawler.crawl(&entry.group, sink);
                outcome.groups_crawled += 1;
                outcome.listings += crawl.listings;
                outcome.failed_listings += crawl.failed_listings;
                outcome.tasks += crawl.tasks;

                if crawl.cancelled {
                    self.frontier.push_front(entry);
                    outcome.cancelled = true;
                    return outcome;
                }
            }

            sink.settle();
            if cancel.is_cancelled() {
                outcome.cancelled = true;
                return outcome;
            }
            self.merge_discoveries();
            if self.frontier.is_empty() {
                break;
            }
        }

        if !self.deferred.is_empty() {
            tracing::debug!(
                dropped = self.deferred.len(),
                "discoveries from groups not crawled this run were dropped"
            );
            self.deferred.clear();
        }
        outcome
    }
}
