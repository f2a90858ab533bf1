//! Breadth-first descent over one group's directory tree.
//!
//! Every listed child passes the path validator and the exclusion rules
//! before it is classified or fetched. Group nodes are descended, artifact
//! nodes enumerate their versions, and version nodes emit one
//! [`DownloadTask`] per allowed file.

mod exclude;
mod listing;

pub use exclude::ExclusionRules;
pub use listing::{anchor_targets, parse_listing, ListingEntry};

use std::collections::VecDeque;

use crate::classify::{self, EntryKind};
use crate::control::CancelToken;
use crate::mirror::{EndpointSet, MirrorRouter};
use crate::scheduler::TaskSink;
use crate::state::DownloadTask;
use crate::url_model::{GroupId, RemotePath};

/// Counters for one group crawl.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CrawlOutcome {
    /// Listings fetched successfully.
    pub listings: usize,
    /// Listings abandoned after both fetch attempts failed.
    pub failed_listings: usize,
    /// Entries dropped by the exclusion rules.
    pub excluded: usize,
    /// Tasks handed to the sink.
    pub tasks: usize,
    /// Stopped at a checkpoint because cancellation was requested.
    pub cancelled: bool,
}

pub struct GroupCrawler<'a> {
    router: &'a MirrorRouter,
    browse: &'a EndpointSet,
    exclude: &'a ExclusionRules,
    allowed_suffixes: &'a [String],
    cancel: &'a CancelToken,
}

impl<'a> GroupCrawler<'a> {
    pub fn new(
        router: &'a MirrorRouter,
        browse: &'a EndpointSet,
        exclude: &'a ExclusionRules,
        allowed_suffixes: &'a [String],
        cancel: &'a CancelToken,
    ) -> Self {
        Self {
            router,
            browse,
            exclude,
            allowed_suffixes,
            cancel,
        }
    }

    fn is_allowed_file(&self, name: &str) -> bool {
        !classify::is_signature(name) && self.allowed_suffixes.iter().any(|s| name.ends_with(s.as_str()))
    }

    /// Crawls `group`, submitting every download task to `sink` as soon as
    /// its version listing has been read. Tasks carry `group` as their origin.
    pub fn crawl(&self, group: &GroupId, sink: &mut dyn TaskSink) -> CrawlOutcome {
        let mut outcome = CrawlOutcome::default();
        // `true` marks a node known to be a version directory.
        let mut queue: VecDeque<(RemotePath, bool)> = VecDeque::new();
        queue.push_back((group.path().clone(), false));

        while let Some((dir, is_version)) = queue.pop_front() {
            if self.cancel.is_cancelled() {
                outcome.cancelled = true;
                break;
            }

            let markup = match self.router.fetch_text(self.browse, &dir.dir_url()) {
                Ok(m) => m,
                Err(_) => {
                    outcome.failed_listings += 1;
                    continue;
                }
            };
            outcome.listings += 1;

            let entries: Vec<ListingEntry> = parse_listing(&markup)
                .into_iter()
                .filter(|e| {
                    let excluded = self.exclude.excludes(&dir.child(e.name.clone()));
                    if excluded {
                        outcome.excluded += 1;
                        tracing::debug!(parent = %dir, entry = %e.name, "excluded");
                    }
                    !excluded
                })
                .collect();

            let kind = if is_version {
                EntryKind::Version
            } else {
                classify::classify(&entries)
            };
            tracing::debug!(path = %dir, ?kind, entries = entries.len(), "listed");

            match kind {
                EntryKind::Group => {
                    for e in entries.iter().filter(|e| e.is_dir) {
                        queue.push_back((dir.child(e.name.clone()), false));
                    }
                }
                EntryKind::Artifact => {
                    for e in &entries {
                        if e.is_dir {
                            queue.push_back((dir.child(e.name.clone()), true));
                        } else if classify::is_metadata_file(e.name.as_str()) && self.is_allowed_file(e.name.as_str()) {
                            sink.submit(DownloadTask::new(dir.child(e.name.clone()), group.clone()));
                            outcome.tasks += 1;
                        }
                    }
                }
                EntryKind::Version | EntryKind::File => {
                    for e in entries.iter().filter(|e| !e.is_dir) {
                        if self.is_allowed_file(e.name.as_str()) {
                            sink.submit(DownloadTask::new(dir.child(e.name.clone()), group.clone()));
                            outcome.tasks += 1;
                        }
                    }
                }
            }
        }

        tracing::info!(
            group = %group,
            listings = outcome.listings,
            failed = outcome.failed_listings,
            tasks = outcome.tasks,
            cancelled = outcome.cancelled,
            "group crawl finished"
        );
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn suffixes() -> Vec<String> {
        [".pom", ".jar", ".xml"].into_iter().map(String::from).collect()
    }

    #[test]
    fn cancelled_before_first_listing_fetches_nothing() {
        let router = MirrorRouter::default();
        let browse = EndpointSet::fallback_only("http://127.0.0.1:9/");
        let exclude = ExclusionRules::default();
        let suffixes = suffixes();
        let cancel = CancelToken::new();
        cancel.cancel();
        let crawler = GroupCrawler::new(&router, &browse, &exclude, &suffixes, &cancel);

        let mut sink: Vec<DownloadTask> = Vec::new();
        let outcome = crawler.crawl(&GroupId::parse("org.foo").unwrap(), &mut sink);
        assert!(outcome.cancelled);
        assert_eq!(outcome.listings + outcome.failed_listings, 0);
        assert!(sink.is_empty());
    }

    #[test]
    fn unreachable_listing_abandons_subtree_only() {
        let router = MirrorRouter::default();
        let browse = EndpointSet::fallback_only("http://127.0.0.1:9/");
        let exclude = ExclusionRules::default();
        let suffixes = suffixes();
        let cancel = CancelToken::new();
        let crawler = GroupCrawler::new(&router, &browse, &exclude, &suffixes, &cancel);

        let mut sink: Vec<DownloadTask> = Vec::new();
        let outcome = crawler.crawl(&GroupId::parse("org.foo").unwrap(), &mut sink);
        assert!(!outcome.cancelled);
        assert_eq!(outcome.failed_listings, 1);
        assert_eq!(outcome.listings, 0);
        assert!(sink.is_empty());
    }

    #[test]
    fn signatures_and_foreign_suffixes_are_not_downloaded() {
        let router = MirrorRouter::default();
        let browse = EndpointSet::fallback_only("http://127.0.0.1:9/");
        let exclude = ExclusionRules::default();
        let suffixes = suffixes();
        let cancel = CancelToken::new();
        let crawler = GroupCrawler::new(&router, &browse, &exclude, &suffixes, &cancel);

        assert!(crawler.is_allowed_file("a-1.0.jar"));
        assert!(crawler.is_allowed_file("maven-metadata.xml"));
        assert!(!crawler.is_allowed_file("a-1.0.jar.asc"));
        assert!(!crawler.is_allowed_file("maven-metadata.xml.sha1"));
        assert!(!crawler.is_allowed_file("a-1.0.txt"));
    }
}
