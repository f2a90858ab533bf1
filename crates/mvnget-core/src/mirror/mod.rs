//! Mirror-aware request resolution with bounded failover.
//!
//! A logical fetch makes at most two network attempts: one against a mirror
//! chosen at random from the endpoint set, then one against the canonical
//! fallback. Remaining mirrors are never iterated. First-attempt failures
//! are logged at debug level only; a warning is emitted once both attempts
//! have failed.

mod endpoint;
mod error;
mod fetch;

pub use endpoint::{join_url, EndpointSet};
pub use error::{classify, classify_curl_error, classify_http_status, AttemptError, FailureKind, FetchFailed};

use std::path::Path;
use std::time::Duration;

/// Per-request network timeouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub connect: Duration,
    /// Whole-request limit for listings and manifests.
    pub browse: Duration,
    /// Whole-request limit for file downloads.
    pub download: Duration,
    /// Abort when the transfer stays below 1 KiB/s for this long.
    pub low_speed: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            connect: Duration::from_secs(10),
            browse: Duration::from_secs(30),
            download: Duration::from_secs(600),
            low_speed: Duration::from_secs(60),
        }
    }
}

/// Resolves relative repository paths against an [`EndpointSet`].
///
/// Endpoint-agnostic: callers pass the browse set for listings and the
/// download set for files.
#[derive(Debug, Clone, Default)]
pub struct MirrorRouter {
    timeouts: Timeouts,
}

impl MirrorRouter {
    pub fn new(timeouts: Timeouts) -> Self {
        Self { timeouts }
    }

    /// Fetch `rel` as text (directory listing markup, manifest documents).
    pub fn fetch_text(&self, endpoints: &EndpointSet, rel: &str) -> Result<String, FetchFailed> {
        self.resolve(endpoints, rel, |url| fetch::get_text(url, &self.timeouts))
    }

    /// Stream `rel` to `dest` (via `dest.part` and an atomic rename).
    /// Returns the number of bytes written.
    pub fn fetch_to_file(&self, endpoints: &EndpointSet, rel: &str, dest: &Path) -> Result<u64, FetchFailed> {
        self.resolve(endpoints, rel, |url| fetch::get_to_file(url, dest, &self.timeouts))
    }

    /// Runs `attempt` against a random mirror, then once against the fallback.
    pub fn resolve<T, F>(&self, endpoints: &EndpointSet, rel: &str, mut attempt: F) -> Result<T, FetchFailed>
    where
        F: FnMut(&str) -> Result<T, AttemptError>,
    {
        let mut attempts = 0u32;

        if let Some(base) = endpoints.pick_candidate() {
            attempts += 1;
            let url = join_url(base, rel);
            match attempt(&url) {
                Ok(v) => return Ok(v),
                Err(e) => {
                    tracing::debug!(
                        url = %url,
                        kind = %classify(&e),
                        error = %e,
                        "mirror attempt failed, falling back to canonical endpoint"
                    );
                }
            }
        }

        attempts += 1;
        let url = join_url(&endpoints.fallback, rel);
        match attempt(&url) {
            Ok(v) => Ok(v),
            Err(e) => {
                tracing::warn!(path = rel, kind = %classify(&e), error = %e, "fetch failed");
                Err(FetchFailed {
                    path: rel.to_string(),
                    attempts,
                    last: e,
                })
            }
        }
    }
}
