//! Endpoint sets: randomly chosen mirror candidates plus a canonical fallback.

use anyhow::{Context, Result};
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};

/// Candidate base URLs for one kind of request (browse or download), plus
/// the canonical URL tried when the chosen candidate fails.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointSet {
    /// Mirror base URLs; one is chosen uniformly at random per request.
    #[serde(default)]
    pub mirrors: Vec<String>,
    /// Canonical base URL, used directly when `mirrors` is empty.
    pub fallback: String,
}

impl EndpointSet {
    pub fn new(mirrors: Vec<String>, fallback: impl Into<String>) -> Self {
        Self {
            mirrors,
            fallback: fallback.into(),
        }
    }

    pub fn fallback_only(fallback: impl Into<String>) -> Self {
        Self::new(Vec::new(), fallback)
    }

    /// Checks every base URL is an absolute http(s) URL.
    pub fn validate(&self) -> Result<()> {
        for base in self.mirrors.iter().chain(std::iter::once(&self.fallback)) {
            let url = url::Url::parse(base).with_context(|| format!("invalid endpoint URL: {base}"))?;
            if url.scheme() != "http" && url.scheme() != "https" {
                anyhow::bail!("endpoint must be http or https: {base}");
            }
        }
        Ok(())
    }

    /// Picks one mirror uniformly at random, or `None` when there are none.
    pub(crate) fn pick_candidate(&self) -> Option<&str> {
        self.mirrors.choose(&mut rand::rng()).map(String::as_str)
    }
}

/// Joins a base URL and a relative repository path with exactly one slash.
pub fn join_url(base: &str, rel: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), rel.trim_start_matches('/'))
}
