//! Validated path tokens, remote paths, and group coordinates.
//!
//! Remote link text never reaches a URL or filesystem path directly: it is
//! first reduced to a [`PathToken`] by [`sanitize_segment`], and paths are
//! only ever built by joining tokens.

mod group;
mod sanitize;

pub use group::GroupId;
pub use sanitize::{sanitize_segment, Rejected};

use std::fmt;
use std::path::{Path, PathBuf};

/// A single validated path segment. Only [`sanitize_segment`] creates these.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PathToken(String);

impl PathToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for PathToken {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PathToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Path relative to a repository root (or to the local output root), made
/// only of validated tokens.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RemotePath {
    tokens: Vec<PathToken>,
}

impl RemotePath {
    pub fn from_tokens(tokens: Vec<PathToken>) -> Self {
        Self { tokens }
    }

    /// Parses a `/`-separated relative path, validating every segment.
    /// Leading and trailing slashes are ignored; empty inner segments are not.
    pub fn parse(s: &str) -> Result<Self, Rejected> {
        let trimmed = s.trim_matches('/');
        if trimmed.is_empty() {
            return Err(Rejected::Empty);
        }
        let tokens = trimmed
            .split('/')
            .map(sanitize_segment)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { tokens })
    }

    pub fn tokens(&self) -> &[PathToken] {
        &self.tokens
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn last(&self) -> Option<&PathToken> {
        self.tokens.last()
    }

    /// Returns a new path with `token` appended.
    pub fn child(&self, token: PathToken) -> Self {
        let mut tokens = self.tokens.clone();
        tokens.push(token);
        Self { tokens }
    }

    /// `/`-joined form without leading or trailing slash (`org/foo/1.0/foo-1.0.jar`).
    pub fn as_rel(&self) -> String {
        self.join('/')
    }

    /// Relative URL path of a directory listing (`org/foo/`).
    pub fn dir_url(&self) -> String {
        let mut s = self.as_rel();
        s.push('/');
        s
    }

    /// Dotted form used for exclusion matching (`org.springframework.boot`).
    pub fn dotted(&self) -> String {
        self.join('.')
    }

    /// Local path of this entry under `root`.
    pub fn local_path(&self, root: &Path) -> PathBuf {
        let mut p = root.to_path_buf();
        for t in &self.tokens {
            p.push(t.as_str());
        }
        p
    }

    fn join(&self, sep: char) -> String {
        let mut out = String::new();
        for (i, t) in self.tokens.iter().enumerate() {
            if i > 0 {
                out.push(sep);
            }
            out.push_str(t.as_str());
        }
        out
    }
}

impl fmt::Display for RemotePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_rel())
    }
}
