//! Exclusion predicate for pruning subtrees before any network call.

use crate::url_model::RemotePath;

/// Substring-based exclusion tokens.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExclusionRules {
    tokens: Vec<String>,
}

impl ExclusionRules {
    /// Empty tokens are ignored (they would match everything).
    pub fn new<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tokens: tokens
                .into_iter()
                .map(Into::into)
                .filter(|t: &String| !t.trim().is_empty())
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// True when any token is a substring of the dotted path or of the segment.
    pub fn is_excluded(&self, dotted_path: &str, segment: &str) -> bool {
        self.tokens
            .iter()
            .any(|t| dotted_path.contains(t.as_str()) || segment.contains(t.as_str()))
    }

    pub fn excludes(&self, path: &RemotePath) -> bool {
        let segment = path.last().map(|t| t.as_str()).unwrap_or("");
        self.is_excluded(&path.dotted(), segment)
    }
}
