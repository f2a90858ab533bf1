//! Directory listing markup → validated child entries.

use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

use crate::url_model::{sanitize_segment, PathToken};

fn re_href() -> &'static Regex {
    static R: OnceLock<Regex> = OnceLock::new();
    R.get_or_init(|| {
        Regex::new(r#"(?is)<a\b[^>]*?\bhref\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s>]+))"#).unwrap()
    })
}

/// One child of a listed directory. The name is always a validated token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingEntry {
    pub name: PathToken,
    pub is_dir: bool,
}

impl ListingEntry {
    pub fn dir(name: PathToken) -> Self {
        Self { name, is_dir: true }
    }

    pub fn file(name: PathToken) -> Self {
        Self { name, is_dir: false }
    }
}

/// Raw `href` targets of every anchor in `markup`, in document order.
pub fn anchor_targets(markup: &str) -> Vec<String> {
    re_href()
        .captures_iter(markup)
        .filter_map(|c| c.get(1).or_else(|| c.get(2)).or_else(|| c.get(3)))
        .map(|m| m.as_str().replace("&amp;", "&"))
        .collect()
}

/// Reduces a relative link target to one candidate segment and whether it
/// names a directory. Absolute and off-site links yield `None`.
fn link_segment(href: &str) -> Option<(&str, bool)> {
    let href = href.trim();
    let href = href.split(['?', '#']).next().unwrap_or("");
    if href.is_empty() || href.starts_with('/') || href.contains("://") || href.contains(':') {
        return None;
    }
    let href = href.strip_prefix("./").unwrap_or(href);
    match href.strip_suffix('/') {
        Some(dir) => Some((dir, true)),
        None => Some((href, false)),
    }
}

/// Parses listing markup into validated entries. Links that fail path
/// validation (parent links, nested paths, encoded traversal) are dropped
/// without further inspection; duplicates keep their first occurrence.
pub fn parse_listing(markup: &str) -> Vec<ListingEntry> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for href in anchor_targets(markup) {
        let Some((segment, is_dir)) = link_segment(&href) else {
            continue;
        };
        let Ok(name) = sanitize_segment(segment) else {
            continue;
        };
        if seen.insert(name.clone()) {
            out.push(ListingEntry { name, is_dir });
        }
    }
    out
}
