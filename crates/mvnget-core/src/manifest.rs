//! POM manifest scanning for related group coordinates.
//!
//! Only coordinate names are extracted; versions, scopes, and property
//! resolution are out of scope.

use regex::Regex;
use std::borrow::Cow;
use std::collections::BTreeSet;
use std::sync::OnceLock;

use crate::url_model::GroupId;

fn re_xmlns_decl() -> &'static Regex {
    static R: OnceLock<Regex> = OnceLock::new();
    R.get_or_init(|| Regex::new(r#"\s+xmlns(?::[A-Za-z_][\w.\-]*)?\s*=\s*(?:"[^"]*"|'[^']*')"#).unwrap())
}

fn re_prefixed_attr() -> &'static Regex {
    static R: OnceLock<Regex> = OnceLock::new();
    R.get_or_init(|| Regex::new(r#"\s+[A-Za-z_][\w.\-]*:[A-Za-z_][\w.\-]*\s*=\s*(?:"[^"]*"|'[^']*')"#).unwrap())
}

fn re_prefixed_tag() -> &'static Regex {
    static R: OnceLock<Regex> = OnceLock::new();
    R.get_or_init(|| Regex::new(r"(</?)[A-Za-z_][\w.\-]*:").unwrap())
}

/// Textually removes namespace declarations, prefixed attributes, and
/// element prefixes so that `<m:groupId>` and `<groupId>` read the same.
pub fn strip_namespaces(text: &str) -> Cow<'_, str> {
    let mut out = Cow::Borrowed(text);
    for (re, rep) in [
        (re_xmlns_decl(), ""),
        (re_prefixed_attr(), ""),
        (re_prefixed_tag(), "$1"),
    ] {
        if re.is_match(&out) {
            out = Cow::Owned(re.replace_all(&out, rep).into_owned());
        }
    }
    out
}

/// Unresolved property interpolation such as `${project.groupId}`.
fn is_placeholder(value: &str) -> bool {
    value.contains("${")
}

/// Group identifiers of every `<groupId>` nested (at any depth) under a
/// `<dependency>` element, minus placeholders and `own_group`.
///
/// Malformed markup yields an empty set.
pub fn extract_dependencies(manifest_text: &str, own_group: &GroupId) -> BTreeSet<GroupId> {
    let cleaned = strip_namespaces(manifest_text);
    let doc = match roxmltree::Document::parse(&cleaned) {
        Ok(doc) => doc,
        Err(e) => {
            tracing::warn!(group = %own_group, error = %e, "unparsable manifest, no dependencies taken from it");
            return BTreeSet::new();
        }
    };

    let mut groups = BTreeSet::new();
    for node in doc.descendants().filter(|n| n.has_tag_name("groupId")) {
        if !node.ancestors().skip(1).any(|a| a.has_tag_name("dependency")) {
            continue;
        }
        let value = node.text().map(str::trim).unwrap_or("");
        if value.is_empty() || is_placeholder(value) {
            continue;
        }
        match GroupId::parse(value) {
            Ok(g) if &g == own_group => {}
            Ok(g) => {
                groups.insert(g);
            }
            Err(e) => tracing::debug!(value, error = %e, "dropping invalid dependency groupId"),
        }
    }
    groups
}
