//! Directory-kind classification for the group → artifact → version tree.
//!
//! Version directories are never classified here: anything one level below
//! an artifact is a version by construction.

use regex::Regex;
use std::sync::OnceLock;

use crate::crawler::ListingEntry;

/// Suffixes of detached signatures and checksums.
pub const SIGNATURE_SUFFIXES: &[&str] = &[".asc", ".md5", ".sha1", ".sha256", ".sha512"];

/// Kind of a node in the remote tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    Group,
    Artifact,
    Version,
    File,
}

fn re_version() -> &'static Regex {
    static R: OnceLock<Regex> = OnceLock::new();
    // Leading digit run, then delimiter-separated alphanumeric segments:
    // 1.0, 2.3.4-SNAPSHOT, 5.3.1.RELEASE, 20030203.000550, 1.0+build.7
    R.get_or_init(|| Regex::new(r"^[0-9]+(?:[._+\-][0-9A-Za-z]+)*$").unwrap())
}

pub fn is_signature(name: &str) -> bool {
    SIGNATURE_SUFFIXES.iter().any(|s| name.ends_with(s))
}

/// `maven-metadata.xml` and repository-specific variants such as
/// `maven-metadata-central.xml`.
pub fn is_metadata_file(name: &str) -> bool {
    name.starts_with("maven-metadata") && name.ends_with(".xml")
}

pub fn is_version_like(name: &str) -> bool {
    re_version().is_match(name)
}

/// Classifies a listed directory from its children.
///
/// 1. Any non-signature metadata file → [`EntryKind::Artifact`].
/// 2. Otherwise, a strict majority of version-like subdirectories → Artifact.
/// 3. Otherwise [`EntryKind::Group`].
pub fn classify(entries: &[ListingEntry]) -> EntryKind {
    let has_metadata = entries
        .iter()
        .filter(|e| !e.is_dir)
        .map(|e| e.name.as_str())
        .any(|n| !is_signature(n) && is_metadata_file(n));
    if has_metadata {
        return EntryKind::Artifact;
    }

    let dirs: Vec<&str> = entries
        .iter()
        .filter(|e| e.is_dir)
        .map(|e| e.name.as_str())
        .collect();
    let versions = dirs.iter().filter(|d| is_version_like(d)).count();
    if !dirs.is_empty() && versions * 2 > dirs.len() {
        return EntryKind::Artifact;
    }

    EntryKind::Group
}
