//! Group coordinates (`org.springframework.boot`) and their repository paths.

use std::fmt;
use std::str::FromStr;

use super::{sanitize_segment, PathToken, Rejected, RemotePath};

/// A group identifier, stored as its validated repository path.
///
/// Accepts the dotted coordinate form (`org.apache.commons`) as well as the
/// slash form used in repository URLs (`org/apache/commons/`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupId {
    path: RemotePath,
}

impl GroupId {
    pub fn parse(input: &str) -> Result<Self, Rejected> {
        let input = input.trim();
        if input.contains('/') {
            return Ok(Self {
                path: RemotePath::parse(input)?,
            });
        }
        if input.is_empty() {
            return Err(Rejected::Empty);
        }
        let tokens = input
            .split('.')
            .map(sanitize_segment)
            .collect::<Result<Vec<PathToken>, _>>()?;
        Ok(Self {
            path: RemotePath::from_tokens(tokens),
        })
    }

    /// Parses the slash form only, keeping dots inside segments
    /// (`org/foo.bar` is two segments).
    pub fn parse_path(input: &str) -> Result<Self, Rejected> {
        Self::from_path(RemotePath::parse(input)?).ok_or(Rejected::Empty)
    }

    /// Wraps an already validated path. `None` for the empty path.
    pub fn from_path(path: RemotePath) -> Option<Self> {
        (!path.is_empty()).then_some(Self { path })
    }

    /// Group owning a file laid out as `<group>/<artifact>/<version>/<file>`.
    pub fn owning(file: &RemotePath) -> Option<Self> {
        let tokens = file.tokens();
        let len = tokens.len().checked_sub(3)?;
        Self::from_path(RemotePath::from_tokens(tokens[..len].to_vec()))
    }

    /// This group and every enclosing group, innermost first
    /// (`org.foo.bar`, `org.foo`, `org`).
    pub fn ancestors(&self) -> impl Iterator<Item = GroupId> + '_ {
        let tokens = self.path.tokens();
        (1..=tokens.len()).rev().map(move |n| Self {
            path: RemotePath::from_tokens(tokens[..n].to_vec()),
        })
    }

    /// Repository path of the group directory.
    pub fn path(&self) -> &RemotePath {
        &self.path
    }

    /// Dotted coordinate form.
    pub fn dotted(&self) -> String {
        self.path.dotted()
    }
}

impl FromStr for GroupId {
    type Err = Rejected;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.dotted())
    }
}
