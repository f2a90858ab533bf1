//! Path-segment validation for untrusted link targets.
//!
//! Every token that ends up in a URL or a local path passes through
//! [`sanitize_segment`]; there is no other constructor for [`PathToken`].

use percent_encoding::percent_decode_str;

use super::PathToken;

/// Upper bound on nested percent-decoding rounds (`%252e` → `%2e` → `.`).
const MAX_DECODE_ROUNDS: usize = 4;

/// Reason a raw segment was refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Rejected {
    #[error("empty path segment")]
    Empty,
    #[error("path segment contains a separator: {0:?}")]
    Separator(String),
    #[error("path segment is a directory reference: {0:?}")]
    Traversal(String),
    #[error("path segment contains a control character: {0:?}")]
    Control(String),
}

/// Validates a single raw path segment.
///
/// Rejects the empty string, anything containing `/` or `\`, `.` and `..`
/// (also when percent-encoded, at any nesting), dot/space-only names such as
/// `...` that some filesystems collapse to a parent reference, and control
/// characters. Everything else is accepted verbatim.
pub fn sanitize_segment(raw: &str) -> Result<PathToken, Rejected> {
    if raw.is_empty() {
        return Err(Rejected::Empty);
    }
    check_decoded(raw, raw)?;

    let mut current = raw.to_string();
    for _ in 0..MAX_DECODE_ROUNDS {
        let decoded = percent_decode_str(&current).decode_utf8_lossy().into_owned();
        if decoded == current {
            break;
        }
        check_decoded(raw, &decoded)?;
        current = decoded;
    }

    Ok(PathToken(raw.to_string()))
}

fn check_decoded(raw: &str, candidate: &str) -> Result<(), Rejected> {
    if candidate.contains('/') || candidate.contains('\\') {
        return Err(Rejected::Separator(raw.to_string()));
    }
    if candidate.chars().any(char::is_control) {
        return Err(Rejected::Control(raw.to_string()));
    }
    let collapsed = candidate.trim_matches(|c: char| c == '.' || c.is_whitespace());
    if collapsed.is_empty() {
        // ".", "..", "...", " .. " and friends
        return Err(Rejected::Traversal(raw.to_string()));
    }
    Ok(())
}
