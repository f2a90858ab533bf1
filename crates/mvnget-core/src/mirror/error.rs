//! Fetch errors and their classification for diagnostics.

use std::fmt;

/// Failure of a single network attempt against one base URL.
#[derive(Debug, thiserror::Error)]
pub enum AttemptError {
    /// Curl reported an error (timeout, connection, etc.).
    #[error("{0}")]
    Curl(#[from] curl::Error),
    /// HTTP response had a non-2xx status.
    #[error("HTTP {0}")]
    Http(u32),
    /// Writing the response body to disk failed.
    #[error("storage: {0}")]
    Storage(#[from] std::io::Error),
}

/// Terminal failure of a logical fetch after the mirror and fallback attempts.
#[derive(Debug, thiserror::Error)]
#[error("fetch of {path} failed after {attempts} attempt(s): {last}")]
pub struct FetchFailed {
    pub path: String,
    pub attempts: u32,
    #[source]
    pub last: AttemptError,
}

/// Coarse failure kind, used in log fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Timeout,
    Connection,
    NotFound,
    Throttled,
    Http5xx(u16),
    Storage,
    Other,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::Connection => write!(f, "connection"),
            FailureKind::NotFound => write!(f, "not-found"),
            FailureKind::Throttled => write!(f, "throttled"),
            FailureKind::Http5xx(code) => write!(f, "http-{code}"),
            FailureKind::Storage => write!(f, "storage"),
            FailureKind::Other => write!(f, "other"),
        }
    }
}

/// Classify an HTTP status code.
pub fn classify_http_status(code: u32) -> FailureKind {
    match code {
        404 | 410 => FailureKind::NotFound,
        429 | 503 => FailureKind::Throttled,
        500..=599 => FailureKind::Http5xx(code as u16),
        _ => FailureKind::Other,
    }
}

/// Classify a curl error.
pub fn classify_curl_error(e: &curl::Error) -> FailureKind {
    if e.is_operation_timedout() {
        return FailureKind::Timeout;
    }
    if e.is_couldnt_connect()
        || e.is_couldnt_resolve_host()
        || e.is_couldnt_resolve_proxy()
        || e.is_read_error()
        || e.is_recv_error()
        || e.is_send_error()
        || e.is_got_nothing()
        || e.is_partial_file()
    {
        return FailureKind::Connection;
    }
    FailureKind::Other
}

pub fn classify(e: &AttemptError) -> FailureKind {
    match e {
        AttemptError::Curl(ce) => classify_curl_error(ce),
        AttemptError::Http(code) => classify_http_status(*code),
        AttemptError::Storage(_) => FailureKind::Storage,
    }
}
