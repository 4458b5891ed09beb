use chrono::NaiveDate;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, RepgenError>;

#[derive(Error, Debug)]
pub enum RepgenError {
    #[error("Authentication failed (HTTP {status}): {message}")]
    Auth { status: u16, message: String },
    #[error("Project or ref not found: {0}")]
    NotFound(String),
    #[error("Malformed API response: {0}")]
    Protocol(String),
    #[error("Transport error: {0}")]
    Transport(String),
    #[error("Rate limited: {message}")]
    RateLimited {
        message: String,
        retry_after: Option<u64>,
    },
    #[error("Unexpected HTTP status {status}: {message}")]
    UnexpectedStatus { status: u16, message: String },
    #[error("Fetching page {page} failed after {attempts} attempts: {source}")]
    Fetch {
        page: u32,
        attempts: u32,
        #[source]
        source: Box<RepgenError>,
    },
    #[error("Cannot read commit cache {path}: {reason}")]
    CacheRead { path: PathBuf, reason: String },
    #[error("Cannot write commit cache {path}: {reason}")]
    CacheWrite { path: PathBuf, reason: String },
    #[error("No commits left after filtering; nothing to report")]
    EmptyHistogram,
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Invalid date: {0}")]
    InvalidDate(String),
}

impl RepgenError {
    /// Transient failures the fetcher may retry with backoff.
    pub fn is_retryable(&self) -> bool {
        matches!(self, RepgenError::Transport(_) | RepgenError::RateLimited { .. })
    }

    /// Server-requested wait in seconds, if any.
    pub fn retry_after(&self) -> Option<u64> {
        match self {
            RepgenError::RateLimited { retry_after, .. } => *retry_after,
            _ => None,
        }
    }

    pub fn invalid_range(since: NaiveDate, until: NaiveDate) -> Self {
        RepgenError::Config(format!("range start {since} is after range end {until}"))
    }
}
