use ccdb_core::TargetError;
use thiserror::Error;

use crate::classify::TemporaryReason;

#[derive(Debug, Error)]
pub enum FetchError {
    /// The target failed validation; no request was sent.
    #[error("invalid request: {0}")]
    InvalidRequest(#[from] TargetError),

    /// Transport failure: connect, timeout, or body read.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{url} is temporarily unavailable: {reason}")]
    Temporary { url: String, reason: TemporaryReason },

    /// The response matched neither a known error banner nor usable content.
    #[error("unexpected response from {url}: HTTP {status} with a {body_len} byte body")]
    Unknown {
        url: String,
        status: u16,
        body_len: usize,
    },

    #[error("invalid base URL \"{base_url}\": {reason}")]
    InvalidBaseUrl { base_url: String, reason: String },
}

impl FetchError {
    /// Whether the same request may succeed on a later tick.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, FetchError::Http(_) | FetchError::Temporary { .. })
    }
}
