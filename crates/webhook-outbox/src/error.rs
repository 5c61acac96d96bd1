//! Outbox error types.

use serde::Deserialize;
use std::fmt;
use thiserror::Error;

/// Longest body excerpt kept when a rejection body is not JSON.
const MAX_BODY_EXCERPT: usize = 200;

/// Structured error detail from a webhook rejection body.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ErrorDetail {
    #[serde(default)]
    pub code: Option<i64>,
    #[serde(default)]
    pub message: Option<String>,
    /// Seconds until the server accepts requests again (429 only).
    #[serde(default)]
    pub retry_after: Option<f64>,
}

impl ErrorDetail {
    /// Parse a response body, keeping a short excerpt when it is not JSON.
    pub fn from_body(body: &str) -> Self {
        let trimmed = body.trim();
        if trimmed.is_empty() {
            return Self::default();
        }
        match serde_json::from_str::<ErrorDetail>(trimmed) {
            Ok(detail) => detail,
            Err(_) => Self {
                message: Some(trimmed.chars().take(MAX_BODY_EXCERPT).collect()),
                ..Self::default()
            },
        }
    }
}

impl fmt::Display for ErrorDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.code, self.message.as_deref()) {
            (Some(code), Some(message)) => write!(f, "{} - {}", code, message),
            (Some(code), None) => write!(f, "{}", code),
            (None, Some(message)) => f.write_str(message),
            (None, None) => f.write_str("no detail"),
        }
    }
}

/// Outbox error type.
#[derive(Error, Debug)]
pub enum OutboxError {
    /// HTTP request error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Transport failure reported by a non-reqwest transport
    #[error("Transport error: {0}")]
    Transport(String),

    /// The request did not complete in time
    #[error("Request timed out after {0} ms")]
    Timeout(u64),

    /// The webhook answered with a non-429 error status
    #[error("Webhook rejected message ({status}): {detail}")]
    Rejected { status: u16, detail: ErrorDetail },

    /// The webhook answered 429
    #[error("Webhook rate limited (429): {detail}")]
    RateLimited { detail: ErrorDetail },

    /// The pipeline has stopped accepting messages
    #[error("Relay pipeline is closed")]
    Closed,

    /// Splitter configuration error
    #[error("Split error: {0}")]
    Split(#[from] fence_splitter::SplitError),
}

impl OutboxError {
    /// Failure without an HTTP response.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Http(_) | Self::Transport(_) | Self::Timeout(_))
    }

    /// Whether this failure consumes rate-limit quota.
    ///
    /// Only answered requests count, and a 429 never does.
    pub fn charges_limiter(&self) -> bool {
        matches!(self, Self::Rejected { .. })
    }
}

/// Result type alias using OutboxError.
pub type OutboxResult<T> = Result<T, OutboxError>;
