//! Error taxonomy shared by every layer of the crate.
//!
//! Local validation failures ([`SlackLineError::InvalidArgument`],
//! [`SlackLineError::Configuration`], [`SlackLineError::UserNotFound`]) are
//! raised before any network call. Upstream failures are passed through as
//! the API layer produced them; only [`SlackLineError::RateLimited`] is ever
//! retried.

use std::path::PathBuf;
use std::time::Duration;

/// Errors produced while building, delivering, or persisting messages.
#[derive(Debug, thiserror::Error)]
pub enum SlackLineError {
    /// Malformed or contradictory construction input.
    #[error("{0}")]
    InvalidArgument(String),

    /// No destination (or token) could be resolved from the configuration.
    #[error("{0}")]
    Configuration(String),

    /// A `@name` destination did not match any user in the directory.
    #[error("User with display name '{0}' was not found.")]
    UserNotFound(String),

    /// Slack asked us to slow down.
    #[error("{method} was rate limited; retry after {retry_after:?}")]
    RateLimited {
        /// API method that was throttled.
        method: String,
        /// Server-specified wait before the next attempt.
        retry_after: Duration,
    },

    /// Slack answered with `ok: false`.
    #[error("{method} failed: {error}")]
    Api {
        /// API method that failed.
        method: String,
        /// Slack error code (e.g. `channel_not_found`).
        error: String,
    },

    /// Slack answered with a non-success HTTP status other than 429.
    #[error("{method} returned non-success status {status}: {body}")]
    HttpStatus {
        /// API method that failed.
        method: String,
        /// HTTP status code.
        status: u16,
        /// Sanitized response body.
        body: String,
    },

    /// HTTP transport failure.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON encoding or decoding failure.
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Reading or writing a persisted record failed.
    #[error("failed to access {}: {source}", path.display())]
    Io {
        /// File that could not be read or written.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A thread index was outside the persisted thread.
    #[error("--message-number {index} is out of range (thread has {size} messages)")]
    MessageIndexOutOfRange {
        /// Requested zero-based index.
        index: usize,
        /// Number of messages in the thread.
        size: usize,
    },
}

impl SlackLineError {
    /// Shorthand for [`SlackLineError::InvalidArgument`].
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    /// Whether this error is a transient rate-limit signal.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, SlackLineError>;
