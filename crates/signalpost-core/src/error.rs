//! Error taxonomy shared across the Signalpost workspace.
//!
//! Three families with deliberately different lifetimes:
//!
//! - [`ConfigError`] is raised synchronously at construction time and is
//!   fatal to the component being built.
//! - [`SubmitError`] is raised synchronously from submission calls made
//!   after shutdown has begun; the caller may drop or redirect the record.
//! - [`TaskError`] describes a failed delivery attempt. It is consumed by
//!   the worker pool's retry loop and only ever observed through the
//!   failure hook, never by the original submitter.

use std::time::Duration;

use thiserror::Error;

/// Construction-time configuration failure.
///
/// Every variant names the offending parameter so the embedding application
/// can report a precise message without string matching.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A numeric parameter is below its documented minimum.
    #[error("{name} must be at least {min}, got {got}")]
    BelowMinimum {
        /// Name of the offending parameter.
        name: &'static str,
        /// Documented minimum.
        min: u64,
        /// Value that was supplied.
        got: u64,
    },

    /// A duration parameter must be non-zero.
    #[error("{name} must be a non-zero duration")]
    ZeroDuration {
        /// Name of the offending parameter.
        name: &'static str,
    },

    /// A duration parameter is below its documented minimum.
    #[error("{name} must be at least {min:?}, got {got:?}")]
    DurationBelowMinimum {
        /// Name of the offending parameter.
        name: &'static str,
        /// Documented minimum.
        min: Duration,
        /// Value that was supplied.
        got: Duration,
    },

    /// A required string parameter is empty.
    #[error("{name} must not be empty")]
    Empty {
        /// Name of the offending parameter.
        name: &'static str,
    },

    /// A URL parameter failed to parse.
    #[error("{name} is not a valid URL: {reason}")]
    InvalidUrl {
        /// Name of the offending parameter.
        name: &'static str,
        /// Parser diagnostic.
        reason: String,
    },

    /// The underlying HTTP client could not be constructed.
    #[error("building HTTP client failed: {message}")]
    HttpClient {
        /// Builder diagnostic.
        message: String,
    },

    /// Layered configuration sources could not be read or deserialized.
    #[error("loading configuration failed: {message}")]
    Load {
        /// Source diagnostic.
        message: String,
    },
}

/// Rejection of a submission made after shutdown has begun.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SubmitError {
    /// The component no longer accepts new work; already-accepted work is
    /// still being drained.
    #[error("shutting down, no new work accepted")]
    ShuttingDown,
}

/// A failed delivery attempt.
#[derive(Debug, Error)]
pub enum TaskError {
    /// The server answered with a non-success status.
    #[error("request failed with status {status}: {body}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// Response body, truncated by the transport.
        body: String,
    },

    /// The request never reached the server.
    #[error("network error: {message}")]
    Network {
        /// Underlying I/O diagnostic.
        message: String,
    },

    /// The request exceeded the configured timeout.
    #[error("request timed out: {message}")]
    Timeout {
        /// Underlying timeout diagnostic.
        message: String,
    },

    /// Any other action failure.
    #[error("{message}")]
    Other {
        /// Failure description.
        message: String,
    },
}

impl TaskError {
    /// Creates an HTTP status error.
    pub fn http(status: u16, body: impl Into<String>) -> Self {
        Self::Http { status, body: body.into() }
    }

    /// Creates a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network { message: message.into() }
    }

    /// Creates a timeout error.
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::Timeout { message: message.into() }
    }

    /// Creates an uncategorized action error.
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other { message: message.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_names_offending_parameter() {
        let err = ConfigError::BelowMinimum { name: "worker_count", min: 1, got: 0 };
        assert_eq!(err.to_string(), "worker_count must be at least 1, got 0");

        let err = ConfigError::Empty { name: "api_key" };
        assert_eq!(err.to_string(), "api_key must not be empty");
    }

    #[test]
    fn duration_bound_message_shows_both_values() {
        let err = ConfigError::DurationBelowMinimum {
            name: "flush_interval",
            min: Duration::from_secs(5),
            got: Duration::from_secs(1),
        };
        assert_eq!(err.to_string(), "flush_interval must be at least 5s, got 1s");
    }

    #[test]
    fn task_error_messages() {
        let err = TaskError::http(503, "upstream unavailable");
        assert_eq!(err.to_string(), "request failed with status 503: upstream unavailable");

        let err = TaskError::other("scripted failure");
        assert_eq!(err.to_string(), "scripted failure");
    }
}
