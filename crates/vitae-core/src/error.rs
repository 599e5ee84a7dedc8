//! Common error type definitions.
//!
//! Every failure that can surface to a client, synchronously as an HTTP or
//! RPC error or asynchronously inside a task record, carries one of the
//! stable [`ErrorKind`] codes defined here. The code is part of the wire
//! contract; the message is free-form.

use std::error::Error as StdError;

use serde::{Deserialize, Serialize};

/// Type alias for boxed dynamic errors that can be sent across threads.
pub type BoxedError = Box<dyn StdError + Send + Sync>;

/// Result type alias for fallible operations in this workspace.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Stable error codes shared by the HTTP surface, the RPC surface and task
/// records.
///
/// The serialized form (`snake_case`) is observable by clients and must not
/// change.
#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ErrorKind {
    /// Malformed payload (parse or bind failure).
    InvalidRequest,
    /// Schema or field constraint failed.
    ValidationFailed,
    /// Token bucket denied the call.
    RateLimited,
    /// Destination circuit is open.
    CircuitOpen,
    /// Worker pool queue saturated.
    QueueFull,
    /// Per-request deadline exceeded.
    Timeout,
    /// A dependency (scraper, AI provider, storage) failed.
    UpstreamFailure,
    /// Missing required configuration for a feature.
    ConfigurationError,
    /// Recovered panic or unclassified failure.
    #[default]
    Internal,
    /// Unknown process id or resource.
    NotFound,
    /// Dependency health check failed.
    ServiceUnavailable,
}

impl ErrorKind {
    /// Returns the stable wire code for this kind.
    pub fn code(self) -> &'static str {
        self.into()
    }

    /// Attaches a message, producing a full [`Error`].
    pub fn with_message(self, message: impl Into<String>) -> Error {
        Error::new(self).with_message(message)
    }
}

/// Structured error carried through the task pipeline.
///
/// Pairs a stable [`ErrorKind`] with an optional human-readable message and
/// an optional source error retained for diagnostics.
#[derive(Debug, thiserror::Error)]
#[error("{}", .message.as_ref().map(|m| format!("{}: {}", .kind, m)).unwrap_or_else(|| .kind.to_string()))]
pub struct Error {
    /// The specific kind of error that occurred.
    pub kind: ErrorKind,
    /// Optional additional message providing more context.
    pub message: Option<String>,
    /// Optional source error for additional context.
    #[source]
    pub source: Option<BoxedError>,
}

impl Error {
    /// Creates a new error with the given kind.
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            message: None,
            source: None,
        }
    }

    /// Adds a message to this error.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Adds a source error to this error.
    pub fn with_source(mut self, source: impl Into<BoxedError>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Returns the stable wire code of this error.
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    /// Returns true if the client caused this error (4xx-style).
    pub fn is_client_error(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::InvalidRequest | ErrorKind::ValidationFailed | ErrorKind::NotFound
        )
    }

    /// Returns true if the operation is worth retrying.
    ///
    /// Transient admission and dependency failures are retryable; shape
    /// errors and recovered panics are not.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::RateLimited
                | ErrorKind::QueueFull
                | ErrorKind::Timeout
                | ErrorKind::UpstreamFailure
                | ErrorKind::ServiceUnavailable
        )
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Self::new(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_snake_case_and_stable() {
        assert_eq!(ErrorKind::InvalidRequest.code(), "invalid_request");
        assert_eq!(ErrorKind::ValidationFailed.code(), "validation_failed");
        assert_eq!(ErrorKind::RateLimited.code(), "rate_limited");
        assert_eq!(ErrorKind::CircuitOpen.code(), "circuit_open");
        assert_eq!(ErrorKind::QueueFull.code(), "queue_full");
        assert_eq!(ErrorKind::Timeout.code(), "timeout");
        assert_eq!(ErrorKind::UpstreamFailure.code(), "upstream_failure");
        assert_eq!(ErrorKind::Internal.code(), "internal");
        assert_eq!(ErrorKind::NotFound.code(), "not_found");
        assert_eq!(ErrorKind::ServiceUnavailable.code(), "service_unavailable");
    }

    #[test]
    fn serde_round_trips_the_wire_code() -> anyhow::Result<()> {
        let json = serde_json::to_string(&ErrorKind::QueueFull)?;
        assert_eq!(json, r#""queue_full""#);
        let kind: ErrorKind = serde_json::from_str(&json)?;
        assert_eq!(kind, ErrorKind::QueueFull);
        Ok(())
    }

    #[test]
    fn display_includes_message() {
        let error = ErrorKind::UpstreamFailure.with_message("scraper returned 502");
        assert_eq!(error.to_string(), "upstream_failure: scraper returned 502");
    }

    #[test]
    fn classification_covers_the_taxonomy() {
        assert!(ErrorKind::ValidationFailed.with_message("x").is_client_error());
        assert!(!ErrorKind::Internal.with_message("x").is_client_error());
        assert!(ErrorKind::RateLimited.with_message("x").is_retryable());
        assert!(!ErrorKind::Internal.with_message("x").is_retryable());
    }
}
