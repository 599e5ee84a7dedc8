//! HTTP error responses built from the workspace error taxonomy.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use jiff::Timestamp;
use validator::ValidationErrors;
use vitae_core::ErrorKind;

use crate::handler::response::ErrorEnvelope;

/// Result alias for HTTP handlers.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// The error type for HTTP handlers.
///
/// Carries a stable taxonomy code plus a user-facing message and serializes
/// into the async error envelope.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{kind}: {message}")]
#[must_use = "errors do nothing unless serialized"]
pub struct Error {
    kind: ErrorKind,
    message: String,
    process_id: Option<String>,
}

impl Error {
    /// Creates a new error with the specified kind.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            process_id: None,
        }
    }

    /// Attaches the process id a failed submission was assigned, if any.
    pub fn with_process_id(mut self, process_id: impl Into<String>) -> Self {
        self.process_id = Some(process_id.into());
        self
    }

    /// Returns the error kind.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Maps the taxonomy code onto an HTTP status.
    pub fn status(&self) -> StatusCode {
        match self.kind {
            ErrorKind::InvalidRequest | ErrorKind::ValidationFailed => StatusCode::BAD_REQUEST,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ErrorKind::Timeout => StatusCode::GATEWAY_TIMEOUT,
            ErrorKind::QueueFull
            | ErrorKind::CircuitOpen
            | ErrorKind::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            ErrorKind::UpstreamFailure => StatusCode::BAD_GATEWAY,
            ErrorKind::ConfigurationError | ErrorKind::Internal => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<vitae_core::Error> for Error {
    fn from(error: vitae_core::Error) -> Self {
        Self {
            message: error.to_string(),
            kind: error.kind,
            process_id: None,
        }
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Self::new(kind, kind.code())
    }
}

impl From<ValidationErrors> for Error {
    fn from(errors: ValidationErrors) -> Self {
        let details: Vec<String> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, field_errors)| {
                field_errors.iter().map(move |error| {
                    match &error.message {
                        Some(message) => format!("{field}: {message}"),
                        None => format!("{field}: failed {}", error.code),
                    }
                })
            })
            .collect();

        let message = if details.is_empty() {
            "validation failed".to_string()
        } else {
            details.join("; ")
        };

        tracing::warn!(
            target: crate::handler::TRACING_TARGET,
            errors = ?errors.field_errors(),
            "request validation failed"
        );

        Self::new(ErrorKind::ValidationFailed, message)
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorEnvelope {
            error: self.kind.code().to_string(),
            message: self.message,
            process_id: self.process_id,
            timestamp: Timestamp::now(),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn taxonomy_maps_to_expected_statuses() {
        assert_eq!(Error::from(ErrorKind::ValidationFailed).status(), StatusCode::BAD_REQUEST);
        assert_eq!(Error::from(ErrorKind::NotFound).status(), StatusCode::NOT_FOUND);
        assert_eq!(Error::from(ErrorKind::QueueFull).status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(Error::from(ErrorKind::RateLimited).status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(Error::from(ErrorKind::Internal).status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn core_errors_keep_their_kind() {
        let error = Error::from(ErrorKind::UpstreamFailure.with_message("scraper died"));
        assert_eq!(error.kind(), ErrorKind::UpstreamFailure);
        assert!(error.to_string().contains("scraper died"));
    }
}
