//! TellaTale: API error types.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use tellatale_core::outcome::{FailureReason, GenerationOutcome};
use thiserror::Error;

/// Startup errors for the API server.
#[derive(Debug, Error)]
pub enum AppError {
    /// A required environment variable is missing or invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// Tracing or exporter setup failed.
    #[error("telemetry error: {0}")]
    Telemetry(String),

    /// Network binding or I/O error.
    #[error("server error: {0}")]
    Server(#[from] std::io::Error),
}

/// JSON body returned for error responses.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Fixed, localized message for the user.
    pub error: String,
    /// Machine-readable error code.
    pub kind: &'static str,
}

/// A request that ends without a story.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// The topic was missing or blank.
    Validation(String),
    /// No backend credential is configured.
    MissingCredential(String),
    /// The backend refused the topic on content-policy grounds.
    SafetyBlocked(String),
    /// The backend failed.
    GenerationFailed(String),
}

impl ApiError {
    /// Splits a generation outcome into the story or the error to return.
    ///
    /// # Errors
    ///
    /// Returns the matching `ApiError` for every non-story outcome.
    pub fn story_or_error(outcome: GenerationOutcome) -> Result<String, Self> {
        match outcome {
            GenerationOutcome::Story(story) => Ok(story),
            GenerationOutcome::SafetyBlocked { message } => Err(Self::SafetyBlocked(message)),
            GenerationOutcome::Failed {
                reason: FailureReason::MissingCredential,
                message,
            } => Err(Self::MissingCredential(message)),
            GenerationOutcome::Failed {
                reason: FailureReason::Backend,
                message,
            } => Err(Self::GenerationFailed(message)),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, kind, message) = match self {
            Self::Validation(message) => (StatusCode::BAD_REQUEST, "validation_error", message),
            Self::MissingCredential(message) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "missing_credential",
                message,
            ),
            Self::SafetyBlocked(message) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "safety_blocked", message)
            }
            Self::GenerationFailed(message) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "generation_failed",
                message,
            ),
        };

        let body = ErrorBody {
            error: message,
            kind,
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    fn status_of(err: ApiError) -> StatusCode {
        let response = err.into_response();
        response.status()
    }

    #[test]
    fn test_io_errors_convert_to_server_errors() {
        let err: AppError =
            std::io::Error::new(std::io::ErrorKind::AddrInUse, "address in use").into();

        assert!(matches!(err, AppError::Server(_)));
        assert_eq!(err.to_string(), "server error: address in use");
    }

    #[test]
    fn test_validation_maps_to_400() {
        assert_eq!(
            status_of(ApiError::Validation("empty".into())),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_generation_failures_map_to_500() {
        for err in [
            ApiError::MissingCredential("no key".into()),
            ApiError::SafetyBlocked("blocked".into()),
            ApiError::GenerationFailed("later".into()),
        ] {
            assert_eq!(status_of(err), StatusCode::INTERNAL_SERVER_ERROR);
        }
    }

    #[test]
    fn test_outcomes_split_into_story_or_error() {
        assert_eq!(
            ApiError::story_or_error(GenerationOutcome::Story("tale".into())),
            Ok("tale".into())
        );
        assert_eq!(
            ApiError::story_or_error(GenerationOutcome::SafetyBlocked {
                message: "blocked".into()
            }),
            Err(ApiError::SafetyBlocked("blocked".into()))
        );
        assert_eq!(
            ApiError::story_or_error(GenerationOutcome::Failed {
                reason: FailureReason::MissingCredential,
                message: "no key".into(),
            }),
            Err(ApiError::MissingCredential("no key".into()))
        );
        assert_eq!(
            ApiError::story_or_error(GenerationOutcome::Failed {
                reason: FailureReason::Backend,
                message: "later".into(),
            }),
            Err(ApiError::GenerationFailed("later".into()))
        );
    }
}
