//! Error types for HTTP handlers.
//!
//! Bridges the domain error taxonomy ([`CoreError`]) to HTTP responses,
//! implementing Axum's `IntoResponse` trait. Every error body is JSON with
//! a stable machine-readable `code` and a human-readable `message`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use cinerate_core::CoreError;
use serde::Serialize;
use std::fmt;

/// Application error type for HTTP handlers.
///
/// Wraps domain errors and provides HTTP-friendly error responses.
///
/// # Examples
///
/// ```ignore
/// async fn handler() -> Result<Json<Data>, AppError> {
///     let movie = state.store.find_movie(id).await?
///         .ok_or_else(|| AppError::not_found("Movie", id))?;
///     Ok(Json(movie))
/// }
/// ```
#[derive(Debug)]
pub struct AppError {
    /// HTTP status code
    status: StatusCode,
    /// Error message (user-facing)
    message: String,
    /// Error code (for client error handling)
    code: String,
    /// Internal error (for logging, not exposed to client)
    source: Option<anyhow::Error>,
}

impl AppError {
    /// Create a new application error.
    #[must_use]
    pub const fn new(status: StatusCode, message: String, code: String) -> Self {
        Self {
            status,
            message,
            code,
            source: None,
        }
    }

    /// Attach a source error for logging.
    #[must_use]
    pub fn with_source(mut self, source: anyhow::Error) -> Self {
        self.source = Some(source);
        self
    }

    /// Create a 400 Bad Request error.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            message.into(),
            "BAD_REQUEST".to_string(),
        )
    }

    /// Create a 404 Not Found error.
    #[must_use]
    pub fn not_found(resource: impl fmt::Display, id: impl fmt::Display) -> Self {
        Self::new(
            StatusCode::NOT_FOUND,
            format!("{resource} with id {id} not found"),
            "NOT_FOUND".to_string(),
        )
    }

    /// Create a 409 Conflict error.
    #[must_use]
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::CONFLICT,
            message.into(),
            "CONFLICT".to_string(),
        )
    }

    /// Create a 422 Unprocessable Entity error.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::UNPROCESSABLE_ENTITY,
            message.into(),
            "VALIDATION_ERROR".to_string(),
        )
    }

    /// Create a 500 Internal Server Error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            message.into(),
            "INTERNAL_SERVER_ERROR".to_string(),
        )
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Map each domain error to its HTTP status and stable client code.
impl From<CoreError> for AppError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InvalidCode => Self::new(
                StatusCode::BAD_REQUEST,
                "Unknown access code".to_string(),
                "INVALID_CODE".to_string(),
            ),
            CoreError::MovieNotFound(id) => Self::new(
                StatusCode::NOT_FOUND,
                format!("Movie {id} not found"),
                "MOVIE_NOT_FOUND".to_string(),
            ),
            CoreError::AlreadyRated { movie_id } => Self::new(
                StatusCode::CONFLICT,
                format!("This code has already rated movie {movie_id}"),
                "ALREADY_RATED".to_string(),
            ),
            CoreError::InvalidRatingValue(value) => Self::new(
                StatusCode::UNPROCESSABLE_ENTITY,
                format!("Rating value {value} is not a half-star step in [0.5, 5.0]"),
                "INVALID_RATING_VALUE".to_string(),
            ),
            CoreError::InvalidTransition(reason) => Self::new(
                StatusCode::CONFLICT,
                reason.to_string(),
                "INVALID_TRANSITION".to_string(),
            ),
            CoreError::RatingClosed(movie_id) => Self::new(
                StatusCode::CONFLICT,
                format!("No rating session is open for movie {movie_id}"),
                "RATING_CLOSED".to_string(),
            ),
            CoreError::CodeSpaceExhausted { attempts } => Self::new(
                StatusCode::UNPROCESSABLE_ENTITY,
                format!("Code space exhausted after {attempts} attempts"),
                "CODE_SPACE_EXHAUSTED".to_string(),
            ),
            CoreError::Store(err) => {
                Self::internal("Storage failure").with_source(anyhow::Error::new(err))
            }
        }
    }
}

/// Convert `anyhow::Error` to `AppError`.
impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::internal("An internal error occurred").with_source(err)
    }
}

/// Error response body (JSON).
#[derive(Debug, Serialize)]
struct ErrorResponse {
    /// Error code (for client error handling).
    code: String,
    /// Human-readable error message.
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log internal errors
        if self.status.is_server_error() {
            if let Some(source) = &self.source {
                tracing::error!(
                    status = %self.status,
                    code = %self.code,
                    message = %self.message,
                    error = %source,
                    "Internal server error"
                );
            } else {
                tracing::error!(
                    status = %self.status,
                    code = %self.code,
                    message = %self.message,
                    "Internal server error"
                );
            }
        }

        let body = ErrorResponse {
            code: self.code,
            message: self.message,
        };

        (self.status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cinerate_core::MovieId;

    #[test]
    fn test_error_display() {
        let err = AppError::bad_request("Invalid input");
        assert_eq!(err.to_string(), "[BAD_REQUEST] Invalid input");
    }

    #[test]
    fn test_not_found() {
        let err = AppError::not_found("Movie", "123");
        assert_eq!(err.to_string(), "[NOT_FOUND] Movie with id 123 not found");
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_already_rated_maps_to_conflict() {
        let err = AppError::from(CoreError::AlreadyRated {
            movie_id: MovieId::new(7),
        });
        assert_eq!(err.status, StatusCode::CONFLICT);
        assert_eq!(err.code, "ALREADY_RATED");
    }

    #[test]
    fn test_invalid_value_maps_to_unprocessable() {
        let err = AppError::from(CoreError::InvalidRatingValue(0.3));
        assert_eq!(err.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err.code, "INVALID_RATING_VALUE");
    }

    #[test]
    fn test_rating_closed_maps_to_conflict() {
        let err = AppError::from(CoreError::RatingClosed(MovieId::new(1)));
        assert_eq!(err.status, StatusCode::CONFLICT);
        assert_eq!(err.code, "RATING_CLOSED");
    }
}
