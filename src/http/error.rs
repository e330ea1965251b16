//! HTTP error handling and response types.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db::repository::RepositoryError;
use crate::services::BookingError;

/// API error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code for programmatic handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
    /// When the error was produced
    pub timestamp: DateTime<Utc>,
    /// Optional additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            timestamp: Utc::now(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

/// Application error type for HTTP handlers.
#[derive(Debug)]
pub enum AppError {
    /// Resource not found
    NotFound(String),
    /// Invalid request (validation error)
    BadRequest(String),
    /// Internal server error
    Internal(String),
    /// Domain error from the booking services
    Booking(BookingError),
    /// Repository error
    Repository(RepositoryError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error) = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, ApiError::new("NOT_FOUND", msg)),
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, ApiError::new("BAD_REQUEST", msg))
            }
            AppError::Internal(msg) => {
                // Internal detail is logged, never returned to the caller.
                tracing::error!(error = %msg, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiError::new("INTERNAL_ERROR", "Internal server error"),
                )
            }
            AppError::Booking(err) => return booking_error_response(err),
            AppError::Repository(err) => return repository_error_response(err),
        };

        (status, Json(error)).into_response()
    }
}

fn booking_error_response(err: BookingError) -> Response {
    let (status, error) = match &err {
        BookingError::InvalidRange { .. } => (
            StatusCode::BAD_REQUEST,
            ApiError::new("INVALID_RANGE", err.to_string()),
        ),
        BookingError::DateRangeConflict { conflicting } => (
            StatusCode::CONFLICT,
            ApiError::new("DATE_RANGE_CONFLICT", err.to_string())
                .with_details(format!("conflicting_booking_id={}", conflicting)),
        ),
        BookingError::InvalidTransition { .. } => (
            StatusCode::CONFLICT,
            ApiError::new("INVALID_TRANSITION", err.to_string()),
        ),
        BookingError::NotFound { .. } => (
            StatusCode::NOT_FOUND,
            ApiError::new("NOT_FOUND", err.to_string()),
        ),
        BookingError::Persistence(inner) => {
            tracing::error!(error = %inner, "persistence failure");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiError::new("PERSISTENCE_ERROR", "Storage operation failed"),
            )
        }
    };

    (status, Json(error)).into_response()
}

fn repository_error_response(err: RepositoryError) -> Response {
    let (status, error) = match &err {
        RepositoryError::NotFound { message, .. } => (
            StatusCode::NOT_FOUND,
            ApiError::new("NOT_FOUND", message.clone()),
        ),
        other => {
            tracing::error!(error = %other, "repository failure");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                ApiError::new("REPOSITORY_ERROR", "Storage operation failed"),
            )
        }
    };

    (status, Json(error)).into_response()
}

impl From<BookingError> for AppError {
    fn from(err: BookingError) -> Self {
        AppError::Booking(err)
    }
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        AppError::Repository(err)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}
