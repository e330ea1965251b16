//! Error taxonomy for booking operations.

use crate::api::{BookingId, BookingStatus};
use crate::db::repository::RepositoryError;

/// Result type for booking operations.
pub type BookingResult<T> = Result<T, BookingError>;

/// Errors surfaced by the availability and lifecycle operations.
///
/// The first four variants are caller errors and map onto 4xx responses; the
/// last wraps storage failures and maps onto 500.
#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    /// Malformed or inverted date range, or a stay violating the listing's
    /// length constraints. Detected before any write.
    #[error("Invalid date range: {reason}")]
    InvalidRange { reason: String },

    /// The requested range overlaps an active booking.
    #[error("Requested range conflicts with existing booking {conflicting}")]
    DateRangeConflict { conflicting: BookingId },

    /// The requested status change is not in the transition table.
    #[error("Illegal status transition from {from} to {to}")]
    InvalidTransition {
        from: BookingStatus,
        to: BookingStatus,
    },

    /// Unknown listing or booking id.
    #[error("Not found: {message}")]
    NotFound { message: String },

    /// Storage or transaction failure.
    #[error(transparent)]
    Persistence(RepositoryError),
}

impl BookingError {
    pub fn invalid_range(reason: impl Into<String>) -> Self {
        Self::InvalidRange {
            reason: reason.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Whether retrying the operation may succeed (transient storage failure).
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Persistence(e) if e.is_retryable())
    }
}

impl From<RepositoryError> for BookingError {
    fn from(err: RepositoryError) -> Self {
        // Missing entities reported by the storage layer stay 404-class.
        match err {
            RepositoryError::NotFound { ref message, .. } => BookingError::NotFound {
                message: message.clone(),
            },
            other => BookingError::Persistence(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_not_found_stays_not_found() {
        let err: BookingError = RepositoryError::not_found("Listing 7 not found").into();
        assert!(matches!(err, BookingError::NotFound { .. }));
    }

    #[test]
    fn test_retryable_passes_through() {
        let err: BookingError = RepositoryError::connection("pool exhausted").into();
        assert!(err.is_retryable());

        let err: BookingError = RepositoryError::query("syntax error").into();
        assert!(!err.is_retryable());
    }
}
