//! Booking status lifecycle.
//!
//! Drives the transition table in [`crate::models::BookingStatus`] against
//! the repository's compare-and-swap status update. When a racing writer
//! changes the status between our read and our write, the swap reports the
//! actual stored status and the transition is re-evaluated against it, so an
//! illegal change is reported to the caller rather than applied or silently
//! dropped.

use chrono::NaiveDate;

use super::error::{BookingError, BookingResult};
use crate::api::{Booking, BookingId, BookingStatus};
use crate::db::repository::{BookingRepository, FullRepository, StatusUpdate};

/// One concession to racing writers: after a stale CAS we re-read once.
const MAX_TRANSITION_ATTEMPTS: u32 = 2;

async fn transition(
    repo: &dyn FullRepository,
    id: BookingId,
    to: BookingStatus,
    actor: Option<String>,
) -> BookingResult<Booking> {
    let booking = repo
        .fetch_booking(id)
        .await?
        .ok_or_else(|| BookingError::not_found(format!("Booking {} not found", id)))?;

    let mut from = booking.status;
    for _ in 0..MAX_TRANSITION_ATTEMPTS {
        if !from.can_transition(to) {
            return Err(BookingError::InvalidTransition { from, to });
        }

        match repo
            .update_booking_status(id, from, to, actor.clone())
            .await?
        {
            StatusUpdate::Updated(updated) => {
                tracing::info!(booking_id = %id, from = %from, to = %to, "booking status changed");
                return Ok(updated);
            }
            StatusUpdate::StaleStatus { actual } => {
                tracing::debug!(
                    booking_id = %id,
                    expected = %from,
                    actual = %actual,
                    "status changed concurrently, re-evaluating"
                );
                from = actual;
            }
        }
    }

    Err(BookingError::InvalidTransition { from, to })
}

/// Confirm a pending booking.
pub async fn confirm(repo: &dyn FullRepository, id: BookingId) -> BookingResult<Booking> {
    transition(repo, id, BookingStatus::Confirmed, None).await
}

/// Cancel a pending or confirmed booking, recording the acting party.
///
/// Cancellation immediately frees the booking's range for new reservations:
/// availability is derived from status, so no separate cleanup runs.
pub async fn cancel(
    repo: &dyn FullRepository,
    id: BookingId,
    actor_id: String,
) -> BookingResult<Booking> {
    transition(repo, id, BookingStatus::Cancelled, Some(actor_id)).await
}

/// Mark a confirmed booking as completed once its checkout date has elapsed.
///
/// `today` is supplied by the caller; completing before the checkout date is
/// an illegal transition.
pub async fn complete(
    repo: &dyn FullRepository,
    id: BookingId,
    today: NaiveDate,
) -> BookingResult<Booking> {
    let booking = repo
        .fetch_booking(id)
        .await?
        .ok_or_else(|| BookingError::not_found(format!("Booking {} not found", id)))?;

    if today < booking.range.end {
        return Err(BookingError::InvalidTransition {
            from: booking.status,
            to: BookingStatus::Completed,
        });
    }

    transition(repo, id, BookingStatus::Completed, None).await
}
