//! The availability engine.
//!
//! Decides whether a requested date range is free for a listing, expands a
//! listing's active bookings into the blocked calendar dates, and commits new
//! reservations. The overlap predicate itself lives in
//! [`crate::models::DateRange`] and is shared with the repository
//! implementations; this module adds validation, orchestration and the retry
//! policy for transient storage failures.
//!
//! The set of active bookings is re-read from the repository on every
//! operation rather than cached, so the engine stays correct across multiple
//! server instances and restarts.

use std::time::Duration;

use chrono::NaiveDate;

use super::error::{BookingError, BookingResult};
use crate::api::{
    Booking, BookingId, DateRange, GuestInfo, Listing, ListingId, NewBooking, PriceBreakdown,
};
use crate::db::repository::{
    BookingRepository, FullRepository, ListingRepository, ReserveOutcome,
};
use crate::models::BlockedDates;

/// Delay before the single internal retry of a transient reserve failure.
const RESERVE_RETRY_DELAY: Duration = Duration::from_millis(50);

/// Result of an availability check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeAvailability {
    /// Whether the requested range is free of active bookings
    pub available: bool,
    /// The active booking the range collides with, when not available
    pub conflicting_booking_id: Option<BookingId>,
}

/// Validate a raw start/end pair into a [`DateRange`].
pub fn validate_range(start: NaiveDate, end: NaiveDate) -> BookingResult<DateRange> {
    DateRange::new(start, end).ok_or_else(|| {
        BookingError::invalid_range(format!("start {} must be before end {}", start, end))
    })
}

/// Find the first active booking whose range overlaps `range`, skipping the
/// excluded booking if given. Pure; usable against any snapshot of bookings.
pub fn find_conflict<'a>(
    bookings: impl IntoIterator<Item = &'a Booking>,
    range: &DateRange,
    exclude: Option<BookingId>,
) -> Option<&'a Booking> {
    bookings
        .into_iter()
        .filter(|b| Some(b.id) != exclude)
        .find(|b| b.range.overlaps(range))
}

async fn fetch_listing_or_err(
    repo: &dyn FullRepository,
    listing_id: ListingId,
) -> BookingResult<Listing> {
    repo.fetch_listing(listing_id)
        .await?
        .ok_or_else(|| BookingError::not_found(format!("Listing {} not found", listing_id)))
}

/// Check whether `[start, end)` is free for a listing.
///
/// `exclude` skips one booking during the check, for re-checking while a
/// guest amends an existing reservation.
pub async fn is_range_available(
    repo: &dyn FullRepository,
    listing_id: ListingId,
    start: NaiveDate,
    end: NaiveDate,
    exclude: Option<BookingId>,
) -> BookingResult<RangeAvailability> {
    let range = validate_range(start, end)?;
    fetch_listing_or_err(repo, listing_id).await?;

    let active = repo.list_active_bookings(listing_id).await?;
    let conflict = find_conflict(&active, &range, exclude);

    Ok(RangeAvailability {
        available: conflict.is_none(),
        conflicting_booking_id: conflict.map(|b| b.id),
    })
}

/// Expand a listing's active bookings into the occupied calendar dates,
/// ascending and deduplicated, checkout days excluded.
pub async fn blocked_dates(
    repo: &dyn FullRepository,
    listing_id: ListingId,
) -> BookingResult<BlockedDates> {
    fetch_listing_or_err(repo, listing_id).await?;

    let active = repo.list_active_bookings(listing_id).await?;
    Ok(BlockedDates::new(
        active.into_iter().map(|b| b.range).collect(),
    ))
}

/// Commit a reservation for `[start, end)`.
///
/// Validation happens before any write; the availability check and the
/// insert are one atomic step inside the repository, so concurrent
/// overlapping requests cannot both succeed. A transient storage failure is
/// retried once after a short backoff before surfacing. On success the
/// booking is returned with status `pending`.
pub async fn reserve(
    repo: &dyn FullRepository,
    listing_id: ListingId,
    start: NaiveDate,
    end: NaiveDate,
    guest: GuestInfo,
    price: Option<PriceBreakdown>,
) -> BookingResult<Booking> {
    let range = validate_range(start, end)?;
    let listing = fetch_listing_or_err(repo, listing_id).await?;

    let nights = range.nights();
    if let Some(min) = listing.min_stay_nights {
        if nights < min as i64 {
            return Err(BookingError::invalid_range(format!(
                "stay of {} nights is below the listing minimum of {}",
                nights, min
            )));
        }
    }
    if let Some(max) = listing.max_stay_nights {
        if nights > max as i64 {
            return Err(BookingError::invalid_range(format!(
                "stay of {} nights exceeds the listing maximum of {}",
                nights, max
            )));
        }
    }

    let request = NewBooking {
        listing_id,
        range,
        guest,
        price: price.unwrap_or_else(|| PriceBreakdown::from_nightly(listing.nightly_price, nights)),
    };

    let outcome = match repo.reserve_booking(request.clone()).await {
        Ok(outcome) => outcome,
        Err(e) if e.is_retryable() => {
            tracing::warn!(listing_id = %listing_id, error = %e, "transient reserve failure, retrying once");
            tokio::time::sleep(RESERVE_RETRY_DELAY).await;
            repo.reserve_booking(request).await?
        }
        Err(e) => return Err(e.into()),
    };

    match outcome {
        ReserveOutcome::Created(booking) => {
            tracing::info!(
                listing_id = %listing_id,
                booking_id = %booking.id,
                range = %booking.range,
                "reservation created"
            );
            Ok(booking)
        }
        ReserveOutcome::Conflict { existing } => {
            tracing::info!(
                listing_id = %listing_id,
                conflicting = %existing,
                "reservation rejected, range occupied"
            );
            Err(BookingError::DateRangeConflict {
                conflicting: existing,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::BookingStatus;
    use chrono::Utc;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn booking(id: i64, start: NaiveDate, end: NaiveDate) -> Booking {
        Booking {
            id: BookingId::new(id),
            listing_id: ListingId::new(1),
            range: DateRange::new(start, end).unwrap(),
            status: BookingStatus::Pending,
            guest: GuestInfo {
                name: "Ada".to_string(),
                email: "ada@example.com".to_string(),
            },
            price: PriceBreakdown::from_nightly(100.0, 2),
            created_at: Utc::now(),
            cancelled_by: None,
        }
    }

    #[test]
    fn test_validate_range_rejects_inverted() {
        assert!(matches!(
            validate_range(date(2024, 3, 12), date(2024, 3, 10)),
            Err(BookingError::InvalidRange { .. })
        ));
    }

    #[test]
    fn test_find_conflict_none_when_adjacent() {
        let existing = vec![booking(1, date(2024, 3, 12), date(2024, 3, 15))];
        let requested = DateRange::new(date(2024, 3, 10), date(2024, 3, 12)).unwrap();
        assert!(find_conflict(&existing, &requested, None).is_none());
    }

    #[test]
    fn test_find_conflict_reports_overlap() {
        let existing = vec![booking(1, date(2024, 3, 12), date(2024, 3, 15))];
        let requested = DateRange::new(date(2024, 3, 11), date(2024, 3, 13)).unwrap();
        let hit = find_conflict(&existing, &requested, None).unwrap();
        assert_eq!(hit.id, BookingId::new(1));
    }

    #[test]
    fn test_find_conflict_honors_exclusion() {
        let existing = vec![booking(1, date(2024, 3, 12), date(2024, 3, 15))];
        let requested = DateRange::new(date(2024, 3, 11), date(2024, 3, 13)).unwrap();
        assert!(find_conflict(&existing, &requested, Some(BookingId::new(1))).is_none());
    }
}
