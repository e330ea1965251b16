//! Booking repository trait.
//!
//! The two mutation paths here carry the whole concurrency story for the
//! reservation system, so their contracts are spelled out precisely:
//!
//! - [`BookingRepository::reserve_booking`] performs the availability check
//!   and the insert as one atomic step against a per-listing contention
//!   point (listing-keyed mutex in the in-memory backend, a row lock inside
//!   a transaction in Postgres). Concurrent overlapping reservations for the
//!   same listing serialize there; exactly one wins.
//! - [`BookingRepository::update_booking_status`] is a compare-and-swap on
//!   the expected current status, so a cancel racing a confirm resolves to
//!   whichever commits first and the loser observes the actual status.

use async_trait::async_trait;

use super::error::RepositoryResult;
use crate::api::{Booking, BookingId, BookingStatus, ListingId, NewBooking};

/// Outcome of an atomic reserve attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum ReserveOutcome {
    /// The requested range was free and the booking was inserted.
    Created(Booking),
    /// The requested range overlaps an active booking; nothing was written.
    Conflict {
        /// The existing booking the request collided with
        existing: BookingId,
    },
}

/// Outcome of a compare-and-swap status update.
#[derive(Debug, Clone, PartialEq)]
pub enum StatusUpdate {
    /// The booking was in the expected status and has been transitioned.
    Updated(Booking),
    /// The booking was not in the expected status; nothing was written.
    StaleStatus {
        /// The status actually stored
        actual: BookingStatus,
    },
}

/// Repository trait for booking operations.
///
/// # Thread Safety
/// Implementations must be `Send + Sync` to work with async Rust.
#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// Fetch the bookings that currently occupy dates for a listing, i.e.
    /// those with status `pending` or `confirmed`.
    async fn list_active_bookings(&self, listing_id: ListingId)
        -> RepositoryResult<Vec<Booking>>;

    /// Fetch every booking for a listing regardless of status, ascending by id.
    async fn list_bookings(&self, listing_id: ListingId) -> RepositoryResult<Vec<Booking>>;

    /// Fetch a booking by id.
    async fn fetch_booking(&self, id: BookingId) -> RepositoryResult<Option<Booking>>;

    /// Atomically check availability and insert a booking.
    ///
    /// The overlap check and the insert must not be separable by a
    /// concurrent writer on the same listing. On success the stored booking
    /// has status `pending`.
    ///
    /// # Returns
    /// * `Ok(ReserveOutcome::Created)` - the booking, with assigned id
    /// * `Ok(ReserveOutcome::Conflict)` - an active booking overlaps the range
    /// * `Err(RepositoryError::NotFound)` if the listing does not exist
    /// * `Err(RepositoryError)` if the operation fails
    async fn reserve_booking(&self, booking: NewBooking) -> RepositoryResult<ReserveOutcome>;

    /// Transition a booking's status only if it is currently `from`.
    ///
    /// `actor` is recorded as `cancelled_by` when `to` is `cancelled` and is
    /// ignored otherwise.
    ///
    /// # Returns
    /// * `Ok(StatusUpdate::Updated)` - transition applied
    /// * `Ok(StatusUpdate::StaleStatus)` - the stored status differed from `from`
    /// * `Err(RepositoryError::NotFound)` if no booking has that id
    async fn update_booking_status(
        &self,
        id: BookingId,
        from: BookingStatus,
        to: BookingStatus,
        actor: Option<String>,
    ) -> RepositoryResult<StatusUpdate>;
}
