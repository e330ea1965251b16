//! In-memory repository for unit testing and local development.
//!
//! Listings and bookings live in `parking_lot`-guarded maps. Reservation
//! writes serialize on a per-listing mutex so that the availability check and
//! the insert form one atomic step for a given listing while unrelated
//! listings proceed independently.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};

use crate::api::{
    Booking, BookingId, BookingStatus, Listing, ListingId, ListingUpdate, NewBooking, NewListing,
};
use crate::db::repository::{
    BookingRepository, ErrorContext, FullRepository, ListingRepository, RepositoryError,
    RepositoryResult, ReserveOutcome, StatusUpdate,
};

/// In-memory implementation of the repository traits.
#[derive(Debug)]
pub struct LocalRepository {
    listings: RwLock<HashMap<i64, Listing>>,
    bookings: RwLock<HashMap<i64, Booking>>,
    next_listing_id: AtomicI64,
    next_booking_id: AtomicI64,
    /// Per-listing contention points serializing reserve attempts
    reserve_gates: Mutex<HashMap<i64, Arc<Mutex<()>>>>,
}

impl LocalRepository {
    /// Create an empty repository.
    pub fn new() -> Self {
        Self {
            listings: RwLock::new(HashMap::new()),
            bookings: RwLock::new(HashMap::new()),
            next_listing_id: AtomicI64::new(1),
            next_booking_id: AtomicI64::new(1),
            reserve_gates: Mutex::new(HashMap::new()),
        }
    }

    fn reserve_gate(&self, listing_id: ListingId) -> Arc<Mutex<()>> {
        let mut gates = self.reserve_gates.lock();
        gates
            .entry(listing_id.value())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    fn listing_exists(&self, listing_id: ListingId) -> bool {
        self.listings.read().contains_key(&listing_id.value())
    }
}

#[async_trait]
impl ListingRepository for LocalRepository {
    async fn insert_listing(&self, listing: NewListing) -> RepositoryResult<Listing> {
        let id = self.next_listing_id.fetch_add(1, Ordering::SeqCst);
        let stored = Listing {
            id: ListingId::new(id),
            host_id: listing.host_id,
            title: listing.title,
            location: listing.location,
            nightly_price: listing.nightly_price,
            min_stay_nights: listing.min_stay_nights,
            max_stay_nights: listing.max_stay_nights,
            created_at: chrono::Utc::now(),
        };
        self.listings.write().insert(id, stored.clone());
        Ok(stored)
    }

    async fn fetch_listing(&self, id: ListingId) -> RepositoryResult<Option<Listing>> {
        Ok(self.listings.read().get(&id.value()).cloned())
    }

    async fn list_listings(&self) -> RepositoryResult<Vec<Listing>> {
        let mut listings: Vec<Listing> = self.listings.read().values().cloned().collect();
        listings.sort_by_key(|l| l.id);
        Ok(listings)
    }

    async fn update_listing(
        &self,
        id: ListingId,
        update: ListingUpdate,
    ) -> RepositoryResult<Listing> {
        let mut listings = self.listings.write();
        let listing = listings.get_mut(&id.value()).ok_or_else(|| {
            RepositoryError::not_found_with_context(
                format!("Listing {} not found", id),
                ErrorContext::new("update_listing")
                    .with_entity("listing")
                    .with_entity_id(id),
            )
        })?;
        update.apply(listing);
        Ok(listing.clone())
    }

    async fn health_check(&self) -> RepositoryResult<bool> {
        Ok(true)
    }
}

#[async_trait]
impl BookingRepository for LocalRepository {
    async fn list_active_bookings(
        &self,
        listing_id: ListingId,
    ) -> RepositoryResult<Vec<Booking>> {
        let mut bookings: Vec<Booking> = self
            .bookings
            .read()
            .values()
            .filter(|b| b.listing_id == listing_id && b.status.is_active())
            .cloned()
            .collect();
        bookings.sort_by_key(|b| b.id);
        Ok(bookings)
    }

    async fn list_bookings(&self, listing_id: ListingId) -> RepositoryResult<Vec<Booking>> {
        let mut bookings: Vec<Booking> = self
            .bookings
            .read()
            .values()
            .filter(|b| b.listing_id == listing_id)
            .cloned()
            .collect();
        bookings.sort_by_key(|b| b.id);
        Ok(bookings)
    }

    async fn fetch_booking(&self, id: BookingId) -> RepositoryResult<Option<Booking>> {
        Ok(self.bookings.read().get(&id.value()).cloned())
    }

    async fn reserve_booking(&self, booking: NewBooking) -> RepositoryResult<ReserveOutcome> {
        if !self.listing_exists(booking.listing_id) {
            return Err(RepositoryError::not_found_with_context(
                format!("Listing {} not found", booking.listing_id),
                ErrorContext::new("reserve_booking")
                    .with_entity("listing")
                    .with_entity_id(booking.listing_id),
            ));
        }

        let gate = self.reserve_gate(booking.listing_id);
        let _guard = gate.lock();

        // Under the gate no other writer can interleave a check with ours.
        let conflict = self
            .bookings
            .read()
            .values()
            .filter(|b| b.listing_id == booking.listing_id && b.status.is_active())
            .find(|b| b.range.overlaps(&booking.range))
            .map(|b| b.id);

        if let Some(existing) = conflict {
            return Ok(ReserveOutcome::Conflict { existing });
        }

        let id = self.next_booking_id.fetch_add(1, Ordering::SeqCst);
        let stored = Booking {
            id: BookingId::new(id),
            listing_id: booking.listing_id,
            range: booking.range,
            status: BookingStatus::Pending,
            guest: booking.guest,
            price: booking.price,
            created_at: chrono::Utc::now(),
            cancelled_by: None,
        };
        self.bookings.write().insert(id, stored.clone());
        Ok(ReserveOutcome::Created(stored))
    }

    async fn update_booking_status(
        &self,
        id: BookingId,
        from: BookingStatus,
        to: BookingStatus,
        actor: Option<String>,
    ) -> RepositoryResult<StatusUpdate> {
        let mut bookings = self.bookings.write();
        let booking = bookings.get_mut(&id.value()).ok_or_else(|| {
            RepositoryError::not_found_with_context(
                format!("Booking {} not found", id),
                ErrorContext::new("update_booking_status")
                    .with_entity("booking")
                    .with_entity_id(id),
            )
        })?;

        if booking.status != from {
            return Ok(StatusUpdate::StaleStatus {
                actual: booking.status,
            });
        }

        booking.status = to;
        if to == BookingStatus::Cancelled {
            booking.cancelled_by = actor;
        }
        Ok(StatusUpdate::Updated(booking.clone()))
    }
}

impl FullRepository for LocalRepository {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{DateRange, GuestInfo, Location, PriceBreakdown};
    use chrono::NaiveDate;

    fn new_listing() -> NewListing {
        NewListing {
            host_id: "host-1".to_string(),
            title: "Sea view flat".to_string(),
            location: Location::new("10 Shore Rd", 41.38, 2.17).unwrap(),
            nightly_price: 100.0,
            min_stay_nights: None,
            max_stay_nights: None,
        }
    }

    fn new_booking(listing_id: ListingId, start: (i32, u32, u32), end: (i32, u32, u32)) -> NewBooking {
        NewBooking {
            listing_id,
            range: DateRange::new(
                NaiveDate::from_ymd_opt(start.0, start.1, start.2).unwrap(),
                NaiveDate::from_ymd_opt(end.0, end.1, end.2).unwrap(),
            )
            .unwrap(),
            guest: GuestInfo {
                name: "Ada".to_string(),
                email: "ada@example.com".to_string(),
            },
            price: PriceBreakdown::from_nightly(100.0, 2),
        }
    }

    #[tokio::test]
    async fn test_listing_ids_are_sequential() {
        let repo = LocalRepository::new();
        let a = repo.insert_listing(new_listing()).await.unwrap();
        let b = repo.insert_listing(new_listing()).await.unwrap();
        assert!(a.id < b.id);
    }

    #[tokio::test]
    async fn test_reserve_rejects_unknown_listing() {
        let repo = LocalRepository::new();
        let err = repo
            .reserve_booking(new_booking(ListingId::new(99), (2024, 3, 1), (2024, 3, 3)))
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_reserve_detects_conflict() {
        let repo = LocalRepository::new();
        let listing = repo.insert_listing(new_listing()).await.unwrap();

        let first = repo
            .reserve_booking(new_booking(listing.id, (2024, 3, 1), (2024, 3, 5)))
            .await
            .unwrap();
        let created = match first {
            ReserveOutcome::Created(b) => b,
            other => panic!("expected created, got {:?}", other),
        };

        let second = repo
            .reserve_booking(new_booking(listing.id, (2024, 3, 4), (2024, 3, 8)))
            .await
            .unwrap();
        assert_eq!(
            second,
            ReserveOutcome::Conflict {
                existing: created.id
            }
        );
    }

    #[tokio::test]
    async fn test_status_cas_detects_stale() {
        let repo = LocalRepository::new();
        let listing = repo.insert_listing(new_listing()).await.unwrap();
        let booking = match repo
            .reserve_booking(new_booking(listing.id, (2024, 3, 1), (2024, 3, 3)))
            .await
            .unwrap()
        {
            ReserveOutcome::Created(b) => b,
            other => panic!("expected created, got {:?}", other),
        };

        let update = repo
            .update_booking_status(
                booking.id,
                BookingStatus::Confirmed,
                BookingStatus::Completed,
                None,
            )
            .await
            .unwrap();
        assert_eq!(
            update,
            StatusUpdate::StaleStatus {
                actual: BookingStatus::Pending
            }
        );
    }
}
