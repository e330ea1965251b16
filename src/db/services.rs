//! High-level database operations over any repository implementation.
//!
//! Thin orchestration functions used by the HTTP handlers for plain CRUD;
//! the availability engine and lifecycle logic live in [`crate::services`].

use crate::api::{Booking, BookingId, Listing, ListingId, ListingUpdate, NewListing};
use crate::db::repository::{
    BookingRepository, FullRepository, ListingRepository, RepositoryResult,
};

/// Check that the backing store is reachable.
pub async fn health_check(repo: &dyn FullRepository) -> RepositoryResult<bool> {
    repo.health_check().await
}

/// Create a listing.
pub async fn create_listing(
    repo: &dyn FullRepository,
    listing: NewListing,
) -> RepositoryResult<Listing> {
    let stored = repo.insert_listing(listing).await?;
    tracing::info!(listing_id = %stored.id, host_id = %stored.host_id, "listing created");
    Ok(stored)
}

/// List all listings.
pub async fn list_listings(repo: &dyn FullRepository) -> RepositoryResult<Vec<Listing>> {
    repo.list_listings().await
}

/// Fetch a listing by id.
pub async fn get_listing(
    repo: &dyn FullRepository,
    id: ListingId,
) -> RepositoryResult<Option<Listing>> {
    repo.fetch_listing(id).await
}

/// Apply a partial update to a listing.
pub async fn update_listing(
    repo: &dyn FullRepository,
    id: ListingId,
    update: ListingUpdate,
) -> RepositoryResult<Listing> {
    repo.update_listing(id, update).await
}

/// Fetch a booking by id.
pub async fn get_booking(
    repo: &dyn FullRepository,
    id: BookingId,
) -> RepositoryResult<Option<Booking>> {
    repo.fetch_booking(id).await
}

/// Fetch every booking for a listing regardless of status.
pub async fn list_bookings_for_listing(
    repo: &dyn FullRepository,
    listing_id: ListingId,
) -> RepositoryResult<Vec<Booking>> {
    repo.list_bookings(listing_id).await
}
