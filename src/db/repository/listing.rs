//! Listing repository trait.

use async_trait::async_trait;

use super::error::RepositoryResult;
use crate::api::{Listing, ListingId, ListingUpdate, NewListing};

/// Repository trait for listing CRUD operations.
///
/// # Thread Safety
/// Implementations must be `Send + Sync` to work with async Rust.
#[async_trait]
pub trait ListingRepository: Send + Sync {
    /// Insert a new listing and return it with its assigned id.
    async fn insert_listing(&self, listing: NewListing) -> RepositoryResult<Listing>;

    /// Fetch a listing by id.
    ///
    /// # Returns
    /// * `Ok(Some(Listing))` if found
    /// * `Ok(None)` if no listing has that id
    /// * `Err(RepositoryError)` if the operation fails
    async fn fetch_listing(&self, id: ListingId) -> RepositoryResult<Option<Listing>>;

    /// List all listings, ascending by id.
    async fn list_listings(&self) -> RepositoryResult<Vec<Listing>>;

    /// Apply a partial update to a listing's mutable fields.
    ///
    /// # Returns
    /// * `Ok(Listing)` - the updated listing
    /// * `Err(RepositoryError::NotFound)` if no listing has that id
    async fn update_listing(
        &self,
        id: ListingId,
        update: ListingUpdate,
    ) -> RepositoryResult<Listing>;

    /// Check that the backing store is reachable.
    async fn health_check(&self) -> RepositoryResult<bool>;
}
