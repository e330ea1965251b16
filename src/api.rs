//! Public API surface for the backend.
//!
//! This file consolidates the identifier newtypes and re-exports the domain
//! types that cross the HTTP and persistence boundaries. All types derive
//! Serialize/Deserialize for JSON serialization.

use serde::{Deserialize, Serialize};

pub use crate::models::{
    Booking, BookingStatus, DateRange, GuestInfo, Listing, ListingUpdate, Location, NewBooking,
    NewListing, PriceBreakdown,
};

/// Listing identifier (database primary key).
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct ListingId(pub i64);

/// Booking identifier (database primary key).
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct BookingId(pub i64);

impl ListingId {
    pub fn new(value: i64) -> Self {
        ListingId(value)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

impl BookingId {
    pub fn new(value: i64) -> Self {
        BookingId(value)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for ListingId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
impl std::fmt::Display for BookingId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<ListingId> for i64 {
    fn from(id: ListingId) -> Self {
        id.0
    }
}
impl From<BookingId> for i64 {
    fn from(id: BookingId) -> Self {
        id.0
    }
}
