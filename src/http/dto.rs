//! Data Transfer Objects for the HTTP API.
//!
//! These DTOs are used for request/response serialization in the REST API.
//! All calendar dates travel as ISO-8601 (`YYYY-MM-DD`); every transmitted
//! `start_date`/`end_date` pair is half-open: the start date is the first
//! occupied night, the end date is the checkout day and is not occupied.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// Re-export domain types that serialize directly in API responses
pub use crate::api::{
    Booking, BookingStatus, GuestInfo, Listing, ListingUpdate, PriceBreakdown,
};

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Status of the service
    pub status: String,
    /// Version of the API
    pub version: String,
    /// Database connection status
    pub database: String,
}

/// Location fields for listing creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationDto {
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// Request body for creating a new listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateListingRequest {
    /// Account that owns the listing
    pub host_id: String,
    pub title: String,
    pub location: LocationDto,
    /// Price per night
    pub nightly_price: f64,
    #[serde(default)]
    pub min_stay_nights: Option<u32>,
    #[serde(default)]
    pub max_stay_nights: Option<u32>,
}

/// Listing list response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingListResponse {
    pub listings: Vec<Listing>,
    /// Total count
    pub total: usize,
}

/// Query parameters for the availability endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailabilityQuery {
    /// First night of the requested stay (inclusive)
    pub start_date: NaiveDate,
    /// Checkout date (exclusive)
    pub end_date: NaiveDate,
    /// Booking id to ignore during the check (rebooking flows)
    #[serde(default)]
    pub exclude_booking: Option<i64>,
}

/// Availability check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailabilityResponse {
    pub listing_id: i64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Whether the requested range is free of active bookings
    pub available: bool,
    /// The booking the range collides with, when not available
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conflicting_booking_id: Option<i64>,
}

/// Blocked-dates calendar response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarResponse {
    pub listing_id: i64,
    /// Occupied dates, ascending, checkout days excluded
    pub blocked_dates: Vec<NaiveDate>,
}

/// Booking list response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingListResponse {
    pub bookings: Vec<Booking>,
    /// Total count
    pub total: usize,
}

/// Request body for creating a booking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateBookingRequest {
    pub listing_id: i64,
    /// First night of the stay (inclusive)
    pub start_date: NaiveDate,
    /// Checkout date (exclusive)
    pub end_date: NaiveDate,
    pub guest: GuestInfo,
    /// Monetary breakdown; derived from the listing's nightly price when omitted
    #[serde(default)]
    pub price: Option<PriceBreakdown>,
}

/// Request body for cancelling a booking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelBookingRequest {
    /// Identity of the party requesting the cancellation
    pub actor_id: String,
}
