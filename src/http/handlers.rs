//! HTTP handlers for the REST API.
//!
//! Each handler corresponds to an API endpoint and delegates to the service
//! layer for business logic.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;

use super::dto::{
    AvailabilityQuery, AvailabilityResponse, BookingListResponse, CalendarResponse,
    CancelBookingRequest, CreateBookingRequest, CreateListingRequest, HealthResponse,
    ListingListResponse,
};
use super::error::AppError;
use super::state::AppState;
use crate::api::{Booking, BookingId, Listing, ListingId, ListingUpdate, Location, NewListing};
use crate::db::services as db_services;
use crate::services;

/// Result type for handlers.
pub type HandlerResult<T> = Result<Json<T>, AppError>;

// =============================================================================
// Health Check
// =============================================================================

/// GET /health
///
/// Health check endpoint to verify the service is running and the database
/// is accessible.
pub async fn health_check(State(state): State<AppState>) -> HandlerResult<HealthResponse> {
    let db_status = match db_services::health_check(state.repository.as_ref()).await {
        Ok(true) => "connected".to_string(),
        Ok(false) => "disconnected".to_string(),
        Err(e) => format!("error: {}", e),
    };

    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        version: "v1".to_string(),
        database: db_status,
    }))
}

// =============================================================================
// Listing CRUD
// =============================================================================

/// GET /v1/listings
///
/// List all listings.
pub async fn list_listings(State(state): State<AppState>) -> HandlerResult<ListingListResponse> {
    let listings = db_services::list_listings(state.repository.as_ref()).await?;
    let total = listings.len();

    Ok(Json(ListingListResponse { listings, total }))
}

/// POST /v1/listings
///
/// Create a new listing.
pub async fn create_listing(
    State(state): State<AppState>,
    Json(request): Json<CreateListingRequest>,
) -> Result<(StatusCode, Json<Listing>), AppError> {
    let location = Location::new(
        request.location.address,
        request.location.latitude,
        request.location.longitude,
    )
    .map_err(AppError::BadRequest)?;

    let listing = db_services::create_listing(
        state.repository.as_ref(),
        NewListing {
            host_id: request.host_id,
            title: request.title,
            location,
            nightly_price: request.nightly_price,
            min_stay_nights: request.min_stay_nights,
            max_stay_nights: request.max_stay_nights,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(listing)))
}

/// GET /v1/listings/{listing_id}
///
/// Fetch a single listing.
pub async fn get_listing(
    State(state): State<AppState>,
    Path(listing_id): Path<i64>,
) -> HandlerResult<Listing> {
    let listing = db_services::get_listing(state.repository.as_ref(), ListingId::new(listing_id))
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Listing {} not found", listing_id)))?;

    Ok(Json(listing))
}

/// PATCH /v1/listings/{listing_id}
///
/// Update a listing's mutable fields (title, pricing, stay constraints).
pub async fn update_listing(
    State(state): State<AppState>,
    Path(listing_id): Path<i64>,
    Json(update): Json<ListingUpdate>,
) -> HandlerResult<Listing> {
    let listing = db_services::update_listing(
        state.repository.as_ref(),
        ListingId::new(listing_id),
        update,
    )
    .await?;

    Ok(Json(listing))
}

// =============================================================================
// Availability
// =============================================================================

/// GET /v1/listings/{listing_id}/availability
///
/// Check whether the half-open range `[start_date, end_date)` is free of
/// active bookings for the listing.
pub async fn get_availability(
    State(state): State<AppState>,
    Path(listing_id): Path<i64>,
    Query(query): Query<AvailabilityQuery>,
) -> HandlerResult<AvailabilityResponse> {
    let availability = services::is_range_available(
        state.repository.as_ref(),
        ListingId::new(listing_id),
        query.start_date,
        query.end_date,
        query.exclude_booking.map(BookingId::new),
    )
    .await?;

    Ok(Json(AvailabilityResponse {
        listing_id,
        start_date: query.start_date,
        end_date: query.end_date,
        available: availability.available,
        conflicting_booking_id: availability.conflicting_booking_id.map(|id| id.value()),
    }))
}

/// GET /v1/listings/{listing_id}/calendar
///
/// The occupied calendar dates across the listing's active bookings, for
/// rendering a disabled-dates calendar. Checkout days are not occupied.
pub async fn get_calendar(
    State(state): State<AppState>,
    Path(listing_id): Path<i64>,
) -> HandlerResult<CalendarResponse> {
    let blocked =
        services::blocked_dates(state.repository.as_ref(), ListingId::new(listing_id)).await?;

    Ok(Json(CalendarResponse {
        listing_id,
        blocked_dates: blocked.collect(),
    }))
}

/// GET /v1/listings/{listing_id}/bookings
///
/// Every booking for a listing regardless of status.
pub async fn list_listing_bookings(
    State(state): State<AppState>,
    Path(listing_id): Path<i64>,
) -> HandlerResult<BookingListResponse> {
    let id = ListingId::new(listing_id);
    db_services::get_listing(state.repository.as_ref(), id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Listing {} not found", listing_id)))?;

    let bookings = db_services::list_bookings_for_listing(state.repository.as_ref(), id).await?;
    let total = bookings.len();

    Ok(Json(BookingListResponse { bookings, total }))
}

// =============================================================================
// Bookings
// =============================================================================

/// POST /v1/bookings
///
/// Reserve `[start_date, end_date)` on a listing. Returns the created
/// booking with status `pending`, or 409 when the range is occupied.
pub async fn create_booking(
    State(state): State<AppState>,
    Json(request): Json<CreateBookingRequest>,
) -> Result<(StatusCode, Json<Booking>), AppError> {
    let booking = services::reserve(
        state.repository.as_ref(),
        ListingId::new(request.listing_id),
        request.start_date,
        request.end_date,
        request.guest,
        request.price,
    )
    .await?;

    Ok((StatusCode::CREATED, Json(booking)))
}

/// GET /v1/bookings/{booking_id}
///
/// Fetch a single booking.
pub async fn get_booking(
    State(state): State<AppState>,
    Path(booking_id): Path<i64>,
) -> HandlerResult<Booking> {
    let booking = db_services::get_booking(state.repository.as_ref(), BookingId::new(booking_id))
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Booking {} not found", booking_id)))?;

    Ok(Json(booking))
}

/// POST /v1/bookings/{booking_id}/confirm
///
/// Confirm a pending booking.
pub async fn confirm_booking(
    State(state): State<AppState>,
    Path(booking_id): Path<i64>,
) -> HandlerResult<Booking> {
    let booking =
        services::confirm(state.repository.as_ref(), BookingId::new(booking_id)).await?;
    Ok(Json(booking))
}

/// POST /v1/bookings/{booking_id}/cancel
///
/// Cancel a pending or confirmed booking. The freed range is immediately
/// available to new reservations.
pub async fn cancel_booking(
    State(state): State<AppState>,
    Path(booking_id): Path<i64>,
    Json(request): Json<CancelBookingRequest>,
) -> HandlerResult<Booking> {
    let booking = services::cancel(
        state.repository.as_ref(),
        BookingId::new(booking_id),
        request.actor_id,
    )
    .await?;
    Ok(Json(booking))
}

/// POST /v1/bookings/{booking_id}/complete
///
/// Mark a confirmed booking as completed once its checkout date has passed.
pub async fn complete_booking(
    State(state): State<AppState>,
    Path(booking_id): Path<i64>,
) -> HandlerResult<Booking> {
    let booking = services::complete(
        state.repository.as_ref(),
        BookingId::new(booking_id),
        Utc::now().date_naive(),
    )
    .await?;
    Ok(Json(booking))
}
