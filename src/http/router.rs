//! Router configuration for the HTTP API.
//!
//! This module sets up all routes, middleware (CORS, compression, tracing),
//! and creates the axum router ready for serving.

use axum::{
    routing::{get, patch, post},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers;
use super::state::AppState;

/// Create the main application router with all routes and middleware.
pub fn create_router(state: AppState) -> Router {
    // CORS configuration - permissive for development, should be restricted in production
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build the API router with versioned endpoints
    let api_v1 = Router::new()
        // Listing CRUD
        .route("/listings", get(handlers::list_listings))
        .route("/listings", post(handlers::create_listing))
        .route("/listings/{listing_id}", get(handlers::get_listing))
        .route("/listings/{listing_id}", patch(handlers::update_listing))
        // Availability
        .route(
            "/listings/{listing_id}/availability",
            get(handlers::get_availability),
        )
        .route("/listings/{listing_id}/calendar", get(handlers::get_calendar))
        .route(
            "/listings/{listing_id}/bookings",
            get(handlers::list_listing_bookings),
        )
        // Bookings
        .route("/bookings", post(handlers::create_booking))
        .route("/bookings/{booking_id}", get(handlers::get_booking))
        .route(
            "/bookings/{booking_id}/confirm",
            post(handlers::confirm_booking),
        )
        .route(
            "/bookings/{booking_id}/cancel",
            post(handlers::cancel_booking),
        )
        .route(
            "/bookings/{booking_id}/complete",
            post(handlers::complete_booking),
        );

    // Combine all routes
    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/v1", api_v1)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
