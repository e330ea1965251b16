//! # Vacation Rental Marketplace Backend
//!
//! Rust backend for a vacation-rental marketplace. The core of the crate is
//! the availability engine: date-range validation and overlap checks for
//! reservations against a listing's calendar, with a non-overlap invariant
//! enforced atomically when a reservation is committed. The backend exposes a
//! REST API via Axum for the React frontend.
//!
//! ## Features
//!
//! - **Availability**: half-open date-range overlap checks and blocked-date
//!   calendars per listing
//! - **Reservations**: atomic check-then-insert with per-listing
//!   serialization, so concurrent conflicting requests cannot both succeed
//! - **Lifecycle**: explicit booking status machine
//!   (pending/confirmed/cancelled/completed) with illegal transitions
//!   reported, never ignored
//! - **HTTP API**: RESTful endpoints for frontend integration
//!
//! ## Architecture
//!
//! The crate is organized into several logical modules:
//!
//! - [`api`]: identifier newtypes and the serializable API surface
//! - [`models`]: pure domain model (date ranges, bookings, listings)
//! - [`db`]: database operations, repository pattern, and persistence layer
//! - [`services`]: availability engine and booking lifecycle
//! - [`http`]: Axum-based HTTP server and request handlers

pub mod api;

pub mod db;
pub mod models;

pub mod services;

#[cfg(feature = "http-server")]
pub mod http;
