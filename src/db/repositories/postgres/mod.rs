//! Postgres repository implementation using Diesel.
//!
//! This module implements the repository traits against a Postgres database.
//!
//! ## Features
//!
//! - Connection pooling with r2d2
//! - Automatic retry for transient failures
//! - Connection health monitoring
//! - Automatic migration execution
//!
//! ## Concurrency
//!
//! `reserve_booking` row-locks the listing (`SELECT ... FOR UPDATE`) inside a
//! transaction before checking for overlapping active bookings, so the
//! check-then-insert step is atomic per listing while other listings proceed
//! on their own rows. Status changes lock the booking row and compare the
//! stored status before writing.
//!
//! ## Configuration
//!
//! Environment variables:
//! - `DATABASE_URL` or `PG_DATABASE_URL`: Connection string (required)
//! - `PG_POOL_MAX`: Maximum pool size (default: 10)
//! - `PG_POOL_MIN`: Minimum pool size (default: 1)
//! - `PG_CONN_TIMEOUT_SEC`: Connection timeout in seconds (default: 30)
//! - `PG_IDLE_TIMEOUT_SEC`: Idle connection timeout in seconds (default: 600)
//! - `PG_MAX_RETRIES`: Maximum retry attempts for transient failures (default: 3)
//! - `PG_RETRY_DELAY_MS`: Initial retry delay in milliseconds (default: 100)

use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::sql_query;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tokio::task;

use crate::api::{
    Booking, BookingId, BookingStatus, Listing, ListingId, ListingUpdate, NewBooking, NewListing,
};
use crate::db::repository::{
    BookingRepository, ErrorContext, FullRepository, ListingRepository, RepositoryError,
    RepositoryResult, ReserveOutcome, StatusUpdate,
};

mod models;
mod schema;

use models::*;
use schema::{bookings, listings};

type PgPool = Pool<ConnectionManager<PgConnection>>;

const MIGRATIONS: EmbeddedMigrations = embed_migrations!("src/db/repositories/postgres/migrations");

/// Configuration for connecting to Postgres.
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    /// Database connection URL
    pub database_url: String,
    /// Maximum number of connections in the pool
    pub max_pool_size: u32,
    /// Minimum number of connections in the pool
    pub min_pool_size: u32,
    /// Connection timeout in seconds
    pub connection_timeout_sec: u64,
    /// Idle connection timeout in seconds
    pub idle_timeout_sec: u64,
    /// Maximum number of retry attempts for transient failures
    pub max_retries: u32,
    /// Initial retry delay in milliseconds (doubles with each retry)
    pub retry_delay_ms: u64,
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            database_url: String::new(),
            max_pool_size: 10,
            min_pool_size: 1,
            connection_timeout_sec: 30,
            idle_timeout_sec: 600,
            max_retries: 3,
            retry_delay_ms: 100,
        }
    }
}

impl PostgresConfig {
    /// Create configuration from environment variables.
    pub fn from_env() -> Result<Self, String> {
        let database_url = std::env::var("DATABASE_URL")
            .or_else(|_| std::env::var("PG_DATABASE_URL"))
            .map_err(|_| "DATABASE_URL or PG_DATABASE_URL must be set".to_string())?;

        let max_pool_size = std::env::var("PG_POOL_MAX")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(10);

        let min_pool_size = std::env::var("PG_POOL_MIN")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(1);

        let connection_timeout_sec = std::env::var("PG_CONN_TIMEOUT_SEC")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(30);

        let idle_timeout_sec = std::env::var("PG_IDLE_TIMEOUT_SEC")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(600);

        let max_retries = std::env::var("PG_MAX_RETRIES")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(3);

        let retry_delay_ms = std::env::var("PG_RETRY_DELAY_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(100);

        Ok(Self {
            database_url,
            max_pool_size,
            min_pool_size,
            connection_timeout_sec,
            idle_timeout_sec,
            max_retries,
            retry_delay_ms,
        })
    }

    /// Create a new configuration with a database URL.
    pub fn with_url(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            ..Default::default()
        }
    }
}

/// Pool health statistics.
#[derive(Debug, Clone, Default)]
pub struct PoolStats {
    /// Number of connections currently in use
    pub connections_in_use: u32,
    /// Number of idle connections
    pub idle_connections: u32,
    /// Total number of connections in the pool
    pub total_connections: u32,
    /// Maximum pool size
    pub max_size: u32,
    /// Total successful queries executed
    pub total_queries: u64,
    /// Total failed queries
    pub failed_queries: u64,
    /// Total retried operations
    pub retried_operations: u64,
}

/// Diesel-backed repository for Postgres.
#[derive(Clone, Debug)]
pub struct PostgresRepository {
    pool: PgPool,
    config: PostgresConfig,
    // Metrics counters
    total_queries: std::sync::Arc<AtomicU64>,
    failed_queries: std::sync::Arc<AtomicU64>,
    retried_operations: std::sync::Arc<AtomicU64>,
}

impl PostgresRepository {
    /// Create a new repository and run pending migrations.
    pub fn new(config: PostgresConfig) -> RepositoryResult<Self> {
        let manager = ConnectionManager::<PgConnection>::new(&config.database_url);

        let pool = Pool::builder()
            .max_size(config.max_pool_size)
            .min_idle(Some(config.min_pool_size))
            .connection_timeout(Duration::from_secs(config.connection_timeout_sec))
            .idle_timeout(Some(Duration::from_secs(config.idle_timeout_sec)))
            .test_on_check_out(true) // Validate connections before use
            .build(manager)
            .map_err(|e| {
                RepositoryError::connection_with_context(
                    e.to_string(),
                    ErrorContext::new("create_pool")
                        .with_details(format!("max_size={}", config.max_pool_size)),
                )
            })?;

        // Run migrations once during initialization
        {
            let mut conn = pool.get().map_err(|e| {
                RepositoryError::connection_with_context(
                    e.to_string(),
                    ErrorContext::new("get_connection_for_migrations"),
                )
            })?;
            Self::run_migrations(&mut conn)?;
        }

        Ok(Self {
            pool,
            config,
            total_queries: std::sync::Arc::new(AtomicU64::new(0)),
            failed_queries: std::sync::Arc::new(AtomicU64::new(0)),
            retried_operations: std::sync::Arc::new(AtomicU64::new(0)),
        })
    }

    /// Run pending database migrations.
    fn run_migrations(conn: &mut PgConnection) -> RepositoryResult<()> {
        conn.run_pending_migrations(MIGRATIONS).map_err(|e| {
            RepositoryError::internal_with_context(
                format!("Migration failed: {}", e),
                ErrorContext::new("run_migrations"),
            )
        })?;

        Ok(())
    }

    /// Execute a database operation with automatic retry for transient failures.
    ///
    /// This method will retry the operation up to `max_retries` times if a
    /// retryable error occurs (connection errors, timeouts, serialization failures).
    async fn with_conn<T, F>(&self, f: F) -> RepositoryResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut PgConnection) -> RepositoryResult<T> + Send + 'static + Clone,
    {
        let pool = self.pool.clone();
        let max_retries = self.config.max_retries;
        let retry_delay_ms = self.config.retry_delay_ms;
        let total_queries = self.total_queries.clone();
        let failed_queries = self.failed_queries.clone();
        let retried_operations = self.retried_operations.clone();

        task::spawn_blocking(move || {
            let mut last_error = None;
            let mut retry_delay = Duration::from_millis(retry_delay_ms);

            for attempt in 0..=max_retries {
                if attempt > 0 {
                    retried_operations.fetch_add(1, Ordering::Relaxed);
                    std::thread::sleep(retry_delay);
                    retry_delay *= 2; // Exponential backoff
                }

                // Get connection
                let mut conn = match pool.get() {
                    Ok(c) => c,
                    Err(e) => {
                        let err = RepositoryError::connection_with_context(
                            e.to_string(),
                            ErrorContext::new("get_connection")
                                .with_details(format!("attempt={}", attempt + 1))
                                .retryable(),
                        );
                        if attempt < max_retries {
                            last_error = Some(err);
                            continue;
                        }
                        failed_queries.fetch_add(1, Ordering::Relaxed);
                        return Err(err);
                    }
                };

                // Execute the operation
                total_queries.fetch_add(1, Ordering::Relaxed);
                match f.clone()(&mut conn) {
                    Ok(result) => return Ok(result),
                    Err(e) if e.is_retryable() && attempt < max_retries => {
                        last_error = Some(e);
                        continue;
                    }
                    Err(e) => {
                        failed_queries.fetch_add(1, Ordering::Relaxed);
                        return Err(e);
                    }
                }
            }

            failed_queries.fetch_add(1, Ordering::Relaxed);
            Err(last_error.unwrap_or_else(|| {
                RepositoryError::internal("Max retries exceeded with no error captured")
            }))
        })
        .await
        .map_err(|e| {
            RepositoryError::internal_with_context(
                format!("Task join error: {}", e),
                ErrorContext::new("spawn_blocking"),
            )
        })?
    }

    /// Get pool health statistics.
    pub fn get_pool_stats(&self) -> PoolStats {
        let state = self.pool.state();
        PoolStats {
            connections_in_use: state.connections - state.idle_connections,
            idle_connections: state.idle_connections,
            total_connections: state.connections,
            max_size: self.config.max_pool_size,
            total_queries: self.total_queries.load(Ordering::Relaxed),
            failed_queries: self.failed_queries.load(Ordering::Relaxed),
            retried_operations: self.retried_operations.load(Ordering::Relaxed),
        }
    }

    /// Check if the database connection is healthy.
    pub async fn is_healthy(&self) -> bool {
        self.health_check().await.unwrap_or(false)
    }

    /// Get detailed health information.
    ///
    /// Returns a tuple of (is_healthy, latency_ms, error_message).
    pub async fn health_check_detailed(&self) -> (bool, Option<u64>, Option<String>) {
        let start = Instant::now();
        match self.health_check().await {
            Ok(true) => (true, Some(start.elapsed().as_millis() as u64), None),
            Ok(false) => (
                false,
                Some(start.elapsed().as_millis() as u64),
                Some("Health check returned false".to_string()),
            ),
            Err(e) => (
                false,
                Some(start.elapsed().as_millis() as u64),
                Some(e.to_string()),
            ),
        }
    }
}

fn active_statuses() -> Vec<&'static str> {
    vec![
        BookingStatus::Pending.as_str(),
        BookingStatus::Confirmed.as_str(),
    ]
}

#[async_trait]
impl ListingRepository for PostgresRepository {
    async fn insert_listing(&self, listing: NewListing) -> RepositoryResult<Listing> {
        let row = NewListingRow::from(listing);
        let inserted = self
            .with_conn(move |conn| {
                diesel::insert_into(listings::table)
                    .values(row.clone())
                    .get_result::<ListingRow>(conn)
                    .map_err(RepositoryError::from)
            })
            .await?;
        Ok(row_to_listing(inserted))
    }

    async fn fetch_listing(&self, id: ListingId) -> RepositoryResult<Option<Listing>> {
        let row = self
            .with_conn(move |conn| {
                listings::table
                    .filter(listings::listing_id.eq(id.value()))
                    .first::<ListingRow>(conn)
                    .optional()
                    .map_err(RepositoryError::from)
            })
            .await?;
        Ok(row.map(row_to_listing))
    }

    async fn list_listings(&self) -> RepositoryResult<Vec<Listing>> {
        let rows = self
            .with_conn(|conn| {
                listings::table
                    .order(listings::listing_id.asc())
                    .load::<ListingRow>(conn)
                    .map_err(RepositoryError::from)
            })
            .await?;
        Ok(rows.into_iter().map(row_to_listing).collect())
    }

    async fn update_listing(
        &self,
        id: ListingId,
        update: ListingUpdate,
    ) -> RepositoryResult<Listing> {
        let updated = self
            .with_conn(move |conn| {
                conn.transaction::<ListingRow, RepositoryError, _>(|tx| {
                    let row = listings::table
                        .filter(listings::listing_id.eq(id.value()))
                        .for_update()
                        .first::<ListingRow>(tx)
                        .optional()?
                        .ok_or_else(|| {
                            RepositoryError::not_found_with_context(
                                format!("Listing {} not found", id),
                                ErrorContext::new("update_listing")
                                    .with_entity("listing")
                                    .with_entity_id(id),
                            )
                        })?;

                    let mut listing = row_to_listing(row);
                    update.apply(&mut listing);

                    diesel::update(
                        listings::table.filter(listings::listing_id.eq(id.value())),
                    )
                    .set((
                        listings::title.eq(listing.title.clone()),
                        listings::nightly_price.eq(listing.nightly_price),
                        listings::min_stay_nights.eq(listing.min_stay_nights.map(|n| n as i32)),
                        listings::max_stay_nights.eq(listing.max_stay_nights.map(|n| n as i32)),
                    ))
                    .get_result::<ListingRow>(tx)
                    .map_err(RepositoryError::from)
                })
            })
            .await?;
        Ok(row_to_listing(updated))
    }

    async fn health_check(&self) -> RepositoryResult<bool> {
        self.with_conn(|conn| {
            sql_query("SELECT 1")
                .execute(conn)
                .map_err(RepositoryError::from)
        })
        .await?;
        Ok(true)
    }
}

#[async_trait]
impl BookingRepository for PostgresRepository {
    async fn list_active_bookings(
        &self,
        listing_id: ListingId,
    ) -> RepositoryResult<Vec<Booking>> {
        let rows = self
            .with_conn(move |conn| {
                bookings::table
                    .filter(bookings::listing_id.eq(listing_id.value()))
                    .filter(bookings::status.eq_any(active_statuses()))
                    .order(bookings::booking_id.asc())
                    .load::<BookingRow>(conn)
                    .map_err(RepositoryError::from)
            })
            .await?;
        rows.into_iter().map(row_to_booking).collect()
    }

    async fn list_bookings(&self, listing_id: ListingId) -> RepositoryResult<Vec<Booking>> {
        let rows = self
            .with_conn(move |conn| {
                bookings::table
                    .filter(bookings::listing_id.eq(listing_id.value()))
                    .order(bookings::booking_id.asc())
                    .load::<BookingRow>(conn)
                    .map_err(RepositoryError::from)
            })
            .await?;
        rows.into_iter().map(row_to_booking).collect()
    }

    async fn fetch_booking(&self, id: BookingId) -> RepositoryResult<Option<Booking>> {
        let row = self
            .with_conn(move |conn| {
                bookings::table
                    .filter(bookings::booking_id.eq(id.value()))
                    .first::<BookingRow>(conn)
                    .optional()
                    .map_err(RepositoryError::from)
            })
            .await?;
        row.map(row_to_booking).transpose()
    }

    async fn reserve_booking(&self, booking: NewBooking) -> RepositoryResult<ReserveOutcome> {
        self.with_conn(move |conn| {
            let request = booking.clone();
            conn.transaction::<ReserveOutcome, RepositoryError, _>(|tx| {
                // Row-lock the listing; this is the per-listing contention
                // point that serializes concurrent reserve attempts.
                let listing = listings::table
                    .filter(listings::listing_id.eq(request.listing_id.value()))
                    .for_update()
                    .first::<ListingRow>(tx)
                    .optional()?;
                if listing.is_none() {
                    return Err(RepositoryError::not_found_with_context(
                        format!("Listing {} not found", request.listing_id),
                        ErrorContext::new("reserve_booking")
                            .with_entity("listing")
                            .with_entity_id(request.listing_id),
                    ));
                }

                let active = bookings::table
                    .filter(bookings::listing_id.eq(request.listing_id.value()))
                    .filter(bookings::status.eq_any(active_statuses()))
                    .load::<BookingRow>(tx)?;

                for row in active {
                    let existing = row_to_booking(row)?;
                    if existing.range.overlaps(&request.range) {
                        return Ok(ReserveOutcome::Conflict {
                            existing: existing.id,
                        });
                    }
                }

                let inserted = diesel::insert_into(bookings::table)
                    .values(NewBookingRow::from(request))
                    .get_result::<BookingRow>(tx)?;
                Ok(ReserveOutcome::Created(row_to_booking(inserted)?))
            })
        })
        .await
    }

    async fn update_booking_status(
        &self,
        id: BookingId,
        from: BookingStatus,
        to: BookingStatus,
        actor: Option<String>,
    ) -> RepositoryResult<StatusUpdate> {
        self.with_conn(move |conn| {
            let actor = actor.clone();
            conn.transaction::<StatusUpdate, RepositoryError, _>(|tx| {
                let row = bookings::table
                    .filter(bookings::booking_id.eq(id.value()))
                    .for_update()
                    .first::<BookingRow>(tx)
                    .optional()?
                    .ok_or_else(|| {
                        RepositoryError::not_found_with_context(
                            format!("Booking {} not found", id),
                            ErrorContext::new("update_booking_status")
                                .with_entity("booking")
                                .with_entity_id(id),
                        )
                    })?;

                let actual: BookingStatus = row.status.parse().map_err(|e: String| {
                    RepositoryError::internal(format!("Corrupt status column: {}", e))
                })?;
                if actual != from {
                    return Ok(StatusUpdate::StaleStatus { actual });
                }

                let cancelled_by = if to == BookingStatus::Cancelled {
                    actor
                } else {
                    row.cancelled_by
                };

                let updated = diesel::update(
                    bookings::table.filter(bookings::booking_id.eq(id.value())),
                )
                .set((
                    bookings::status.eq(to.as_str()),
                    bookings::cancelled_by.eq(cancelled_by),
                ))
                .get_result::<BookingRow>(tx)?;
                Ok(StatusUpdate::Updated(row_to_booking(updated)?))
            })
        })
        .await
    }
}

impl FullRepository for PostgresRepository {}
