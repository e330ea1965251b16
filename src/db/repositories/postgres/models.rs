use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;

use super::schema::{bookings, listings};
use crate::api::{
    Booking, BookingId, BookingStatus, DateRange, GuestInfo, Listing, ListingId, Location,
    NewBooking, NewListing, PriceBreakdown,
};
use crate::db::repository::{RepositoryError, RepositoryResult};

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = listings)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ListingRow {
    pub listing_id: i64,
    pub host_id: String,
    pub title: String,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    pub nightly_price: f64,
    pub min_stay_nights: Option<i32>,
    pub max_stay_nights: Option<i32>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = listings)]
pub struct NewListingRow {
    pub host_id: String,
    pub title: String,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    pub nightly_price: f64,
    pub min_stay_nights: Option<i32>,
    pub max_stay_nights: Option<i32>,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = bookings)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct BookingRow {
    pub booking_id: i64,
    pub listing_id: i64,
    pub guest_name: String,
    pub guest_email: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: String,
    pub nightly_subtotal: f64,
    pub fees: f64,
    pub taxes: f64,
    pub cancelled_by: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = bookings)]
pub struct NewBookingRow {
    pub listing_id: i64,
    pub guest_name: String,
    pub guest_email: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: String,
    pub nightly_subtotal: f64,
    pub fees: f64,
    pub taxes: f64,
}

impl From<NewListing> for NewListingRow {
    fn from(listing: NewListing) -> Self {
        Self {
            host_id: listing.host_id,
            title: listing.title,
            address: listing.location.address,
            latitude: listing.location.latitude,
            longitude: listing.location.longitude,
            nightly_price: listing.nightly_price,
            min_stay_nights: listing.min_stay_nights.map(|n| n as i32),
            max_stay_nights: listing.max_stay_nights.map(|n| n as i32),
        }
    }
}

impl From<NewBooking> for NewBookingRow {
    fn from(booking: NewBooking) -> Self {
        Self {
            listing_id: booking.listing_id.value(),
            guest_name: booking.guest.name,
            guest_email: booking.guest.email,
            start_date: booking.range.start,
            end_date: booking.range.end,
            status: BookingStatus::Pending.as_str().to_string(),
            nightly_subtotal: booking.price.nightly_subtotal,
            fees: booking.price.fees,
            taxes: booking.price.taxes,
        }
    }
}

pub fn row_to_listing(row: ListingRow) -> Listing {
    Listing {
        id: ListingId::new(row.listing_id),
        host_id: row.host_id,
        title: row.title,
        location: Location {
            address: row.address,
            latitude: row.latitude,
            longitude: row.longitude,
        },
        nightly_price: row.nightly_price,
        min_stay_nights: row.min_stay_nights.map(|n| n as u32),
        max_stay_nights: row.max_stay_nights.map(|n| n as u32),
        created_at: row.created_at,
    }
}

pub fn row_to_booking(row: BookingRow) -> RepositoryResult<Booking> {
    let status: BookingStatus = row
        .status
        .parse()
        .map_err(|e: String| RepositoryError::internal(format!("Corrupt status column: {}", e)))?;
    let range = DateRange::new(row.start_date, row.end_date).ok_or_else(|| {
        RepositoryError::internal(format!(
            "Corrupt booking {}: start_date {} not before end_date {}",
            row.booking_id, row.start_date, row.end_date
        ))
    })?;

    Ok(Booking {
        id: BookingId::new(row.booking_id),
        listing_id: ListingId::new(row.listing_id),
        range,
        status,
        guest: GuestInfo {
            name: row.guest_name,
            email: row.guest_email,
        },
        price: PriceBreakdown {
            nightly_subtotal: row.nightly_subtotal,
            fees: row.fees,
            taxes: row.taxes,
        },
        created_at: row.created_at,
        cancelled_by: row.cancelled_by,
    })
}
