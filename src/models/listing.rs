use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::api::ListingId;

/// Geographic location of a listing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Location {
    /// Street address or free-text description
    pub address: String,
    /// Latitude in decimal degrees (-90 to 90)
    pub latitude: f64,
    /// Longitude in decimal degrees (-180 to 180)
    pub longitude: f64,
}

impl Location {
    pub fn new(address: impl Into<String>, latitude: f64, longitude: f64) -> Result<Self, String> {
        if !(-90.0..=90.0).contains(&latitude) {
            return Err("Latitude must be between -90 and 90 degrees".to_string());
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err("Longitude must be between -180 and 180 degrees".to_string());
        }
        Ok(Self {
            address: address.into(),
            latitude,
            longitude,
        })
    }
}

/// A rental listing. Identity is immutable; pricing and metadata may change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    pub id: ListingId,
    /// Account that owns the listing
    pub host_id: String,
    pub title: String,
    pub location: Location,
    /// Price per night in the marketplace currency
    pub nightly_price: f64,
    /// Minimum stay length in nights, if the host enforces one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_stay_nights: Option<u32>,
    /// Maximum stay length in nights, if the host enforces one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_stay_nights: Option<u32>,
    pub created_at: DateTime<Utc>,
}

/// Listing data as handed to the repository; the id and creation timestamp
/// are assigned on insert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewListing {
    pub host_id: String,
    pub title: String,
    pub location: Location,
    pub nightly_price: f64,
    #[serde(default)]
    pub min_stay_nights: Option<u32>,
    #[serde(default)]
    pub max_stay_nights: Option<u32>,
}

/// Partial update of a listing's mutable fields. `None` leaves a field as is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListingUpdate {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub nightly_price: Option<f64>,
    #[serde(default)]
    pub min_stay_nights: Option<u32>,
    #[serde(default)]
    pub max_stay_nights: Option<u32>,
}

impl ListingUpdate {
    /// Apply the update to an existing listing.
    pub fn apply(&self, listing: &mut Listing) {
        if let Some(title) = &self.title {
            listing.title = title.clone();
        }
        if let Some(price) = self.nightly_price {
            listing.nightly_price = price;
        }
        if let Some(min) = self.min_stay_nights {
            listing.min_stay_nights = Some(min);
        }
        if let Some(max) = self.max_stay_nights {
            listing.max_stay_nights = Some(max);
        }
    }
}
