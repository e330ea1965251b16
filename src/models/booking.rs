use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::api::{BookingId, ListingId};
use crate::models::DateRange;

/// Lifecycle status of a booking.
///
/// Transitions form an explicit table (see [`BookingStatus::can_transition`]):
///
/// ```text
/// pending --confirm--> confirmed
/// pending | confirmed --cancel--> cancelled
/// confirmed --complete--> completed   (only after the checkout date elapses)
/// ```
///
/// `cancelled` and `completed` are terminal. Only `pending` and `confirmed`
/// bookings occupy their date range; the rest are kept for history and never
/// conflict with new reservations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
    Completed,
}

impl BookingStatus {
    /// Whether a booking in this status occupies its date range.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Pending | Self::Confirmed)
    }

    /// Whether this status admits no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Cancelled | Self::Completed)
    }

    /// The transition table. Every pair not listed here is illegal.
    pub fn can_transition(self, to: BookingStatus) -> bool {
        use BookingStatus::*;
        matches!(
            (self, to),
            (Pending, Confirmed)
                | (Pending, Cancelled)
                | (Confirmed, Cancelled)
                | (Confirmed, Completed)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Cancelled => "cancelled",
            Self::Completed => "completed",
        }
    }
}

impl std::str::FromStr for BookingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "confirmed" => Ok(Self::Confirmed),
            "cancelled" => Ok(Self::Cancelled),
            "completed" => Ok(Self::Completed),
            other => Err(format!("Unknown booking status: {}", other)),
        }
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of the guest a booking was made for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuestInfo {
    pub name: String,
    pub email: String,
}

/// Monetary breakdown of a booking.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceBreakdown {
    /// Nightly price times number of nights
    pub nightly_subtotal: f64,
    /// Service and cleaning fees
    pub fees: f64,
    /// Taxes
    pub taxes: f64,
}

impl PriceBreakdown {
    /// Derive a breakdown from a listing's nightly price, fees and taxes zero.
    pub fn from_nightly(nightly_price: f64, nights: i64) -> Self {
        Self {
            nightly_subtotal: nightly_price * nights as f64,
            fees: 0.0,
            taxes: 0.0,
        }
    }

    pub fn total(&self) -> f64 {
        self.nightly_subtotal + self.fees + self.taxes
    }
}

/// A reservation for a listing over a half-open date range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    pub id: BookingId,
    pub listing_id: ListingId,
    pub range: DateRange,
    pub status: BookingStatus,
    pub guest: GuestInfo,
    pub price: PriceBreakdown,
    pub created_at: DateTime<Utc>,
    /// Actor that cancelled the booking, recorded on cancellation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancelled_by: Option<String>,
}

/// Reservation request as handed to the repository; the id, the `pending`
/// status and the creation timestamp are assigned on insert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewBooking {
    pub listing_id: ListingId,
    pub range: DateRange,
    pub guest: GuestInfo,
    pub price: PriceBreakdown,
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    use BookingStatus::*;

    #[test_case(Pending, Confirmed, true; "confirm pending")]
    #[test_case(Pending, Cancelled, true; "cancel pending")]
    #[test_case(Confirmed, Cancelled, true; "cancel confirmed")]
    #[test_case(Confirmed, Completed, true; "complete confirmed")]
    #[test_case(Pending, Completed, false; "pending cannot complete")]
    #[test_case(Confirmed, Confirmed, false; "confirm twice")]
    #[test_case(Cancelled, Cancelled, false; "cancel twice")]
    #[test_case(Cancelled, Confirmed, false; "cancelled is terminal")]
    #[test_case(Cancelled, Pending, false; "no way back to pending")]
    #[test_case(Completed, Cancelled, false; "completed is terminal")]
    #[test_case(Completed, Confirmed, false; "completed cannot reopen")]
    fn test_transition_table(from: BookingStatus, to: BookingStatus, legal: bool) {
        assert_eq!(from.can_transition(to), legal);
    }

    #[test]
    fn test_active_statuses() {
        assert!(Pending.is_active());
        assert!(Confirmed.is_active());
        assert!(!Cancelled.is_active());
        assert!(!Completed.is_active());
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(!Pending.is_terminal());
        assert!(!Confirmed.is_terminal());
        assert!(Cancelled.is_terminal());
        assert!(Completed.is_terminal());
    }

    #[test]
    fn test_status_round_trip() {
        for status in [Pending, Confirmed, Cancelled, Completed] {
            let parsed: BookingStatus = status.as_str().parse().unwrap();
            assert_eq!(parsed, status);
        }
        assert!("unknown".parse::<BookingStatus>().is_err());
    }

    #[test]
    fn test_status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_value(Confirmed).unwrap(),
            serde_json::json!("confirmed")
        );
    }

    #[test]
    fn test_price_total() {
        let price = PriceBreakdown {
            nightly_subtotal: 400.0,
            fees: 50.0,
            taxes: 36.0,
        };
        assert_eq!(price.total(), 486.0);
    }

    #[test]
    fn test_price_from_nightly() {
        let price = PriceBreakdown::from_nightly(120.0, 3);
        assert_eq!(price.nightly_subtotal, 360.0);
        assert_eq!(price.total(), 360.0);
    }
}
