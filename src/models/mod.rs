//! Domain model for listings, bookings and calendar date ranges.
//!
//! Everything in this module is pure data and pure logic: the interval
//! arithmetic and the booking status machine have no knowledge of storage or
//! HTTP, so they are unit-testable in isolation.

pub mod booking;
pub mod date_range;
pub mod listing;

pub use booking::{Booking, BookingStatus, GuestInfo, NewBooking, PriceBreakdown};
pub use date_range::{BlockedDates, DateIter, DateRange};
pub use listing::{Listing, ListingUpdate, Location, NewListing};
