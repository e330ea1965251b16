//! End-to-end flow through the service layer against the local repository.

use chrono::NaiveDate;

use vrm_rust::api::{BookingStatus, GuestInfo, Location, NewListing, PriceBreakdown};
use vrm_rust::db::repositories::LocalRepository;
use vrm_rust::db::services as db_services;
use vrm_rust::services;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[tokio::test]
async fn test_full_booking_flow() {
    let repo = LocalRepository::new();

    // Host publishes a listing.
    let listing = db_services::create_listing(
        &repo,
        NewListing {
            host_id: "host-42".to_string(),
            title: "Old town apartment".to_string(),
            location: Location::new("12 Stone Ln", 50.08, 14.42).unwrap(),
            nightly_price: 75.0,
            min_stay_nights: Some(2),
            max_stay_nights: None,
        },
    )
    .await
    .unwrap();

    let listings = db_services::list_listings(&repo).await.unwrap();
    assert_eq!(listings.len(), 1);

    // Guest checks the dates, then books them.
    let availability = services::is_range_available(
        &repo,
        listing.id,
        date(2024, 7, 10),
        date(2024, 7, 14),
        None,
    )
    .await
    .unwrap();
    assert!(availability.available);

    let booking = services::reserve(
        &repo,
        listing.id,
        date(2024, 7, 10),
        date(2024, 7, 14),
        GuestInfo {
            name: "Nikola Tesla".to_string(),
            email: "nikola@example.com".to_string(),
        },
        Some(PriceBreakdown {
            nightly_subtotal: 300.0,
            fees: 40.0,
            taxes: 27.0,
        }),
    )
    .await
    .unwrap();
    assert_eq!(booking.status, BookingStatus::Pending);
    assert_eq!(booking.price.total(), 367.0);

    // The calendar now shows the stay, checkout day excluded.
    let blocked: Vec<NaiveDate> = services::blocked_dates(&repo, listing.id)
        .await
        .unwrap()
        .collect();
    assert_eq!(
        blocked,
        vec![
            date(2024, 7, 10),
            date(2024, 7, 11),
            date(2024, 7, 12),
            date(2024, 7, 13),
        ]
    );

    // A second guest cannot take an overlapping stay.
    let conflict = services::reserve(
        &repo,
        listing.id,
        date(2024, 7, 12),
        date(2024, 7, 16),
        GuestInfo {
            name: "Marie Curie".to_string(),
            email: "marie@example.com".to_string(),
        },
        None,
    )
    .await;
    assert!(conflict.is_err());

    // Host confirms, the stay happens, the booking completes.
    services::confirm(&repo, booking.id).await.unwrap();
    let completed = services::complete(&repo, booking.id, date(2024, 7, 14))
        .await
        .unwrap();
    assert_eq!(completed.status, BookingStatus::Completed);

    // History is preserved, dates are free again.
    let bookings = db_services::list_bookings_for_listing(&repo, listing.id)
        .await
        .unwrap();
    assert_eq!(bookings.len(), 1);

    let availability = services::is_range_available(
        &repo,
        listing.id,
        date(2024, 7, 10),
        date(2024, 7, 14),
        None,
    )
    .await
    .unwrap();
    assert!(availability.available);
}

#[tokio::test]
async fn test_listing_price_update_applies_to_new_quotes() {
    let repo = LocalRepository::new();
    let listing = db_services::create_listing(
        &repo,
        NewListing {
            host_id: "host-42".to_string(),
            title: "Studio".to_string(),
            location: Location::new("3 Mill Rd", 52.5, 13.4).unwrap(),
            nightly_price: 50.0,
            min_stay_nights: None,
            max_stay_nights: None,
        },
    )
    .await
    .unwrap();

    db_services::update_listing(
        &repo,
        listing.id,
        vrm_rust::api::ListingUpdate {
            nightly_price: Some(60.0),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    let booking = services::reserve(
        &repo,
        listing.id,
        date(2024, 8, 1),
        date(2024, 8, 3),
        GuestInfo {
            name: "Guest".to_string(),
            email: "g@example.com".to_string(),
        },
        None,
    )
    .await
    .unwrap();

    assert_eq!(booking.price.nightly_subtotal, 120.0);
}

#[tokio::test]
async fn test_health_check() {
    let repo = LocalRepository::new();
    assert!(db_services::health_check(&repo).await.unwrap());
}
