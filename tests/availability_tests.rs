//! Integration tests for the availability engine against the in-memory
//! repository.

use chrono::{Duration, NaiveDate};
use rand::{rngs::StdRng, Rng, SeedableRng};

use vrm_rust::api::{DateRange, GuestInfo, ListingId, Location, NewListing};
use vrm_rust::db::repositories::LocalRepository;
use vrm_rust::db::repository::ListingRepository;
use vrm_rust::services::{self, BookingError};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn guest() -> GuestInfo {
    GuestInfo {
        name: "Ada Lovelace".to_string(),
        email: "ada@example.com".to_string(),
    }
}

fn new_listing() -> NewListing {
    NewListing {
        host_id: "host-1".to_string(),
        title: "Harbor loft".to_string(),
        location: Location::new("4 Quay St", 41.38, 2.17).unwrap(),
        nightly_price: 100.0,
        min_stay_nights: None,
        max_stay_nights: None,
    }
}

async fn seed_listing(repo: &LocalRepository) -> ListingId {
    repo.insert_listing(new_listing()).await.unwrap().id
}

#[tokio::test]
async fn test_empty_listing_is_available() {
    let repo = LocalRepository::new();
    let listing = seed_listing(&repo).await;

    let availability = services::is_range_available(
        &repo,
        listing,
        date(2024, 3, 10),
        date(2024, 3, 12),
        None,
    )
    .await
    .unwrap();

    assert!(availability.available);
    assert_eq!(availability.conflicting_booking_id, None);
}

#[tokio::test]
async fn test_adjacent_range_is_available() {
    let repo = LocalRepository::new();
    let listing = seed_listing(&repo).await;

    services::reserve(&repo, listing, date(2024, 3, 12), date(2024, 3, 15), guest(), None)
        .await
        .unwrap();

    // Checkout day of the request equals check-in day of the existing booking.
    let availability = services::is_range_available(
        &repo,
        listing,
        date(2024, 3, 10),
        date(2024, 3, 12),
        None,
    )
    .await
    .unwrap();

    assert!(availability.available);
}

#[tokio::test]
async fn test_overlapping_range_names_conflicting_booking() {
    let repo = LocalRepository::new();
    let listing = seed_listing(&repo).await;

    let existing = services::reserve(
        &repo,
        listing,
        date(2024, 3, 12),
        date(2024, 3, 15),
        guest(),
        None,
    )
    .await
    .unwrap();

    let availability = services::is_range_available(
        &repo,
        listing,
        date(2024, 3, 11),
        date(2024, 3, 13),
        None,
    )
    .await
    .unwrap();

    assert!(!availability.available);
    assert_eq!(availability.conflicting_booking_id, Some(existing.id));
}

#[tokio::test]
async fn test_inverted_range_is_rejected_before_any_read() {
    let repo = LocalRepository::new();
    // Listing does not even exist; range validation must fire first.
    let err = services::is_range_available(
        &repo,
        ListingId::new(404),
        date(2024, 3, 12),
        date(2024, 3, 10),
        None,
    )
    .await
    .unwrap_err();

    assert!(matches!(err, BookingError::InvalidRange { .. }));
}

#[tokio::test]
async fn test_unknown_listing_is_not_found() {
    let repo = LocalRepository::new();
    let err = services::is_range_available(
        &repo,
        ListingId::new(404),
        date(2024, 3, 10),
        date(2024, 3, 12),
        None,
    )
    .await
    .unwrap_err();

    assert!(matches!(err, BookingError::NotFound { .. }));
}

#[tokio::test]
async fn test_exclusion_skips_own_booking() {
    let repo = LocalRepository::new();
    let listing = seed_listing(&repo).await;

    let booking = services::reserve(
        &repo,
        listing,
        date(2024, 3, 10),
        date(2024, 3, 14),
        guest(),
        None,
    )
    .await
    .unwrap();

    // Re-checking the same dates while amending the booking itself.
    let availability = services::is_range_available(
        &repo,
        listing,
        date(2024, 3, 11),
        date(2024, 3, 13),
        Some(booking.id),
    )
    .await
    .unwrap();

    assert!(availability.available);
}

#[tokio::test]
async fn test_reserve_conflict_reports_existing_booking() {
    let repo = LocalRepository::new();
    let listing = seed_listing(&repo).await;

    let existing = services::reserve(
        &repo,
        listing,
        date(2024, 4, 1),
        date(2024, 4, 5),
        guest(),
        None,
    )
    .await
    .unwrap();

    let err = services::reserve(
        &repo,
        listing,
        date(2024, 4, 3),
        date(2024, 4, 7),
        guest(),
        None,
    )
    .await
    .unwrap_err();

    match err {
        BookingError::DateRangeConflict { conflicting } => assert_eq!(conflicting, existing.id),
        other => panic!("expected conflict, got {:?}", other),
    }
}

#[tokio::test]
async fn test_reserve_derives_price_from_listing() {
    let repo = LocalRepository::new();
    let listing = seed_listing(&repo).await;

    let booking = services::reserve(
        &repo,
        listing,
        date(2024, 3, 10),
        date(2024, 3, 13),
        guest(),
        None,
    )
    .await
    .unwrap();

    // 3 nights at the listing's nightly price of 100.0
    assert_eq!(booking.price.nightly_subtotal, 300.0);
    assert_eq!(booking.price.total(), 300.0);
}

#[tokio::test]
async fn test_reserve_enforces_stay_bounds() {
    let repo = LocalRepository::new();
    let listing = repo
        .insert_listing(NewListing {
            min_stay_nights: Some(2),
            max_stay_nights: Some(7),
            ..new_listing()
        })
        .await
        .unwrap()
        .id;

    let too_short = services::reserve(
        &repo,
        listing,
        date(2024, 3, 10),
        date(2024, 3, 11),
        guest(),
        None,
    )
    .await
    .unwrap_err();
    assert!(matches!(too_short, BookingError::InvalidRange { .. }));

    let too_long = services::reserve(
        &repo,
        listing,
        date(2024, 3, 10),
        date(2024, 3, 20),
        guest(),
        None,
    )
    .await
    .unwrap_err();
    assert!(matches!(too_long, BookingError::InvalidRange { .. }));

    services::reserve(&repo, listing, date(2024, 3, 10), date(2024, 3, 13), guest(), None)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_blocked_dates_expansion() {
    let repo = LocalRepository::new();
    let listing = seed_listing(&repo).await;

    services::reserve(&repo, listing, date(2024, 3, 1), date(2024, 3, 3), guest(), None)
        .await
        .unwrap();
    services::reserve(&repo, listing, date(2024, 3, 5), date(2024, 3, 7), guest(), None)
        .await
        .unwrap();

    let blocked: Vec<NaiveDate> = services::blocked_dates(&repo, listing).await.unwrap().collect();

    assert_eq!(
        blocked,
        vec![
            date(2024, 3, 1),
            date(2024, 3, 2),
            date(2024, 3, 5),
            date(2024, 3, 6),
        ]
    );
}

#[tokio::test]
async fn test_blocked_dates_empty_for_new_listing() {
    let repo = LocalRepository::new();
    let listing = seed_listing(&repo).await;

    let blocked: Vec<NaiveDate> = services::blocked_dates(&repo, listing).await.unwrap().collect();
    assert!(blocked.is_empty());
}

#[tokio::test]
async fn test_randomized_availability_matches_overlap_predicate() {
    let repo = LocalRepository::new();
    let listing = seed_listing(&repo).await;
    let mut rng = StdRng::seed_from_u64(42);
    let base = date(2024, 1, 1);

    // Reserve random ranges; the engine decides which ones are accepted.
    let mut accepted: Vec<DateRange> = Vec::new();
    for _ in 0..40 {
        let start = base + Duration::days(rng.gen_range(0..120));
        let end = start + Duration::days(rng.gen_range(1..10));
        match services::reserve(&repo, listing, start, end, guest(), None).await {
            Ok(booking) => accepted.push(booking.range),
            Err(BookingError::DateRangeConflict { .. }) => {}
            Err(other) => panic!("unexpected error: {:?}", other),
        }
    }
    assert!(!accepted.is_empty());

    // Invariant: accepted ranges are pairwise non-overlapping.
    for i in 0..accepted.len() {
        for j in (i + 1)..accepted.len() {
            assert!(
                !accepted[i].overlaps(&accepted[j]),
                "{} overlaps {}",
                accepted[i],
                accepted[j]
            );
        }
    }

    // is_range_available must be the negation of "exists an overlapping
    // active booking".
    for _ in 0..60 {
        let start = base + Duration::days(rng.gen_range(0..130));
        let end = start + Duration::days(rng.gen_range(1..12));
        let range = DateRange::new(start, end).unwrap();

        let availability = services::is_range_available(&repo, listing, start, end, None)
            .await
            .unwrap();
        let expected = !accepted.iter().any(|r| r.overlaps(&range));
        assert_eq!(availability.available, expected, "range {}", range);
    }
}
