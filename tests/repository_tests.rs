//! Tests for the local repository, the factory and configuration loading.

mod support;

use chrono::NaiveDate;

use vrm_rust::api::{
    BookingId, BookingStatus, DateRange, GuestInfo, ListingId, ListingUpdate, Location,
    NewBooking, NewListing, PriceBreakdown,
};
use vrm_rust::db::repositories::LocalRepository;
use vrm_rust::db::repository::{
    BookingRepository, ListingRepository, RepositoryError, ReserveOutcome, StatusUpdate,
};
use vrm_rust::db::{RepositoryFactory, RepositoryType};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn new_listing(title: &str) -> NewListing {
    NewListing {
        host_id: "host-1".to_string(),
        title: title.to_string(),
        location: Location::new("9 Main St", 48.8, 2.3).unwrap(),
        nightly_price: 90.0,
        min_stay_nights: None,
        max_stay_nights: None,
    }
}

fn new_booking(listing_id: ListingId, start: NaiveDate, end: NaiveDate) -> NewBooking {
    NewBooking {
        listing_id,
        range: DateRange::new(start, end).unwrap(),
        guest: GuestInfo {
            name: "Mary Shelley".to_string(),
            email: "mary@example.com".to_string(),
        },
        price: PriceBreakdown::from_nightly(90.0, 2),
    }
}

#[tokio::test]
async fn test_listing_round_trip() {
    let repo = LocalRepository::new();
    let created = repo.insert_listing(new_listing("Loft")).await.unwrap();

    let fetched = repo.fetch_listing(created.id).await.unwrap().unwrap();
    assert_eq!(fetched, created);

    assert!(repo
        .fetch_listing(ListingId::new(999))
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_list_listings_sorted_by_id() {
    let repo = LocalRepository::new();
    repo.insert_listing(new_listing("A")).await.unwrap();
    repo.insert_listing(new_listing("B")).await.unwrap();
    repo.insert_listing(new_listing("C")).await.unwrap();

    let listings = repo.list_listings().await.unwrap();
    assert_eq!(listings.len(), 3);
    assert!(listings.windows(2).all(|w| w[0].id < w[1].id));
}

#[tokio::test]
async fn test_update_listing_mutable_fields() {
    let repo = LocalRepository::new();
    let listing = repo.insert_listing(new_listing("Loft")).await.unwrap();

    let updated = repo
        .update_listing(
            listing.id,
            ListingUpdate {
                title: Some("Renovated loft".to_string()),
                nightly_price: Some(110.0),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.title, "Renovated loft");
    assert_eq!(updated.nightly_price, 110.0);
    // Identity untouched
    assert_eq!(updated.id, listing.id);
    assert_eq!(updated.host_id, listing.host_id);
}

#[tokio::test]
async fn test_update_unknown_listing_fails() {
    let repo = LocalRepository::new();
    let err = repo
        .update_listing(ListingId::new(404), ListingUpdate::default())
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::NotFound { .. }));
}

#[tokio::test]
async fn test_list_bookings_includes_inactive() {
    let repo = LocalRepository::new();
    let listing = repo.insert_listing(new_listing("Loft")).await.unwrap();

    let first = match repo
        .reserve_booking(new_booking(listing.id, date(2024, 3, 1), date(2024, 3, 3)))
        .await
        .unwrap()
    {
        ReserveOutcome::Created(b) => b,
        other => panic!("expected created, got {:?}", other),
    };
    repo.update_booking_status(
        first.id,
        BookingStatus::Pending,
        BookingStatus::Cancelled,
        Some("guest-1".to_string()),
    )
    .await
    .unwrap();

    repo.reserve_booking(new_booking(listing.id, date(2024, 3, 1), date(2024, 3, 3)))
        .await
        .unwrap();

    let all = repo.list_bookings(listing.id).await.unwrap();
    let active = repo.list_active_bookings(listing.id).await.unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(active.len(), 1);
}

#[tokio::test]
async fn test_cancelled_booking_keeps_history() {
    let repo = LocalRepository::new();
    let listing = repo.insert_listing(new_listing("Loft")).await.unwrap();

    let booking = match repo
        .reserve_booking(new_booking(listing.id, date(2024, 3, 1), date(2024, 3, 3)))
        .await
        .unwrap()
    {
        ReserveOutcome::Created(b) => b,
        other => panic!("expected created, got {:?}", other),
    };

    let update = repo
        .update_booking_status(
            booking.id,
            BookingStatus::Pending,
            BookingStatus::Cancelled,
            Some("host-1".to_string()),
        )
        .await
        .unwrap();
    let cancelled = match update {
        StatusUpdate::Updated(b) => b,
        other => panic!("expected updated, got {:?}", other),
    };
    assert_eq!(cancelled.cancelled_by.as_deref(), Some("host-1"));

    // Soft lifecycle: the record is still there.
    let fetched = repo.fetch_booking(booking.id).await.unwrap().unwrap();
    assert_eq!(fetched.status, BookingStatus::Cancelled);
}

#[tokio::test]
async fn test_status_update_unknown_booking_fails() {
    let repo = LocalRepository::new();
    let err = repo
        .update_booking_status(
            BookingId::new(404),
            BookingStatus::Pending,
            BookingStatus::Confirmed,
            None,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::NotFound { .. }));
}

#[tokio::test]
async fn test_factory_creates_local_repository() {
    let repo = RepositoryFactory::create(RepositoryType::Local, None)
        .await
        .unwrap();
    assert!(repo.health_check().await.unwrap());
}

#[test]
fn test_repository_type_from_env() {
    support::with_scoped_env(
        &[
            ("REPOSITORY_TYPE", Some("local")),
            ("DATABASE_URL", None),
            ("PG_DATABASE_URL", None),
        ],
        || {
            assert_eq!(RepositoryType::from_env(), RepositoryType::Local);
        },
    );

    support::with_scoped_env(
        &[
            ("REPOSITORY_TYPE", None),
            ("DATABASE_URL", Some("postgres://localhost/vrm")),
            ("PG_DATABASE_URL", None),
        ],
        || {
            assert_eq!(RepositoryType::from_env(), RepositoryType::Postgres);
        },
    );

    support::with_scoped_env(
        &[
            ("REPOSITORY_TYPE", None),
            ("DATABASE_URL", None),
            ("PG_DATABASE_URL", None),
        ],
        || {
            assert_eq!(RepositoryType::from_env(), RepositoryType::Local);
        },
    );
}
