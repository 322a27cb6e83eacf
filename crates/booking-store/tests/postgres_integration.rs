//! PostgreSQL integration tests
//!
//! These tests start a shared PostgreSQL container and need Docker.
//! Run with:
//!
//! ```bash
//! cargo test -p booking-store --test postgres_integration -- --ignored --test-threads=1
//! ```

use std::sync::Arc;

use booking_store::{
    Booking, BookingId, BookingStatus, BookingStore, HistoryStatus, NewHistoryRecord,
    PostgresBookingStore, StoreError,
};
use chrono::{Duration, SubsecRound, Utc};
use sqlx::PgPool;
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;

/// Shared container info - container stays alive for all tests
struct ContainerInfo {
    #[allow(dead_code)] // Container must stay alive for tests
    container: ContainerAsync<Postgres>,
    connection_string: String,
}

static CONTAINER: OnceCell<Arc<ContainerInfo>> = OnceCell::const_new();

async fn get_container_info() -> Arc<ContainerInfo> {
    CONTAINER
        .get_or_init(|| async {
            let container = Postgres::default().start().await.unwrap();

            let host = container.get_host().await.unwrap();
            let port = container.get_host_port_ipv4(5432).await.unwrap();

            let connection_string =
                format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

            let store = PostgresBookingStore::connect(&connection_string)
                .await
                .unwrap();
            store.run_migrations().await.unwrap();
            store.pool().close().await;

            Arc::new(ContainerInfo {
                container,
                connection_string,
            })
        })
        .await
        .clone()
}

/// Get a fresh store with its own pool and cleared tables
async fn get_test_store() -> PostgresBookingStore {
    let info = get_container_info().await;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&info.connection_string)
        .await
        .unwrap();

    sqlx::query("TRUNCATE TABLE bookings, history RESTART IDENTITY")
        .execute(&pool)
        .await
        .unwrap();

    PostgresBookingStore::new(pool)
}

fn booking(id: &str, user: &str) -> Booking {
    let mut b = Booking::provisional(BookingId::new(id), user, "hotel-1", "SUMMER", 100.0);
    // Postgres stores microseconds; trim so round-trips compare equal.
    b.created_at = b.created_at.trunc_subsecs(6);
    b
}

#[tokio::test]
#[ignore = "requires docker"]
async fn test_insert_and_get_booking() {
    let store = get_test_store().await;
    let b = booking("b-1", "alice");

    store.insert_booking(&b).await.unwrap();

    let loaded = store.get_booking(&b.id).await.unwrap().unwrap();
    assert_eq!(loaded, b);
}

#[tokio::test]
#[ignore = "requires docker"]
async fn test_duplicate_booking_rejected() {
    let store = get_test_store().await;
    let b = booking("b-1", "alice");

    store.insert_booking(&b).await.unwrap();
    let result = store.insert_booking(&b).await;

    assert!(matches!(result, Err(StoreError::DuplicateBooking(_))));
}

#[tokio::test]
#[ignore = "requires docker"]
async fn test_list_bookings_filters_by_user() {
    let store = get_test_store().await;
    store.insert_booking(&booking("b-1", "alice")).await.unwrap();
    store.insert_booking(&booking("b-2", "bob")).await.unwrap();

    assert_eq!(store.list_bookings(None).await.unwrap().len(), 2);
    let bob = store.list_bookings(Some("bob")).await.unwrap();
    assert_eq!(bob.len(), 1);
    assert_eq!(bob[0].id.as_str(), "b-2");
}

#[tokio::test]
#[ignore = "requires docker"]
async fn test_confirm_and_delete() {
    let store = get_test_store().await;
    let b = booking("b-1", "alice");
    store.insert_booking(&b).await.unwrap();

    let confirmed = store.confirm_booking(&b.id, 60.0, 20.0).await.unwrap().unwrap();
    assert_eq!(confirmed.status, BookingStatus::Confirmed);
    assert_eq!(confirmed.price, 60.0);

    assert!(store.delete_booking(&b.id).await.unwrap());
    assert!(store.get_booking(&b.id).await.unwrap().is_none());
    assert!(store.confirm_booking(&b.id, 1.0, 0.0).await.unwrap().is_none());
}

#[tokio::test]
#[ignore = "requires docker"]
async fn test_list_stale_pending() {
    let store = get_test_store().await;
    let mut old = booking("old", "alice");
    old.created_at = (Utc::now() - Duration::hours(1)).trunc_subsecs(6);
    store.insert_booking(&old).await.unwrap();
    store.insert_booking(&booking("fresh", "alice")).await.unwrap();

    let stale = store
        .list_stale_pending(Utc::now() - Duration::minutes(5))
        .await
        .unwrap();

    assert_eq!(stale.len(), 1);
    assert_eq!(stale[0].id.as_str(), "old");
}

#[tokio::test]
#[ignore = "requires docker"]
async fn test_history_is_append_only_multiset() {
    let store = get_test_store().await;
    let id = BookingId::new("b-1");

    let first = store
        .append_history(NewHistoryRecord::confirmed(id.clone(), "alice", "hotel-1", 60.0))
        .await
        .unwrap();
    let second = store
        .append_history(NewHistoryRecord::confirmed(id.clone(), "alice", "hotel-1", 60.0))
        .await
        .unwrap();
    store
        .append_history(NewHistoryRecord::cancelled(
            BookingId::new("b-2"),
            "bob",
            "hotel-1",
            "bad_reviews",
        ))
        .await
        .unwrap();

    assert_ne!(first.id, second.id);

    let records = store.history_for_booking(&id).await.unwrap();
    assert_eq!(records.len(), 2);
    assert!(records.iter().all(|r| r.status == HistoryStatus::Confirmed));

    let all = store.list_history().await.unwrap();
    assert_eq!(all.len(), 3);
    assert_eq!(all[2].reason.as_deref(), Some("bad_reviews"));
    assert_eq!(all[2].final_price, None);
}

#[tokio::test]
#[ignore = "requires docker"]
async fn test_pool_is_reusable_after_truncate() {
    let store = get_test_store().await;
    let pool: &PgPool = store.pool();
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM bookings")
        .fetch_one(pool)
        .await
        .unwrap();
    assert_eq!(count, 0);
}
