//! Integration tests for the history recorder.

use std::time::Duration;

use booking_store::{BookingId, BookingStore, HistoryStatus, InMemoryBookingStore};
use common::{BookingCancelled, BookingConfirmed, topics};
use event_bus::{
    BackoffPolicy, CancellationToken, ConsumerLoop, EventBus, EventBusExt, InMemoryEventBus,
};
use history::HistoryRecorder;

struct TestHarness {
    store: InMemoryBookingStore,
    bus: InMemoryEventBus,
    cancel: CancellationToken,
}

impl TestHarness {
    fn new() -> Self {
        Self {
            store: InMemoryBookingStore::new(),
            bus: InMemoryEventBus::new(),
            cancel: CancellationToken::new(),
        }
    }

    fn start(
        &self,
    ) -> tokio::task::JoinHandle<Result<(), event_bus::ConsumerError>> {
        let config = HistoryRecorder::<InMemoryBookingStore>::config("history-group")
            .with_backoff(BackoffPolicy::fixed(Duration::from_millis(5), 3))
            .with_consume_error_delay(Duration::from_millis(5));

        ConsumerLoop::new(
            self.bus.clone(),
            HistoryRecorder::new(self.store.clone()),
            config,
        )
        .spawn(self.cancel.clone())
    }

    async fn confirm(&self, id: &str, price: f64) {
        let event = BookingConfirmed {
            booking_id: BookingId::new(id),
            final_price: price,
            user_id: "alice".to_string(),
            hotel_id: "hotel-1".to_string(),
        };
        self.bus
            .publish_json(topics::BOOKING_CONFIRMED, id, &event)
            .await
            .unwrap();
    }

    async fn cancel_booking(&self, id: &str, reason: &str) {
        let event = BookingCancelled {
            booking_id: BookingId::new(id),
            reason: reason.to_string(),
            user_id: "bob".to_string(),
            hotel_id: "hotel-2".to_string(),
        };
        self.bus
            .publish_json(topics::BOOKING_CANCELLED, id, &event)
            .await
            .unwrap();
    }

    async fn wait_for_records(&self, expected: usize) {
        for _ in 0..400 {
            if self.store.history_count().await >= expected {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("expected {expected} history records");
    }
}

#[tokio::test]
async fn test_records_both_outcomes() {
    let h = TestHarness::new();
    let consumer = h.start();

    h.confirm("b-1", 60.0).await;
    h.cancel_booking("b-2", "user_blacklisted").await;

    h.wait_for_records(2).await;
    h.cancel.cancel();
    consumer.await.unwrap().unwrap();

    let confirmed = h
        .store
        .history_for_booking(&BookingId::new("b-1"))
        .await
        .unwrap();
    assert_eq!(confirmed.len(), 1);
    assert_eq!(confirmed[0].status, HistoryStatus::Confirmed);
    assert_eq!(confirmed[0].final_price, Some(60.0));

    let cancelled = h
        .store
        .history_for_booking(&BookingId::new("b-2"))
        .await
        .unwrap();
    assert_eq!(cancelled[0].status, HistoryStatus::Cancelled);
    assert_eq!(cancelled[0].reason.as_deref(), Some("user_blacklisted"));
    assert_eq!(cancelled[0].user_id, "bob");
}

#[tokio::test]
async fn test_redelivered_outcome_is_recorded_each_time() {
    let h = TestHarness::new();
    let consumer = h.start();

    for _ in 0..3 {
        h.confirm("b-1", 100.0).await;
    }

    h.wait_for_records(3).await;
    h.cancel.cancel();
    consumer.await.unwrap().unwrap();

    let records = h.store.list_history().await.unwrap();
    assert_eq!(records.len(), 3);
    assert!(records.iter().all(|r| r.booking_id.as_str() == "b-1"));

    let mut ids: Vec<i64> = records.iter().map(|r| r.id).collect();
    ids.dedup();
    assert_eq!(ids.len(), 3);
}

#[tokio::test]
async fn test_malformed_message_does_not_stop_recorder() {
    let h = TestHarness::new();
    let consumer = h.start();

    h.bus
        .publish(topics::BOOKING_CONFIRMED, Some("junk"), b"not json".to_vec())
        .await
        .unwrap();
    h.cancel_booking("b-1", "bad_reviews").await;

    h.wait_for_records(1).await;
    h.cancel.cancel();
    consumer.await.unwrap().unwrap();

    assert_eq!(h.store.history_count().await, 1);
}

#[tokio::test]
async fn test_store_outage_skips_message_and_recovers() {
    let h = TestHarness::new();
    h.store.set_fail_on_write(true);
    let consumer = h.start();

    h.confirm("lost", 100.0).await;
    for _ in 0..400 {
        if h.bus.is_acked("history-group", 0) {
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert!(h.bus.is_acked("history-group", 0));

    h.store.set_fail_on_write(false);
    h.confirm("kept", 100.0).await;

    h.wait_for_records(1).await;
    h.cancel.cancel();
    consumer.await.unwrap().unwrap();

    let records = h.store.list_history().await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].booking_id.as_str(), "kept");
}
