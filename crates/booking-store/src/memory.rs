use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::{
    Booking, BookingId, BookingStatus, HistoryRecord, NewHistoryRecord, Result, StoreError,
    store::BookingStore,
};

#[derive(Default)]
struct MemoryState {
    bookings: HashMap<BookingId, Booking>,
    history: Vec<HistoryRecord>,
    next_history_id: i64,
}

/// In-memory booking store for tests and local runs.
///
/// Provides the same interface as the PostgreSQL implementation. Writes can be
/// made to fail on demand to exercise error paths.
#[derive(Clone, Default)]
pub struct InMemoryBookingStore {
    state: Arc<RwLock<MemoryState>>,
    fail_writes: Arc<AtomicBool>,
}

impl InMemoryBookingStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent write fail with `StoreError::Unavailable`.
    pub fn set_fail_on_write(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Returns the number of stored bookings.
    pub async fn booking_count(&self) -> usize {
        self.state.read().await.bookings.len()
    }

    /// Returns the number of history entries.
    pub async fn history_count(&self) -> usize {
        self.state.read().await.history.len()
    }

    fn check_writable(&self) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(
                "writes disabled for in-memory store".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl BookingStore for InMemoryBookingStore {
    async fn insert_booking(&self, booking: &Booking) -> Result<()> {
        self.check_writable()?;
        let mut state = self.state.write().await;

        if state.bookings.contains_key(&booking.id) {
            return Err(StoreError::DuplicateBooking(booking.id.clone()));
        }
        state.bookings.insert(booking.id.clone(), booking.clone());
        Ok(())
    }

    async fn get_booking(&self, id: &BookingId) -> Result<Option<Booking>> {
        Ok(self.state.read().await.bookings.get(id).cloned())
    }

    async fn list_bookings(&self, user_id: Option<&str>) -> Result<Vec<Booking>> {
        let state = self.state.read().await;
        let mut bookings: Vec<_> = state
            .bookings
            .values()
            .filter(|b| user_id.is_none_or(|user| b.user_id == user))
            .cloned()
            .collect();
        bookings.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(bookings)
    }

    async fn confirm_booking(
        &self,
        id: &BookingId,
        price: f64,
        discount_percent: f64,
    ) -> Result<Option<Booking>> {
        self.check_writable()?;
        let mut state = self.state.write().await;

        Ok(state.bookings.get_mut(id).map(|booking| {
            booking.status = BookingStatus::Confirmed;
            booking.price = price;
            booking.discount_percent = discount_percent;
            booking.clone()
        }))
    }

    async fn delete_booking(&self, id: &BookingId) -> Result<bool> {
        self.check_writable()?;
        Ok(self.state.write().await.bookings.remove(id).is_some())
    }

    async fn list_stale_pending(&self, cutoff: DateTime<Utc>) -> Result<Vec<Booking>> {
        let state = self.state.read().await;
        let mut stale: Vec<_> = state
            .bookings
            .values()
            .filter(|b| b.is_pending() && b.created_at < cutoff)
            .cloned()
            .collect();
        stale.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(stale)
    }

    async fn append_history(&self, record: NewHistoryRecord) -> Result<HistoryRecord> {
        self.check_writable()?;
        let mut state = self.state.write().await;

        state.next_history_id += 1;
        let record = record.with_id(state.next_history_id);
        state.history.push(record.clone());
        Ok(record)
    }

    async fn history_for_booking(&self, booking_id: &BookingId) -> Result<Vec<HistoryRecord>> {
        let state = self.state.read().await;
        Ok(state
            .history
            .iter()
            .filter(|r| &r.booking_id == booking_id)
            .cloned()
            .collect())
    }

    async fn list_history(&self) -> Result<Vec<HistoryRecord>> {
        Ok(self.state.read().await.history.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::HistoryStatus;
    use chrono::Duration;

    fn booking(id: &str, user: &str) -> Booking {
        Booking::provisional(BookingId::new(id), user, "hotel-1", "", 100.0)
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let store = InMemoryBookingStore::new();
        let b = booking("b-1", "u-1");

        store.insert_booking(&b).await.unwrap();

        let loaded = store.get_booking(&b.id).await.unwrap().unwrap();
        assert_eq!(loaded, b);
        assert_eq!(store.booking_count().await, 1);
    }

    #[tokio::test]
    async fn test_duplicate_insert_rejected() {
        let store = InMemoryBookingStore::new();
        let b = booking("b-1", "u-1");

        store.insert_booking(&b).await.unwrap();
        let result = store.insert_booking(&b).await;

        assert!(matches!(result, Err(StoreError::DuplicateBooking(_))));
    }

    #[tokio::test]
    async fn test_list_filters_by_user() {
        let store = InMemoryBookingStore::new();
        store.insert_booking(&booking("b-1", "alice")).await.unwrap();
        store.insert_booking(&booking("b-2", "bob")).await.unwrap();
        store.insert_booking(&booking("b-3", "alice")).await.unwrap();

        assert_eq!(store.list_bookings(None).await.unwrap().len(), 3);

        let alice = store.list_bookings(Some("alice")).await.unwrap();
        assert_eq!(alice.len(), 2);
        assert!(alice.iter().all(|b| b.user_id == "alice"));
    }

    #[tokio::test]
    async fn test_confirm_updates_price_and_status() {
        let store = InMemoryBookingStore::new();
        let b = booking("b-1", "u-1");
        store.insert_booking(&b).await.unwrap();

        let updated = store.confirm_booking(&b.id, 60.0, 20.0).await.unwrap().unwrap();

        assert_eq!(updated.status, BookingStatus::Confirmed);
        assert_eq!(updated.price, 60.0);
        assert_eq!(updated.discount_percent, 20.0);
    }

    #[tokio::test]
    async fn test_confirm_missing_returns_none() {
        let store = InMemoryBookingStore::new();
        let result = store
            .confirm_booking(&BookingId::new("missing"), 60.0, 0.0)
            .await
            .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_delete() {
        let store = InMemoryBookingStore::new();
        let b = booking("b-1", "u-1");
        store.insert_booking(&b).await.unwrap();

        assert!(store.delete_booking(&b.id).await.unwrap());
        assert!(!store.delete_booking(&b.id).await.unwrap());
        assert!(store.get_booking(&b.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_stale_pending_excludes_confirmed_and_recent() {
        let store = InMemoryBookingStore::new();

        let mut old = booking("old", "u");
        old.created_at = Utc::now() - Duration::minutes(10);
        let mut old_confirmed = booking("old-confirmed", "u");
        old_confirmed.created_at = Utc::now() - Duration::minutes(10);
        old_confirmed.status = BookingStatus::Confirmed;
        let fresh = booking("fresh", "u");

        store.insert_booking(&old).await.unwrap();
        store.insert_booking(&old_confirmed).await.unwrap();
        store.insert_booking(&fresh).await.unwrap();

        let stale = store
            .list_stale_pending(Utc::now() - Duration::minutes(5))
            .await
            .unwrap();

        assert_eq!(stale.len(), 1);
        assert_eq!(stale[0].id.as_str(), "old");
    }

    #[tokio::test]
    async fn test_history_ids_are_sequential() {
        let store = InMemoryBookingStore::new();
        let id = BookingId::new("b-1");

        let r1 = store
            .append_history(NewHistoryRecord::confirmed(id.clone(), "u", "h", 60.0))
            .await
            .unwrap();
        let r2 = store
            .append_history(NewHistoryRecord::confirmed(id.clone(), "u", "h", 60.0))
            .await
            .unwrap();

        assert_eq!(r1.id, 1);
        assert_eq!(r2.id, 2);
        assert_eq!(store.history_for_booking(&id).await.unwrap().len(), 2);
        assert_eq!(r2.status, HistoryStatus::Confirmed);
    }

    #[tokio::test]
    async fn test_fail_on_write() {
        let store = InMemoryBookingStore::new();
        store.set_fail_on_write(true);

        let result = store.insert_booking(&booking("b-1", "u")).await;
        assert!(matches!(result, Err(StoreError::Unavailable(_))));
        assert_eq!(store.booking_count().await, 0);

        store.set_fail_on_write(false);
        store.insert_booking(&booking("b-1", "u")).await.unwrap();
        assert_eq!(store.booking_count().await, 1);
    }
}
