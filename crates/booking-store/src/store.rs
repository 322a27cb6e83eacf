use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::{Booking, BookingId, HistoryRecord, NewHistoryRecord, Result};

/// Core trait for booking store implementations.
///
/// The store owns bookings exclusively; the saga only ever holds a transient
/// copy while it decides. All implementations must be thread-safe (Send + Sync).
#[async_trait]
pub trait BookingStore: Send + Sync {
    /// Inserts a new booking.
    ///
    /// Fails with `DuplicateBooking` if the ID is already taken.
    async fn insert_booking(&self, booking: &Booking) -> Result<()>;

    /// Finds a booking by ID.
    async fn get_booking(&self, id: &BookingId) -> Result<Option<Booking>>;

    /// Lists bookings, optionally restricted to one user, oldest first.
    async fn list_bookings(&self, user_id: Option<&str>) -> Result<Vec<Booking>>;

    /// Marks a booking confirmed with its final price and discount.
    ///
    /// Returns the updated booking, or None if it no longer exists.
    async fn confirm_booking(
        &self,
        id: &BookingId,
        price: f64,
        discount_percent: f64,
    ) -> Result<Option<Booking>>;

    /// Deletes a booking. Returns true if a row was removed.
    async fn delete_booking(&self, id: &BookingId) -> Result<bool>;

    /// Lists pending bookings created strictly before `cutoff`.
    async fn list_stale_pending(&self, cutoff: DateTime<Utc>) -> Result<Vec<Booking>>;

    /// Appends an entry to the history log, assigning its sequence ID.
    async fn append_history(&self, record: NewHistoryRecord) -> Result<HistoryRecord>;

    /// Returns all history entries for one booking in insertion order.
    async fn history_for_booking(&self, booking_id: &BookingId) -> Result<Vec<HistoryRecord>>;

    /// Returns the whole history log in insertion order.
    async fn list_history(&self) -> Result<Vec<HistoryRecord>>;
}

#[async_trait]
impl<T: BookingStore + ?Sized> BookingStore for std::sync::Arc<T> {
    async fn insert_booking(&self, booking: &Booking) -> Result<()> {
        (**self).insert_booking(booking).await
    }

    async fn get_booking(&self, id: &BookingId) -> Result<Option<Booking>> {
        (**self).get_booking(id).await
    }

    async fn list_bookings(&self, user_id: Option<&str>) -> Result<Vec<Booking>> {
        (**self).list_bookings(user_id).await
    }

    async fn confirm_booking(
        &self,
        id: &BookingId,
        price: f64,
        discount_percent: f64,
    ) -> Result<Option<Booking>> {
        (**self).confirm_booking(id, price, discount_percent).await
    }

    async fn delete_booking(&self, id: &BookingId) -> Result<bool> {
        (**self).delete_booking(id).await
    }

    async fn list_stale_pending(&self, cutoff: DateTime<Utc>) -> Result<Vec<Booking>> {
        (**self).list_stale_pending(cutoff).await
    }

    async fn append_history(&self, record: NewHistoryRecord) -> Result<HistoryRecord> {
        (**self).append_history(record).await
    }

    async fn history_for_booking(&self, booking_id: &BookingId) -> Result<Vec<HistoryRecord>> {
        (**self).history_for_booking(booking_id).await
    }

    async fn list_history(&self) -> Result<Vec<HistoryRecord>> {
        (**self).list_history().await
    }
}
