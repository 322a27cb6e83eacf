//! Storage for bookings and their append-only history log.
//!
//! [`BookingStore`] is the seam the rest of the workspace programs against.
//! [`InMemoryBookingStore`] backs tests and local runs; [`PostgresBookingStore`]
//! is the durable implementation.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod record;
pub mod store;

pub use common::BookingId;
pub use error::{Result, StoreError};
pub use memory::InMemoryBookingStore;
pub use postgres::PostgresBookingStore;
pub use record::{Booking, BookingStatus, HistoryRecord, HistoryStatus, NewHistoryRecord};
pub use store::BookingStore;
