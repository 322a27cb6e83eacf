use thiserror::Error;

use crate::BookingId;

/// Errors that can occur when interacting with the booking store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A booking with this ID already exists.
    #[error("Booking already exists: {0}")]
    DuplicateBooking(BookingId),

    /// A persisted row holds a status the store does not recognise.
    #[error("Invalid status value: {0}")]
    InvalidStatus(String),

    /// The store refused the operation.
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Result type for booking store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
