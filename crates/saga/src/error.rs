//! Saga error types.

use booking_store::StoreError;
use event_bus::EventBusError;
use thiserror::Error;

/// Errors that can occur while resolving a saga.
#[derive(Debug, Error)]
pub enum SagaError {
    /// Booking store error.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// A terminal event could not be published.
    #[error("Publish error: {0}")]
    Publish(#[from] EventBusError),

    /// The expiry age does not fit a timestamp offset.
    #[error("Invalid max age: {0}")]
    InvalidMaxAge(String),
}

/// Convenience type alias for saga results.
pub type Result<T> = std::result::Result<T, SagaError>;
