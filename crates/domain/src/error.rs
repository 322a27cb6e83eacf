//! Domain error types.

use booking_store::StoreError;
use event_bus::EventBusError;
use thiserror::Error;

/// Errors that can occur during domain operations.
#[derive(Debug, Error)]
pub enum DomainError {
    /// A required input was empty.
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    /// An error occurred in the booking store.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// A message could not be published.
    #[error("Publish error: {0}")]
    Publish(#[from] EventBusError),
}

/// Result type for domain operations.
pub type Result<T> = std::result::Result<T, DomainError>;
