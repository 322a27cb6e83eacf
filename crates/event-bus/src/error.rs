use thiserror::Error;

/// Errors that can occur when talking to the bus.
#[derive(Debug, Clone, Error)]
pub enum EventBusError {
    /// The broker connection is unusable; the consumer must reconnect.
    #[error("Connection failed: {0}")]
    Connection(String),

    /// A single receive failed; the connection is still usable.
    #[error("Transient consume error: {0}")]
    Transient(String),

    /// A message could not be published.
    #[error("Publish failed for topic '{topic}': {reason}")]
    Publish { topic: String, reason: String },

    /// A message could not be encoded.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl EventBusError {
    /// Returns true if the error invalidates the current subscription.
    pub fn is_connection_level(&self) -> bool {
        matches!(self, EventBusError::Connection(_))
    }
}

impl From<serde_json::Error> for EventBusError {
    fn from(e: serde_json::Error) -> Self {
        EventBusError::Serialization(e.to_string())
    }
}

/// Result type for bus operations.
pub type Result<T> = std::result::Result<T, EventBusError>;
