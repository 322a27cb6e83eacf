//! History error types.

use booking_store::StoreError;
use event_bus::HandlerError;
use thiserror::Error;

/// Errors that can occur while recording history.
#[derive(Debug, Error)]
pub enum HistoryError {
    /// The outcome message could not be decoded.
    #[error("Malformed outcome on '{topic}': {source}")]
    Deserialization {
        topic: String,
        #[source]
        source: serde_json::Error,
    },

    /// The message came from a topic the recorder does not handle.
    #[error("Unexpected topic: {0}")]
    UnexpectedTopic(String),

    /// The history entry could not be stored.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl From<HistoryError> for HandlerError {
    fn from(e: HistoryError) -> Self {
        match e {
            HistoryError::Deserialization { topic, source } => HandlerError::decode(topic, source),
            HistoryError::UnexpectedTopic(topic) => HandlerError::UnknownTopic(topic),
            HistoryError::Store(e) => HandlerError::processing(e),
        }
    }
}

/// Result type for history operations.
pub type Result<T> = std::result::Result<T, HistoryError>;
