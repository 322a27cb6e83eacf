use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a booking.
///
/// The booking id doubles as the saga correlation id: every validation result
/// for a booking carries it. Ids are generated from a random UUID but are
/// treated as opaque strings, so ids minted elsewhere decode unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BookingId(String);

impl BookingId {
    /// Generates a new random booking ID.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Wraps an existing identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for BookingId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for BookingId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for BookingId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<BookingId> for String {
    fn from(id: BookingId) -> Self {
        id.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_creates_unique_ids() {
        let id1 = BookingId::generate();
        let id2 = BookingId::generate();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_generated_id_is_a_uuid() {
        let id = BookingId::generate();
        assert!(Uuid::parse_str(id.as_str()).is_ok());
    }

    #[test]
    fn test_foreign_ids_are_preserved() {
        let id = BookingId::new("booking-42");
        assert_eq!(id.as_str(), "booking-42");
        assert_eq!(id.to_string(), "booking-42");
    }

    #[test]
    fn test_serializes_as_plain_string() {
        let id = BookingId::new("abc");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"abc\"");
    }
}
