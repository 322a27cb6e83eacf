use std::borrow::Cow;

use serde::de::DeserializeOwned;

/// A message received from the bus.
///
/// `partition` and `offset` identify the delivery so it can be acknowledged.
#[derive(Debug, Clone, PartialEq)]
pub struct BusMessage {
    pub topic: String,
    pub key: Option<String>,
    pub payload: Vec<u8>,
    pub partition: i32,
    pub offset: i64,
}

impl BusMessage {
    /// Creates a message on partition 0 at offset 0.
    pub fn new(topic: impl Into<String>, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            topic: topic.into(),
            key: None,
            payload: payload.into(),
            partition: 0,
            offset: 0,
        }
    }

    /// Sets the partition key.
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Sets the delivery position.
    pub fn at(mut self, partition: i32, offset: i64) -> Self {
        self.partition = partition;
        self.offset = offset;
        self
    }

    /// Decodes the JSON payload.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.payload)
    }

    /// Payload as text, for logging.
    pub fn payload_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Ping {
        n: u32,
    }

    #[test]
    fn test_decode_json_payload() {
        let msg = BusMessage::new("pings", br#"{"n":7}"#.to_vec());
        assert_eq!(msg.decode::<Ping>().unwrap(), Ping { n: 7 });
    }

    #[test]
    fn test_decode_rejects_garbage() {
        let msg = BusMessage::new("pings", b"not json".to_vec());
        assert!(msg.decode::<Ping>().is_err());
        assert_eq!(msg.payload_lossy(), "not json");
    }

    #[test]
    fn test_builders_set_position_and_key() {
        let msg = BusMessage::new("t", Vec::new()).with_key("k").at(2, 41);
        assert_eq!(msg.key.as_deref(), Some("k"));
        assert_eq!((msg.partition, msg.offset), (2, 41));
    }
}
