use async_trait::async_trait;
use booking_store::{BookingStore, HistoryRecord, NewHistoryRecord};
use common::{BookingCancelled, BookingConfirmed, topics};
use event_bus::{BusMessage, ConsumerConfig, HandlerError, MessageHandler};
use serde::de::DeserializeOwned;
use tracing::info;

use crate::{HistoryError, Result};

/// Turns terminal outcome messages into history records.
pub struct HistoryRecorder<S> {
    store: S,
}

impl<S: BookingStore> HistoryRecorder<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Consumer settings for the two outcome topics under `group`.
    pub fn config(group: impl Into<String>) -> ConsumerConfig {
        ConsumerConfig::new("history-recorder", group, topics::BOOKING_OUTCOMES)
    }

    #[tracing::instrument(skip(self, event), fields(booking_id = %event.booking_id))]
    pub async fn record_confirmed(&self, event: &BookingConfirmed) -> Result<HistoryRecord> {
        let entry = NewHistoryRecord::confirmed(
            event.booking_id.clone(),
            &event.user_id,
            &event.hotel_id,
            event.final_price,
        );
        self.append(entry).await
    }

    #[tracing::instrument(skip(self, event), fields(booking_id = %event.booking_id))]
    pub async fn record_cancelled(&self, event: &BookingCancelled) -> Result<HistoryRecord> {
        let entry = NewHistoryRecord::cancelled(
            event.booking_id.clone(),
            &event.user_id,
            &event.hotel_id,
            &event.reason,
        );
        self.append(entry).await
    }

    /// Decodes an outcome message by topic and records it.
    pub async fn record(&self, message: &BusMessage) -> Result<HistoryRecord> {
        match message.topic.as_str() {
            topics::BOOKING_CONFIRMED => self.record_confirmed(&decode(message)?).await,
            topics::BOOKING_CANCELLED => self.record_cancelled(&decode(message)?).await,
            other => Err(HistoryError::UnexpectedTopic(other.to_string())),
        }
    }

    async fn append(&self, entry: NewHistoryRecord) -> Result<HistoryRecord> {
        let record = self.store.append_history(entry).await?;

        metrics::counter!("history_records_total", "status" => record.status.as_str())
            .increment(1);
        info!(history_id = record.id, status = %record.status, "History recorded");
        Ok(record)
    }
}

#[async_trait]
impl<S: BookingStore> MessageHandler for HistoryRecorder<S> {
    async fn handle(&self, message: &BusMessage) -> std::result::Result<(), HandlerError> {
        self.record(message).await?;
        Ok(())
    }
}

fn decode<T: DeserializeOwned>(message: &BusMessage) -> Result<T> {
    message
        .decode()
        .map_err(|source| HistoryError::Deserialization {
            topic: message.topic.clone(),
            source,
        })
}
