//! Topic dispatch from the bus to the aggregator.

use std::sync::Arc;

use async_trait::async_trait;
use booking_store::BookingStore;
use common::topics;
use event_bus::{BusMessage, ConsumerConfig, EventBus, HandlerError, MessageHandler};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::ValidationAggregator;

/// Feeds validator results to a [`ValidationAggregator`].
///
/// Run it inside an `event_bus::ConsumerLoop` built from
/// [`ResultConsumer::config`] for connection resilience.
pub struct ResultConsumer<S, B> {
    aggregator: Arc<ValidationAggregator<S, B>>,
}

impl<S, B> Clone for ResultConsumer<S, B> {
    fn clone(&self) -> Self {
        Self {
            aggregator: Arc::clone(&self.aggregator),
        }
    }
}

impl<S: BookingStore, B: EventBus> ResultConsumer<S, B> {
    pub fn new(aggregator: Arc<ValidationAggregator<S, B>>) -> Self {
        Self { aggregator }
    }

    pub fn aggregator(&self) -> &ValidationAggregator<S, B> {
        &self.aggregator
    }

    /// Consumer settings for the four result topics under `group`.
    pub fn config(group: impl Into<String>) -> ConsumerConfig {
        ConsumerConfig::new("result-consumer", group, topics::VALIDATION_RESULTS)
    }
}

#[async_trait]
impl<S: BookingStore, B: EventBus> MessageHandler for ResultConsumer<S, B> {
    async fn handle(&self, message: &BusMessage) -> Result<(), HandlerError> {
        let aggregator = &self.aggregator;

        let outcome = match message.topic.as_str() {
            topics::USER_VALIDATION_RESULT => aggregator.handle_user(&decode(message)?).await,
            topics::HOTEL_VALIDATION_RESULT => aggregator.handle_hotel(&decode(message)?).await,
            topics::PROMO_VALIDATION_RESULT => aggregator.handle_promo(&decode(message)?).await,
            topics::REVIEW_VALIDATION_RESULT => aggregator.handle_review(&decode(message)?).await,
            other => return Err(HandlerError::UnknownTopic(other.to_string())),
        };

        let outcome = outcome.map_err(HandlerError::processing)?;
        debug!(topic = %message.topic, ?outcome, "Validation result applied");
        Ok(())
    }
}

fn decode<T: DeserializeOwned>(message: &BusMessage) -> Result<T, HandlerError> {
    message
        .decode()
        .map_err(|e| HandlerError::decode(message.topic.as_str(), e))
}
