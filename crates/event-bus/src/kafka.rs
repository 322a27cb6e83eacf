//! Kafka-compatible broker support.
//!
//! Offsets are stored only after the consumer loop acknowledges a message and
//! are committed in the background, so a crash between handling and commit
//! redelivers rather than loses.

use std::time::Duration;

use async_trait::async_trait;
use rdkafka::Message;
use rdkafka::config::ClientConfig;
use rdkafka::consumer::{Consumer, StreamConsumer};
use rdkafka::error::{KafkaError, RDKafkaErrorCode};
use rdkafka::producer::{FutureProducer, FutureRecord};
use rdkafka::util::Timeout;

use crate::{BusMessage, EventBus, EventBusError, Result, Subscription};

/// [`EventBus`] backed by Kafka or Redpanda.
pub struct KafkaEventBus {
    producer: FutureProducer,
    brokers: String,
    timeout: Duration,
    auto_offset_reset: String,
}

impl KafkaEventBus {
    /// Connects a producer to `brokers` with default settings.
    pub fn new(brokers: impl Into<String>) -> Result<Self> {
        Self::builder().brokers(brokers).build()
    }

    pub fn builder() -> KafkaEventBusBuilder {
        KafkaEventBusBuilder::default()
    }

    pub fn brokers(&self) -> &str {
        &self.brokers
    }
}

/// Builder for [`KafkaEventBus`].
#[derive(Debug, Default)]
pub struct KafkaEventBusBuilder {
    brokers: Option<String>,
    producer_acks: Option<String>,
    timeout: Option<Duration>,
    auto_offset_reset: Option<String>,
}

impl KafkaEventBusBuilder {
    /// Comma-separated `host:port` list.
    #[must_use]
    pub fn brokers(mut self, brokers: impl Into<String>) -> Self {
        self.brokers = Some(brokers.into());
        self
    }

    /// Producer `acks` setting (default `"all"`).
    #[must_use]
    pub fn producer_acks(mut self, acks: impl Into<String>) -> Self {
        self.producer_acks = Some(acks.into());
        self
    }

    /// Publish timeout (default 5 seconds).
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Where a group with no committed offset starts (default `"earliest"`).
    #[must_use]
    pub fn auto_offset_reset(mut self, policy: impl Into<String>) -> Self {
        self.auto_offset_reset = Some(policy.into());
        self
    }

    /// Creates the producer.
    ///
    /// Fails with [`EventBusError::Connection`] if brokers are missing or the
    /// client cannot be created.
    pub fn build(self) -> Result<KafkaEventBus> {
        let brokers = self
            .brokers
            .ok_or_else(|| EventBusError::Connection("Brokers not configured".to_string()))?;
        let acks = self.producer_acks.unwrap_or_else(|| "all".to_string());
        let timeout = self.timeout.unwrap_or(Duration::from_secs(5));

        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", &brokers)
            .set("message.timeout.ms", timeout.as_millis().to_string())
            .set("acks", &acks)
            .create()
            .map_err(|e| EventBusError::Connection(format!("Failed to create producer: {e}")))?;

        let auto_offset_reset = self
            .auto_offset_reset
            .unwrap_or_else(|| "earliest".to_string());

        tracing::info!(
            brokers = %brokers,
            acks = %acks,
            auto_offset_reset = %auto_offset_reset,
            "Kafka event bus created"
        );

        Ok(KafkaEventBus {
            producer,
            brokers,
            timeout,
            auto_offset_reset,
        })
    }
}

#[async_trait]
impl EventBus for KafkaEventBus {
    async fn publish(&self, topic: &str, key: Option<&str>, payload: Vec<u8>) -> Result<()> {
        let mut record = FutureRecord::<str, [u8]>::to(topic).payload(payload.as_slice());
        if let Some(key) = key {
            record = record.key(key);
        }

        match self.producer.send(record, Timeout::After(self.timeout)).await {
            Ok((partition, offset)) => {
                tracing::debug!(topic, partition, offset, "Published message");
                Ok(())
            }
            Err((e, _)) => {
                tracing::error!(topic, error = %e, "Failed to publish message");
                Err(EventBusError::Publish {
                    topic: topic.to_string(),
                    reason: e.to_string(),
                })
            }
        }
    }

    async fn subscribe(&self, topics: &[&str], group: &str) -> Result<Box<dyn Subscription>> {
        let consumer: StreamConsumer = ClientConfig::new()
            .set("bootstrap.servers", &self.brokers)
            .set("group.id", group)
            .set("enable.auto.commit", "true")
            .set("enable.auto.offset.store", "false")
            .set("auto.offset.reset", &self.auto_offset_reset)
            .set("session.timeout.ms", "6000")
            .set("enable.partition.eof", "false")
            .create()
            .map_err(classify)?;

        consumer.subscribe(topics).map_err(classify)?;

        tracing::info!(?topics, group, "Subscribed to topics");
        Ok(Box::new(KafkaSubscription { consumer }))
    }
}

struct KafkaSubscription {
    consumer: StreamConsumer,
}

#[async_trait]
impl Subscription for KafkaSubscription {
    async fn recv(&mut self) -> Result<BusMessage> {
        let message = self.consumer.recv().await.map_err(classify)?;

        Ok(BusMessage {
            topic: message.topic().to_string(),
            key: message
                .key()
                .map(|k| String::from_utf8_lossy(k).into_owned()),
            payload: message.payload().map(<[u8]>::to_vec).unwrap_or_default(),
            partition: message.partition(),
            offset: message.offset(),
        })
    }

    async fn ack(&mut self, message: &BusMessage) -> Result<()> {
        // The stored offset is the next one to read.
        self.consumer
            .store_offset(&message.topic, message.partition, message.offset + 1)
            .map_err(|e| EventBusError::Transient(format!("Failed to store offset: {e}")))
    }
}

/// Maps client errors onto connection-level or one-off failures.
fn classify(error: KafkaError) -> EventBusError {
    match &error {
        KafkaError::ClientCreation(_) | KafkaError::Subscription(_) => {
            EventBusError::Connection(error.to_string())
        }
        KafkaError::MessageConsumption(code) | KafkaError::Global(code)
            if is_connection_code(*code) =>
        {
            EventBusError::Connection(error.to_string())
        }
        _ => EventBusError::Transient(error.to_string()),
    }
}

fn is_connection_code(code: RDKafkaErrorCode) -> bool {
    matches!(
        code,
        RDKafkaErrorCode::AllBrokersDown
            | RDKafkaErrorCode::BrokerTransportFailure
            | RDKafkaErrorCode::Authentication
    )
}
