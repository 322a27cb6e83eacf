//! Publish/subscribe transport for the booking saga.
//!
//! The bus contract is at-least-once delivery with consumer groups:
//! - [`EventBus`] publishes raw payloads to named topics and opens
//!   [`Subscription`]s for a consumer group
//! - [`ConsumerLoop`] drives a subscription through connect, consume and
//!   reconnect with a bounded [`BackoffPolicy`], handing each message to a
//!   [`MessageHandler`]
//! - [`InMemoryEventBus`] backs tests and local runs; `KafkaEventBus` (feature
//!   `kafka`) talks to a Kafka-compatible broker

pub mod backoff;
pub mod bus;
pub mod consumer;
pub mod error;
#[cfg(feature = "kafka")]
pub mod kafka;
pub mod memory;
pub mod message;

pub use backoff::BackoffPolicy;
pub use bus::{EventBus, EventBusExt, Subscription};
pub use consumer::{
    ConsumerConfig, ConsumerError, ConsumerLoop, ConsumerState, HandlerError, MessageHandler,
};
pub use error::{EventBusError, Result};
#[cfg(feature = "kafka")]
pub use kafka::KafkaEventBus;
pub use memory::InMemoryEventBus;
pub use message::BusMessage;
pub use tokio_util::sync::CancellationToken;
