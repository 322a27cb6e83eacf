use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;

use crate::{BusMessage, Result};

/// A topic-based message bus with consumer groups.
///
/// Delivery is at-least-once: a message that was received but not acknowledged
/// may be delivered again after the subscription is re-established. Within a
/// group, each message goes to one subscriber.
#[async_trait]
pub trait EventBus: Send + Sync {
    /// Publishes a raw payload to `topic`.
    async fn publish(&self, topic: &str, key: Option<&str>, payload: Vec<u8>) -> Result<()>;

    /// Opens a subscription to `topics` as a member of `group`.
    ///
    /// Fails with `EventBusError::Connection` when the broker is unreachable.
    async fn subscribe(&self, topics: &[&str], group: &str) -> Result<Box<dyn Subscription>>;
}

/// An open subscription.
#[async_trait]
pub trait Subscription: Send {
    /// Waits for the next message.
    ///
    /// A `Connection` error means the subscription is dead and must be
    /// reopened; any other error is a one-off and the next call may succeed.
    async fn recv(&mut self) -> Result<BusMessage>;

    /// Acknowledges a message so it is not redelivered to this group.
    async fn ack(&mut self, message: &BusMessage) -> Result<()>;
}

/// JSON helpers for any [`EventBus`].
#[async_trait]
pub trait EventBusExt: EventBus {
    /// Serializes `message` as JSON and publishes it under `key`.
    async fn publish_json<T>(&self, topic: &str, key: &str, message: &T) -> Result<()>
    where
        T: Serialize + Sync,
    {
        let payload = serde_json::to_vec(message)?;
        self.publish(topic, Some(key), payload).await
    }
}

impl<B: EventBus + ?Sized> EventBusExt for B {}

#[async_trait]
impl<B: EventBus + ?Sized> EventBus for Arc<B> {
    async fn publish(&self, topic: &str, key: Option<&str>, payload: Vec<u8>) -> Result<()> {
        (**self).publish(topic, key, payload).await
    }

    async fn subscribe(&self, topics: &[&str], group: &str) -> Result<Box<dyn Subscription>> {
        (**self).subscribe(topics, group).await
    }
}
