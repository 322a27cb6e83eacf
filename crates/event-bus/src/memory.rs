use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tokio::sync::mpsc;

use crate::{BusMessage, EventBus, EventBusError, Result, Subscription};

type Delivery = Result<BusMessage>;

struct Subscriber {
    id: u64,
    group: String,
    topics: Vec<String>,
    tx: mpsc::UnboundedSender<Delivery>,
}

impl Subscriber {
    fn wants(&self, topic: &str) -> bool {
        self.topics.iter().any(|t| t == topic)
    }
}

#[derive(Default)]
struct BusState {
    log: Vec<BusMessage>,
    subscribers: Vec<Subscriber>,
    acked: HashMap<String, HashSet<i64>>,
    round_robin: HashMap<String, usize>,
    next_subscriber_id: u64,
    fail_publish: bool,
    failing_subscribes: usize,
    subscribe_attempts: usize,
}

impl BusState {
    /// Hands `message` to one live subscriber of each interested group.
    fn route(&mut self, message: &BusMessage) {
        let mut groups: Vec<String> = self
            .subscribers
            .iter()
            .filter(|s| s.wants(&message.topic))
            .map(|s| s.group.clone())
            .collect();
        groups.sort();
        groups.dedup();

        for group in groups {
            self.deliver_to_group(&group, message);
        }
    }

    fn deliver_to_group(&mut self, group: &str, message: &BusMessage) {
        loop {
            let members: Vec<usize> = self
                .subscribers
                .iter()
                .enumerate()
                .filter(|(_, s)| s.group == group && s.wants(&message.topic))
                .map(|(i, _)| i)
                .collect();
            if members.is_empty() {
                return;
            }

            let cursor = self.round_robin.entry(group.to_string()).or_default();
            let index = members[*cursor % members.len()];
            *cursor = cursor.wrapping_add(1);

            if self.subscribers[index].tx.send(Ok(message.clone())).is_ok() {
                return;
            }
            // Receiver dropped; forget it and pick another member.
            self.subscribers.remove(index);
        }
    }
}

/// In-memory bus for tests and local runs.
///
/// Messages are kept in a single log with a global offset. A new subscription
/// first receives every logged message on its topics that its group has not
/// acknowledged, which mirrors an `earliest` offset reset with committed
/// offsets. Failures can be injected to exercise consumer recovery.
#[derive(Clone, Default)]
pub struct InMemoryEventBus {
    state: Arc<Mutex<BusState>>,
}

impl InMemoryEventBus {
    /// Creates an empty bus.
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, BusState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Makes every subsequent publish fail.
    pub fn set_fail_on_publish(&self, fail: bool) {
        self.state().fail_publish = fail;
    }

    /// Makes the next `count` subscribe calls fail with a connection error.
    pub fn fail_next_subscribes(&self, count: usize) {
        self.state().failing_subscribes = count;
    }

    /// Number of subscribe calls made so far, successful or not.
    pub fn subscribe_attempts(&self) -> usize {
        self.state().subscribe_attempts
    }

    /// Number of currently open subscriptions.
    pub fn subscriber_count(&self) -> usize {
        let mut state = self.state();
        state.subscribers.retain(|s| !s.tx.is_closed());
        state.subscribers.len()
    }

    /// Drops every open subscription. Their next `recv` reports a lost
    /// connection.
    pub fn disconnect_all(&self) {
        self.state().subscribers.clear();
    }

    /// Sends a one-off consume error to every open subscription.
    pub fn inject_consume_error(&self, reason: &str) {
        let state = self.state();
        for subscriber in &state.subscribers {
            let _ = subscriber
                .tx
                .send(Err(EventBusError::Transient(reason.to_string())));
        }
    }

    /// All messages published to `topic`, in order.
    pub fn published(&self, topic: &str) -> Vec<BusMessage> {
        self.state()
            .log
            .iter()
            .filter(|m| m.topic == topic)
            .cloned()
            .collect()
    }

    /// Decodes every message published to `topic`.
    pub fn published_as<T: DeserializeOwned>(
        &self,
        topic: &str,
    ) -> std::result::Result<Vec<T>, serde_json::Error> {
        self.published(topic).iter().map(BusMessage::decode).collect()
    }

    /// Whether `group` has acknowledged the message at `offset`.
    pub fn is_acked(&self, group: &str, offset: i64) -> bool {
        self.state()
            .acked
            .get(group)
            .is_some_and(|offsets| offsets.contains(&offset))
    }
}

#[async_trait]
impl EventBus for InMemoryEventBus {
    async fn publish(&self, topic: &str, key: Option<&str>, payload: Vec<u8>) -> Result<()> {
        let mut state = self.state();
        if state.fail_publish {
            return Err(EventBusError::Publish {
                topic: topic.to_string(),
                reason: "publishing disabled for in-memory bus".to_string(),
            });
        }

        let offset = state.log.len() as i64;
        let mut message = BusMessage::new(topic, payload).at(0, offset);
        message.key = key.map(str::to_string);

        state.log.push(message.clone());
        state.route(&message);

        tracing::trace!(topic, offset, "Published message");
        Ok(())
    }

    async fn subscribe(&self, topics: &[&str], group: &str) -> Result<Box<dyn Subscription>> {
        let mut state = self.state();
        state.subscribe_attempts += 1;

        if state.failing_subscribes > 0 {
            state.failing_subscribes -= 1;
            return Err(EventBusError::Connection(
                "in-memory broker unreachable".to_string(),
            ));
        }

        let (tx, rx) = mpsc::unbounded_channel();
        let topics: Vec<String> = topics.iter().map(|t| (*t).to_string()).collect();

        let acked = state.acked.get(group);
        for message in state
            .log
            .iter()
            .filter(|m| topics.contains(&m.topic))
            .filter(|m| !acked.is_some_and(|a| a.contains(&m.offset)))
        {
            let _ = tx.send(Ok(message.clone()));
        }

        state.next_subscriber_id += 1;
        let id = state.next_subscriber_id;
        state.subscribers.push(Subscriber {
            id,
            group: group.to_string(),
            topics,
            tx,
        });

        Ok(Box::new(MemorySubscription {
            id,
            group: group.to_string(),
            rx,
            state: Arc::clone(&self.state),
        }))
    }
}

struct MemorySubscription {
    id: u64,
    group: String,
    rx: mpsc::UnboundedReceiver<Delivery>,
    state: Arc<Mutex<BusState>>,
}

#[async_trait]
impl Subscription for MemorySubscription {
    async fn recv(&mut self) -> Result<BusMessage> {
        match self.rx.recv().await {
            Some(delivery) => delivery,
            None => Err(EventBusError::Connection(format!(
                "subscription {} closed",
                self.id
            ))),
        }
    }

    async fn ack(&mut self, message: &BusMessage) -> Result<()> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state
            .acked
            .entry(self.group.clone())
            .or_default()
            .insert(message.offset);
        Ok(())
    }
}

impl Drop for MemorySubscription {
    fn drop(&mut self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.subscribers.retain(|s| s.id != self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EventBusExt;

    #[tokio::test]
    async fn test_publish_reaches_subscriber() {
        let bus = InMemoryEventBus::new();
        let mut sub = bus.subscribe(&["a"], "g").await.unwrap();

        bus.publish("a", Some("k"), b"1".to_vec()).await.unwrap();

        let msg = sub.recv().await.unwrap();
        assert_eq!(msg.topic, "a");
        assert_eq!(msg.key.as_deref(), Some("k"));
        assert_eq!(msg.payload, b"1");
    }

    #[tokio::test]
    async fn test_new_subscription_replays_unacked_backlog() {
        let bus = InMemoryEventBus::new();
        bus.publish("a", None, b"1".to_vec()).await.unwrap();
        bus.publish("b", None, b"2".to_vec()).await.unwrap();
        bus.publish("a", None, b"3".to_vec()).await.unwrap();

        let mut sub = bus.subscribe(&["a"], "g").await.unwrap();
        let first = sub.recv().await.unwrap();
        sub.ack(&first).await.unwrap();
        drop(sub);

        let mut sub = bus.subscribe(&["a"], "g").await.unwrap();
        let msg = sub.recv().await.unwrap();
        assert_eq!(msg.payload, b"3");
        assert!(bus.is_acked("g", first.offset));
    }

    #[tokio::test]
    async fn test_each_group_gets_its_own_copy() {
        let bus = InMemoryEventBus::new();
        let mut saga = bus.subscribe(&["a"], "saga").await.unwrap();
        let mut history = bus.subscribe(&["a"], "history").await.unwrap();

        bus.publish("a", None, b"x".to_vec()).await.unwrap();

        assert_eq!(saga.recv().await.unwrap().payload, b"x");
        assert_eq!(history.recv().await.unwrap().payload, b"x");
    }

    #[tokio::test]
    async fn test_group_members_share_messages() {
        let bus = InMemoryEventBus::new();
        let mut one = bus.subscribe(&["a"], "g").await.unwrap();
        let mut two = bus.subscribe(&["a"], "g").await.unwrap();

        bus.publish("a", None, b"1".to_vec()).await.unwrap();
        bus.publish("a", None, b"2".to_vec()).await.unwrap();

        let mut payloads = vec![
            one.recv().await.unwrap().payload,
            two.recv().await.unwrap().payload,
        ];
        payloads.sort();
        assert_eq!(payloads, vec![b"1".to_vec(), b"2".to_vec()]);
    }

    #[tokio::test]
    async fn test_disconnect_surfaces_connection_error() {
        let bus = InMemoryEventBus::new();
        let mut sub = bus.subscribe(&["a"], "g").await.unwrap();

        bus.disconnect_all();

        let err = sub.recv().await.unwrap_err();
        assert!(err.is_connection_level());
    }

    #[tokio::test]
    async fn test_injected_consume_error_is_transient() {
        let bus = InMemoryEventBus::new();
        let mut sub = bus.subscribe(&["a"], "g").await.unwrap();

        bus.inject_consume_error("boom");
        bus.publish("a", None, b"1".to_vec()).await.unwrap();

        let err = sub.recv().await.unwrap_err();
        assert!(!err.is_connection_level());
        assert_eq!(sub.recv().await.unwrap().payload, b"1");
    }

    #[tokio::test]
    async fn test_failing_subscribes_then_recovers() {
        let bus = InMemoryEventBus::new();
        bus.fail_next_subscribes(2);

        assert!(bus.subscribe(&["a"], "g").await.is_err());
        assert!(bus.subscribe(&["a"], "g").await.is_err());
        assert!(bus.subscribe(&["a"], "g").await.is_ok());
        assert_eq!(bus.subscribe_attempts(), 3);
    }

    #[tokio::test]
    async fn test_publish_failure() {
        let bus = InMemoryEventBus::new();
        bus.set_fail_on_publish(true);

        let result = bus.publish("a", None, Vec::new()).await;
        assert!(matches!(result, Err(EventBusError::Publish { .. })));
        assert!(bus.published("a").is_empty());
    }

    #[tokio::test]
    async fn test_publish_json_and_decode() {
        let bus = InMemoryEventBus::new();
        bus.publish_json("nums", "k", &vec![1, 2, 3]).await.unwrap();

        let decoded: Vec<Vec<i32>> = bus.published_as("nums").unwrap();
        assert_eq!(decoded, vec![vec![1, 2, 3]]);
    }

    #[tokio::test]
    async fn test_dropped_subscription_is_forgotten() {
        let bus = InMemoryEventBus::new();
        let sub = bus.subscribe(&["a"], "g").await.unwrap();
        assert_eq!(bus.subscriber_count(), 1);

        drop(sub);
        assert_eq!(bus.subscriber_count(), 0);
    }
}
