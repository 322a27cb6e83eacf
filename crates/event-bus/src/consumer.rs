//! Resilient consume loop.
//!
//! A [`ConsumerLoop`] owns one subscription at a time and moves through
//! [`ConsumerState`]s:
//!
//! ```text
//! Disconnected -> Subscribing -> Consuming
//!       ^             |              |
//!       +-- backoff --+-- conn err --+
//!
//! any state -> Stopped (cancellation or retries exhausted)
//! ```
//!
//! Consecutive connection failures are counted and reset by every received
//! message. One-off consume errors pause for `consume_error_delay` and do not
//! count. Handler failures are logged and the message is acknowledged anyway,
//! so one bad payload never stalls a partition.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::{BackoffPolicy, BusMessage, EventBus, EventBusError, Subscription};

/// Lifecycle of a consumer loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsumerState {
    Disconnected,
    Subscribing,
    Consuming,
    Stopped,
}

impl fmt::Display for ConsumerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConsumerState::Disconnected => "disconnected",
            ConsumerState::Subscribing => "subscribing",
            ConsumerState::Consuming => "consuming",
            ConsumerState::Stopped => "stopped",
        };
        f.write_str(s)
    }
}

/// Error returned by a [`MessageHandler`]. Logged, never fatal to the loop.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("Malformed payload on '{topic}': {source}")]
    Decode {
        topic: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("No handler for topic '{0}'")]
    UnknownTopic(String),

    #[error("Processing failed: {0}")]
    Processing(String),
}

impl HandlerError {
    pub fn decode(topic: impl Into<String>, source: serde_json::Error) -> Self {
        HandlerError::Decode {
            topic: topic.into(),
            source,
        }
    }

    pub fn processing(err: impl fmt::Display) -> Self {
        HandlerError::Processing(err.to_string())
    }
}

/// Processes one message at a time.
#[async_trait]
pub trait MessageHandler: Send + Sync {
    async fn handle(&self, message: &BusMessage) -> Result<(), HandlerError>;
}

#[async_trait]
impl<H: MessageHandler + ?Sized> MessageHandler for std::sync::Arc<H> {
    async fn handle(&self, message: &BusMessage) -> Result<(), HandlerError> {
        (**self).handle(message).await
    }
}

/// Error that ends a consumer loop.
#[derive(Debug, Error)]
pub enum ConsumerError {
    #[error("Consumer '{name}' stopped after {attempts} consecutive connection failures: {last_error}")]
    RetriesExhausted {
        name: String,
        attempts: usize,
        last_error: EventBusError,
    },
}

/// Settings for one consumer loop.
#[derive(Debug, Clone)]
pub struct ConsumerConfig {
    /// Name used in logs and metric labels
    pub name: String,
    pub topics: Vec<String>,
    pub group: String,
    pub backoff: BackoffPolicy,
    /// Pause after a one-off consume error
    pub consume_error_delay: Duration,
}

impl ConsumerConfig {
    pub fn new<I, T>(name: impl Into<String>, group: impl Into<String>, topics: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self {
            name: name.into(),
            topics: topics.into_iter().map(Into::into).collect(),
            group: group.into(),
            backoff: BackoffPolicy::default(),
            consume_error_delay: Duration::from_secs(2),
        }
    }

    #[must_use]
    pub fn with_backoff(mut self, backoff: BackoffPolicy) -> Self {
        self.backoff = backoff;
        self
    }

    #[must_use]
    pub fn with_consume_error_delay(mut self, delay: Duration) -> Self {
        self.consume_error_delay = delay;
        self
    }
}

enum Interrupted {
    Cancelled,
    ConnectionLost(EventBusError),
}

/// Subscribes, consumes and reconnects until cancelled or out of retries.
pub struct ConsumerLoop<B, H> {
    bus: B,
    handler: H,
    config: ConsumerConfig,
    state: ConsumerState,
    failures: usize,
}

impl<B, H> ConsumerLoop<B, H>
where
    B: EventBus,
    H: MessageHandler,
{
    pub fn new(bus: B, handler: H, config: ConsumerConfig) -> Self {
        Self {
            bus,
            handler,
            config,
            state: ConsumerState::Disconnected,
            failures: 0,
        }
    }

    pub fn state(&self) -> ConsumerState {
        self.state
    }

    /// Consecutive connection failures since the last received message.
    pub fn consecutive_failures(&self) -> usize {
        self.failures
    }

    pub fn config(&self) -> &ConsumerConfig {
        &self.config
    }

    /// Runs until `cancel` fires (`Ok`) or the backoff budget is spent.
    ///
    /// A message whose handler is already running is finished and
    /// acknowledged before the loop observes cancellation.
    pub async fn run(&mut self, cancel: CancellationToken) -> Result<(), ConsumerError> {
        info!(
            consumer = %self.config.name,
            group = %self.config.group,
            topics = ?self.config.topics,
            "Starting consumer"
        );

        loop {
            if cancel.is_cancelled() {
                self.stop();
                return Ok(());
            }

            self.transition(ConsumerState::Subscribing);
            let topics: Vec<&str> = self.config.topics.iter().map(String::as_str).collect();

            let subscribed = tokio::select! {
                _ = cancel.cancelled() => {
                    self.stop();
                    return Ok(());
                }
                result = self.bus.subscribe(&topics, &self.config.group) => result,
            };

            let mut subscription = match subscribed {
                Ok(subscription) => subscription,
                Err(e) => {
                    self.connection_failed(e, &cancel).await?;
                    continue;
                }
            };

            self.transition(ConsumerState::Consuming);
            info!(consumer = %self.config.name, "Subscribed");

            match self.consume(subscription.as_mut(), &cancel).await {
                Interrupted::Cancelled => {
                    self.stop();
                    return Ok(());
                }
                Interrupted::ConnectionLost(e) => {
                    self.connection_failed(e, &cancel).await?;
                }
            }
        }
    }

    /// Spawns [`run`](Self::run) on the runtime.
    pub fn spawn(mut self, cancel: CancellationToken) -> JoinHandle<Result<(), ConsumerError>>
    where
        B: 'static,
        H: 'static,
    {
        tokio::spawn(async move { self.run(cancel).await })
    }

    async fn consume(
        &mut self,
        subscription: &mut dyn Subscription,
        cancel: &CancellationToken,
    ) -> Interrupted {
        loop {
            let received = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Interrupted::Cancelled,
                result = subscription.recv() => result,
            };

            match received {
                Ok(message) => {
                    self.failures = 0;
                    self.dispatch(&message).await;
                    if let Err(e) = subscription.ack(&message).await {
                        warn!(
                            consumer = %self.config.name,
                            topic = %message.topic,
                            offset = message.offset,
                            error = %e,
                            "Failed to acknowledge message (may be redelivered)"
                        );
                    }
                }
                Err(e) if e.is_connection_level() => return Interrupted::ConnectionLost(e),
                Err(e) => {
                    error!(
                        consumer = %self.config.name,
                        error = %e,
                        delay_ms = self.config.consume_error_delay.as_millis() as u64,
                        "Consume error"
                    );
                    if !sleep_or_cancel(self.config.consume_error_delay, cancel).await {
                        return Interrupted::Cancelled;
                    }
                }
            }
        }
    }

    async fn dispatch(&self, message: &BusMessage) {
        debug!(
            consumer = %self.config.name,
            topic = %message.topic,
            partition = message.partition,
            offset = message.offset,
            "Handling message"
        );

        match self.handler.handle(message).await {
            Ok(()) => {
                metrics::counter!(
                    "consumer_messages_total",
                    "consumer" => self.config.name.clone(),
                    "topic" => message.topic.clone()
                )
                .increment(1);
            }
            Err(e) => {
                error!(
                    consumer = %self.config.name,
                    topic = %message.topic,
                    offset = message.offset,
                    error = %e,
                    payload = %message.payload_lossy(),
                    "Failed to handle message, skipping"
                );
                metrics::counter!(
                    "consumer_handler_errors_total",
                    "consumer" => self.config.name.clone(),
                    "topic" => message.topic.clone()
                )
                .increment(1);
            }
        }
    }

    async fn connection_failed(
        &mut self,
        error: EventBusError,
        cancel: &CancellationToken,
    ) -> Result<(), ConsumerError> {
        self.failures += 1;
        self.transition(ConsumerState::Disconnected);
        metrics::counter!("consumer_reconnects_total", "consumer" => self.config.name.clone())
            .increment(1);

        if self.config.backoff.is_exhausted(self.failures) {
            error!(
                consumer = %self.config.name,
                attempts = self.failures,
                error = %error,
                "Giving up after repeated connection failures"
            );
            self.stop();
            return Err(ConsumerError::RetriesExhausted {
                name: self.config.name.clone(),
                attempts: self.failures,
                last_error: error,
            });
        }

        let delay = self.config.backoff.delay_for_attempt(self.failures - 1);
        warn!(
            consumer = %self.config.name,
            attempt = self.failures,
            max_retries = self.config.backoff.max_retries,
            delay_ms = delay.as_millis() as u64,
            error = %error,
            "Connection failed, retrying"
        );

        // Cancellation during the pause is picked up at the top of `run`.
        sleep_or_cancel(delay, cancel).await;
        Ok(())
    }

    fn transition(&mut self, next: ConsumerState) {
        if self.state != next {
            debug!(consumer = %self.config.name, from = %self.state, to = %next, "State change");
            self.state = next;
        }
    }

    fn stop(&mut self) {
        self.transition(ConsumerState::Stopped);
        info!(consumer = %self.config.name, "Consumer stopped");
    }
}

/// Sleeps for `delay`. Returns false if cancelled first.
async fn sleep_or_cancel(delay: Duration, cancel: &CancellationToken) -> bool {
    tokio::select! {
        _ = cancel.cancelled() => false,
        _ = tokio::time::sleep(delay) => true,
    }
}
