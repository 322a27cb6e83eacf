//! Periodic expiry of sagas that never complete.

use std::sync::Arc;
use std::time::Duration;

use booking_store::BookingStore;
use event_bus::EventBus;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::ValidationAggregator;

/// Runs [`ValidationAggregator::expire_stale`] on a fixed interval.
pub struct StaleSagaSweeper<S, B> {
    aggregator: Arc<ValidationAggregator<S, B>>,
    max_age: Duration,
    interval: Duration,
}

impl<S, B> StaleSagaSweeper<S, B>
where
    S: BookingStore + 'static,
    B: EventBus + 'static,
{
    pub fn new(
        aggregator: Arc<ValidationAggregator<S, B>>,
        max_age: Duration,
        interval: Duration,
    ) -> Self {
        Self {
            aggregator,
            max_age,
            interval,
        }
    }

    /// Sweeps until `cancel` fires. Sweep failures are logged and retried on
    /// the next tick.
    pub async fn run(self, cancel: CancellationToken) {
        info!(
            max_age_secs = self.max_age.as_secs(),
            interval_secs = self.interval.as_secs(),
            "Starting stale saga sweeper"
        );

        let mut ticker = tokio::time::interval(self.interval.max(Duration::from_millis(1)));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    if let Err(e) = self.aggregator.expire_stale(self.max_age).await {
                        error!(error = %e, "Stale saga sweep failed");
                    }
                }
            }
        }

        info!("Stale saga sweeper stopped");
    }

    pub fn spawn(self, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(self.run(cancel))
    }
}
