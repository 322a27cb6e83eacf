//! Validation aggregator: joins the four validator reports and resolves the
//! booking exactly once.

use std::time::{Duration, Instant};

use booking_store::{Booking, BookingStore};
use chrono::Utc;
use common::{
    BookingCancelled, BookingConfirmed, BookingId, HotelValidationResult, PromoValidationResult,
    ReviewValidationResult, UserValidationResult, topics,
};
use domain::{Decision, FailureReason, PendingValidation};
use event_bus::{EventBus, EventBusExt};
use tracing::{debug, error, info, warn};

use crate::error::{Result, SagaError};
use crate::registry::{LockedEntry, PendingRegistry};

/// Why a complete saga was dropped without a decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The booking row is gone.
    BookingMissing,
    /// The booking exists but is no longer pending.
    AlreadyResolved,
}

/// Result of feeding one report to the aggregator.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Waiting on the remaining validators.
    Waiting { reported: usize },
    Confirmed(BookingConfirmed),
    Cancelled(BookingCancelled),
    /// Complete, but there was nothing left to decide.
    Skipped(SkipReason),
}

impl Outcome {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Outcome::Confirmed(_) | Outcome::Cancelled(_))
    }
}

/// Summary of one [`ValidationAggregator::expire_stale`] pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExpiryReport {
    /// Pending bookings cancelled with `validation_timeout`.
    pub expired: usize,
    /// Registry entries dropped because their booking was already settled.
    pub orphans_dropped: usize,
}

impl ExpiryReport {
    pub fn is_empty(&self) -> bool {
        self.expired == 0 && self.orphans_dropped == 0
    }
}

/// Accumulates validator reports per booking and confirms or cancels once all
/// four are in.
///
/// Every handler call re-evaluates the decision, since reports arrive in any
/// order. The store write and the outcome publish happen while the booking's
/// entry is locked, so one booking gets at most one terminal decision per
/// entry.
pub struct ValidationAggregator<S, B> {
    store: S,
    bus: B,
    registry: PendingRegistry,
}

impl<S: BookingStore, B: EventBus> ValidationAggregator<S, B> {
    /// Creates a new aggregator.
    pub fn new(store: S, bus: B) -> Self {
        Self {
            store,
            bus,
            registry: PendingRegistry::new(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }

    /// Number of bookings with partial results held in memory.
    pub fn pending_count(&self) -> usize {
        self.registry.len()
    }

    /// Copy of the partial results held for `id`, if any.
    pub async fn snapshot(&self, id: &BookingId) -> Option<PendingValidation> {
        let entry = self.registry.lock_existing(id).await?;
        Some(entry.pending().clone())
    }

    #[tracing::instrument(skip(self, result), fields(booking_id = %result.correlation_id))]
    pub async fn handle_user(&self, result: &UserValidationResult) -> Result<Outcome> {
        self.merge(&result.correlation_id, "user", |p| p.apply_user(result))
            .await
    }

    #[tracing::instrument(skip(self, result), fields(booking_id = %result.correlation_id))]
    pub async fn handle_hotel(&self, result: &HotelValidationResult) -> Result<Outcome> {
        self.merge(&result.correlation_id, "hotel", |p| p.apply_hotel(result))
            .await
    }

    #[tracing::instrument(skip(self, result), fields(booking_id = %result.correlation_id))]
    pub async fn handle_promo(&self, result: &PromoValidationResult) -> Result<Outcome> {
        self.merge(&result.correlation_id, "promo", |p| p.apply_promo(result))
            .await
    }

    #[tracing::instrument(skip(self, result), fields(booking_id = %result.correlation_id))]
    pub async fn handle_review(&self, result: &ReviewValidationResult) -> Result<Outcome> {
        self.merge(&result.correlation_id, "review", |p| p.apply_review(result))
            .await
    }

    async fn merge(
        &self,
        id: &BookingId,
        domain: &'static str,
        apply: impl FnOnce(&mut PendingValidation) + Send,
    ) -> Result<Outcome> {
        let mut entry = self.registry.lock(id).await;
        apply(entry.pending_mut());

        let reported = entry.pending().reported();
        debug!(domain, reported, "Merged validation result");

        match entry.pending().decide() {
            Decision::Incomplete => Ok(Outcome::Waiting { reported }),
            decision => self.resolve(entry, decision).await,
        }
    }

    async fn resolve(&self, entry: LockedEntry<'_>, decision: Decision) -> Result<Outcome> {
        let started = Instant::now();
        let id = entry.id().clone();
        let reported = entry.pending().reported();

        let booking = match self.store.get_booking(&id).await? {
            Some(booking) if booking.is_pending() => booking,
            Some(booking) => {
                warn!(status = %booking.status, "Booking already resolved, discarding late result");
                entry.discard();
                return Ok(Outcome::Skipped(SkipReason::AlreadyResolved));
            }
            None => {
                warn!("Booking not found, discarding late result");
                entry.discard();
                return Ok(Outcome::Skipped(SkipReason::BookingMissing));
            }
        };

        let outcome = match decision {
            Decision::Confirm {
                final_price,
                discount_percent,
            } => {
                self.confirm(entry, &booking, final_price, discount_percent)
                    .await?
            }
            Decision::Cancel { reason } => self.cancel(entry, &booking, reason).await?,
            Decision::Incomplete => return Ok(Outcome::Waiting { reported }),
        };

        metrics::histogram!("saga_decision_duration_seconds")
            .record(started.elapsed().as_secs_f64());
        Ok(outcome)
    }

    /// Updates the booking, then publishes `booking-confirmed`.
    async fn confirm(
        &self,
        entry: LockedEntry<'_>,
        booking: &Booking,
        final_price: f64,
        discount_percent: f64,
    ) -> Result<Outcome> {
        let id = &booking.id;

        let confirmed = match self
            .store
            .confirm_booking(id, final_price, discount_percent)
            .await
        {
            Ok(Some(confirmed)) => confirmed,
            Ok(None) => {
                warn!("Booking deleted before confirmation, discarding");
                entry.discard();
                return Ok(Outcome::Skipped(SkipReason::BookingMissing));
            }
            Err(e) => {
                error!(error = %e, "Failed to confirm booking, saga left unresolved");
                return Err(e.into());
            }
        };

        let event = BookingConfirmed {
            booking_id: id.clone(),
            final_price: confirmed.price,
            user_id: confirmed.user_id,
            hotel_id: confirmed.hotel_id,
        };

        let published = self
            .bus
            .publish_json(topics::BOOKING_CONFIRMED, id.as_str(), &event)
            .await;
        // The store is already confirmed, so a retry would find nothing to do.
        entry.discard();

        if let Err(e) = published {
            error!(error = %e, "Booking confirmed in store but confirmation not published");
            return Err(e.into());
        }

        metrics::counter!("saga_confirmed_total").increment(1);
        info!(final_price = event.final_price, discount_percent, "Booking confirmed");
        Ok(Outcome::Confirmed(event))
    }

    /// Publishes `booking-cancelled`, then deletes the booking.
    async fn cancel(
        &self,
        entry: LockedEntry<'_>,
        booking: &Booking,
        reason: FailureReason,
    ) -> Result<Outcome> {
        let id = &booking.id;

        let event = BookingCancelled {
            booking_id: id.clone(),
            reason: reason.as_str().to_string(),
            user_id: booking.user_id.clone(),
            hotel_id: booking.hotel_id.clone(),
        };

        if let Err(e) = self
            .bus
            .publish_json(topics::BOOKING_CANCELLED, id.as_str(), &event)
            .await
        {
            error!(error = %e, %reason, "Failed to publish cancellation, saga left unresolved");
            return Err(e.into());
        }

        let deleted = self.store.delete_booking(id).await;
        entry.discard();

        if let Err(e) = deleted {
            error!(error = %e, %reason, "Cancellation published but booking not deleted");
            return Err(e.into());
        }

        metrics::counter!("saga_cancelled_total", "reason" => reason.as_str()).increment(1);
        info!(%reason, "Booking cancelled");
        Ok(Outcome::Cancelled(event))
    }

    /// Cancels pending bookings older than `max_age` with `validation_timeout`
    /// and drops in-memory entries that outlived their booking.
    #[tracing::instrument(skip(self))]
    pub async fn expire_stale(&self, max_age: Duration) -> Result<ExpiryReport> {
        let age = chrono::Duration::from_std(max_age)
            .map_err(|e| SagaError::InvalidMaxAge(e.to_string()))?;
        let cutoff = Utc::now() - age;
        let mut report = ExpiryReport::default();

        for stale in self.store.list_stale_pending(cutoff).await? {
            let entry = self.registry.lock(&stale.id).await;

            // Re-read under the lock; a handler may have just resolved it.
            match self.store.get_booking(&stale.id).await? {
                Some(booking) if booking.is_pending() => {
                    let reported = entry.pending().reported();
                    warn!(booking_id = %booking.id, reported, "Saga timed out");
                    self.cancel(entry, &booking, FailureReason::ValidationTimeout)
                        .await?;
                    metrics::counter!("saga_expired_total").increment(1);
                    report.expired += 1;
                }
                _ => entry.discard(),
            }
        }

        for id in self.registry.ids() {
            let Some(entry) = self.registry.lock_existing(&id).await else {
                continue;
            };
            if entry.age() < max_age {
                continue;
            }

            let settled = self
                .store
                .get_booking(&id)
                .await?
                .is_none_or(|b| !b.is_pending());
            if settled {
                debug!(booking_id = %id, "Dropping orphaned validation state");
                entry.discard();
                report.orphans_dropped += 1;
            }
        }

        if !report.is_empty() {
            info!(
                expired = report.expired,
                orphans_dropped = report.orphans_dropped,
                "Stale sagas swept"
            );
        }
        Ok(report)
    }
}
