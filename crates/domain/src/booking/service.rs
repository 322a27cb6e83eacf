//! Booking service: intake and listing.

use booking_store::{Booking, BookingStore};
use common::{BookingId, ValidationRequest, topics};
use event_bus::{EventBus, EventBusExt};
use tracing::{error, info};

use super::{CreateBooking, PLACEHOLDER_PRICE};
use crate::Result;

/// Entry point for CreateBooking and ListBookings.
///
/// Creating a booking stores it as pending and publishes one validation
/// request; the saga decides the outcome later.
pub struct BookingService<S, B> {
    store: S,
    bus: B,
}

impl<S: BookingStore, B: EventBus> BookingService<S, B> {
    /// Creates a new booking service.
    pub fn new(store: S, bus: B) -> Self {
        Self { store, bus }
    }

    /// Returns a reference to the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Creates a provisional booking and requests its validation.
    ///
    /// The returned price is a placeholder. If the request cannot be
    /// published the error is returned and the stored booking stays pending.
    #[tracing::instrument(skip(self), fields(user_id = %cmd.user_id, hotel_id = %cmd.hotel_id))]
    pub async fn create_booking(&self, cmd: CreateBooking) -> Result<Booking> {
        cmd.validate()?;

        let id = BookingId::generate();
        let promo_code = cmd.promo_code.unwrap_or_default();
        let booking = Booking::provisional(
            id.clone(),
            cmd.user_id,
            cmd.hotel_id,
            promo_code,
            PLACEHOLDER_PRICE,
        );

        self.store.insert_booking(&booking).await?;

        let request = ValidationRequest {
            correlation_id: id.clone(),
            booking_id: id.clone(),
            user_id: booking.user_id.clone(),
            hotel_id: booking.hotel_id.clone(),
            promo_code: booking.promo_code.clone(),
        };

        if let Err(e) = self
            .bus
            .publish_json(topics::VALIDATION_REQUEST, id.as_str(), &request)
            .await
        {
            error!(
                booking_id = %id,
                error = %e,
                "Validation request not published, booking left pending"
            );
            return Err(e.into());
        }

        metrics::counter!("bookings_created_total").increment(1);
        info!(booking_id = %id, "Booking created, validation requested");

        Ok(booking)
    }

    /// Lists bookings, optionally for one user.
    #[tracing::instrument(skip(self))]
    pub async fn list_bookings(&self, user_id: Option<&str>) -> Result<Vec<Booking>> {
        Ok(self.store.list_bookings(user_id).await?)
    }
}
