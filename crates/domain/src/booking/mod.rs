//! Booking intake.

mod service;

pub use service::BookingService;

use crate::{DomainError, Result};

/// Price stored on a booking until the saga decides the real one.
pub const PLACEHOLDER_PRICE: f64 = 100.0;

/// Command to create a provisional booking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateBooking {
    pub user_id: String,
    pub hotel_id: String,
    pub promo_code: Option<String>,
}

impl CreateBooking {
    pub fn new(user_id: impl Into<String>, hotel_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            hotel_id: hotel_id.into(),
            promo_code: None,
        }
    }

    pub fn with_promo_code(mut self, promo_code: impl Into<String>) -> Self {
        self.promo_code = Some(promo_code.into());
        self
    }

    /// Rejects blank user or hotel identifiers.
    pub fn validate(&self) -> Result<()> {
        if self.user_id.trim().is_empty() {
            return Err(DomainError::MissingField("userId"));
        }
        if self.hotel_id.trim().is_empty() {
            return Err(DomainError::MissingField("hotelId"));
        }
        Ok(())
    }
}
