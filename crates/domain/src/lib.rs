//! Domain layer for the booking saga.
//!
//! This crate provides:
//! - Booking intake: [`BookingService`] creates provisional bookings and fans
//!   out the validation request
//! - The decision rule: [`PendingValidation`] accumulates the four validator
//!   reports and yields a [`Decision`]

pub mod booking;
pub mod error;
pub mod validation;

pub use booking::{BookingService, CreateBooking, PLACEHOLDER_PRICE};
pub use error::{DomainError, Result};
pub use validation::{
    Decision, FailureReason, HotelReport, PendingValidation, PromoReport, ReviewReport,
    UserReport, pricing,
};
