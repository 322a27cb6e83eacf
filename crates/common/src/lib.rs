//! Shared identifiers and bus message schemas.
//!
//! Every crate in the workspace speaks in terms of [`BookingId`] and the
//! payload types in [`messages`]; topic names live in [`topics`].

pub mod messages;
pub mod topics;
pub mod types;

pub use messages::{
    BookingCancelled, BookingConfirmed, HotelValidationResult, PromoValidationResult,
    ReviewValidationResult, UserValidationResult, ValidationRequest,
};
pub use types::BookingId;
