//! Validation results and the confirm-or-cancel decision.

mod outcome;
mod pending;
pub mod pricing;

pub use outcome::{Decision, FailureReason};
pub use pending::{
    HotelReport, PendingValidation, PromoReport, ReviewReport, UserReport, VIP_STATUS,
};
