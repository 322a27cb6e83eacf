//! Booking saga coordination.
//!
//! The saga for one booking runs as follows:
//! 1. Intake publishes a validation request (see `domain::BookingService`)
//! 2. Four validators report back on their result topics
//! 3. [`ResultConsumer`] decodes each report and hands it to the
//!    [`ValidationAggregator`]
//! 4. Once all four are in, the aggregator confirms the booking or cancels it
//!    (compensating delete) and publishes the terminal outcome
//!
//! [`StaleSagaSweeper`] cancels sagas that never complete.

pub mod aggregator;
pub mod consumer;
pub mod error;
pub mod registry;
pub mod sweeper;

pub use aggregator::{ExpiryReport, Outcome, SkipReason, ValidationAggregator};
pub use consumer::ResultConsumer;
pub use error::{Result, SagaError};
pub use registry::PendingRegistry;
pub use sweeper::StaleSagaSweeper;
