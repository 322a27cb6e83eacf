//! History recorder.
//!
//! Subscribes to `booking-confirmed` and `booking-cancelled` and appends one
//! history record per delivered message. There is no deduplication: a
//! redelivered outcome is recorded again.

pub mod error;
pub mod recorder;

pub use error::{HistoryError, Result};
pub use recorder::HistoryRecorder;
