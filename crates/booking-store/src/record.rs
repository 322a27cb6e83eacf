//! Persisted records: bookings and history entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{BookingId, StoreError};

/// Lifecycle status of a stored booking.
///
/// Cancelled bookings are deleted rather than flagged, so there is no
/// cancelled variant here; cancellations live only in the history log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    /// Awaiting the outcome of validation.
    #[default]
    Pending,
    /// All validations passed and the final price is set.
    Confirmed,
}

impl BookingStatus {
    /// Returns the status as persisted.
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
        }
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for BookingStatus {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(BookingStatus::Pending),
            "confirmed" => Ok(BookingStatus::Confirmed),
            other => Err(StoreError::InvalidStatus(other.to_string())),
        }
    }
}

/// A hotel booking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: BookingId,
    pub user_id: String,
    pub hotel_id: String,
    pub promo_code: String,
    pub discount_percent: f64,
    pub price: f64,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
}

impl Booking {
    /// Creates a pending booking with a placeholder price and no discount.
    pub fn provisional(
        id: BookingId,
        user_id: impl Into<String>,
        hotel_id: impl Into<String>,
        promo_code: impl Into<String>,
        placeholder_price: f64,
    ) -> Self {
        Self {
            id,
            user_id: user_id.into(),
            hotel_id: hotel_id.into(),
            promo_code: promo_code.into(),
            discount_percent: 0.0,
            price: placeholder_price,
            status: BookingStatus::Pending,
            created_at: Utc::now(),
        }
    }

    /// Returns true while the booking awaits a saga decision.
    pub fn is_pending(&self) -> bool {
        self.status == BookingStatus::Pending
    }
}

/// Terminal outcome recorded in the history log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryStatus {
    Confirmed,
    Cancelled,
}

impl HistoryStatus {
    /// Returns the status as persisted.
    pub fn as_str(&self) -> &'static str {
        match self {
            HistoryStatus::Confirmed => "confirmed",
            HistoryStatus::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for HistoryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for HistoryStatus {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "confirmed" => Ok(HistoryStatus::Confirmed),
            "cancelled" => Ok(HistoryStatus::Cancelled),
            other => Err(StoreError::InvalidStatus(other.to_string())),
        }
    }
}

/// A history entry that has not been assigned a sequence ID yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewHistoryRecord {
    pub booking_id: BookingId,
    pub user_id: String,
    pub hotel_id: String,
    pub status: HistoryStatus,
    pub final_price: Option<f64>,
    pub reason: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

impl NewHistoryRecord {
    /// History entry for a confirmed booking.
    pub fn confirmed(
        booking_id: BookingId,
        user_id: impl Into<String>,
        hotel_id: impl Into<String>,
        final_price: f64,
    ) -> Self {
        Self {
            booking_id,
            user_id: user_id.into(),
            hotel_id: hotel_id.into(),
            status: HistoryStatus::Confirmed,
            final_price: Some(final_price),
            reason: None,
            recorded_at: Utc::now(),
        }
    }

    /// History entry for a cancelled booking.
    pub fn cancelled(
        booking_id: BookingId,
        user_id: impl Into<String>,
        hotel_id: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            booking_id,
            user_id: user_id.into(),
            hotel_id: hotel_id.into(),
            status: HistoryStatus::Cancelled,
            final_price: None,
            reason: Some(reason.into()),
            recorded_at: Utc::now(),
        }
    }

    /// Attaches the store-assigned sequence ID.
    pub fn with_id(self, id: i64) -> HistoryRecord {
        HistoryRecord {
            id,
            booking_id: self.booking_id,
            user_id: self.user_id,
            hotel_id: self.hotel_id,
            status: self.status,
            final_price: self.final_price,
            reason: self.reason,
            recorded_at: self.recorded_at,
        }
    }
}

/// An immutable entry in the history log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRecord {
    pub id: i64,
    pub booking_id: BookingId,
    pub user_id: String,
    pub hotel_id: String,
    pub status: HistoryStatus,
    pub final_price: Option<f64>,
    pub reason: Option<String>,
    pub recorded_at: DateTime<Utc>,
}
