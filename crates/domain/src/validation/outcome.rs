use std::fmt;

/// Why a booking was cancelled.
///
/// The first six mirror the validators in precedence order; `ValidationTimeout`
/// is used when a saga never completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureReason {
    UserBlacklisted,
    HotelNotOperational,
    HotelFullyBooked,
    InvalidPromo,
    BadReviews,
    Unknown,
    ValidationTimeout,
}

impl FailureReason {
    /// Reason string carried on `booking-cancelled`.
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureReason::UserBlacklisted => "user_blacklisted",
            FailureReason::HotelNotOperational => "hotel_not_operational",
            FailureReason::HotelFullyBooked => "hotel_fully_booked",
            FailureReason::InvalidPromo => "invalid_promo",
            FailureReason::BadReviews => "bad_reviews",
            FailureReason::Unknown => "unknown",
            FailureReason::ValidationTimeout => "validation_timeout",
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What to do with a booking after a validation report.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Decision {
    /// Some validators have not reported yet.
    Incomplete,
    /// Everything passed.
    Confirm {
        final_price: f64,
        discount_percent: f64,
    },
    /// Something failed; compensate.
    Cancel { reason: FailureReason },
}
