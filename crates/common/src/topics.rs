//! Bus topic names.

/// Published by intake; consumed by the four validators.
pub const VALIDATION_REQUEST: &str = "booking-validation-request";

/// User eligibility results.
pub const USER_VALIDATION_RESULT: &str = "user-validation-result";

/// Hotel availability results.
pub const HOTEL_VALIDATION_RESULT: &str = "hotel-validation-result";

/// Promo code results.
pub const PROMO_VALIDATION_RESULT: &str = "promo-validation-result";

/// Review trust results.
pub const REVIEW_VALIDATION_RESULT: &str = "review-validation-result";

/// Terminal outcome: booking confirmed.
pub const BOOKING_CONFIRMED: &str = "booking-confirmed";

/// Terminal outcome: booking cancelled.
pub const BOOKING_CANCELLED: &str = "booking-cancelled";

/// The result topics the saga coordinator listens on.
pub const VALIDATION_RESULTS: [&str; 4] = [
    USER_VALIDATION_RESULT,
    HOTEL_VALIDATION_RESULT,
    PROMO_VALIDATION_RESULT,
    REVIEW_VALIDATION_RESULT,
];

/// The terminal outcome topics the history recorder listens on.
pub const BOOKING_OUTCOMES: [&str; 2] = [BOOKING_CONFIRMED, BOOKING_CANCELLED];
