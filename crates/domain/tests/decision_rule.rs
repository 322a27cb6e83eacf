//! Decision rule truth table through the public API.

use common::{
    BookingId, HotelValidationResult, PromoValidationResult, ReviewValidationResult,
    UserValidationResult,
};
use domain::{Decision, FailureReason, PendingValidation};

#[derive(Clone, Copy)]
struct Inputs {
    active: bool,
    blacklisted: bool,
    vip: bool,
    operational: bool,
    fully_booked: bool,
    promo_valid: bool,
    discount: f64,
    vip_only: bool,
    trusted: bool,
}

impl Default for Inputs {
    fn default() -> Self {
        Self {
            active: true,
            blacklisted: false,
            vip: false,
            operational: true,
            fully_booked: false,
            promo_valid: false,
            discount: 0.0,
            vip_only: false,
            trusted: true,
        }
    }
}

fn decide(inputs: Inputs) -> Decision {
    let id = BookingId::new("b-1");
    let mut pending = PendingValidation::new();
    pending.apply_user(&UserValidationResult {
        correlation_id: id.clone(),
        active: inputs.active,
        blacklisted: inputs.blacklisted,
        status: if inputs.vip { "VIP" } else { "normal" }.to_string(),
    });
    pending.apply_hotel(&HotelValidationResult {
        correlation_id: id.clone(),
        operational: inputs.operational,
        fully_booked: inputs.fully_booked,
    });
    pending.apply_promo(&PromoValidationResult {
        correlation_id: id.clone(),
        valid: inputs.promo_valid,
        discount: Some(inputs.discount),
        vip_only: Some(inputs.vip_only),
    });
    pending.apply_review(&ReviewValidationResult {
        correlation_id: id,
        review_score_ok: inputs.trusted,
    });
    pending.decide()
}

fn cancelled(reason: FailureReason) -> Decision {
    Decision::Cancel { reason }
}

#[test]
fn test_vip_only_promo_with_regular_user_is_unknown() {
    let decision = decide(Inputs {
        promo_valid: true,
        vip_only: true,
        ..Inputs::default()
    });
    assert_eq!(decision, cancelled(FailureReason::Unknown));
}

#[test]
fn test_vip_with_twenty_off_confirms_at_sixty() {
    let decision = decide(Inputs {
        vip: true,
        promo_valid: true,
        discount: 20.0,
        ..Inputs::default()
    });
    assert_eq!(
        decision,
        Decision::Confirm {
            final_price: 60.0,
            discount_percent: 20.0
        }
    );
}

#[test]
fn test_blacklisted_user_is_cancelled() {
    let decision = decide(Inputs {
        blacklisted: true,
        ..Inputs::default()
    });
    assert_eq!(decision, cancelled(FailureReason::UserBlacklisted));
}

#[test]
fn test_inactive_user_with_good_promo_is_unknown() {
    let decision = decide(Inputs {
        active: false,
        promo_valid: true,
        ..Inputs::default()
    });
    assert_eq!(decision, cancelled(FailureReason::Unknown));
}

#[test]
fn test_every_single_failure_has_expected_reason() {
    let cases = [
        (
            Inputs {
                operational: false,
                ..Inputs::default()
            },
            FailureReason::HotelNotOperational,
        ),
        (
            Inputs {
                fully_booked: true,
                ..Inputs::default()
            },
            FailureReason::HotelFullyBooked,
        ),
        (
            Inputs {
                trusted: false,
                promo_valid: true,
                ..Inputs::default()
            },
            FailureReason::BadReviews,
        ),
    ];

    for (inputs, reason) in cases {
        assert_eq!(decide(inputs), cancelled(reason));
    }
}

#[test]
fn test_invalid_promo_discount_is_ignored() {
    let decision = decide(Inputs {
        promo_valid: false,
        discount: 30.0,
        ..Inputs::default()
    });
    assert_eq!(
        decision,
        Decision::Confirm {
            final_price: 100.0,
            discount_percent: 0.0
        }
    );
}

#[test]
fn test_reason_strings_match_wire_format() {
    assert_eq!(FailureReason::UserBlacklisted.as_str(), "user_blacklisted");
    assert_eq!(FailureReason::HotelNotOperational.as_str(), "hotel_not_operational");
    assert_eq!(FailureReason::HotelFullyBooked.as_str(), "hotel_fully_booked");
    assert_eq!(FailureReason::InvalidPromo.as_str(), "invalid_promo");
    assert_eq!(FailureReason::BadReviews.as_str(), "bad_reviews");
    assert_eq!(FailureReason::Unknown.as_str(), "unknown");
    assert_eq!(FailureReason::ValidationTimeout.to_string(), "validation_timeout");
}
