use common::{
    HotelValidationResult, PromoValidationResult, ReviewValidationResult, UserValidationResult,
};

use super::{Decision, FailureReason, pricing};

/// User status that unlocks VIP pricing and VIP-only promos.
pub const VIP_STATUS: &str = "VIP";

#[derive(Debug, Clone, PartialEq)]
pub struct UserReport {
    pub active: bool,
    pub blacklisted: bool,
    pub status: String,
}

impl UserReport {
    pub fn is_vip(&self) -> bool {
        self.status == VIP_STATUS
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HotelReport {
    pub operational: bool,
    pub fully_booked: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PromoReport {
    pub valid: bool,
    pub discount_percent: f64,
    pub vip_only: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReviewReport {
    pub trusted: bool,
}

/// Partial validation results for one booking.
///
/// Each domain is `None` until its validator reports. A later report for the
/// same domain replaces the earlier one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PendingValidation {
    pub user: Option<UserReport>,
    pub hotel: Option<HotelReport>,
    pub promo: Option<PromoReport>,
    pub review: Option<ReviewReport>,
}

impl PendingValidation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply_user(&mut self, result: &UserValidationResult) {
        self.user = Some(UserReport {
            active: result.active,
            blacklisted: result.blacklisted,
            status: result.status.clone(),
        });
    }

    pub fn apply_hotel(&mut self, result: &HotelValidationResult) {
        self.hotel = Some(HotelReport {
            operational: result.operational,
            fully_booked: result.fully_booked,
        });
    }

    pub fn apply_promo(&mut self, result: &PromoValidationResult) {
        self.promo = Some(PromoReport {
            valid: result.valid,
            discount_percent: result.discount.unwrap_or(0.0),
            vip_only: result.vip_only.unwrap_or(false),
        });
    }

    pub fn apply_review(&mut self, result: &ReviewValidationResult) {
        self.review = Some(ReviewReport {
            trusted: result.review_score_ok,
        });
    }

    /// Number of domains that have reported, out of four.
    pub fn reported(&self) -> usize {
        [
            self.user.is_some(),
            self.hotel.is_some(),
            self.promo.is_some(),
            self.review.is_some(),
        ]
        .into_iter()
        .filter(|r| *r)
        .count()
    }

    /// True once every domain has reported.
    pub fn is_complete(&self) -> bool {
        self.reported() == 4
    }

    /// True if complete and every check passed.
    ///
    /// A promo that is valid and VIP-only fails the booking unless the user is
    /// VIP. An invalid promo does not fail it; it just grants no discount.
    pub fn is_valid(&self) -> bool {
        let (Some(user), Some(hotel), Some(promo), Some(review)) =
            (&self.user, &self.hotel, &self.promo, &self.review)
        else {
            return false;
        };

        user.active
            && !user.blacklisted
            && hotel.operational
            && !hotel.fully_booked
            && (!promo.valid || !promo.vip_only || user.is_vip())
            && review.trusted
    }

    /// First failing check in precedence order.
    ///
    /// Checks without a listed reason (an inactive user, a VIP-only promo for
    /// a regular user) fall through to `Unknown`.
    pub fn failure_reason(&self) -> FailureReason {
        if self.user.as_ref().is_some_and(|u| u.blacklisted) {
            FailureReason::UserBlacklisted
        } else if self.hotel.is_some_and(|h| !h.operational) {
            FailureReason::HotelNotOperational
        } else if self.hotel.is_some_and(|h| h.fully_booked) {
            FailureReason::HotelFullyBooked
        } else if self.promo.is_some_and(|p| !p.valid) {
            FailureReason::InvalidPromo
        } else if self.review.is_some_and(|r| !r.trusted) {
            FailureReason::BadReviews
        } else {
            FailureReason::Unknown
        }
    }

    /// Applies the decision rule.
    pub fn decide(&self) -> Decision {
        if !self.is_complete() {
            return Decision::Incomplete;
        }

        if !self.is_valid() {
            return Decision::Cancel {
                reason: self.failure_reason(),
            };
        }

        let is_vip = self.user.as_ref().is_some_and(UserReport::is_vip);
        let discount_percent = self
            .promo
            .filter(|p| p.valid)
            .map_or(0.0, |p| p.discount_percent);

        Decision::Confirm {
            final_price: pricing::final_price(is_vip, discount_percent),
            discount_percent,
        }
    }
}
