//! Final price computation.

/// Base price for VIP users.
pub const VIP_BASE_PRICE: f64 = 80.0;

/// Base price for everyone else.
pub const STANDARD_BASE_PRICE: f64 = 100.0;

pub fn base_price(is_vip: bool) -> f64 {
    if is_vip {
        VIP_BASE_PRICE
    } else {
        STANDARD_BASE_PRICE
    }
}

/// Base price minus the promo discount, never below zero.
pub fn final_price(is_vip: bool, discount: f64) -> f64 {
    (base_price(is_vip) - discount).max(0.0)
}
