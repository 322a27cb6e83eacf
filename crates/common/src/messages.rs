//! JSON payloads exchanged over the bus.
//!
//! Field names are camelCase on the wire. Optional fields default when absent
//! so that validators may omit what they do not know.

use serde::{Deserialize, Serialize};

use crate::types::BookingId;

/// Fan-out request asking each validator to check a provisional booking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationRequest {
    pub correlation_id: BookingId,
    pub booking_id: BookingId,
    pub user_id: String,
    pub hotel_id: String,
    #[serde(default)]
    pub promo_code: String,
}

/// User eligibility result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserValidationResult {
    pub correlation_id: BookingId,
    pub active: bool,
    pub blacklisted: bool,
    /// Loyalty tier, e.g. `"normal"` or `"VIP"`.
    #[serde(default)]
    pub status: String,
}

/// Hotel availability result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HotelValidationResult {
    pub correlation_id: BookingId,
    pub operational: bool,
    pub fully_booked: bool,
}

/// Promo code result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromoValidationResult {
    pub correlation_id: BookingId,
    pub valid: bool,
    /// Discount granted by the promo, in price units.
    #[serde(default)]
    pub discount: Option<f64>,
    /// Set when the promo is restricted to VIP users.
    #[serde(default)]
    pub vip_only: Option<bool>,
}

/// Review trust result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewValidationResult {
    pub correlation_id: BookingId,
    pub review_score_ok: bool,
}

/// Terminal outcome published when a booking is confirmed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingConfirmed {
    pub booking_id: BookingId,
    pub final_price: f64,
    pub user_id: String,
    pub hotel_id: String,
}

/// Terminal outcome published when a booking is cancelled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingCancelled {
    pub booking_id: BookingId,
    pub reason: String,
    pub user_id: String,
    pub hotel_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_validation_request_uses_camel_case() {
        let request = ValidationRequest {
            correlation_id: BookingId::new("b-1"),
            booking_id: BookingId::new("b-1"),
            user_id: "u-1".to_string(),
            hotel_id: "h-1".to_string(),
            promo_code: String::new(),
        };

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            json!({
                "correlationId": "b-1",
                "bookingId": "b-1",
                "userId": "u-1",
                "hotelId": "h-1",
                "promoCode": ""
            })
        );
    }

    #[test]
    fn test_promo_result_optional_fields_default() {
        let promo: PromoValidationResult =
            serde_json::from_value(json!({"correlationId": "b-1", "valid": false})).unwrap();
        assert_eq!(promo.discount, None);
        assert_eq!(promo.vip_only, None);
    }

    #[test]
    fn test_user_result_status_defaults_to_empty() {
        let user: UserValidationResult = serde_json::from_value(
            json!({"correlationId": "b-1", "active": true, "blacklisted": false}),
        )
        .unwrap();
        assert_eq!(user.status, "");
    }

    #[test]
    fn test_review_result_requires_score_flag() {
        let result: Result<ReviewValidationResult, _> =
            serde_json::from_value(json!({"correlationId": "b-1"}));
        assert!(result.is_err());
    }

    #[test]
    fn test_cancelled_payload_shape() {
        let cancelled = BookingCancelled {
            booking_id: BookingId::new("b-9"),
            reason: "user_blacklisted".to_string(),
            user_id: "u".to_string(),
            hotel_id: "h".to_string(),
        };
        let value = serde_json::to_value(&cancelled).unwrap();
        assert_eq!(value["bookingId"], "b-9");
        assert_eq!(value["reason"], "user_blacklisted");
    }
}
