//! Response DTOs for callers exposing the engine over an API.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::error::PricingError;

/// Money value for JSON responses
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MoneyResponse {
    #[serde(with = "rust_decimal::serde::str")]
    pub amount: Decimal,
    pub currency: String,
}

impl MoneyResponse {
    pub fn new(amount: Decimal, currency: impl Into<String>) -> Self {
        MoneyResponse {
            amount,
            currency: currency.into(),
        }
    }
}

/// Response for a priced booking request
#[derive(Debug, Serialize)]
pub struct BookingQuoteResponse {
    pub cost: MoneyResponse,
    pub blocks_booked: u32,
}

/// Structured pricing failure for API error payloads.
///
/// `error_type` is the machine-readable reason code; message parameters
/// (e.g. the minimum duration in days) land in `details` so the caller can
/// localize the message itself.
#[derive(Debug, Serialize)]
pub struct PricingErrorResponse {
    pub error_type: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl From<&PricingError> for PricingErrorResponse {
    fn from(err: &PricingError) -> Self {
        let details = match err {
            PricingError::DurationTooShort { minimum_days } => {
                Some(serde_json::json!({ "minimum_days": minimum_days }))
            }
            PricingError::UnknownResource(id) => {
                Some(serde_json::json!({ "resource_id": id }))
            }
            PricingError::UnknownPersonType(id) => {
                Some(serde_json::json!({ "person_type_id": id }))
            }
            PricingError::InvalidConfig { .. } | PricingError::Unavailable(_) => None,
        };
        PricingErrorResponse {
            error_type: err.reason_code().to_string(),
            message: err.to_string(),
            details,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_money_serializes_amount_as_string() {
        let money = MoneyResponse::new(dec!(123.45), "EUR");
        let json = serde_json::to_value(&money).unwrap();
        assert_eq!(json["amount"], "123.45");
        assert_eq!(json["currency"], "EUR");
    }

    #[test]
    fn test_quote_response_serializes_cost_and_blocks() {
        let quote = BookingQuoteResponse {
            cost: MoneyResponse::new(dec!(46), "EUR"),
            blocks_booked: 2,
        };
        let json = serde_json::to_value(&quote).unwrap();
        assert_eq!(json["cost"]["amount"], "46");
        assert_eq!(json["cost"]["currency"], "EUR");
        assert_eq!(json["blocks_booked"], 2);
    }

    #[test]
    fn test_error_response_carries_reason_and_details() {
        let err = PricingError::DurationTooShort { minimum_days: 14 };
        let response = PricingErrorResponse::from(&err);
        assert_eq!(response.error_type, "duration_too_short");
        assert_eq!(response.details.unwrap()["minimum_days"], 14);

        let err = PricingError::invalid_config("bad rule");
        let response = PricingErrorResponse::from(&err);
        assert_eq!(response.error_type, "invalid_config");
        assert!(response.details.is_none());
    }
}
