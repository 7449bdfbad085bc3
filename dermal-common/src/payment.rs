//! Payment API request/response types shared by service and client

use serde::{Deserialize, Serialize};

/// Smallest chargeable amount in the minimum currency unit (cents)
pub const MIN_AMOUNT_CENTS: f64 = 50.0;

/// Plan that unlocks the full report
pub const FULL_REPORT_PLAN: &str = "Full Report";

/// Price of the full report in dollars
pub const FULL_REPORT_AMOUNT: f64 = 29.0;

/// Body of `POST /api/create-payment-intent`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentIntentRequest {
    /// Amount in cents
    pub amount: serde_json::Value,
}

impl PaymentIntentRequest {
    pub fn cents(amount: u64) -> Self {
        Self {
            amount: serde_json::Value::from(amount),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentIntentResponse {
    pub client_secret: String,
}

/// Error body returned by the payment endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Convert a dollar amount to cents
pub fn to_subcurrency(amount: f64) -> u64 {
    (amount * 100.0).round().max(0.0) as u64
}
