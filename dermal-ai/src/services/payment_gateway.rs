//! Payment intent creation
//!
//! `StripeGateway` posts form-encoded requests to the PaymentIntents API.
//! The amount arrives from the client in cents and is validated here before
//! any outbound call is made.

use async_trait::async_trait;
use dermal_common::payment::MIN_AMOUNT_CENTS;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

pub const DEFAULT_BASE_URL: &str = "https://api.stripe.com";
pub const DEFAULT_CURRENCY: &str = "usd";
const USER_AGENT: &str = concat!("dermal-ai/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("Invalid amount (minimum 50 cents)")]
    InvalidAmount,

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Processor error {0}: {1}")]
    ProcessorError(u16, String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Processor returned no client secret")]
    MissingClientSecret,
}

/// Created payment intent
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PaymentIntent {
    pub id: String,
    pub client_secret: Option<String>,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Create an intent for `amount_cents` in `currency`
    async fn create_payment_intent(
        &self,
        amount_cents: u64,
        currency: &str,
    ) -> Result<PaymentIntent, PaymentError>;
}

/// Validate a client-supplied amount and round it to whole cents
///
/// Accepts any finite JSON number of at least 50.
pub fn validate_amount(amount: &Value) -> Result<u64, PaymentError> {
    let value = amount.as_f64().ok_or(PaymentError::InvalidAmount)?;
    if !value.is_finite() || value < MIN_AMOUNT_CENTS {
        return Err(PaymentError::InvalidAmount);
    }
    Ok(value.round() as u64)
}

pub struct StripeGateway {
    http_client: reqwest::Client,
    secret_key: String,
    base_url: String,
}

impl StripeGateway {
    pub fn new(
        secret_key: impl Into<String>,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, PaymentError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| PaymentError::NetworkError(e.to_string()))?;

        Ok(Self {
            http_client,
            secret_key: secret_key.into(),
            base_url: base_url.into(),
        })
    }

    fn intents_url(&self) -> String {
        format!("{}/v1/payment_intents", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    async fn create_payment_intent(
        &self,
        amount_cents: u64,
        currency: &str,
    ) -> Result<PaymentIntent, PaymentError> {
        let amount = amount_cents.to_string();
        let form = [
            ("amount", amount.as_str()),
            ("currency", currency),
            ("automatic_payment_methods[enabled]", "true"),
        ];

        let response = self
            .http_client
            .post(self.intents_url())
            .bearer_auth(&self.secret_key)
            .form(&form)
            .send()
            .await
            .map_err(|e| PaymentError::NetworkError(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "Payment intent rejected");
            return Err(PaymentError::ProcessorError(status.as_u16(), error_text));
        }

        let intent: PaymentIntent = response
            .json()
            .await
            .map_err(|e| PaymentError::ParseError(e.to_string()))?;

        info!(intent_id = %intent.id, amount_cents, currency, "Payment intent created");
        Ok(intent)
    }
}
