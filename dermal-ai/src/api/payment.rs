//! Payment intent endpoint

use crate::services::payment_gateway::validate_amount;
use crate::services::PaymentError;
use crate::{ApiError, ApiResult, AppState};
use axum::{body::Bytes, extract::State, routing::post, Json, Router};
use dermal_common::payment::PaymentIntentResponse;
use serde_json::Value;
use tracing::{info, warn};

/// POST /api/create-payment-intent
///
/// Body `{ "amount": <cents> }`. Responds with the processor's client secret.
pub async fn create_payment_intent(
    State(state): State<AppState>,
    body: Bytes,
) -> ApiResult<Json<PaymentIntentResponse>> {
    let gateway = state.payments.as_ref().ok_or(ApiError::PaymentNotConfigured)?;

    let amount = serde_json::from_slice::<Value>(&body)
        .ok()
        .and_then(|value| value.get("amount").cloned())
        .unwrap_or(Value::Null);
    let amount_cents = validate_amount(&amount).map_err(|e| {
        warn!(amount = %amount, "Rejected payment amount");
        e
    })?;

    let intent = gateway
        .create_payment_intent(amount_cents, &state.currency)
        .await?;
    let client_secret = intent
        .client_secret
        .ok_or(PaymentError::MissingClientSecret)?;

    info!(intent_id = %intent.id, amount_cents, "Payment intent ready");
    Ok(Json(PaymentIntentResponse { client_secret }))
}

/// Build payment routes
pub fn payment_routes() -> Router<AppState> {
    Router::new().route("/api/create-payment-intent", post(create_payment_intent))
}
