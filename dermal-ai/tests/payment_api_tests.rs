//! Payment intent endpoint integration tests

mod helpers;

use axum::http::StatusCode;
use dermal_ai::services::PaymentGateway;
use dermal_common::payment::{to_subcurrency, FULL_REPORT_AMOUNT};
use helpers::*;
use serde_json::json;
use std::sync::Arc;

fn idle_model() -> Arc<ScriptedModel> {
    Arc::new(ScriptedModel::new(LogScript::FailImmediately, Ok(json!(null))))
}

fn state_with(gateway: &Arc<MockGateway>) -> dermal_ai::AppState {
    test_state(idle_model(), Some(gateway.clone() as Arc<dyn PaymentGateway>))
}

#[tokio::test]
async fn test_amount_below_minimum_rejected() {
    // Given: a configured gateway
    let gateway = Arc::new(MockGateway::default());

    // When: 30 cents is requested
    let response = send(
        state_with(&gateway),
        json_post("/api/create-payment-intent", json!({ "amount": 30 }).to_string()),
    )
    .await;

    // Then: 400 with the minimum-amount message, and no intent created
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await,
        json!({ "error": "Invalid amount (minimum 50 cents)" })
    );
    assert!(gateway.calls().is_empty());
}

#[tokio::test]
async fn test_full_report_amount_returns_client_secret() {
    let gateway = Arc::new(MockGateway::default());
    let cents = to_subcurrency(FULL_REPORT_AMOUNT);

    let response = send(
        state_with(&gateway),
        json_post("/api/create-payment-intent", json!({ "amount": cents }).to_string()),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let secret = body["clientSecret"].as_str().unwrap();
    assert!(!secret.is_empty());
    assert_eq!(gateway.calls(), vec![(2900, "usd".to_string())]);
}

#[tokio::test]
async fn test_fractional_amount_rounded() {
    let gateway = Arc::new(MockGateway::default());

    let response = send(
        state_with(&gateway),
        json_post("/api/create-payment-intent", json!({ "amount": 2899.5 }).to_string()),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(gateway.calls()[0].0, 2900);
}

#[tokio::test]
async fn test_missing_or_non_numeric_amount_rejected() {
    let gateway = Arc::new(MockGateway::default());

    for body in [
        json!({}).to_string(),
        json!({ "amount": "2900" }).to_string(),
        json!({ "amount": null }).to_string(),
        "garbage".to_string(),
    ] {
        let response = send(state_with(&gateway), json_post("/api/create-payment-intent", body)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
    assert!(gateway.calls().is_empty());
}

#[tokio::test]
async fn test_unconfigured_payment_returns_503() {
    // Given: no payment key configured
    let state = test_state(idle_model(), None);

    // When
    let response = send(
        state,
        json_post("/api/create-payment-intent", json!({ "amount": 2900 }).to_string()),
    )
    .await;

    // Then
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(
        body_json(response).await,
        json!({ "error": "Payment is not configured" })
    );
}

#[tokio::test]
async fn test_processor_failure_returns_generic_500() {
    let gateway = Arc::new(MockGateway::failing());

    let response = send(
        state_with(&gateway),
        json_post("/api/create-payment-intent", json!({ "amount": 2900 }).to_string()),
    )
    .await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body_json(response).await,
        json!({ "error": "Internal Server Error" })
    );
}
