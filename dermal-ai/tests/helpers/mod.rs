//! Test Helper Utilities
//!
//! Scripted model and payment gateway doubles plus router helpers

#![allow(dead_code)]

use async_trait::async_trait;
use axum::body::Body;
use axum::http::Request;
use axum::response::Response;
use dermal_ai::services::{
    AnalysisOrchestrator, GenerativeModel, ModelError, ModelRequest, OutputSchema, PaymentError,
    PaymentGateway, PaymentIntent, TextStream,
};
use dermal_ai::{build_router, AppState};
use dermal_common::sse::SseDecoder;
use dermal_common::{AnalysisEvent, FallbackPolicy, StreamEvent};
use futures::stream;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

// ============================================================================
// Generative model double
// ============================================================================

/// How the scripted log stream behaves
#[derive(Clone)]
pub enum LogScript {
    /// Yield each fragment in order
    Fragments(Vec<String>),
    /// Yield the fragments, then a stream error
    FailAfter(Vec<String>),
    /// Fail before producing any text
    FailImmediately,
}

pub struct ScriptedModel {
    pub logs: LogScript,
    pub report: Result<Value, String>,
    pub stream_calls: AtomicUsize,
    pub object_calls: AtomicUsize,
    pub prompts: Mutex<Vec<String>>,
}

impl ScriptedModel {
    pub fn new(logs: LogScript, report: Result<Value, String>) -> Self {
        Self {
            logs,
            report,
            stream_calls: AtomicUsize::new(0),
            object_calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl GenerativeModel for ScriptedModel {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn stream_text(&self, request: ModelRequest) -> Result<TextStream, ModelError> {
        self.stream_calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(request.prompt);

        let items: Vec<Result<String, ModelError>> = match &self.logs {
            LogScript::Fragments(fragments) => fragments.iter().cloned().map(Ok).collect(),
            LogScript::FailAfter(fragments) => fragments
                .iter()
                .cloned()
                .map(Ok)
                .chain(std::iter::once(Err(ModelError::StreamError(
                    "connection reset".to_string(),
                ))))
                .collect(),
            LogScript::FailImmediately => {
                return Err(ModelError::NetworkError("connection refused".to_string()))
            }
        };
        Ok(Box::pin(stream::iter(items)))
    }

    async fn generate_object(
        &self,
        request: ModelRequest,
        _schema: &OutputSchema,
    ) -> Result<Value, ModelError> {
        self.object_calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(request.prompt);
        self.report
            .clone()
            .map_err(|reason| ModelError::ApiError(500, reason))
    }
}

/// Eleven well-formed diagnostic lines, delivered with awkward chunk boundaries
pub fn eleven_log_fragments() -> Vec<String> {
    let text = (0..11)
        .map(|i| format!("08:35:{:02} [OK] DIAGNOSTIC_STEP_{}\n", i, i))
        .collect::<String>();
    text.as_bytes()
        .chunks(7)
        .map(|chunk| String::from_utf8_lossy(chunk).to_string())
        .collect()
}

/// A schema-valid "Bio-Age Aligned" report
pub fn aligned_report() -> Value {
    json!({
        "profileId": "SK-12345",
        "headline": "Bio-Age Aligned",
        "description": "Dermal structure is consistent with chronological age.",
        "bioAgeVariance": "0y",
        "metrics": {
            "uvDamage": { "value": 35, "trend": "neutral" },
            "hydration": { "value": 64, "trend": "up" },
            "inflammation": "Low",
            "dermalBioAge": "0y"
        },
        "findings": [
            {
                "id": "uv-damage",
                "title": "UV Damage",
                "icon": "warning",
                "description": "Mild photo-aging along the cheekbones."
            },
            {
                "id": "lipid_loss",
                "title": "Lipid Loss",
                "icon": "alert",
                "description": "Barrier lipids slightly below optimal range."
            }
        ]
    })
}

// ============================================================================
// Payment gateway double
// ============================================================================

#[derive(Default)]
pub struct MockGateway {
    pub calls: Mutex<Vec<(u64, String)>>,
    pub fail: bool,
}

impl MockGateway {
    pub fn failing() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn calls(&self) -> Vec<(u64, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl PaymentGateway for MockGateway {
    async fn create_payment_intent(
        &self,
        amount_cents: u64,
        currency: &str,
    ) -> Result<PaymentIntent, PaymentError> {
        self.calls
            .lock()
            .unwrap()
            .push((amount_cents, currency.to_string()));
        if self.fail {
            return Err(PaymentError::ProcessorError(402, "card_declined".to_string()));
        }
        Ok(PaymentIntent {
            id: format!("pi_test_{}", amount_cents),
            client_secret: Some(format!("pi_test_{}_secret_abc", amount_cents)),
        })
    }
}

// ============================================================================
// Router helpers
// ============================================================================

pub fn test_state(
    model: Arc<ScriptedModel>,
    payments: Option<Arc<dyn PaymentGateway>>,
) -> AppState {
    let orchestrator = Arc::new(AnalysisOrchestrator::new(model, FallbackPolicy::standard()));
    AppState::new(orchestrator, payments)
}

pub fn json_post(uri: &str, body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(body.into())
        .unwrap()
}

pub async fn send(state: AppState, request: Request<Body>) -> Response {
    build_router(state).oneshot(request).await.unwrap()
}

pub async fn body_bytes(response: Response) -> Vec<u8> {
    response.into_body().collect().await.unwrap().to_bytes().to_vec()
}

pub async fn body_json(response: Response) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

/// Collect the full SSE body and decode every record
pub async fn sse_events(response: Response) -> Vec<StreamEvent> {
    let bytes = body_bytes(response).await;
    let mut decoder = SseDecoder::new();
    let events = decoder.feed(&bytes);
    assert_eq!(decoder.pending_len(), 0, "stream ended mid-record");
    events
}

pub fn decoded(events: &[StreamEvent]) -> Vec<AnalysisEvent> {
    events
        .iter()
        .map(|event| AnalysisEvent::decode(event).unwrap())
        .collect()
}
