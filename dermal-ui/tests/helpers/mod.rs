//! Test Helper Utilities
//!
//! Scripted analysis transports for consumer tests

#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use dermal_common::{AnalysisEvent, AnalyzeRequest, DermalReport};
use dermal_ui::{AnalysisTransport, ByteStream, TransportError};
use futures::stream::{self, StreamExt};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// One step of a scripted response body
#[derive(Clone)]
pub enum BodyStep {
    Chunk(Vec<u8>),
    Wait(Duration),
    Fail(String),
}

pub struct ScriptedTransport {
    /// `None` makes `open` fail
    pub body: Option<Vec<BodyStep>>,
    pub opens: AtomicUsize,
    pub requests: Mutex<Vec<AnalyzeRequest>>,
}

impl ScriptedTransport {
    pub fn new(body: Vec<BodyStep>) -> Self {
        Self {
            body: Some(body),
            opens: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn refusing() -> Self {
        Self {
            body: None,
            opens: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<AnalyzeRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl AnalysisTransport for ScriptedTransport {
    async fn open(&self, request: AnalyzeRequest) -> Result<ByteStream, TransportError> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request);

        let steps = self
            .body
            .clone()
            .ok_or_else(|| TransportError::Network("connection refused".to_string()))?;

        let body = stream::iter(steps).filter_map(|step| async move {
            match step {
                BodyStep::Chunk(bytes) => Some(Ok(Bytes::from(bytes))),
                BodyStep::Wait(duration) => {
                    tokio::time::sleep(duration).await;
                    None
                }
                BodyStep::Fail(reason) => Some(Err(TransportError::Body(reason))),
            }
        });
        Ok(body.boxed())
    }
}

/// Encoded SSE text for a sequence of events
pub fn encode(events: &[AnalysisEvent]) -> Vec<u8> {
    events
        .iter()
        .map(|event| event.to_stream_event().unwrap().encode())
        .collect::<String>()
        .into_bytes()
}

/// Split bytes into fixed-size chunks
pub fn chunked(bytes: &[u8], size: usize) -> Vec<BodyStep> {
    bytes
        .chunks(size)
        .map(|chunk| BodyStep::Chunk(chunk.to_vec()))
        .collect()
}

pub fn eleven_logs() -> Vec<AnalysisEvent> {
    (0..11)
        .map(|i| AnalysisEvent::log(format!("08:35:{:02} [OK] DIAGNOSTIC_STEP_{}", i, i)))
        .collect()
}

pub fn aligned_report() -> DermalReport {
    DermalReport::from_json_value(json!({
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
            { "id": "uv-damage", "title": "UV Damage", "icon": "warning", "description": "Mild photo-aging." },
            { "id": "lipid-loss", "title": "Lipid Loss", "icon": "alert", "description": "Barrier lipids low." }
        ]
    }))
    .unwrap()
}
