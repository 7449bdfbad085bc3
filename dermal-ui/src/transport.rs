//! HTTP access to the analysis service
//!
//! `AnalysisTransport` opens the analysis event stream and hands back the raw
//! body; decoding happens in the consumer so chunk boundaries stay visible
//! to it. `PaymentClient` requests payment intents.

use async_trait::async_trait;
use bytes::Bytes;
use dermal_common::payment::{ErrorBody, PaymentIntentRequest, PaymentIntentResponse};
use dermal_common::AnalyzeRequest;
use futures::stream::{BoxStream, StreamExt};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

const USER_AGENT: &str = concat!("dermal-ui/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Server returned status {0}")]
    Status(u16),

    #[error("Body read error: {0}")]
    Body(String),

    #[error("Request rejected: {0}")]
    Rejected(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Raw response body chunks
pub type ByteStream = BoxStream<'static, Result<Bytes, TransportError>>;

#[async_trait]
pub trait AnalysisTransport: Send + Sync {
    /// POST the request and return the event stream body
    async fn open(&self, request: AnalyzeRequest) -> Result<ByteStream, TransportError>;
}

fn http_client(timeout: Option<Duration>) -> Result<reqwest::Client, TransportError> {
    let mut builder = reqwest::Client::builder().user_agent(USER_AGENT);
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    builder
        .build()
        .map_err(|e| TransportError::Network(e.to_string()))
}

fn join_url(base_url: &str, path: &str) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), path)
}

/// Event stream transport over reqwest
pub struct HttpTransport {
    http_client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    /// No overall timeout: the stream stays open for the whole analysis
    pub fn new(base_url: impl Into<String>) -> Result<Self, TransportError> {
        Ok(Self {
            http_client: http_client(None)?,
            base_url: base_url.into(),
        })
    }

    pub fn analyze_url(&self) -> String {
        join_url(&self.base_url, "/api/analyze")
    }
}

#[async_trait]
impl AnalysisTransport for HttpTransport {
    async fn open(&self, request: AnalyzeRequest) -> Result<ByteStream, TransportError> {
        debug!(url = %self.analyze_url(), with_image = request.has_image(), "Opening analysis stream");

        let response = self
            .http_client
            .post(self.analyze_url())
            .json(&request)
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status(status.as_u16()));
        }

        let body = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(|e| TransportError::Body(e.to_string())));
        Ok(body.boxed())
    }
}

/// Payment intent requests
pub struct PaymentClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl PaymentClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, TransportError> {
        Ok(Self {
            http_client: http_client(Some(timeout))?,
            base_url: base_url.into(),
        })
    }

    /// Request an intent for `amount_cents`; returns the client secret
    pub async fn create_payment_intent(&self, amount_cents: u64) -> Result<String, TransportError> {
        let response = self
            .http_client
            .post(join_url(&self.base_url, "/api/create-payment-intent"))
            .json(&PaymentIntentRequest::cents(amount_cents))
            .send()
            .await
            .map_err(|e| TransportError::Network(e.to_string()))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| TransportError::Body(e.to_string()))?;

        if !status.is_success() {
            return Err(match serde_json::from_slice::<ErrorBody>(&body) {
                Ok(error) => TransportError::Rejected(error.error),
                Err(_) => TransportError::Status(status.as_u16()),
            });
        }

        let intent: PaymentIntentResponse = serde_json::from_slice(&body)
            .map_err(|e| TransportError::InvalidResponse(e.to_string()))?;
        info!(amount_cents, "Payment intent created");
        Ok(intent.client_secret)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urls_join_without_double_slash() {
        let transport = HttpTransport::new("http://127.0.0.1:5780/").unwrap();
        assert_eq!(transport.analyze_url(), "http://127.0.0.1:5780/api/analyze");
        assert_eq!(
            join_url("http://host", "/api/create-payment-intent"),
            "http://host/api/create-payment-intent"
        );
    }
}
