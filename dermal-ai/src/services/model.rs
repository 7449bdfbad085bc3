//! Generative model abstraction
//!
//! The orchestrator needs two capabilities from an upstream model:
//! - streaming free text for a prompt (optionally with an image)
//! - one-shot structured output validated against a JSON schema

use async_trait::async_trait;
use dermal_common::image::ImageData;
use futures::stream::BoxStream;
use thiserror::Error;

/// Model client errors
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Model API key not configured")]
    MissingApiKey,

    #[error("Invalid API key")]
    InvalidApiKey,

    #[error("Rate limited")]
    RateLimited,

    #[error("API error {0}: {1}")]
    ApiError(u16, String),

    #[error("Stream error: {0}")]
    StreamError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("No structured output in response")]
    NoStructuredOutput,
}

/// Incremental text fragments from a streaming call
pub type TextStream = BoxStream<'static, Result<String, ModelError>>;

/// One prompt, with an optional image attachment
#[derive(Debug, Clone)]
pub struct ModelRequest {
    pub prompt: String,
    pub image: Option<ImageData>,
}

impl ModelRequest {
    pub fn text(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            image: None,
        }
    }

    pub fn with_image(prompt: impl Into<String>, image: Option<ImageData>) -> Self {
        Self {
            prompt: prompt.into(),
            image,
        }
    }
}

/// Schema the structured output is coerced against
#[derive(Debug, Clone)]
pub struct OutputSchema {
    pub name: String,
    pub description: String,
    pub schema: serde_json::Value,
}

#[async_trait]
pub trait GenerativeModel: Send + Sync {
    /// Model identifier for logging
    fn name(&self) -> &str;

    /// Start a streaming text generation
    ///
    /// Errors returned here mean no text was produced. Errors yielded by
    /// the stream may follow partial output.
    async fn stream_text(&self, request: ModelRequest) -> Result<TextStream, ModelError>;

    /// Generate one object shaped by `schema`
    ///
    /// The returned value is unvalidated; callers apply their own schema check.
    async fn generate_object(
        &self,
        request: ModelRequest,
        schema: &OutputSchema,
    ) -> Result<serde_json::Value, ModelError>;
}
