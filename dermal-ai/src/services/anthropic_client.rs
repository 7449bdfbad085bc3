//! Anthropic Messages API client
//!
//! Streaming text uses the Messages API with `stream: true` and decodes the
//! SSE response with the shared `SseDecoder`. Structured output forces a
//! single tool call whose input schema is the requested output schema.

use super::model::{GenerativeModel, ModelError, ModelRequest, OutputSchema, TextStream};
use async_trait::async_trait;
use dermal_common::sse::SseDecoder;
use futures::StreamExt;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, info, warn};

pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-5";
pub const DEFAULT_MAX_TOKENS: u32 = 1024;
const API_VERSION: &str = "2023-06-01";
const USER_AGENT: &str = concat!("dermal-ai/", env!("CARGO_PKG_VERSION"));

/// Connection settings for the Messages API
#[derive(Debug, Clone)]
pub struct AnthropicConfig {
    /// `None` disables live calls; every request fails with `MissingApiKey`
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub max_tokens: u32,
    pub timeout: Duration,
}

impl Default for AnthropicConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            timeout: Duration::from_secs(120),
        }
    }
}

/// Streaming event payloads we care about
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum StreamPayload {
    ContentBlockDelta { delta: Delta },
    Error { error: ApiErrorBody },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum Delta {
    TextDelta { text: String },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(rename = "type")]
    kind: String,
    message: String,
}

#[derive(Debug, Deserialize)]
struct MessageResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock {
    ToolUse { name: String, input: Value },
    #[serde(other)]
    Other,
}

pub struct AnthropicClient {
    http_client: reqwest::Client,
    config: AnthropicConfig,
}

impl AnthropicClient {
    pub fn new(config: AnthropicConfig) -> Result<Self, ModelError> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.timeout)
            .build()
            .map_err(|e| ModelError::NetworkError(e.to_string()))?;

        Ok(Self {
            http_client,
            config,
        })
    }

    fn messages_url(&self) -> String {
        format!("{}/v1/messages", self.config.base_url.trim_end_matches('/'))
    }

    fn api_key(&self) -> Result<&str, ModelError> {
        self.config.api_key.as_deref().ok_or(ModelError::MissingApiKey)
    }

    /// Build the `messages` array for one user turn
    fn user_message(request: &ModelRequest) -> Value {
        let mut content = vec![json!({ "type": "text", "text": request.prompt })];
        if let Some(image) = &request.image {
            content.push(json!({
                "type": "image",
                "source": {
                    "type": "base64",
                    "media_type": image.media_type,
                    "data": image.data,
                }
            }));
        }
        json!([{ "role": "user", "content": content }])
    }

    async fn send(&self, body: &Value) -> Result<reqwest::Response, ModelError> {
        let api_key = self.api_key()?;

        let response = self
            .http_client
            .post(self.messages_url())
            .header("x-api-key", api_key)
            .header("anthropic-version", API_VERSION)
            .json(body)
            .send()
            .await
            .map_err(|e| ModelError::NetworkError(e.to_string()))?;

        let status = response.status();
        if status == 401 || status == 403 {
            return Err(ModelError::InvalidApiKey);
        }
        if status == 429 {
            return Err(ModelError::RateLimited);
        }
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(ModelError::ApiError(status.as_u16(), error_text));
        }
        Ok(response)
    }
}

/// Text carried by one decoded stream record, if any
fn text_from_record(data: &str) -> Result<Option<String>, ModelError> {
    match serde_json::from_str::<StreamPayload>(data) {
        Ok(StreamPayload::ContentBlockDelta {
            delta: Delta::TextDelta { text },
        }) => Ok(Some(text)),
        Ok(StreamPayload::Error { error }) => Err(ModelError::StreamError(format!(
            "{}: {}",
            error.kind, error.message
        ))),
        Ok(_) => Ok(None),
        Err(e) => {
            debug!("Skipping undecodable stream record: {}", e);
            Ok(None)
        }
    }
}

/// Input of the forced tool call
fn tool_input(response: MessageResponse, tool_name: &str) -> Result<Value, ModelError> {
    response
        .content
        .into_iter()
        .find_map(|block| match block {
            ContentBlock::ToolUse { name, input } if name == tool_name => Some(input),
            _ => None,
        })
        .ok_or(ModelError::NoStructuredOutput)
}

#[async_trait]
impl GenerativeModel for AnthropicClient {
    fn name(&self) -> &str {
        &self.config.model
    }

    async fn stream_text(&self, request: ModelRequest) -> Result<TextStream, ModelError> {
        let body = json!({
            "model": self.config.model,
            "max_tokens": self.config.max_tokens,
            "stream": true,
            "messages": Self::user_message(&request),
        });

        debug!(
            model = %self.config.model,
            with_image = request.image.is_some(),
            "Starting streaming generation"
        );
        let response = self.send(&body).await?;
        let mut bytes = Box::pin(response.bytes_stream());

        let stream = async_stream::stream! {
            let mut decoder = SseDecoder::new();
            while let Some(chunk) = bytes.next().await {
                let chunk = match chunk {
                    Ok(chunk) => chunk,
                    Err(e) => {
                        yield Err(ModelError::StreamError(e.to_string()));
                        return;
                    }
                };
                for record in decoder.feed(&chunk) {
                    match text_from_record(&record.data) {
                        Ok(Some(text)) => {
                            yield Ok(text);
                        }
                        Ok(None) => {}
                        Err(e) => {
                            yield Err(e);
                            return;
                        }
                    }
                }
            }
        };

        Ok(Box::pin(stream))
    }

    async fn generate_object(
        &self,
        request: ModelRequest,
        schema: &OutputSchema,
    ) -> Result<Value, ModelError> {
        let body = json!({
            "model": self.config.model,
            "max_tokens": self.config.max_tokens,
            "messages": Self::user_message(&request),
            "tools": [{
                "name": schema.name,
                "description": schema.description,
                "input_schema": schema.schema,
            }],
            "tool_choice": { "type": "tool", "name": schema.name },
        });

        let response = self.send(&body).await?;
        let message: MessageResponse = response
            .json()
            .await
            .map_err(|e| ModelError::ParseError(e.to_string()))?;

        let input = tool_input(message, &schema.name);
        match &input {
            Ok(_) => info!(model = %self.config.model, schema = %schema.name, "Structured output received"),
            Err(e) => warn!(model = %self.config.model, "Structured output missing: {}", e),
        }
        input
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dermal_common::image::ImageData;

    #[test]
    fn test_client_creation() {
        let client = AnthropicClient::new(AnthropicConfig::default());
        assert!(client.is_ok());
    }

    #[test]
    fn test_messages_url_joins_base() {
        let client = AnthropicClient::new(AnthropicConfig {
            base_url: "http://localhost:9999/".to_string(),
            ..AnthropicConfig::default()
        })
        .unwrap();
        assert_eq!(client.messages_url(), "http://localhost:9999/v1/messages");
    }

    #[tokio::test]
    async fn test_missing_key_fails_without_network() {
        let client = AnthropicClient::new(AnthropicConfig::default()).unwrap();
        let result = client.stream_text(ModelRequest::text("hello")).await;
        assert!(matches!(result, Err(ModelError::MissingApiKey)));
    }

    #[test]
    fn test_user_message_with_image() {
        let request = ModelRequest::with_image(
            "describe",
            ImageData::from_data_url("data:image/png;base64,AAAA"),
        );
        let messages = AnthropicClient::user_message(&request);
        let content = messages[0]["content"].as_array().unwrap();
        assert_eq!(content.len(), 2);
        assert_eq!(content[0]["text"], "describe");
        assert_eq!(content[1]["source"]["media_type"], "image/png");
        assert_eq!(content[1]["source"]["data"], "AAAA");
    }

    #[test]
    fn test_text_from_records() {
        let delta = r#"{"type":"content_block_delta","index":0,"delta":{"type":"text_delta","text":"08:34"}}"#;
        assert_eq!(text_from_record(delta).unwrap().as_deref(), Some("08:34"));

        let ping = r#"{"type":"ping"}"#;
        assert_eq!(text_from_record(ping).unwrap(), None);

        let json_delta = r#"{"type":"content_block_delta","index":0,"delta":{"type":"input_json_delta","partial_json":"{"}}"#;
        assert_eq!(text_from_record(json_delta).unwrap(), None);

        let error = r#"{"type":"error","error":{"type":"overloaded_error","message":"Overloaded"}}"#;
        assert!(matches!(text_from_record(error), Err(ModelError::StreamError(_))));
    }

    #[test]
    fn test_tool_input_extraction() {
        let response: MessageResponse = serde_json::from_value(json!({
            "content": [
                { "type": "text", "text": "Here is the report" },
                { "type": "tool_use", "id": "toolu_1", "name": "DermalReport", "input": { "profileId": "SK-12345" } }
            ]
        }))
        .unwrap();
        let input = tool_input(response, "DermalReport").unwrap();
        assert_eq!(input["profileId"], "SK-12345");

        let empty: MessageResponse = serde_json::from_value(json!({ "content": [] })).unwrap();
        assert!(matches!(
            tool_input(empty, "DermalReport"),
            Err(ModelError::NoStructuredOutput)
        ));
    }
}
