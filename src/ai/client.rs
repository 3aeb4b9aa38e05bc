use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

const CLAUDE_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
pub const DEFAULT_MODEL: &str = "claude-3-5-haiku-20241022";

/// A single prompt submission.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub system: String,
    pub prompt: String,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Overrides the client's configured key for this call only.
    pub api_key: Option<String>,
}

/// Text-generation backend used by the summarizer.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn complete(&self, request: CompletionRequest) -> Result<String>;

    fn model_version(&self) -> &str;
}

#[derive(Debug, Serialize)]
struct MessageRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<Message<'a>>,
    system: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessageResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    text: Option<String>,
}

/// Anthropic Messages API client.
pub struct ClaudeClient {
    client: Client,
    api_key: Option<String>,
    model: String,
    endpoint: String,
}

impl ClaudeClient {
    pub fn new(api_key: Option<String>, model: String, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_key,
            model,
            endpoint: CLAUDE_API_URL.to_string(),
        })
    }

    /// Point the client at a different Messages API endpoint.
    #[cfg(test)]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

#[async_trait]
impl LanguageModel for ClaudeClient {
    async fn complete(&self, request: CompletionRequest) -> Result<String> {
        let usable = |key: &&str| !key.trim().is_empty();
        let api_key = request
            .api_key
            .as_deref()
            .filter(usable)
            .or(self.api_key.as_deref().filter(usable))
            .ok_or_else(|| AppError::ClaudeApi("no API key configured".to_string()))?;

        let body = MessageRequest {
            model: &self.model,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            messages: vec![Message {
                role: "user",
                content: &request.prompt,
            }],
            system: Some(&request.system),
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header("x-api-key", api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::ClaudeApi(format!("request failed: {}", e)))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            let error_text = response.text().await.unwrap_or_default();
            return Err(AppError::RateLimited(error_text));
        }
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(AppError::ClaudeApi(format!("API error ({}): {}", status, error_text)));
        }

        let message_response: MessageResponse = response
            .json()
            .await
            .map_err(|e| AppError::ClaudeApi(format!("unreadable response: {}", e)))?;

        let text = message_response
            .content
            .into_iter()
            .filter_map(|block| block.text)
            .collect::<Vec<_>>()
            .join("\n");

        if text.trim().is_empty() {
            return Err(AppError::ClaudeApi("no response text from model".to_string()));
        }
        Ok(text)
    }

    fn model_version(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request(api_key: Option<&str>) -> CompletionRequest {
        CompletionRequest {
            system: "Be brief.".to_string(),
            prompt: "Say hello".to_string(),
            temperature: 0.7,
            max_tokens: 50,
            api_key: api_key.map(str::to_string),
        }
    }

    async fn client_for(server: &MockServer, key: Option<&str>) -> ClaudeClient {
        ClaudeClient::new(key.map(str::to_string), DEFAULT_MODEL.to_string(), Duration::from_secs(5))
            .unwrap()
            .with_endpoint(format!("{}/v1/messages", server.uri()))
    }

    #[tokio::test]
    async fn test_complete_joins_text_blocks() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/messages"))
            .and(header("x-api-key", "configured-key"))
            .and(header("anthropic-version", ANTHROPIC_VERSION))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "content": [
                    {"type": "text", "text": "Hello"},
                    {"type": "text", "text": "there"}
                ]
            })))
            .mount(&server)
            .await;

        let client = client_for(&server, Some("configured-key")).await;
        let text = client.complete(request(None)).await.unwrap();
        assert_eq!(text, "Hello\nthere");
    }

    #[tokio::test]
    async fn test_request_key_overrides_configured_key() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header("x-api-key", "user-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "content": [{"type": "text", "text": "ok"}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server, Some("configured-key")).await;
        assert_eq!(client.complete(request(Some("user-key"))).await.unwrap(), "ok");
    }

    #[tokio::test]
    async fn test_missing_key_fails_without_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let client = client_for(&server, None).await;
        let err = client.complete(request(None)).await.unwrap_err();
        assert!(matches!(err, AppError::ClaudeApi(_)));
    }

    #[tokio::test]
    async fn test_rate_limit_maps_to_rate_limited() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).set_body_string("slow down"))
            .mount(&server)
            .await;

        let client = client_for(&server, Some("k")).await;
        let err = client.complete(request(None)).await.unwrap_err();
        assert!(matches!(err, AppError::RateLimited(_)));
        assert_eq!(err.status_code(), 429);
    }

    #[tokio::test]
    async fn test_slow_model_times_out_as_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"content": [{"type": "text", "text": "late"}]}))
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let client = ClaudeClient::new(Some("k".to_string()), DEFAULT_MODEL.to_string(), Duration::from_secs(1))
            .unwrap()
            .with_endpoint(format!("{}/v1/messages", server.uri()));
        let err = client.complete(request(None)).await.unwrap_err();
        assert!(matches!(err, AppError::ClaudeApi(_)));
        assert!(err.retryable());
    }

    #[tokio::test]
    async fn test_server_error_and_empty_reply() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(529).set_body_string("overloaded"))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"content": []})))
            .mount(&server)
            .await;

        let client = client_for(&server, Some("k")).await;
        let err = client.complete(request(None)).await.unwrap_err();
        assert!(matches!(err, AppError::ClaudeApi(ref msg) if msg.contains("overloaded")));

        let err = client.complete(request(None)).await.unwrap_err();
        assert!(matches!(err, AppError::ClaudeApi(_)));
    }
}
