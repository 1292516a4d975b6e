//! Completion client abstraction.
//!
//! Generators are written against the `CompletionClient` trait so that the
//! HTTP-backed [`AnthropicClient`] can be swapped for a scripted client in
//! tests and offline runs.

use crate::error::NarrativeError;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Default Messages API endpoint.
pub const DEFAULT_API_URL: &str = "https://api.anthropic.com";

/// Default model used for names and narratives.
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";

/// Value of the `anthropic-version` header.
pub const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Request timeout for a single completion.
const REQUEST_TIMEOUT_SECS: u64 = 120;

/// One single-turn completion request.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    /// System prompt.
    pub system: String,
    /// User message.
    pub prompt: String,
    /// Upper bound on generated tokens.
    pub max_tokens: u32,
    /// Sampling temperature.
    pub temperature: f64,
}

/// Trait for text completion backends.
///
/// Implementations return the full response text; callers handle JSON
/// extraction and validation.
#[async_trait::async_trait]
pub trait CompletionClient: Send + Sync {
    /// Run one completion and return the concatenated response text.
    async fn complete(&self, request: &CompletionRequest) -> Result<String, NarrativeError>;
}

#[async_trait::async_trait]
impl<T: CompletionClient + ?Sized> CompletionClient for Arc<T> {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, NarrativeError> {
        (**self).complete(request).await
    }
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f64,
    system: &'a str,
    messages: [Message<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: Option<String>,
}

/// Client for the Anthropic Messages API.
#[derive(Debug, Clone)]
pub struct AnthropicClient {
    http: Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl AnthropicClient {
    /// Create a client for `model`, authenticating with `api_key`.
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Result<Self, NarrativeError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            http,
            base_url: DEFAULT_API_URL.to_string(),
            api_key: api_key.into(),
            model: model.into(),
        })
    }

    /// Point the client at a different API root.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Model name sent with every request.
    pub fn model(&self) -> &str {
        &self.model
    }

    fn messages_url(&self) -> String {
        format!("{}/v1/messages", self.base_url.trim_end_matches('/'))
    }

    fn request_body<'a>(&'a self, request: &'a CompletionRequest) -> MessagesRequest<'a> {
        MessagesRequest {
            model: &self.model,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            system: &request.system,
            messages: [Message {
                role: "user",
                content: &request.prompt,
            }],
        }
    }
}

#[async_trait::async_trait]
impl CompletionClient for AnthropicClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, NarrativeError> {
        let url = self.messages_url();
        tracing::debug!(
            "Requesting completion from {url} (model: {}, temperature: {})",
            self.model,
            request.temperature
        );

        let response = self
            .http
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&self.request_body(request))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NarrativeError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        parse_messages_response(&body)
    }
}

/// Concatenate the text blocks of a Messages API response body.
fn parse_messages_response(body: &str) -> Result<String, NarrativeError> {
    let parsed: MessagesResponse = serde_json::from_str(body)
        .map_err(|e| NarrativeError::MalformedResponse(e.to_string()))?;

    let text: String = parsed
        .content
        .into_iter()
        .filter_map(|block| block.text)
        .collect();

    if text.is_empty() {
        return Err(NarrativeError::MalformedResponse(
            "response contains no text content".to_string(),
        ));
    }

    Ok(text)
}
