//! HTTP client for chat completion providers
//!
//! Talks to any OpenAI-compatible chat completions endpoint (OpenRouter,
//! OpenAI, Ollama, LM Studio). One request per call, no retries.

use super::chat::{ChatMessage, ChatRequest, ChatResponse, Choice, MessageRole, Usage};
use super::LlmConfig;
use crate::util::{sanitize_base_url, validate_api_key};
use crate::{error_log, info_log};
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE},
    Client as HttpClient, StatusCode,
};
use serde::Deserialize;
use std::time::{Duration, Instant};

/// Anything that can answer a chat completion request
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse>;
}

/// Main LLM Client
pub struct LlmClient {
    config: LlmConfig,
    http_client: HttpClient,
    endpoint: String,
    headers: HeaderMap,
}

impl LlmClient {
    /// Create a new LLM client.
    ///
    /// The base URL and API key are validated here so that a bad
    /// configuration fails before the first request.
    pub fn new(config: LlmConfig) -> crate::error::Result<Self> {
        let base_url = sanitize_base_url(&config.base_url)?;
        let endpoint = format!("{}/chat/completions", base_url);
        let headers = build_headers(&base_url, config.api_key.as_deref())?;

        let http_client = HttpClient::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("arena/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                crate::error::AgentError::invalid_config(format!(
                    "failed to build HTTP client: {}",
                    e
                ))
            })?;

        Ok(LlmClient {
            config,
            http_client,
            endpoint,
            headers,
        })
    }

    /// Model every request is addressed to
    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// Full URL requests are posted to
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Send one request; the outcome and latency are logged
    pub async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse> {
        info_log!(
            "Chat request: model={}, messages={}",
            request.model,
            request.messages.len()
        );

        let start = Instant::now();
        let result = self.chat_openai(request).await;

        match &result {
            Ok(response) => match &response.usage {
                Some(usage) => {
                    info_log!("Chat completed in {:?}: {}", start.elapsed(), usage);
                }
                None => {
                    info_log!("Chat completed in {:?} (no usage data)", start.elapsed());
                }
            },
            Err(e) => {
                error_log!("Chat failed after {:?}: {:#}", start.elapsed(), e);
            }
        }

        result
    }

    async fn chat_openai(&self, request: &ChatRequest) -> Result<ChatResponse> {
        let response = self
            .http_client
            .post(&self.endpoint)
            .headers(self.headers.clone())
            .json(request)
            .send()
            .await
            .context("Failed to send request to chat completions API")?;

        match response.status() {
            StatusCode::OK => {
                let text = response
                    .text()
                    .await
                    .context("Failed to read chat completions response")?;
                let body: OpenAiResponse = match serde_json::from_str(&text) {
                    Ok(body) => body,
                    Err(e) => {
                        error_log!("Failed to parse chat response: {}. Raw body: {}", e, text);
                        bail!("Failed to parse chat completions response: {}", e);
                    }
                };
                body.into_chat_response()
            }
            StatusCode::UNAUTHORIZED => {
                bail!("Authentication failed (401): the provider rejected the API key");
            }
            StatusCode::TOO_MANY_REQUESTS => {
                bail!("Rate limited by the provider (429)");
            }
            status => {
                let error_body: Option<serde_json::Value> = response.json().await.ok();
                let error_msg = error_body
                    .as_ref()
                    .and_then(|v| v.get("error").and_then(|e| e.get("message")))
                    .and_then(|v| v.as_str())
                    .unwrap_or("no error message in response body");
                bail!("Chat completions request failed with {}: {}", status, error_msg);
            }
        }
    }
}

#[async_trait]
impl ChatBackend for LlmClient {
    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse> {
        LlmClient::chat(self, request).await
    }
}

/// Static headers sent with every request
fn build_headers(base_url: &str, api_key: Option<&str>) -> crate::error::Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

    // OpenRouter attribution headers
    if base_url.contains("openrouter.ai") {
        headers.insert("X-Title", HeaderValue::from_static("arena"));
    }

    if let Some(api_key) = api_key {
        let key = validate_api_key(api_key)?;
        let value = HeaderValue::from_str(&format!("Bearer {}", key)).map_err(|_| {
            crate::error::AgentError::invalid_config("API key is not a valid header value")
        })?;
        headers.insert(AUTHORIZATION, value);
    }

    Ok(headers)
}

// Provider response shape; `content` may be null
#[derive(Deserialize)]
struct OpenAiResponse {
    #[serde(default)]
    id: String,
    #[serde(default)]
    model: String,
    choices: Vec<OpenAiChoice>,
    #[serde(default)]
    usage: Option<OpenAiUsage>,
}

#[derive(Deserialize)]
struct OpenAiChoice {
    #[serde(default)]
    index: u32,
    message: OpenAiMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct OpenAiMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Deserialize)]
struct OpenAiUsage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
    #[serde(default)]
    total_tokens: u32,
}

impl OpenAiResponse {
    /// A choice without message content (refusal, content filter, tool
    /// call) carries no action and fails the whole response.
    fn into_chat_response(self) -> Result<ChatResponse> {
        let mut choices = Vec::with_capacity(self.choices.len());
        for c in self.choices {
            let Some(content) = c.message.content else {
                bail!(
                    "Chat completions response has no message content (finish_reason: {})",
                    c.finish_reason.as_deref().unwrap_or("unknown")
                );
            };
            choices.push(Choice {
                index: c.index,
                message: ChatMessage {
                    role: MessageRole::Assistant,
                    content,
                },
                finish_reason: c.finish_reason,
            });
        }

        Ok(ChatResponse {
            id: self.id,
            model: self.model,
            choices,
            usage: self.usage.map(|u| Usage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
                total_tokens: u.total_tokens,
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_rejects_bad_base_url() {
        let config = LlmConfig::new("not-a-url", "gpt-4o-mini", None);
        let err = LlmClient::new(config).err().unwrap();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_endpoint_url() {
        let config = LlmConfig::new("https://openrouter.ai/api/v1/", "gpt-4o-mini", None);
        let client = LlmClient::new(config).unwrap();
        assert_eq!(client.endpoint(), "https://openrouter.ai/api/v1/chat/completions");
        assert_eq!(client.model(), "gpt-4o-mini");
    }

    #[test]
    fn test_headers() {
        let headers = build_headers("https://openrouter.ai/api/v1", Some("sk-test")).unwrap();
        assert_eq!(headers[AUTHORIZATION], "Bearer sk-test");
        assert_eq!(headers["X-Title"], "arena");

        let headers = build_headers("http://localhost:11434/v1", None).unwrap();
        assert!(headers.get(AUTHORIZATION).is_none());
        assert!(headers.get("X-Title").is_none());

        assert!(build_headers("http://localhost:11434/v1", Some("sk-\nabc")).is_err());
    }

    #[test]
    fn test_response_conversion() {
        let body: OpenAiResponse = serde_json::from_str(
            r#"{"id":"gen-1","model":"m","choices":[{"index":0,"message":{"role":"assistant","content":"[pass]"},"finish_reason":"stop"}]}"#,
        )
        .unwrap();
        let response = body.into_chat_response().unwrap();
        assert_eq!(response.first_content(), Some("[pass]"));
        assert_eq!(response.id, "gen-1");
        assert!(response.usage.is_none());
    }

    #[test]
    fn test_null_content_is_an_error() {
        let body: OpenAiResponse = serde_json::from_str(
            r#"{"choices":[{"index":0,"message":{"role":"assistant","content":null},"finish_reason":"content_filter"}]}"#,
        )
        .unwrap();
        let err = body.into_chat_response().unwrap_err();
        assert!(err.to_string().contains("content_filter"));
    }
}
