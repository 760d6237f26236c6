//! LLM client module
//!
//! Provides the chat completion types and an HTTP client for
//! OpenAI-compatible providers.

pub mod chat;
pub mod client;

pub use chat::{ChatMessage, ChatRequest, ChatResponse, Choice, MessageRole, Usage};
pub use client::{ChatBackend, LlmClient};

use crate::config::{RemoteConfig, DEFAULT_TIMEOUT_SECS};

/// Where and how to reach a chat completion provider. Sampling options
/// travel in each [`ChatRequest`].
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// API endpoint base URL
    pub base_url: String,
    pub model: String,
    /// API key (if required)
    pub api_key: Option<String>,
    /// Overall request timeout
    pub timeout_secs: u64,
}

impl LlmConfig {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>, api_key: Option<String>) -> Self {
        LlmConfig {
            base_url: base_url.into(),
            model: model.into(),
            api_key,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Build from the `[remote]` configuration section
    pub fn from_remote(remote: &RemoteConfig, model: impl Into<String>, api_key: String) -> Self {
        LlmConfig {
            timeout_secs: remote.timeout_secs,
            ..Self::new(remote.base_url.clone(), model, Some(api_key))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_remote() {
        let remote = RemoteConfig {
            timeout_secs: 30,
            ..Default::default()
        };
        let config = LlmConfig::from_remote(&remote, "openai/gpt-4o-mini", "sk-test".to_string());
        assert_eq!(config.base_url, "https://openrouter.ai/api/v1");
        assert_eq!(config.model, "openai/gpt-4o-mini");
        assert_eq!(config.api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.timeout_secs, 30);
    }

    #[test]
    fn test_new_uses_default_timeout() {
        let config = LlmConfig::new("http://localhost:11434/v1", "llama3", None);
        assert_eq!(config.timeout_secs, 300);
        assert!(config.api_key.is_none());
    }
}
