//! Remote-model agent
//!
//! Sends each observation to a hosted chat completion endpoint.

use super::{check_model_name, Agent};
use crate::config::RemoteConfig;
use crate::error::{AgentError, Result};
use crate::llm::{ChatBackend, ChatMessage, ChatRequest, LlmClient, LlmConfig};
use crate::info_log;
use async_trait::async_trait;

/// Agent backed by an OpenAI-compatible chat completion API
pub struct RemoteAgent<B = LlmClient> {
    model_name: String,
    backend: B,
    system_prompt: String,
    temperature: f32,
    max_tokens: Option<u32>,
}

impl RemoteAgent {
    /// Remote agent with the default endpoint and credential variable
    pub fn new(model_name: &str) -> Result<Self> {
        Self::from_config(model_name, &RemoteConfig::default())
    }

    /// Remote agent configured from a `[remote]` section.
    ///
    /// Fails with [`AgentError::MissingCredential`] when the API key
    /// variable is unset or blank; nothing is sent over the network here.
    pub fn from_config(model_name: &str, config: &RemoteConfig) -> Result<Self> {
        let model_name = check_model_name(model_name)?;
        let api_key = resolve_api_key(&config.api_key_env)?;

        let client = LlmClient::new(LlmConfig::from_remote(config, model_name.clone(), api_key))?;
        info_log!(
            "Remote agent ready: model={}, endpoint={}",
            model_name,
            client.endpoint()
        );

        Self::with_backend(&model_name, client, config)
    }
}

impl<B: ChatBackend> RemoteAgent<B> {
    /// Remote agent answering through any chat backend
    pub fn with_backend(model_name: &str, backend: B, config: &RemoteConfig) -> Result<Self> {
        Ok(Self {
            model_name: check_model_name(model_name)?,
            backend,
            system_prompt: config.system_prompt.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        })
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// The single-candidate request sent for an observation
    pub fn build_request(&self, observation: &str) -> ChatRequest {
        ChatRequest::new(self.model_name.clone(), vec![ChatMessage::user(observation)])
            .with_system_prompt(self.system_prompt.clone())
            .with_temperature(self.temperature)
            .with_candidates(1)
            .with_max_tokens(self.max_tokens)
    }
}

#[async_trait]
impl<B: ChatBackend> Agent for RemoteAgent<B> {
    fn name(&self) -> &str {
        &self.model_name
    }

    async fn try_act(&self, observation: &str) -> Result<String> {
        let request = self.build_request(observation);
        let response = self
            .backend
            .chat(&request)
            .await
            .map_err(|e| AgentError::Provider {
                message: format!("{:#}", e),
            })?;

        response
            .first_content()
            .map(|content| content.trim().to_string())
            .ok_or(AgentError::EmptyResponse)
    }
}

/// Read the API key from `var`; unset or blank is a configuration error.
fn resolve_api_key(var: &str) -> Result<String> {
    match std::env::var(var) {
        Ok(key) if !key.trim().is_empty() => Ok(key),
        _ => Err(AgentError::MissingCredential {
            var: var.to_string(),
        }),
    }
}
