//! Wire types for OpenAI-compatible chat completions

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
}

impl ChatMessage {
    fn with_role(role: MessageRole, content: impl Into<String>) -> Self {
        ChatMessage {
            role,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::with_role(MessageRole::User, content)
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::with_role(MessageRole::System, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::with_role(MessageRole::Assistant, content)
    }
}

/// Body of `POST /chat/completions`. Unset options are left out of the JSON
/// so the provider applies its own defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    /// Sampling temperature, 0 to 2
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// Candidate count
    #[serde(skip_serializing_if = "Option::is_none")]
    pub n: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop: Option<Vec<String>>,
}

impl ChatRequest {
    pub fn new(model: impl Into<String>, messages: Vec<ChatMessage>) -> Self {
        ChatRequest {
            model: model.into(),
            messages,
            max_tokens: None,
            temperature: None,
            n: None,
            stop: None,
        }
    }

    /// Put `prompt` in front as the system message
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.messages.insert(0, ChatMessage::system(prompt));
        self
    }

    pub fn with_max_tokens(mut self, tokens: Option<u32>) -> Self {
        self.max_tokens = tokens;
        self
    }

    pub fn with_temperature(mut self, temp: f32) -> Self {
        self.temperature = Some(temp.clamp(0.0, 2.0));
        self
    }

    /// At least one
    pub fn with_candidates(mut self, n: u32) -> Self {
        self.n = Some(n.max(1));
        self
    }
}

/// Parsed completion, provider-independent
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatResponse {
    pub id: String,
    pub model: String,
    pub choices: Vec<Choice>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

impl ChatResponse {
    /// Content of the first choice, if any
    pub fn first_content(&self) -> Option<&str> {
        self.choices.first().map(|c| c.message.content.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Choice {
    pub index: u32,
    pub message: ChatMessage,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finish_reason: Option<String>,
}

/// Token counts reported by the provider
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

impl std::fmt::Display for Usage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} prompt + {} completion = {} tokens",
            self.prompt_tokens, self.completion_tokens, self.total_tokens
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_roles() {
        assert_eq!(ChatMessage::user("a").role, MessageRole::User);
        assert_eq!(ChatMessage::system("b").role, MessageRole::System);
        let reply = ChatMessage::assistant("c");
        assert_eq!(reply.role, MessageRole::Assistant);
        assert_eq!(reply.content, "c");
    }

    #[test]
    fn test_chat_request_builder() {
        let request = ChatRequest::new("gpt-4o-mini", vec![ChatMessage::user("hi")])
            .with_system_prompt("Be helpful")
            .with_max_tokens(Some(100))
            .with_temperature(0.7)
            .with_candidates(1);

        assert_eq!(request.model, "gpt-4o-mini");
        assert_eq!(request.messages.len(), 2);
        assert_eq!(request.messages[0].role, MessageRole::System);
        assert_eq!(request.messages[1].role, MessageRole::User);
        assert_eq!(request.max_tokens, Some(100));
        assert_eq!(request.temperature, Some(0.7));
        assert_eq!(request.n, Some(1));
    }

    #[test]
    fn test_temperature_clamping() {
        let request = ChatRequest::new("gpt-4", vec![]).with_temperature(3.0);
        assert_eq!(request.temperature, Some(2.0));
    }

    #[test]
    fn test_request_wire_format() {
        let request = ChatRequest::new("m", vec![ChatMessage::user("obs")])
            .with_system_prompt("sys")
            .with_temperature(0.7)
            .with_candidates(1);
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "obs");
        assert_eq!(json["n"], 1);
        assert!(json.get("max_tokens").is_none());
        assert!(json.get("stop").is_none());
    }

    #[test]
    fn test_first_content() {
        let response = ChatResponse {
            choices: vec![Choice {
                index: 0,
                message: ChatMessage::assistant("  move north "),
                finish_reason: Some("stop".to_string()),
            }],
            ..Default::default()
        };
        assert_eq!(response.first_content(), Some("  move north "));
        assert_eq!(ChatResponse::default().first_content(), None);
    }
}
