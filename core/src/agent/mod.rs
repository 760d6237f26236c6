//! Agent contract
//!
//! An agent maps an observation (text shown to it) to an action (text it
//! answers with). Three variants exist: a human at the terminal, a hosted
//! chat-completion model and a model loaded into this process.

pub mod human;
pub mod local;
pub mod remote;

pub use human::HumanAgent;
pub use local::{GeneratedSequence, GenerationParams, LocalAgent, TextGenerationPipeline};
pub use remote::RemoteAgent;

use crate::error::{AgentError, Result};
use async_trait::async_trait;

/// One observation in, one action out.
#[async_trait]
pub trait Agent: Send + Sync {
    /// Identifying name; the model identifier the agent was built with.
    fn name(&self) -> &str;

    /// Produce an action for `observation`, reporting failures as errors.
    async fn try_act(&self, observation: &str) -> Result<String>;

    /// Produce an action for `observation`.
    ///
    /// Never fails: a failed call is rendered as
    /// `"An error occurred: {reason}"` and returned as the action.
    async fn act(&self, observation: &str) -> String {
        match self.try_act(observation).await {
            Ok(action) => action,
            Err(e) => {
                crate::error_log!("Agent {} failed: {}", self.name(), e);
                e.to_action()
            }
        }
    }
}

#[async_trait]
impl<A: Agent + ?Sized> Agent for Box<A> {
    fn name(&self) -> &str {
        (**self).name()
    }

    async fn try_act(&self, observation: &str) -> Result<String> {
        (**self).try_act(observation).await
    }

    async fn act(&self, observation: &str) -> String {
        (**self).act(observation).await
    }
}

/// Model identifiers must be non-empty.
pub(crate) fn check_model_name(model_name: &str) -> Result<String> {
    let trimmed = model_name.trim();
    if trimmed.is_empty() {
        return Err(AgentError::invalid_config("model name cannot be empty"));
    }
    Ok(trimmed.to_string())
}
