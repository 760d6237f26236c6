//! Structured error types for arena agents
//!
//! Two kinds of failure exist: configuration failures, returned from agent
//! constructors, and per-call failures, returned from `Agent::try_act` and
//! rendered as text by `Agent::act`.

use thiserror::Error;

/// Prefix used when a per-call failure is rendered as an action string
pub const ERROR_PREFIX: &str = "An error occurred:";

/// Primary error type for agent operations
#[derive(Error, Debug)]
pub enum AgentError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// API credential variable is unset or blank
    #[error("API key not found. Please set the {var} environment variable.")]
    MissingCredential { var: String },

    /// Invalid configuration
    #[error("invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// Tokenizer or model could not be resolved or loaded
    #[error("failed to load model {model}: {message}")]
    ModelLoad { model: String, message: String },

    // =========================================================================
    // Per-call Errors
    // =========================================================================
    /// Remote provider, transport or response parsing failure
    #[error("{message}")]
    Provider { message: String },

    /// Local generation pipeline failure
    #[error("generation failed: {message}")]
    Generation { message: String },

    /// The backend answered without any usable candidate
    #[error("model returned no output")]
    EmptyResponse,

    /// Interactive input reached end of file
    #[error("input stream closed before an action was entered")]
    InputClosed,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AgentError {
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Configuration failures surface at construction time and are never
    /// converted into action text.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::MissingCredential { .. } | Self::InvalidConfig { .. } | Self::ModelLoad { .. }
        )
    }

    /// Render this error the way a failed call is reported as an action
    pub fn to_action(&self) -> String {
        format!("{} {}", ERROR_PREFIX, self)
    }
}

/// Result type alias using AgentError
pub type Result<T> = std::result::Result<T, AgentError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_errors() {
        assert!(AgentError::MissingCredential {
            var: "OPENAI_API_KEY".to_string()
        }
        .is_configuration());
        assert!(AgentError::invalid_config("empty model").is_configuration());
        assert!(!AgentError::EmptyResponse.is_configuration());
        assert!(!AgentError::InputClosed.is_configuration());
    }

    #[test]
    fn test_to_action() {
        let err = AgentError::Provider {
            message: "Chat completions request failed with 500: boom".to_string(),
        };
        assert_eq!(
            err.to_action(),
            "An error occurred: Chat completions request failed with 500: boom"
        );

        let err = AgentError::Generation {
            message: "out of memory".to_string(),
        };
        assert!(err.to_action().starts_with(ERROR_PREFIX));
    }

    #[test]
    fn test_missing_credential_message() {
        let err = AgentError::MissingCredential {
            var: "OPENAI_API_KEY".to_string(),
        };
        assert!(err.to_string().contains("OPENAI_API_KEY"));
    }
}
