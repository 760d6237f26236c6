//! Build an agent from a variant name and the loaded configuration

use crate::agent::{Agent, HumanAgent, RemoteAgent};
use crate::config::Config;
use crate::error::Result;

/// Which agent variant to construct
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentKind {
    /// A person typing actions at the terminal
    Human,
    /// Hosted chat completion model
    Remote,
    /// Model loaded into this process
    Local,
}

impl std::str::FromStr for AgentKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "human" | "interactive" => Ok(AgentKind::Human),
            "remote" | "openai" | "openrouter" | "gpt" => Ok(AgentKind::Remote),
            "local" | "hf" | "huggingface" => Ok(AgentKind::Local),
            _ => Err(format!("Unknown agent kind: {}", s)),
        }
    }
}

impl std::fmt::Display for AgentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AgentKind::Human => write!(f, "human"),
            AgentKind::Remote => write!(f, "remote"),
            AgentKind::Local => write!(f, "local"),
        }
    }
}

/// Construct one agent. Configuration failures are returned here and never
/// deferred to the first call.
pub fn create_agent(kind: AgentKind, model_name: &str, config: &Config) -> Result<Box<dyn Agent>> {
    crate::info_log!("Creating {} agent for model {}", kind, model_name);

    match kind {
        AgentKind::Human => Ok(Box::new(HumanAgent::new(model_name)?)),
        AgentKind::Remote => Ok(Box::new(RemoteAgent::from_config(model_name, &config.remote)?)),
        AgentKind::Local => create_local(model_name, config),
    }
}

#[cfg(feature = "local")]
fn create_local(model_name: &str, config: &Config) -> Result<Box<dyn Agent>> {
    Ok(Box::new(crate::agent::LocalAgent::from_config(
        model_name,
        &config.local,
    )?))
}

#[cfg(not(feature = "local"))]
fn create_local(_model_name: &str, _config: &Config) -> Result<Box<dyn Agent>> {
    Err(crate::error::AgentError::invalid_config(
        "local agents require the `local` feature",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AgentError;

    #[test]
    fn test_parse_kind() {
        assert_eq!("human".parse::<AgentKind>().unwrap(), AgentKind::Human);
        assert_eq!("Remote".parse::<AgentKind>().unwrap(), AgentKind::Remote);
        assert_eq!("openrouter".parse::<AgentKind>().unwrap(), AgentKind::Remote);
        assert_eq!("hf".parse::<AgentKind>().unwrap(), AgentKind::Local);
        assert!("robot".parse::<AgentKind>().is_err());
    }

    #[test]
    fn test_display_round_trip() {
        for kind in [AgentKind::Human, AgentKind::Remote, AgentKind::Local] {
            assert_eq!(kind.to_string().parse::<AgentKind>().unwrap(), kind);
        }
    }

    #[tokio::test]
    async fn test_create_human() {
        let agent = create_agent(AgentKind::Human, "player", &Config::default()).unwrap();
        assert_eq!(agent.name(), "player");
    }

    #[test]
    fn test_create_remote_without_credential() {
        let mut config = Config::default();
        config.remote.api_key_env = "ARENA_TEST_FACTORY_UNSET_KEY_0B7E".to_string();
        let err = create_agent(AgentKind::Remote, "openai/gpt-4o-mini", &config)
            .err()
            .unwrap();
        assert!(matches!(err, AgentError::MissingCredential { .. }));
    }

    #[test]
    fn test_create_rejects_empty_model() {
        let err = create_agent(AgentKind::Human, "  ", &Config::default())
            .err()
            .unwrap();
        assert!(err.is_configuration());
    }
}
