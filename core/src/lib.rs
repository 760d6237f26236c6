pub mod agent;
pub mod config;
pub mod error;
pub mod factory;
pub mod llm;
pub mod logger;
pub mod util;

// Re-exports for convenience
pub use agent::{Agent, HumanAgent, LocalAgent, RemoteAgent};
pub use config::Config;
pub use error::{AgentError, ERROR_PREFIX};
pub use factory::{create_agent, AgentKind};
