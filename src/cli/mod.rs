//! CLI argument parsing using clap 4.x derive macros

use arena_core::AgentKind;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Drive a text agent: a person at the terminal, a hosted chat model or a
/// model loaded into this process.
#[derive(Parser, Debug)]
#[command(name = "arena")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
#[command(disable_version_flag = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Configuration file (defaults to ./arena.toml, then the user config dir)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Print version information
    #[arg(long)]
    pub version: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Ask an agent for one action
    Act {
        #[command(flatten)]
        agent: AgentArgs,

        /// Observation text; read from stdin when omitted
        #[arg(num_args = 0..)]
        observation: Vec<String>,
    },

    /// Feed observations to an agent line by line
    Interactive {
        #[command(flatten)]
        agent: AgentArgs,
    },

    /// Show or create the configuration file
    Config {
        /// Write the default configuration instead of printing it
        #[arg(long)]
        init: bool,
    },
}

/// Options shared by every command that builds an agent
#[derive(Args, Debug, Clone)]
pub struct AgentArgs {
    /// Agent variant: human, remote or local
    #[arg(short, long, default_value = "remote")]
    pub agent: AgentKind,

    /// Model identifier (a label for human agents)
    #[arg(short, long)]
    pub model: String,

    /// Hold local model weights in 16-bit precision
    #[arg(short, long)]
    pub quantize: bool,

    /// Exit with an error instead of printing "An error occurred: ..."
    #[arg(long)]
    pub strict: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_act() {
        let cli = Cli::parse_from([
            "arena",
            "act",
            "--agent",
            "local",
            "--model",
            "Qwen/Qwen2-0.5B-Instruct",
            "--quantize",
            "You",
            "see",
        ]);
        match cli.command {
            Some(Commands::Act { agent, observation }) => {
                assert_eq!(agent.agent, AgentKind::Local);
                assert_eq!(agent.model, "Qwen/Qwen2-0.5B-Instruct");
                assert!(agent.quantize);
                assert!(!agent.strict);
                assert_eq!(observation, vec!["You", "see"]);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_global_config() {
        let cli = Cli::parse_from(["arena", "config", "--init", "--config", "/tmp/a.toml"]);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/a.toml")));
        assert!(matches!(cli.command, Some(Commands::Config { init: true })));
    }

    #[test]
    fn test_unknown_agent_rejected() {
        assert!(Cli::try_parse_from(["arena", "act", "--agent", "robot", "--model", "x"]).is_err());
    }

    #[test]
    fn test_model_required() {
        assert!(Cli::try_parse_from(["arena", "interactive"]).is_err());
    }
}
