//! `arena` - drive interchangeable text agents from the terminal
//!
//! Builds one agent (human, remote or local) and passes it observations,
//! printing the actions it returns.

use anyhow::{bail, Context, Result};
use clap::{CommandFactory, Parser};
use console::Style;
use std::path::Path;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};

use crate::cli::{AgentArgs, Cli, Commands};
use arena_core::{create_agent, Agent, AgentKind, Config};

mod cli;

/// Number of log entries shown by `:logs` in interactive mode
const RECENT_LOG_LINES: usize = 20;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.version {
        let blue = Style::new().blue();
        println!(
            "{} v{} ({}, {})",
            blue.apply_to("arena"),
            env!("CARGO_PKG_VERSION"),
            env!("GIT_HASH"),
            env!("BUILD_PROFILE")
        );
        return Ok(());
    }

    // `config --init` must work before any file exists
    let config = match cli.command {
        Some(Commands::Config { init: true }) => Config::default(),
        _ => load_config(cli.config.as_deref())?,
    };
    if let Some(path) = config.logging.file_path() {
        arena_core::logger::init(path, config.logging.ring_size);
    }

    match cli.command {
        Some(Commands::Act { agent, observation }) => handle_act(&agent, observation, config).await,
        Some(Commands::Interactive { agent }) => handle_interactive(&agent, config).await,
        Some(Commands::Config { init }) => handle_config(init, cli.config.as_deref(), &config),
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::load(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display())),
        None => Config::load_or_default().context("Failed to load configuration"),
    }
}

fn build_agent(args: &AgentArgs, mut config: Config) -> Result<Box<dyn Agent>> {
    if args.quantize {
        config.local.quantize = true;
    }
    create_agent(args.agent, &args.model, &config)
        .with_context(|| format!("Failed to create {} agent", args.agent))
}

/// One observation in, one action out
async fn handle_act(args: &AgentArgs, observation: Vec<String>, config: Config) -> Result<()> {
    let observation = if observation.is_empty() {
        if args.agent == AgentKind::Human {
            bail!("a human agent reads its action from stdin; pass the observation as arguments");
        }
        let mut buf = String::new();
        tokio::io::stdin()
            .read_to_string(&mut buf)
            .await
            .context("Failed to read observation from stdin")?;
        buf
    } else {
        observation.join(" ")
    };

    let agent = build_agent(args, config)?;
    let action = respond(agent.as_ref(), &observation, args.strict).await?;
    println!("{}", action);
    Ok(())
}

/// Prompt for observations until EOF, `exit` or `quit`
async fn handle_interactive(args: &AgentArgs, config: Config) -> Result<()> {
    if args.agent == AgentKind::Human {
        bail!("interactive mode needs a model agent; use `arena act --agent human` instead");
    }

    let agent = build_agent(args, config)?;
    let prompt = Style::new().cyan().bold();
    let name = Style::new().green();
    let dim = Style::new().dim();

    println!(
        "{} {} ({}). Type {} or {} to leave.",
        dim.apply_to("Talking to"),
        name.apply_to(agent.name()),
        args.agent,
        prompt.apply_to("exit"),
        prompt.apply_to("quit")
    );

    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        stdout
            .write_all(prompt.apply_to("observation> ").to_string().as_bytes())
            .await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            println!();
            break;
        };
        let observation = line.trim();
        match observation {
            "" => continue,
            "exit" | "quit" => break,
            ":logs" => {
                for entry in arena_core::logger::get_recent_logs(RECENT_LOG_LINES).iter().rev() {
                    println!("{}", dim.apply_to(entry));
                }
                continue;
            }
            _ => {}
        }

        let action = respond(agent.as_ref(), observation, args.strict).await?;
        println!("{} {}", name.apply_to(format!("{}:", agent.name())), action);
    }

    Ok(())
}

async fn respond(agent: &dyn Agent, observation: &str, strict: bool) -> Result<String> {
    if strict {
        Ok(agent.try_act(observation).await?)
    } else {
        Ok(agent.act(observation).await)
    }
}

fn handle_config(init: bool, explicit: Option<&Path>, config: &Config) -> Result<()> {
    if init {
        let path = match explicit {
            Some(path) => {
                Config::default().save(path)?;
                path.to_path_buf()
            }
            None => Config::default().save_default()?,
        };
        println!(
            "{} {}",
            Style::new().green().apply_to("Wrote default configuration to"),
            path.display()
        );
        return Ok(());
    }

    print!("{}", toml::to_string_pretty(config)?);
    Ok(())
}
