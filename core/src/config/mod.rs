//! Configuration management
//!
//! A single TOML file configures the remote agent, the local agent and the
//! debug log. Every field has a default, so the file is optional.

pub mod store;

pub use store::{
    Config, ConfigError, LocalConfig, LoggingConfig, RemoteConfig, DEFAULT_API_KEY_ENV,
    DEFAULT_BASE_URL, DEFAULT_SYSTEM_PROMPT, DEFAULT_TEMPERATURE, DEFAULT_TIMEOUT_SECS,
};

use std::path::PathBuf;

/// Find the configuration file in standard locations
pub fn find_config_file() -> Option<PathBuf> {
    if let Ok(cwd) = std::env::current_dir() {
        let path = cwd.join("arena.toml");
        if path.exists() {
            return Some(path);
        }
    }

    Config::default_path().filter(|path| path.exists())
}

/// Get the configuration directory path
pub fn get_config_dir() -> Option<PathBuf> {
    if let Some(dir) = dirs::config_dir() {
        return Some(dir.join("arena"));
    }

    home::home_dir().map(|home| home.join(".config").join("arena"))
}
