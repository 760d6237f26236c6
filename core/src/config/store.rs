//! Configuration file model and persistence
//!
//! Loading and saving of the TOML configuration file.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default endpoint for the remote agent (OpenRouter's OpenAI-compatible API)
pub const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";
/// Environment variable holding the remote API credential
pub const DEFAULT_API_KEY_ENV: &str = "OPENAI_API_KEY";
/// System preamble sent with every remote request
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant.";
/// Sampling temperature used by both model-backed agents
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
/// Overall HTTP request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// IO error occurred while reading/writing config file
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
    /// TOML serialization error
    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
    /// No platform configuration directory could be determined
    #[error("could not determine a configuration directory")]
    NoConfigDir,
}

/// Unified configuration for all agent variants
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Config {
    /// Hosted chat-completion agent settings
    #[serde(default)]
    pub remote: RemoteConfig,

    /// In-process model agent settings
    #[serde(default)]
    pub local: LocalConfig,

    /// Debug log settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&content)?;
        config.normalize();
        Ok(config)
    }

    /// Save configuration to file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Load from the first file found by [`super::find_config_file`], or
    /// fall back to defaults when there is none.
    pub fn load_or_default() -> Result<Self, ConfigError> {
        match super::find_config_file() {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// Save to the default location
    pub fn save_default(&self) -> Result<PathBuf, ConfigError> {
        let path = Self::default_path().ok_or(ConfigError::NoConfigDir)?;
        self.save(&path)?;
        Ok(path)
    }

    /// Get default config file path
    pub fn default_path() -> Option<PathBuf> {
        super::get_config_dir().map(|d| d.join("config.toml"))
    }

    /// Clamp values into their valid ranges
    fn normalize(&mut self) {
        self.remote.temperature = clamp_temperature("remote", self.remote.temperature);
        self.local.temperature = clamp_temperature("local", self.local.temperature);
        self.logging.ring_size = self.logging.ring_size.max(1);
    }
}

/// Settings for the hosted chat-completion agent
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RemoteConfig {
    /// OpenAI-compatible API base URL
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Name of the environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// System preamble sent before the observation
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,

    /// Temperature (0.0 - 2.0)
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Completion token cap; omitted from requests when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Overall HTTP request timeout
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key_env: default_api_key_env(),
            system_prompt: default_system_prompt(),
            temperature: default_temperature(),
            max_tokens: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Settings for the in-process model agent
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LocalConfig {
    /// Model repository revision to download
    #[serde(default = "default_revision")]
    pub revision: String,

    /// Load weights in reduced precision
    #[serde(default)]
    pub quantize: bool,

    /// Temperature (0.0 - 2.0); 0 selects greedy decoding
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Upper bound on generated tokens per call
    #[serde(default = "default_max_new_tokens")]
    pub max_new_tokens: usize,

    /// Sampling seed
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Run on the first CUDA device when one is available
    #[serde(default)]
    pub use_gpu: bool,
}

impl Default for LocalConfig {
    fn default() -> Self {
        Self {
            revision: default_revision(),
            quantize: false,
            temperature: default_temperature(),
            max_new_tokens: default_max_new_tokens(),
            seed: default_seed(),
            use_gpu: false,
        }
    }
}

/// Debug log settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// Log file; defaults to `<data_dir>/arena/debug.log`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,

    /// Entries kept in memory
    #[serde(default = "default_ring_size")]
    pub ring_size: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            file: None,
            ring_size: default_ring_size(),
        }
    }
}

impl LoggingConfig {
    /// Resolved log file location
    pub fn file_path(&self) -> Option<PathBuf> {
        self.file
            .clone()
            .or_else(|| dirs::data_dir().map(|d| d.join("arena").join("debug.log")))
    }
}

fn clamp_temperature(section: &str, value: f32) -> f32 {
    let clamped = value.clamp(0.0, 2.0);
    if clamped != value {
        crate::warn_log!(
            "[{}] temperature {} is outside 0.0..=2.0, using {}",
            section,
            value,
            clamped
        );
    }
    clamped
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_api_key_env() -> String {
    DEFAULT_API_KEY_ENV.to_string()
}

fn default_system_prompt() -> String {
    DEFAULT_SYSTEM_PROMPT.to_string()
}

fn default_temperature() -> f32 {
    DEFAULT_TEMPERATURE
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_revision() -> String {
    "main".to_string()
}

fn default_max_new_tokens() -> usize {
    256
}

fn default_seed() -> u64 {
    299792458
}

fn default_ring_size() -> usize {
    1000
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_defaults() {
        let config = Config::default();
        assert_eq!(config.remote.base_url, "https://openrouter.ai/api/v1");
        assert_eq!(config.remote.api_key_env, "OPENAI_API_KEY");
        assert_eq!(config.remote.system_prompt, "You are a helpful assistant.");
        assert_eq!(config.remote.temperature, 0.7);
        assert!(config.remote.max_tokens.is_none());
        assert_eq!(config.local.revision, "main");
        assert!(!config.local.quantize);
        assert_eq!(config.local.temperature, 0.7);
    }

    #[test]
    fn test_config_save_load() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.remote.base_url = "http://localhost:11434/v1".to_string();
        config.remote.max_tokens = Some(150);
        config.local.quantize = true;
        config.save(&config_path).unwrap();

        let loaded = Config::load(&config_path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("arena.toml");
        std::fs::write(&config_path, "[local]\nmax_new_tokens = 32\n").unwrap();

        let loaded = Config::load(&config_path).unwrap();
        assert_eq!(loaded.local.max_new_tokens, 32);
        assert_eq!(loaded.local.revision, "main");
        assert_eq!(loaded.remote, RemoteConfig::default());
    }

    #[test]
    fn test_temperature_clamping() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("arena.toml");
        std::fs::write(
            &config_path,
            "[remote]\ntemperature = 3.5\n[local]\ntemperature = -1.0\n",
        )
        .unwrap();

        let loaded = Config::load(&config_path).unwrap();
        assert_eq!(loaded.remote.temperature, 2.0);
        assert_eq!(loaded.local.temperature, 0.0);

        let logs = crate::logger::get_recent_logs(200);
        assert!(logs
            .iter()
            .any(|l| l.contains("[WARN]") && l.contains("[remote] temperature 3.5")));
    }

    #[test]
    fn test_invalid_toml() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("arena.toml");
        std::fs::write(&config_path, "[remote\nbase_url = ").unwrap();

        assert!(matches!(
            Config::load(&config_path),
            Err(ConfigError::TomlParse(_))
        ));
    }

    #[test]
    fn test_explicit_log_file() {
        let logging = LoggingConfig {
            file: Some(PathBuf::from("/tmp/arena-test.log")),
            ring_size: 10,
        };
        assert_eq!(logging.file_path(), Some(PathBuf::from("/tmp/arena-test.log")));
    }
}
