//! Configuration management for Quillchat
//!
//! This module handles loading, parsing, validating, and managing
//! configuration from files, environment variables, and CLI overrides.
//!
//! Configuration describes where the client talks to and where it keeps its
//! data. Per-user preferences (temperature, theme, ...) are
//! [`crate::settings::Settings`] and live in the record store instead.

use crate::error::{ChatError, Result};
use crate::storage::history::MAX_HISTORY;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration structure for Quillchat
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Chat endpoint settings
    #[serde(default)]
    pub transport: TransportConfig,
    /// Record store settings
    #[serde(default)]
    pub storage: StorageConfig,
    /// Interactive chat settings
    #[serde(default)]
    pub chat: ChatConfig,
}

/// Chat endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransportConfig {
    /// URL receiving the multipart `POST`
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Request timeout (seconds)
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,

    /// User-Agent header sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_endpoint() -> String {
    "http://localhost:8080/api/chat".to_string()
}

fn default_timeout() -> u64 {
    120
}

fn default_user_agent() -> String {
    concat!("quillchat/", env!("CARGO_PKG_VERSION")).to_string()
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            timeout_seconds: default_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

/// Record store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Database file; the platform data directory is used when unset
    #[serde(default)]
    pub path: Option<String>,

    /// Number of chats kept in history (1 to 50)
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
}

fn default_history_limit() -> usize {
    MAX_HISTORY
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: None,
            history_limit: default_history_limit(),
        }
    }
}

/// Interactive chat configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Show prompt suggestions in the welcome banner
    #[serde(default = "default_show_suggestions")]
    pub show_suggestions: bool,

    /// Number of suggestions shown
    #[serde(default = "default_suggestion_count")]
    pub suggestion_count: usize,
}

fn default_show_suggestions() -> bool {
    true
}

fn default_suggestion_count() -> usize {
    5
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            show_suggestions: default_show_suggestions(),
            suggestion_count: default_suggestion_count(),
        }
    }
}

impl Config {
    /// Load configuration from file with environment and CLI overrides
    ///
    /// # Arguments
    ///
    /// * `path` - Path to configuration file
    /// * `cli` - CLI arguments for overrides
    ///
    /// # Returns
    ///
    /// Returns the loaded and merged configuration
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read or parsed
    pub fn load(path: &str, cli: &crate::cli::Cli) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            tracing::warn!("Config file not found at {}, using defaults", path);
            Self::default()
        };

        config.apply_env_vars();
        config.apply_cli_overrides(cli);

        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ChatError::Config(format!("Failed to read config file: {}", e)))?;
        serde_yaml::from_str(&contents)
            .map_err(|e| ChatError::Config(format!("Failed to parse config: {}", e)).into())
    }

    fn apply_env_vars(&mut self) {
        if let Ok(endpoint) = std::env::var("QUILLCHAT_ENDPOINT") {
            self.transport.endpoint = endpoint;
        }

        if let Ok(timeout) = std::env::var("QUILLCHAT_TIMEOUT_SECONDS") {
            if let Ok(value) = timeout.parse() {
                self.transport.timeout_seconds = value;
            } else {
                tracing::warn!("Invalid QUILLCHAT_TIMEOUT_SECONDS: {}", timeout);
            }
        }

        if let Ok(limit) = std::env::var("QUILLCHAT_HISTORY_LIMIT") {
            if let Ok(value) = limit.parse() {
                self.storage.history_limit = value;
            } else {
                tracing::warn!("Invalid QUILLCHAT_HISTORY_LIMIT: {}", limit);
            }
        }

        if let Ok(path) = std::env::var(crate::storage::STORE_PATH_ENV) {
            self.storage.path = Some(path);
        }
    }

    fn apply_cli_overrides(&mut self, cli: &crate::cli::Cli) {
        if let Some(endpoint) = &cli.endpoint {
            self.transport.endpoint = endpoint.clone();
        }

        if let Some(store) = &cli.store {
            self.storage.path = Some(store.clone());
        }
    }

    /// Validate configuration
    ///
    /// # Errors
    ///
    /// Returns error if any validation check fails
    pub fn validate(&self) -> Result<()> {
        let endpoint = url::Url::parse(&self.transport.endpoint).map_err(|e| {
            ChatError::Config(format!(
                "transport.endpoint is not a valid URL ({}): {}",
                e, self.transport.endpoint
            ))
        })?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(ChatError::Config(format!(
                "transport.endpoint must use http or https, got {}",
                endpoint.scheme()
            ))
            .into());
        }

        if self.transport.timeout_seconds == 0 {
            return Err(ChatError::Config(
                "transport.timeout_seconds must be greater than 0".to_string(),
            )
            .into());
        }

        if self.storage.history_limit == 0 || self.storage.history_limit > MAX_HISTORY {
            return Err(ChatError::Config(format!(
                "storage.history_limit must be between 1 and {}",
                MAX_HISTORY
            ))
            .into());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use clap::Parser;
    use serial_test::serial;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.transport.timeout_seconds, 120);
        assert_eq!(config.storage.history_limit, 50);
        assert!(config.storage.path.is_none());
        assert!(config.chat.show_suggestions);
    }

    #[test]
    fn test_config_validation_success() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_config_validation_bad_endpoint() {
        let mut config = Config::default();
        config.transport.endpoint = "not a url".to_string();
        assert!(config.validate().is_err());

        config.transport.endpoint = "ftp://example.com/chat".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_zero_timeout() {
        let mut config = Config::default();
        config.transport.timeout_seconds = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_history_limit_bounds() {
        let mut config = Config::default();
        config.storage.history_limit = 0;
        assert!(config.validate().is_err());
        config.storage.history_limit = 51;
        assert!(config.validate().is_err());
        config.storage.history_limit = 10;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_from_yaml() {
        let yaml = r#"
transport:
  endpoint: https://chat.example.com/api
  timeout_seconds: 30
storage:
  history_limit: 20
chat:
  show_suggestions: false
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.transport.endpoint, "https://chat.example.com/api");
        assert_eq!(config.transport.timeout_seconds, 30);
        assert_eq!(config.transport.user_agent, default_user_agent());
        assert_eq!(config.storage.history_limit, 20);
        assert!(!config.chat.show_suggestions);
        assert_eq!(config.chat.suggestion_count, 5);
    }

    #[test]
    fn test_empty_yaml_uses_defaults() {
        let config: Config = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config.transport.endpoint, default_endpoint());
    }

    #[test]
    #[serial]
    fn test_load_nonexistent_file_uses_defaults() {
        let cli = Cli::try_parse_from(["quillchat", "history", "list"]).unwrap();
        let config = Config::load("/nonexistent/config.yaml", &cli).unwrap();
        assert_eq!(config.storage.history_limit, 50);
    }

    #[test]
    #[serial]
    fn test_cli_overrides_file_and_env() {
        std::env::set_var("QUILLCHAT_ENDPOINT", "http://env.example/chat");
        let cli = Cli::try_parse_from([
            "quillchat",
            "--endpoint",
            "http://cli.example/chat",
            "--store",
            "/tmp/quill.db",
            "history",
            "list",
        ])
        .unwrap();
        let config = Config::load("/nonexistent/config.yaml", &cli).unwrap();
        std::env::remove_var("QUILLCHAT_ENDPOINT");

        assert_eq!(config.transport.endpoint, "http://cli.example/chat");
        assert_eq!(config.storage.path.as_deref(), Some("/tmp/quill.db"));
    }

    #[test]
    #[serial]
    fn test_env_overrides_apply() {
        std::env::set_var("QUILLCHAT_TIMEOUT_SECONDS", "15");
        std::env::set_var("QUILLCHAT_HISTORY_LIMIT", "not-a-number");
        let mut config = Config::default();
        config.apply_env_vars();
        std::env::remove_var("QUILLCHAT_TIMEOUT_SECONDS");
        std::env::remove_var("QUILLCHAT_HISTORY_LIMIT");

        assert_eq!(config.transport.timeout_seconds, 15);
        assert_eq!(config.storage.history_limit, 50);
    }
}
