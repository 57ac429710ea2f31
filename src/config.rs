//! Configuration for dify-chat
//!
//! Two layers:
//! - [`Config`]: optional values read from ~/.dify-chat/config.toml
//! - [`ClientConfig`]: the resolved profile the client sends with
//!
//! The API key is a secret held in process memory. Supply it at deploy time
//! (env var, .env, or config file); nothing is compiled in.

use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// Default chat-messages endpoint (Dify cloud)
pub const DEFAULT_ENDPOINT: &str = "https://api.dify.ai/v1/chat-messages";

/// Default end-user identifier sent with every query
pub const DEFAULT_USER: &str = "dify-chat-user";

/// Values from the config file. Every field is optional; CLI flags and env
/// vars take precedence.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// Dify app API key
    pub api_key: Option<String>,

    /// Chat-messages endpoint URL
    pub endpoint: Option<String>,

    /// End-user identifier
    pub user: Option<String>,
}

impl Config {
    /// Load config from ~/.dify-chat/config.toml
    pub fn load() -> Self {
        Self::load_from(&config_path())
    }

    /// Load config from an explicit path. Missing or unreadable files yield
    /// the default config.
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(config) => config,
                Err(e) => {
                    tracing::warn!("Failed to parse {}: {}", path.display(), e);
                    Self::default()
                }
            },
            Err(e) => {
                tracing::warn!("Failed to read {}: {}", path.display(), e);
                Self::default()
            }
        }
    }
}

/// Get the data directory (~/.dify-chat)
pub fn data_dir() -> PathBuf {
    dirs::home_dir().unwrap_or_default().join(".dify-chat")
}

/// Get the config file path
pub fn config_path() -> PathBuf {
    data_dir().join("config.toml")
}

/// Connection profile used for every request
#[derive(Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub api_key: String,
    pub endpoint: String,
}

impl ClientConfig {
    pub fn new(api_key: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            endpoint: endpoint.into(),
        }
    }

    /// Merge a partial update; unset fields keep their current value
    pub fn apply(&mut self, update: ConfigUpdate) {
        if let Some(api_key) = update.api_key {
            self.api_key = api_key;
        }
        if let Some(endpoint) = update.endpoint {
            self.endpoint = endpoint;
        }
    }

    /// Key with everything but the last four characters masked
    pub fn redacted_key(&self) -> String {
        let chars: Vec<char> = self.api_key.chars().collect();
        if chars.len() <= 4 {
            return "****".to_string();
        }
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("****{}", tail)
    }
}

// Never print the key
impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_key", &self.redacted_key())
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

/// Partial profile for [`ClientConfig::apply`]
#[derive(Debug, Clone, Default)]
pub struct ConfigUpdate {
    pub api_key: Option<String>,
    pub endpoint: Option<String>,
}

impl ConfigUpdate {
    pub fn api_key(key: impl Into<String>) -> Self {
        Self {
            api_key: Some(key.into()),
            ..Default::default()
        }
    }

    pub fn endpoint(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: Some(endpoint.into()),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert!(config.api_key.is_none());
        assert!(config.endpoint.is_none());
        assert!(config.user.is_none());
    }

    #[test]
    fn test_config_path() {
        let path = config_path();
        assert!(path.to_string_lossy().contains(".dify-chat"));
        assert!(path.to_string_lossy().ends_with("config.toml"));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "api_key = \"app-test\"\nendpoint = \"http://localhost:5001/v1/chat-messages\""
        )
        .unwrap();

        let config = Config::load_from(file.path());
        assert_eq!(config.api_key.as_deref(), Some("app-test"));
        assert_eq!(
            config.endpoint.as_deref(),
            Some("http://localhost:5001/v1/chat-messages")
        );
        assert!(config.user.is_none());
    }

    #[test]
    fn test_load_from_invalid_file_falls_back() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "api_key = [not toml").unwrap();

        let config = Config::load_from(file.path());
        assert!(config.api_key.is_none());
    }

    #[test]
    fn test_load_from_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("nope.toml"));
        assert!(config.endpoint.is_none());
    }

    #[test]
    fn test_apply_partial_update() {
        let mut config = ClientConfig::new("old-key", "https://example.com/v1/chat-messages");
        config.apply(ConfigUpdate::api_key("new-key"));
        assert_eq!(config.api_key, "new-key");
        assert_eq!(config.endpoint, "https://example.com/v1/chat-messages");

        config.apply(ConfigUpdate::default());
        assert_eq!(config.api_key, "new-key");

        config.apply(ConfigUpdate::endpoint("http://127.0.0.1:1/x"));
        assert_eq!(config.api_key, "new-key");
        assert_eq!(config.endpoint, "http://127.0.0.1:1/x");
    }

    #[test]
    fn test_debug_redacts_key() {
        let config = ClientConfig::new("app-0123456789abcd", DEFAULT_ENDPOINT);
        let debug = format!("{:?}", config);
        assert!(!debug.contains("app-0123456789abcd"));
        assert!(debug.contains("****abcd"));
        assert_eq!(ClientConfig::new("abc", DEFAULT_ENDPOINT).redacted_key(), "****");
    }
}
