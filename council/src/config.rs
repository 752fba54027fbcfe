//! Council configuration.
//!
//! Resolution order: built-in defaults, then environment variables, then an
//! optional TOML file. Command-line flags are applied last by the binary.
//!
//! ```toml
//! api_url = "http://localhost:11434/v1/chat/completions"
//! roles_dir = "roles"
//! rounds = 2
//! max_retries = 1
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use crate::debate::DebateConfig;
use crate::error::ConfigurationError;
use crate::provider::{ProviderConfig, RetryPolicy};

const DEFAULT_API_URL: &str = "http://localhost:11434/v1/chat/completions";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CouncilConfig {
    /// Chat-completions endpoint (`OLLAMA_API_URL`).
    pub api_url: String,
    /// Optional bearer token (`COUNCIL_API_KEY`).
    pub api_key: Option<String>,
    /// Directory of role definition files (`COUNCIL_ROLES_DIR`).
    pub roles_dir: PathBuf,
    /// Conversation storage directory (`COUNCIL_DATA_DIR`).
    pub data_dir: PathBuf,
    /// Debate rounds per session (`COUNCIL_ROUNDS`).
    pub rounds: u32,
    /// Model used for conversation titles (`COUNCIL_TITLE_MODEL`).
    pub title_model: String,
    pub request_timeout_secs: u64,
    pub connect_timeout_secs: u64,
    /// Extra attempts for transient invocation failures; 0 disables retries.
    pub max_retries: u32,
    pub retry_backoff_ms: u64,
}

impl Default for CouncilConfig {
    fn default() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }
}

/// Values a TOML config file may set; absent keys keep the current value.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    api_url: Option<String>,
    api_key: Option<String>,
    roles_dir: Option<PathBuf>,
    data_dir: Option<PathBuf>,
    rounds: Option<u32>,
    title_model: Option<String>,
    request_timeout_secs: Option<u64>,
    connect_timeout_secs: Option<u64>,
    max_retries: Option<u32>,
    retry_backoff_ms: Option<u64>,
}

impl CouncilConfig {
    /// Build from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        fn parsed<T: std::str::FromStr>(
            lookup: &impl Fn(&str) -> Option<String>,
            key: &str,
            default: T,
        ) -> T {
            lookup(key)
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or(default)
        }

        Self {
            api_url: lookup("OLLAMA_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            api_key: lookup("COUNCIL_API_KEY").filter(|k| !k.is_empty()),
            roles_dir: lookup("COUNCIL_ROLES_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("roles")),
            data_dir: lookup("COUNCIL_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("data/conversations")),
            rounds: parsed(&lookup, "COUNCIL_ROUNDS", 3),
            title_model: lookup("COUNCIL_TITLE_MODEL")
                .unwrap_or_else(|| "llama3.2:3b".to_string()),
            request_timeout_secs: parsed(&lookup, "COUNCIL_REQUEST_TIMEOUT_SECS", 300),
            connect_timeout_secs: parsed(&lookup, "COUNCIL_CONNECT_TIMEOUT_SECS", 60),
            max_retries: parsed(&lookup, "COUNCIL_MAX_RETRIES", 0),
            retry_backoff_ms: parsed(&lookup, "COUNCIL_RETRY_BACKOFF_MS", 500),
        }
    }

    /// Environment defaults, overlaid by `path` when given.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigurationError> {
        let mut config = Self::default();
        if let Some(path) = path {
            config.merge_file(path)?;
        }
        Ok(config)
    }

    /// Overlay the keys present in a TOML file.
    pub fn merge_file(&mut self, path: &Path) -> Result<(), ConfigurationError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigurationError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        self.merge_toml(&content)
            .map_err(|detail| ConfigurationError::InvalidConfigFile {
                path: path.to_path_buf(),
                detail,
            })?;
        debug!(path = %path.display(), "Config file applied");
        Ok(())
    }

    fn merge_toml(&mut self, content: &str) -> Result<(), String> {
        let file: ConfigFile = toml::from_str(content).map_err(|e| e.to_string())?;

        if let Some(v) = file.api_url {
            self.api_url = v;
        }
        if let Some(v) = file.api_key {
            self.api_key = Some(v);
        }
        if let Some(v) = file.roles_dir {
            self.roles_dir = v;
        }
        if let Some(v) = file.data_dir {
            self.data_dir = v;
        }
        if let Some(v) = file.rounds {
            self.rounds = v;
        }
        if let Some(v) = file.title_model {
            self.title_model = v;
        }
        if let Some(v) = file.request_timeout_secs {
            self.request_timeout_secs = v;
        }
        if let Some(v) = file.connect_timeout_secs {
            self.connect_timeout_secs = v;
        }
        if let Some(v) = file.max_retries {
            self.max_retries = v;
        }
        if let Some(v) = file.retry_backoff_ms {
            self.retry_backoff_ms = v;
        }
        Ok(())
    }

    pub fn provider_config(&self) -> ProviderConfig {
        ProviderConfig {
            api_url: self.api_url.clone(),
            api_key: self.api_key.clone(),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            backoff: Duration::from_millis(self.retry_backoff_ms),
        }
    }

    pub fn debate_config(&self) -> DebateConfig {
        DebateConfig {
            total_rounds: self.rounds,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::NamedTempFile;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = CouncilConfig::from_lookup(lookup(&[]));
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.roles_dir, PathBuf::from("roles"));
        assert_eq!(config.data_dir, PathBuf::from("data/conversations"));
        assert_eq!(config.rounds, 3);
        assert_eq!(config.title_model, "llama3.2:3b");
        assert_eq!(config.request_timeout_secs, 300);
        assert_eq!(config.connect_timeout_secs, 60);
        assert_eq!(
            config.retry_policy(),
            RetryPolicy {
                max_retries: 0,
                backoff: Duration::from_millis(500)
            }
        );
        assert!(config.api_key.is_none());
    }

    #[test]
    fn test_env_overrides() {
        let config = CouncilConfig::from_lookup(lookup(&[
            ("OLLAMA_API_URL", "http://gpu-box:8000/v1/chat/completions"),
            ("COUNCIL_ROUNDS", "5"),
            ("COUNCIL_MAX_RETRIES", "2"),
            ("COUNCIL_API_KEY", "secret"),
        ]));
        assert_eq!(config.api_url, "http://gpu-box:8000/v1/chat/completions");
        assert_eq!(config.debate_config().total_rounds, 5);
        assert_eq!(config.retry_policy().max_retries, 2);
        assert_eq!(config.provider_config().api_key.as_deref(), Some("secret"));
    }

    #[test]
    fn test_unparseable_env_keeps_default() {
        let config = CouncilConfig::from_lookup(lookup(&[("COUNCIL_ROUNDS", "many")]));
        assert_eq!(config.rounds, 3);
    }

    #[test]
    fn test_toml_overlay() {
        let mut config = CouncilConfig::from_lookup(lookup(&[("COUNCIL_ROUNDS", "5")]));
        let mut file = NamedTempFile::new().unwrap();
        std::io::Write::write_all(
            &mut file,
            b"rounds = 1\ntitle_model = \"qwen2.5:7b\"\nrequest_timeout_secs = 30\n",
        )
        .unwrap();

        config.merge_file(file.path()).unwrap();
        assert_eq!(config.rounds, 1);
        assert_eq!(config.title_model, "qwen2.5:7b");
        assert_eq!(config.provider_config().request_timeout, Duration::from_secs(30));
        assert_eq!(config.roles_dir, PathBuf::from("roles"));
    }

    #[test]
    fn test_toml_unknown_key_rejected() {
        let mut config = CouncilConfig::from_lookup(lookup(&[]));
        let mut file = NamedTempFile::new().unwrap();
        std::io::Write::write_all(&mut file, b"round = 2\n").unwrap();

        let err = config.merge_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigurationError::InvalidConfigFile { .. }));
    }

    #[test]
    fn test_missing_config_file() {
        let err = CouncilConfig::load(Some(Path::new("/nonexistent/council.toml"))).unwrap_err();
        assert!(matches!(err, ConfigurationError::Io { .. }));
    }
}
