//! Configuration loading from geoagent.toml.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_FILE: &str = "geoagent.toml";
pub const MODEL_ENV: &str = "GEOAGENT_MODEL";

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub model: ModelConfig,
    pub server: ServerConfig,
    pub paths: PathsConfig,
}

/// Model collaborator settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub base_url: String,
    pub model: String,
    pub timeout_secs: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            base_url: runtime::DEFAULT_BASE_URL.to_string(),
            model: runtime::DEFAULT_MODEL.to_string(),
            timeout_secs: 120,
        }
    }
}

impl ModelConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Tool service settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Base URL the chat client sends tool calls to.
    pub url: String,
    /// Listen address for `serve`.
    pub bind: String,
    pub timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:11435".to_string(),
            bind: "127.0.0.1:11435".to_string(),
            timeout_secs: mcp::DEFAULT_TIMEOUT.as_secs(),
        }
    }
}

impl ServerConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub output_dir: PathBuf,
    pub temp_dir: PathBuf,
    pub database: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("static/outputs"),
            temp_dir: PathBuf::from("temp"),
            database: PathBuf::from("geoagent.db"),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::parse(&content)
    }

    /// Parse configuration from TOML string.
    pub fn parse(toml: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Load `path` if it exists, otherwise use defaults. Applies
    /// environment overrides either way.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let config = if path.exists() {
            Self::load(path)?
        } else {
            Self::default()
        };
        Ok(config.with_model_override(std::env::var(MODEL_ENV).ok()))
    }

    fn with_model_override(mut self, model: Option<String>) -> Self {
        if let Some(model) = model.filter(|m| !m.trim().is_empty()) {
            self.model.model = model;
        }
        self
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.model.base_url, "http://127.0.0.1:11434");
        assert_eq!(config.model.model, "phi3");
        assert_eq!(config.model.timeout(), Duration::from_secs(120));
        assert_eq!(config.server.bind, "127.0.0.1:11435");
        assert_eq!(config.server.timeout(), Duration::from_secs(60));
        assert_eq!(config.paths.output_dir, PathBuf::from("static/outputs"));
    }

    #[test]
    fn partial_tables_keep_other_defaults() {
        let config = Config::parse(
            r#"
            [model]
            model = "llama3"

            [paths]
            temp_dir = "/tmp/geoagent"
            "#,
        )
        .unwrap();
        assert_eq!(config.model.model, "llama3");
        assert_eq!(config.model.timeout_secs, 120);
        assert_eq!(config.paths.temp_dir, PathBuf::from("/tmp/geoagent"));
        assert_eq!(config.paths.database, PathBuf::from("geoagent.db"));
    }

    #[test]
    fn invalid_toml_is_parse_error() {
        let err = Config::parse("[model\nmodel = 1").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_or_default(dir.path().join(CONFIG_FILE)).unwrap();
        assert_eq!(config.server.url, "http://127.0.0.1:11435");
    }

    #[test]
    fn model_override() {
        let config = Config::default().with_model_override(Some("mistral".into()));
        assert_eq!(config.model.model, "mistral");
        let config = Config::default().with_model_override(Some("  ".into()));
        assert_eq!(config.model.model, "phi3");
    }
}
