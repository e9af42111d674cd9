//! Configuration loading from napier.toml.

use runtime::Launcher;
use serde::Deserialize;
use std::path::Path;

/// Environment variable holding the Gemini API key.
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// Log filter used when neither `--log-level` nor `RUST_LOG` is set.
    pub log_level: Option<String>,

    /// Backend configuration.
    #[serde(default)]
    pub backend: BackendConfig,

    /// History sent to the model.
    #[serde(default)]
    pub history: HistoryConfig,

    /// Interpreters for server scripts.
    #[serde(default)]
    pub launcher: LauncherConfig,
}

/// Backend provider configuration.
#[derive(Debug, Deserialize)]
pub struct BackendConfig {
    /// Model to use.
    #[serde(default = "default_model")]
    pub model: String,

    /// Gemini API key. `GEMINI_API_KEY` takes precedence when set.
    pub api_key: Option<String>,

    /// Sampling temperature.
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Maximum tokens per reply.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            api_key: None,
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct HistoryConfig {
    /// Most recent turns sent with each call; 0 sends everything.
    #[serde(default)]
    pub max_turns: usize,
}

#[derive(Debug, Deserialize)]
pub struct LauncherConfig {
    #[serde(default = "default_python")]
    pub python: String,
    #[serde(default = "default_node")]
    pub node: String,
}

impl Default for LauncherConfig {
    fn default() -> Self {
        Self {
            python: default_python(),
            node: default_node(),
        }
    }
}

impl From<&LauncherConfig> for Launcher {
    fn from(config: &LauncherConfig) -> Self {
        Launcher {
            python: config.python.clone(),
            node: config.node.clone(),
        }
    }
}

fn default_model() -> String {
    "gemini-1.5-pro".to_string()
}

fn default_temperature() -> f32 {
    0.2
}

fn default_max_tokens() -> u32 {
    8192
}

fn default_python() -> String {
    "python".to_string()
}

fn default_node() -> String {
    "node".to_string()
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::parse(&content)
    }

    /// Load the file if it exists, otherwise use defaults.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Parse configuration from TOML string.
    pub fn parse(toml: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Resolve the API key, preferring the environment value.
    pub fn api_key(&self, from_env: Option<String>) -> Result<String, ConfigError> {
        let usable = |key: &String| !key.trim().is_empty();
        from_env
            .filter(usable)
            .or_else(|| self.backend.api_key.clone().filter(usable))
            .ok_or(ConfigError::MissingCredentials)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(String),

    #[error("{API_KEY_ENV} not found: set it in the environment or as backend.api_key")]
    MissingCredentials,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.backend.model, "gemini-1.5-pro");
        assert!((config.backend.temperature - 0.2).abs() < f32::EPSILON);
        assert_eq!(config.backend.max_tokens, 8192);
        assert_eq!(config.history.max_turns, 0);
        assert_eq!(config.launcher.python, "python");
        assert!(config.log_level.is_none());
    }

    #[test]
    fn parse_full_config() {
        let config = Config::parse(
            r#"
log_level = "debug"

[backend]
model = "gemini-2.0-flash"
api_key = "from-file"
temperature = 0.7

[history]
max_turns = 20

[launcher]
python = "python3"
"#,
        )
        .unwrap();

        assert_eq!(config.log_level.as_deref(), Some("debug"));
        assert_eq!(config.backend.model, "gemini-2.0-flash");
        assert_eq!(config.backend.max_tokens, 8192);
        assert_eq!(config.history.max_turns, 20);

        let launcher = Launcher::from(&config.launcher);
        assert_eq!(launcher.python, "python3");
        assert_eq!(launcher.node, "node");
    }

    #[test]
    fn invalid_toml_is_a_parse_error() {
        let err = Config::parse("[backend\nmodel = 1").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn environment_key_wins() {
        let config = Config::parse("[backend]\napi_key = \"file\"").unwrap();
        assert_eq!(config.api_key(Some("env".into())).unwrap(), "env");
        assert_eq!(config.api_key(None).unwrap(), "file");
        assert_eq!(config.api_key(Some("  ".into())).unwrap(), "file");
    }

    #[test]
    fn missing_key_is_reported() {
        let config = Config::default();
        assert!(matches!(
            config.api_key(None),
            Err(ConfigError::MissingCredentials)
        ));
    }

    #[test]
    fn blank_file_key_is_missing() {
        for body in ["[backend]\napi_key = \"\"", "[backend]\napi_key = \"   \""] {
            let config = Config::parse(body).unwrap();
            assert!(matches!(
                config.api_key(None),
                Err(ConfigError::MissingCredentials)
            ));
            assert!(matches!(
                config.api_key(Some(String::new())),
                Err(ConfigError::MissingCredentials)
            ));
        }
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config = Config::load_or_default("does-not-exist/napier.toml").unwrap();
        assert_eq!(config.backend.model, "gemini-1.5-pro");
    }
}
