use serde::{Deserialize, Serialize};

use crate::error::{Result, StoryError};
use crate::model::DEFAULT_LANGUAGE;

/// Narrator voice used when a story does not name one.
pub const DEFAULT_VOICE_ID: &str = "pNInz6obpgDQGcFmaJgB";

/// Story service connection settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the story service
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Fallback narrator voice for synthesis
    #[serde(default = "default_voice_id")]
    pub voice_id: String,

    /// Fallback language for synthesis
    #[serde(default = "default_language")]
    pub language: String,
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_voice_id() -> String {
    DEFAULT_VOICE_ID.to_string()
}

fn default_language() -> String {
    DEFAULT_LANGUAGE.to_string()
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            voice_id: default_voice_id(),
            language: default_language(),
        }
    }
}

impl ClientConfig {
    /// Check the settings before a backend is built from them
    pub fn validate(&self) -> Result<()> {
        let url = self.base_url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(StoryError::ConfigError(format!(
                "base_url must start with http:// or https://, got '{}'",
                self.base_url
            )));
        }
        if self.timeout_secs == 0 {
            return Err(StoryError::ConfigError(
                "timeout_secs must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url, "http://localhost:8000");
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.voice_id, "pNInz6obpgDQGcFmaJgB");
        assert_eq!(config.language, "en");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_partial_config() {
        let config: ClientConfig =
            toml::from_str(r#"base_url = "https://stories.example""#).unwrap();
        assert_eq!(config.base_url, "https://stories.example");
        assert_eq!(config.timeout_secs, 30);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let config = ClientConfig {
            base_url: "localhost:8000".to_string(),
            ..ClientConfig::default()
        };
        assert!(matches!(config.validate(), Err(StoryError::ConfigError(_))));

        let config = ClientConfig {
            timeout_secs: 0,
            ..ClientConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
