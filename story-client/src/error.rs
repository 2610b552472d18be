use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoryError {
    /// A cached artifact does not exist. Expected; callers fall back.
    #[error("Resource unavailable: {what}")]
    ResourceUnavailable { what: String },

    #[error("Narration synthesis failed: {0}")]
    SynthesisFailed(String),

    #[error("Network failure: {0}")]
    NetworkFailure(String),

    #[error(
        "API error{}: {message}",
        status_code.map(|c| format!(" (HTTP {})", c)).unwrap_or_default()
    )]
    Api {
        message: String,
        status_code: Option<u16>,
    },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

impl StoryError {
    /// Whether this is the expected "no cached copy" outcome rather than a fault.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::ResourceUnavailable { .. })
    }
}

pub type Result<T> = std::result::Result<T, StoryError>;
