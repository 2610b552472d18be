//! Narration audio sources: cached artifacts and on-demand synthesis.

mod resolver;

pub use resolver::AudioSourceResolver;

use story_client::{DEFAULT_LANGUAGE, Story};

/// Voice used for on-demand synthesis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceOptions {
    /// Voice identifier understood by the narration service
    pub voice_id: String,
    /// Language tag, e.g. "en"
    pub language: String,
}

impl Default for VoiceOptions {
    fn default() -> Self {
        Self {
            voice_id: story_client::config::DEFAULT_VOICE_ID.to_string(),
            language: DEFAULT_LANGUAGE.to_string(),
        }
    }
}

impl VoiceOptions {
    /// Create voice options with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the voice identifier. Blank values are ignored.
    pub fn with_voice(mut self, voice_id: impl Into<String>) -> Self {
        let voice_id = voice_id.into();
        if !voice_id.trim().is_empty() {
            self.voice_id = voice_id.trim().to_string();
        }
        self
    }

    /// Set the language tag. Blank values are ignored.
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        let language = language.into();
        if !language.trim().is_empty() {
            self.language = language.trim().to_string();
        }
        self
    }

    /// Options for narrating `story`: its own voice and language where set,
    /// these values otherwise.
    pub fn for_story(&self, story: &Story) -> Self {
        let mut options = self.clone();
        if let Some(voice_id) = &story.voice_id {
            options = options.with_voice(voice_id.as_str());
        }
        if let Some(language) = &story.language {
            options = options.with_language(language.as_str());
        }
        options
    }
}
