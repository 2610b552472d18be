//! Scene audio resolution: cached narration first, synthesis as fallback.

use std::sync::Arc;

use story_client::{ArtifactKey, Result, Story, StoryBackend, StoryError, SynthesisRequest};

use super::VoiceOptions;
use crate::audio::{AudioClip, AudioHandle, HandleLedger};
use crate::text::clean_text;

/// Turns scenes into playable audio handles.
///
/// Every success acquires a fresh handle; nothing is cached between calls.
pub struct AudioSourceResolver {
    backend: Arc<dyn StoryBackend>,
    voice: VoiceOptions,
    ledger: HandleLedger,
}

impl AudioSourceResolver {
    pub fn new(backend: Arc<dyn StoryBackend>, voice: VoiceOptions) -> Self {
        Self {
            backend,
            voice,
            ledger: HandleLedger::new(),
        }
    }

    /// Ledger counting the handles this resolver has handed out.
    pub fn ledger(&self) -> &HandleLedger {
        &self.ledger
    }

    /// Resolve narration for one scene.
    ///
    /// A scene flagged with cached narration is fetched by its artifact index.
    /// Unflagged scenes, and flagged ones whose fetch fails or does not
    /// decode, are synthesized from the scene text in the story's voice and
    /// language.
    pub async fn resolve(&self, story: &Story, scene_index: usize) -> Result<AudioHandle> {
        let scene = story
            .scene(scene_index)
            .ok_or_else(|| StoryError::ResourceUnavailable {
                what: format!("scene {} of story {}", scene_index, story.id),
            })?;

        if scene.has_cached_narration {
            let key = ArtifactKey::Narration(scene.artifact_index);
            match self.fetch_cached(&story.id, key).await {
                Ok(handle) => return Ok(handle),
                Err(e) if e.is_unavailable() => log::debug!(
                    "Cached narration for scene {} missing, synthesizing",
                    scene_index + 1
                ),
                Err(e) => log::warn!(
                    "Cached narration for scene {} failed ({}), synthesizing",
                    scene_index + 1,
                    e
                ),
            }
        }

        let voice = self.voice.for_story(story);
        let request = SynthesisRequest {
            text: clean_text(&scene.text),
            voice_id: voice.voice_id,
            language: voice.language,
        };

        let bytes = self.backend.synthesize(request).await.map_err(|e| match e {
            StoryError::SynthesisFailed(_) => e,
            other => StoryError::SynthesisFailed(other.to_string()),
        })?;
        if bytes.is_empty() {
            return Err(StoryError::SynthesisFailed("Empty audio payload".into()));
        }

        self.acquire(bytes).map_err(|e| StoryError::SynthesisFailed(e.to_string()))
    }

    /// Fetch a cached artifact (narration or ambient loop) as a handle.
    pub async fn fetch_cached(&self, story_id: &str, key: ArtifactKey) -> Result<AudioHandle> {
        let bytes = self.backend.fetch_cached_audio(story_id, key).await?;
        if bytes.is_empty() {
            return Err(StoryError::ResourceUnavailable {
                what: format!("story {} audio {} (empty)", story_id, key.path_segment()),
            });
        }
        self.acquire(bytes)
    }

    /// Measure the payload and hand out a handle. Payloads that do not decode
    /// are invalid responses.
    fn acquire(&self, bytes: Vec<u8>) -> Result<AudioHandle> {
        let clip = AudioClip::decode(bytes)
            .map_err(|e| StoryError::InvalidResponse(format!("Unplayable audio: {}", e)))?;
        Ok(self.ledger.acquire(clip))
    }
}
