use async_trait::async_trait;
use serde::Serialize;

use crate::error::Result;
use crate::model::{ArtifactKey, Story};

/// Request for on-demand narration synthesis
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SynthesisRequest {
    pub text: String,
    pub voice_id: String,
    pub language: String,
}

/// Trait for story service backends
///
/// Every call is a single attempt. Failures are reported, never retried.
#[async_trait]
pub trait StoryBackend: Send + Sync {
    /// Fetch a story and its artifact flags
    async fn fetch_story(&self, story_id: &str) -> Result<Story>;

    /// Fetch a pre-rendered audio artifact
    async fn fetch_cached_audio(&self, story_id: &str, key: ArtifactKey) -> Result<Vec<u8>>;

    /// Synthesize narration audio for arbitrary text
    async fn synthesize(&self, request: SynthesisRequest) -> Result<Vec<u8>>;

    /// Fetch the illustration for the scene at `artifact_index`
    async fn fetch_image(&self, story_id: &str, artifact_index: usize) -> Result<Vec<u8>>;

    /// Get the backend name for display
    fn name(&self) -> &'static str;
}
