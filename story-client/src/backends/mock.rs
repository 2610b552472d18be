//! Mock story backend for testing
//!
//! Serves a fixed story from memory, records every call, and can simulate
//! missing artifacts, failing synthesis and slow responses.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use crate::backend::{StoryBackend, SynthesisRequest};
use crate::error::{Result, StoryError};
use crate::model::{ArtifactKey, Story};

/// A call received by the mock backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendCall {
    FetchStory(String),
    CachedAudio { story_id: String, key: ArtifactKey },
    Synthesize { text: String, voice_id: String, language: String },
    Image { story_id: String, artifact_index: usize },
}

/// In-memory backend
pub struct MockBackend {
    story: Option<Story>,
    /// Cached artifacts; a missing key answers `ResourceUnavailable`
    cached: HashMap<ArtifactKey, Vec<u8>>,
    /// Payload for synthesis; `None` makes every synthesis fail
    synthesized: Option<Vec<u8>>,
    /// Per-text synthesis payloads, checked before `synthesized`
    synthesized_by_text: HashMap<String, Vec<u8>>,
    images: HashMap<usize, Vec<u8>>,
    /// Delay applied before answering each call
    latency: Option<Duration>,
    calls: Mutex<Vec<BackendCall>>,
}

impl MockBackend {
    /// Backend serving `story` with no cached artifacts and failing synthesis
    pub fn new(story: Story) -> Self {
        Self {
            story: Some(story),
            cached: HashMap::new(),
            synthesized: None,
            synthesized_by_text: HashMap::new(),
            images: HashMap::new(),
            latency: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Backend that cannot serve any story
    pub fn offline() -> Self {
        Self {
            story: None,
            ..Self::new(Story::from_texts("", "", &[]))
        }
    }

    pub fn with_cached_audio(mut self, key: ArtifactKey, bytes: Vec<u8>) -> Self {
        self.cached.insert(key, bytes);
        self
    }

    /// Make synthesis succeed with this payload for any text
    pub fn with_synthesis(mut self, bytes: Vec<u8>) -> Self {
        self.synthesized = Some(bytes);
        self
    }

    /// Make synthesis of exactly `text` return this payload
    pub fn with_synthesis_for(mut self, text: &str, bytes: Vec<u8>) -> Self {
        self.synthesized_by_text.insert(text.to_string(), bytes);
        self
    }

    pub fn with_image(mut self, artifact_index: usize, bytes: Vec<u8>) -> Self {
        self.images.insert(artifact_index, bytes);
        self
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// All calls received so far, in order
    pub fn calls(&self) -> Vec<BackendCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|c| c.len()).unwrap_or_default()
    }

    /// Texts submitted for synthesis, in order
    pub fn synthesized_texts(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                BackendCall::Synthesize { text, .. } => Some(text),
                _ => None,
            })
            .collect()
    }

    /// Cached artifact keys requested, in order
    pub fn cached_requests(&self) -> Vec<ArtifactKey> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                BackendCall::CachedAudio { key, .. } => Some(key),
                _ => None,
            })
            .collect()
    }

    async fn record(&self, call: BackendCall) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }
}

#[async_trait]
impl StoryBackend for MockBackend {
    async fn fetch_story(&self, story_id: &str) -> Result<Story> {
        self.record(BackendCall::FetchStory(story_id.to_string()))
            .await;

        match &self.story {
            Some(story) if story.id == story_id => Ok(story.clone()),
            Some(_) => Err(StoryError::ResourceUnavailable {
                what: format!("story {}", story_id),
            }),
            None => Err(StoryError::NetworkFailure("mock backend is offline".into())),
        }
    }

    async fn fetch_cached_audio(&self, story_id: &str, key: ArtifactKey) -> Result<Vec<u8>> {
        self.record(BackendCall::CachedAudio {
            story_id: story_id.to_string(),
            key,
        })
        .await;

        self.cached
            .get(&key)
            .cloned()
            .ok_or_else(|| StoryError::ResourceUnavailable {
                what: format!("story {} audio {}", story_id, key.path_segment()),
            })
    }

    async fn synthesize(&self, request: SynthesisRequest) -> Result<Vec<u8>> {
        let text = request.text.clone();
        self.record(BackendCall::Synthesize {
            text: request.text,
            voice_id: request.voice_id,
            language: request.language,
        })
        .await;

        self.synthesized_by_text
            .get(&text)
            .or(self.synthesized.as_ref())
            .cloned()
            .ok_or_else(|| StoryError::SynthesisFailed("mock synthesis disabled".into()))
    }

    async fn fetch_image(&self, story_id: &str, artifact_index: usize) -> Result<Vec<u8>> {
        self.record(BackendCall::Image {
            story_id: story_id.to_string(),
            artifact_index,
        })
        .await;

        self.images
            .get(&artifact_index)
            .cloned()
            .ok_or_else(|| StoryError::ResourceUnavailable {
                what: format!("story {} image {}", story_id, artifact_index),
            })
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}
