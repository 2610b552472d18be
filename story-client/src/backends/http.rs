//! HTTP story service backend
//!
//! JSON over HTTP against the story service's REST endpoints.

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode, Url};
use serde::Deserialize;
use std::time::Duration;

use crate::backend::{StoryBackend, SynthesisRequest};
use crate::config::ClientConfig;
use crate::error::{Result, StoryError};
use crate::model::{ArtifactKey, Story};

/// Backend talking to the story service over HTTP
pub struct HttpBackend {
    base_url: Url,
    client: Client,
}

impl HttpBackend {
    /// Create a new HTTP backend
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| StoryError::ConfigError(format!("Failed to build HTTP client: {}", e)))?;

        let base_url = Url::parse(config.base_url.trim()).map_err(|e| {
            StoryError::ConfigError(format!("Invalid base URL '{}': {}", config.base_url, e))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(StoryError::ConfigError(format!(
                "Base URL '{}' cannot hold a path",
                config.base_url
            )));
        }

        Ok(Self { base_url, client })
    }

    /// The base URL with `segments` appended, each percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| StoryError::ConfigError(format!("Base URL '{}' cannot hold a path", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn story_url(&self, story_id: &str) -> Result<Url> {
        self.endpoint(&["api", "stories", story_id])
    }

    fn audio_url(&self, story_id: &str, key: ArtifactKey) -> Result<Url> {
        self.endpoint(&["api", "stories", story_id, "audio", &key.path_segment()])
    }

    fn image_url(&self, story_id: &str, artifact_index: usize) -> Result<Url> {
        let image = format!("img_{}", artifact_index);
        self.endpoint(&["api", "stories", story_id, "image", &image])
    }

    fn narrate_url(&self) -> Result<Url> {
        self.endpoint(&["api", "narrate"])
    }

    async fn get(&self, url: Url, what: &str) -> Result<Response> {
        log::debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| {
                StoryError::NetworkFailure(format!("Request for {} failed: {}", what, e))
            })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(StoryError::ResourceUnavailable {
                what: what.to_string(),
            });
        }
        if !status.is_success() {
            return Err(api_error(response).await);
        }
        Ok(response)
    }

    async fn get_bytes(&self, url: Url, what: &str) -> Result<Vec<u8>> {
        let response = self.get(url, what).await?;
        let bytes = response.bytes().await.map_err(|e| {
            StoryError::NetworkFailure(format!("Failed to read {}: {}", what, e))
        })?;
        Ok(bytes.to_vec())
    }
}

// Error bodies look like {"detail": "..."}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    detail: serde_json::Value,
}

async fn api_error(response: Response) -> StoryError {
    let status = response.status();
    let error_text = response.text().await.unwrap_or_default();
    let message = match serde_json::from_str::<ErrorResponse>(&error_text) {
        Ok(ErrorResponse {
            detail: serde_json::Value::String(detail),
        }) => detail,
        Ok(ErrorResponse { detail }) => detail.to_string(),
        Err(_) => error_text,
    };

    StoryError::Api {
        message,
        status_code: Some(status.as_u16()),
    }
}

#[async_trait]
impl StoryBackend for HttpBackend {
    async fn fetch_story(&self, story_id: &str) -> Result<Story> {
        let what = format!("story {}", story_id);
        let response = self.get(self.story_url(story_id)?, &what).await?;
        let body = response.text().await.map_err(|e| {
            StoryError::NetworkFailure(format!("Failed to read {}: {}", what, e))
        })?;
        Story::from_json(&body)
    }

    async fn fetch_cached_audio(&self, story_id: &str, key: ArtifactKey) -> Result<Vec<u8>> {
        let what = format!("story {} audio {}", story_id, key.path_segment());
        self.get_bytes(self.audio_url(story_id, key)?, &what).await
    }

    async fn synthesize(&self, request: SynthesisRequest) -> Result<Vec<u8>> {
        let url = self.narrate_url()?;
        log::debug!(
            "POST {} ({} chars, voice {}, language {})",
            url,
            request.text.chars().count(),
            request.voice_id,
            request.language
        );
        let response = self
            .client
            .post(url)
            .json(&request)
            .send()
            .await
            .map_err(|e| StoryError::SynthesisFailed(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let err = api_error(response).await;
            return Err(StoryError::SynthesisFailed(err.to_string()));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| StoryError::SynthesisFailed(format!("Failed to read audio: {}", e)))?;

        if bytes.is_empty() {
            return Err(StoryError::SynthesisFailed("Empty audio payload".into()));
        }

        Ok(bytes.to_vec())
    }

    async fn fetch_image(&self, story_id: &str, artifact_index: usize) -> Result<Vec<u8>> {
        let what = format!("story {} image {}", story_id, artifact_index);
        self.get_bytes(self.image_url(story_id, artifact_index)?, &what)
            .await
    }

    fn name(&self) -> &'static str {
        "story service (HTTP)"
    }
}
