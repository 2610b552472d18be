//! Story data model and the service document it is parsed from.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{Result, StoryError};

/// Language used when the service does not tag a story.
pub const DEFAULT_LANGUAGE: &str = "en";

/// A cached audio artifact stored by the story service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKey {
    /// Pre-rendered narration for the scene at this artifact index.
    Narration(usize),
    /// Story-wide ambient sound effects loop.
    SoundEffects,
    /// Story-wide background music loop.
    Music,
}

impl ArtifactKey {
    /// Path segment the service uses for this artifact.
    pub fn path_segment(&self) -> String {
        match self {
            Self::Narration(index) => index.to_string(),
            Self::SoundEffects => "sfx".to_string(),
            Self::Music => "lullaby".to_string(),
        }
    }
}

/// One scene of a story.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Scene {
    /// Position in playback order (0-based).
    pub index: usize,
    /// Position in the service document, used for artifact lookups. Differs
    /// from `index` only when blank scenes were dropped while loading.
    pub artifact_index: usize,
    /// Narration text, never blank.
    pub text: String,
    /// Display-only label.
    pub mood: Option<String>,
    pub has_cached_narration: bool,
    pub has_cached_ambient: bool,
    pub has_cached_music: bool,
    pub has_cached_image: bool,
}

impl Scene {
    /// Create a scene with no cached artifacts.
    pub fn new(index: usize, text: impl Into<String>) -> Self {
        Self {
            index,
            artifact_index: index,
            text: text.into(),
            mood: None,
            has_cached_narration: false,
            has_cached_ambient: false,
            has_cached_music: false,
            has_cached_image: false,
        }
    }
}

/// A loaded story. Scene order is playback order and does not change after load.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Story {
    pub id: String,
    pub title: String,
    /// Language tag, when the service supplied one.
    pub language: Option<String>,
    pub mood: Option<String>,
    pub voice_id: Option<String>,
    pub scenes: Vec<Scene>,
}

impl Story {
    /// Build a story from plain scene texts, with no cached artifacts.
    pub fn from_texts(id: impl Into<String>, title: impl Into<String>, texts: &[&str]) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            language: None,
            mood: None,
            voice_id: None,
            scenes: texts
                .iter()
                .enumerate()
                .map(|(i, text)| Scene::new(i, *text))
                .collect(),
        }
    }

    /// Parse the JSON document returned by the story service.
    pub fn from_json(json: &str) -> Result<Self> {
        let document: StoryDocument = serde_json::from_str(json)
            .map_err(|e| StoryError::InvalidResponse(format!("Failed to parse story: {}", e)))?;
        document.into_story()
    }

    pub fn scene(&self, index: usize) -> Option<&Scene> {
        self.scenes.get(index)
    }

    pub fn scene_count(&self) -> usize {
        self.scenes.len()
    }

    /// Whether any scene carries a cached artifact for this ambient key.
    /// Narration keys are per scene and never count as ambient.
    pub fn has_cached_ambient(&self, key: ArtifactKey) -> bool {
        match key {
            ArtifactKey::SoundEffects => self.scenes.iter().any(|s| s.has_cached_ambient),
            ArtifactKey::Music => self.scenes.iter().any(|s| s.has_cached_music),
            ArtifactKey::Narration(_) => false,
        }
    }
}

// Service document types. Two shapes are accepted: scenes as plain strings with
// story-level `has_audio` / `has_images` presence maps, or scenes as objects
// carrying their own flags.

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum IdRepr {
    Number(u64),
    Text(String),
}

impl IdRepr {
    fn into_string(self) -> String {
        match self {
            Self::Number(n) => n.to_string(),
            Self::Text(s) => s,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SceneRepr {
    Text(String),
    Detailed(SceneDocument),
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SceneDocument {
    text: String,
    #[serde(default)]
    mood: Option<String>,
    #[serde(default, alias = "has_cached_narration")]
    has_cached_narration: bool,
    #[serde(default, alias = "has_cached_ambient")]
    has_cached_ambient: bool,
    #[serde(default, alias = "has_cached_music")]
    has_cached_music: bool,
    #[serde(default, alias = "has_cached_image")]
    has_cached_image: bool,
}

#[derive(Debug, Deserialize)]
struct StoryDocument {
    id: IdRepr,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    language: Option<String>,
    #[serde(default)]
    mood: Option<String>,
    #[serde(default)]
    voice_id: Option<String>,
    #[serde(default)]
    child_name: Option<String>,
    #[serde(default)]
    scenes: Vec<SceneRepr>,
    #[serde(default)]
    has_audio: HashMap<String, serde_json::Value>,
    #[serde(default)]
    has_images: HashMap<String, serde_json::Value>,
}

/// A presence map entry counts unless it is explicitly `false` or `null`.
fn flagged(map: &HashMap<String, serde_json::Value>, key: &str) -> bool {
    match map.get(key) {
        None | Some(serde_json::Value::Null) | Some(serde_json::Value::Bool(false)) => false,
        Some(_) => true,
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl StoryDocument {
    fn into_story(self) -> Result<Story> {
        let id = self.id.into_string();
        let story_ambient = flagged(&self.has_audio, "sfx");
        let story_music = flagged(&self.has_audio, "lullaby") || flagged(&self.has_audio, "music");

        let mut scenes = Vec::with_capacity(self.scenes.len());
        for (artifact_index, repr) in self.scenes.into_iter().enumerate() {
            let doc = match repr {
                SceneRepr::Text(text) => SceneDocument {
                    text,
                    ..SceneDocument::default()
                },
                SceneRepr::Detailed(doc) => doc,
            };

            let text = doc.text.trim().to_string();
            if text.is_empty() {
                continue;
            }

            let key = artifact_index.to_string();
            scenes.push(Scene {
                index: scenes.len(),
                artifact_index,
                text,
                mood: non_blank(doc.mood),
                has_cached_narration: doc.has_cached_narration || flagged(&self.has_audio, &key),
                has_cached_ambient: doc.has_cached_ambient || story_ambient,
                has_cached_music: doc.has_cached_music || story_music,
                has_cached_image: doc.has_cached_image
                    || flagged(&self.has_images, &format!("img_{}", key))
                    || flagged(&self.has_images, &key),
            });
        }

        if scenes.is_empty() {
            return Err(StoryError::InvalidResponse(format!(
                "Story {} has no scenes",
                id
            )));
        }

        let title = non_blank(self.title)
            .or_else(|| non_blank(self.child_name).map(|name| format!("{}'s Story", name)))
            .unwrap_or_else(|| "Untitled".to_string());

        Ok(Story {
            id,
            title,
            language: non_blank(self.language),
            mood: non_blank(self.mood),
            voice_id: non_blank(self.voice_id),
            scenes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_service_document() {
        let json = r#"{
            "id": 42,
            "title": "The Moon Boat",
            "scenes": ["A cat sat. It purred.", "The sun rose."],
            "mood": "magical",
            "voice_id": "voice-1",
            "child_name": "Maya",
            "language": "fr",
            "created_at": "2025-01-01 10:00:00",
            "has_audio": {"0": true, "sfx": true},
            "has_images": {"img_1": true}
        }"#;

        let story = Story::from_json(json).unwrap();
        assert_eq!(story.id, "42");
        assert_eq!(story.title, "The Moon Boat");
        assert_eq!(story.language.as_deref(), Some("fr"));
        assert_eq!(story.voice_id.as_deref(), Some("voice-1"));
        assert_eq!(story.scene_count(), 2);

        let first = story.scene(0).unwrap();
        assert!(first.has_cached_narration);
        assert!(first.has_cached_ambient);
        assert!(!first.has_cached_music);
        assert!(!first.has_cached_image);

        let second = story.scene(1).unwrap();
        assert!(!second.has_cached_narration);
        assert!(second.has_cached_image);

        assert!(story.has_cached_ambient(ArtifactKey::SoundEffects));
        assert!(!story.has_cached_ambient(ArtifactKey::Music));
    }

    #[test]
    fn test_parse_flagged_scene_objects() {
        let json = r#"{
            "id": "abc",
            "title": "Night Sky",
            "language": "en",
            "scenes": [
                {"text": "Stars woke up.", "hasCachedNarration": true, "hasCachedMusic": true},
                {"text": "The owl sang.", "mood": "calm", "hasCachedImage": true}
            ]
        }"#;

        let story = Story::from_json(json).unwrap();
        assert_eq!(story.id, "abc");
        assert!(story.scenes[0].has_cached_narration);
        assert!(story.has_cached_ambient(ArtifactKey::Music));
        assert_eq!(story.scenes[1].mood.as_deref(), Some("calm"));
        assert!(story.scenes[1].has_cached_image);
    }

    #[test]
    fn test_blank_scenes_are_dropped_and_reindexed() {
        let json = r#"{"id": 1, "scenes": ["First.", "   ", "Third."], "has_audio": {"2": true}}"#;
        let story = Story::from_json(json).unwrap();
        assert_eq!(story.scene_count(), 2);
        assert_eq!(story.scenes[1].index, 1);
        assert_eq!(story.scenes[1].artifact_index, 2);
        assert!(story.scenes[1].has_cached_narration);
    }

    #[test]
    fn test_story_without_scenes_is_invalid() {
        let result = Story::from_json(r#"{"id": 7, "scenes": []}"#);
        assert!(matches!(result, Err(StoryError::InvalidResponse(_))));
    }

    #[test]
    fn test_defaults_for_missing_fields() {
        let story =
            Story::from_json(r#"{"id": 3, "child_name": "Leo", "scenes": ["Hi."]}"#).unwrap();
        assert_eq!(story.title, "Leo's Story");
        assert!(story.language.is_none());
        assert!(story.voice_id.is_none());
    }

    #[test]
    fn test_false_presence_flags_are_ignored() {
        let json = r#"{"id": 5, "scenes": ["One."], "has_audio": {"0": false, "lullaby": null}}"#;
        let story = Story::from_json(json).unwrap();
        assert!(!story.scenes[0].has_cached_narration);
        assert!(!story.has_cached_ambient(ArtifactKey::Music));
    }

    #[test]
    fn test_artifact_path_segments() {
        assert_eq!(ArtifactKey::Narration(3).path_segment(), "3");
        assert_eq!(ArtifactKey::SoundEffects.path_segment(), "sfx");
        assert_eq!(ArtifactKey::Music.path_segment(), "lullaby");
    }
}
