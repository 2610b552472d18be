//! Session options and illustration types.

use std::time::Duration;

use crate::audio::MixLevels;
use crate::playback::SequencerSettings;
use crate::tts::VoiceOptions;

/// Everything a session needs besides the story and its backend.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Fallback voice for synthesis
    pub voice: VoiceOptions,
    pub levels: MixLevels,
    /// Silence between scenes when playing all
    pub scene_pause: Duration,
    /// Start with captions on
    pub captions: bool,
    /// Switch ambient sound on when playing all
    pub auto_ambient: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            voice: VoiceOptions::default(),
            levels: MixLevels::default(),
            scene_pause: Duration::from_millis(1000),
            captions: true,
            auto_ambient: true,
        }
    }
}

impl SessionOptions {
    pub(crate) fn sequencer_settings(&self) -> SequencerSettings {
        SequencerSettings {
            scene_pause: self.scene_pause,
            levels: self.levels,
            captions: self.captions,
            auto_ambient: self.auto_ambient,
        }
    }
}

/// Image container, detected from magic bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Jpeg,
    Gif,
    WebP,
    Unknown,
}

impl ImageFormat {
    pub fn sniff(data: &[u8]) -> Self {
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            Self::Jpeg
        } else if data.starts_with(&[0x89, 0x50, 0x4E, 0x47]) {
            Self::Png
        } else if data.starts_with(b"GIF") {
            Self::Gif
        } else if data.starts_with(b"RIFF") && data.len() > 12 && &data[8..12] == b"WEBP" {
            Self::WebP
        } else {
            Self::Unknown
        }
    }

    /// File extension for saving. Unknown payloads are saved as PNG, the
    /// format the illustration service produces.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Gif => "gif",
            Self::WebP => "webp",
            Self::Png | Self::Unknown => "png",
        }
    }
}

/// A scene's illustration.
#[derive(Debug, Clone, PartialEq)]
pub struct Illustration {
    pub scene: usize,
    pub format: ImageFormat,
    pub bytes: Vec<u8>,
}

impl Illustration {
    pub fn new(scene: usize, bytes: Vec<u8>) -> Self {
        Self {
            scene,
            format: ImageFormat::sniff(&bytes),
            bytes,
        }
    }

    /// Suggested file name, e.g. `scene-2.png` for the second scene.
    pub fn file_name(&self) -> String {
        format!("scene-{}.{}", self.scene + 1, self.format.extension())
    }
}
