//! story-player configuration.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use story_client::ClientConfig;

use crate::audio::MixLevels;
use crate::session::SessionOptions;
use crate::tts::VoiceOptions;

const DEFAULT_SCENE_PAUSE_MS: u64 = 1000;
const DEFAULT_NARRATION_VOLUME: f32 = 1.0;
const DEFAULT_SFX_VOLUME: f32 = 0.3;
const DEFAULT_MUSIC_VOLUME: f32 = 0.2;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerConfig {
    /// Story service connection and synthesis defaults
    #[serde(default)]
    pub server: ClientConfig,

    /// Silence between scenes when playing all, in milliseconds
    #[serde(default = "default_scene_pause_ms")]
    pub scene_pause_ms: u64,

    /// Narration volume (0.0-1.0)
    #[serde(default = "default_narration_volume")]
    pub narration_volume: f32,

    /// Ambient sound effects volume (0.0-1.0), capped at the narration volume
    #[serde(default = "default_sfx_volume")]
    pub sfx_volume: f32,

    /// Background music volume (0.0-1.0), capped at the sound effects volume
    #[serde(default = "default_music_volume")]
    pub music_volume: f32,

    /// Show captions by default
    #[serde(default = "default_captions")]
    pub captions: bool,
}

fn default_scene_pause_ms() -> u64 {
    DEFAULT_SCENE_PAUSE_MS
}

fn default_narration_volume() -> f32 {
    DEFAULT_NARRATION_VOLUME
}

fn default_sfx_volume() -> f32 {
    DEFAULT_SFX_VOLUME
}

fn default_music_volume() -> f32 {
    DEFAULT_MUSIC_VOLUME
}

fn default_captions() -> bool {
    true
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            server: ClientConfig::default(),
            scene_pause_ms: default_scene_pause_ms(),
            narration_volume: default_narration_volume(),
            sfx_volume: default_sfx_volume(),
            music_volume: default_music_volume(),
            captions: default_captions(),
        }
    }
}

impl PlayerConfig {
    /// Get the config file path: ~/.config/story-player/config.toml
    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir().context("Could not determine home directory")?;
        Ok(home.join(".config").join("story-player").join("config.toml"))
    }

    /// Load config from file, returning default if file doesn't exist
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: PlayerConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(config)
    }

    /// Save config to file
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Volumes clamped and ordered for mixing.
    pub fn mix_levels(&self) -> MixLevels {
        MixLevels::new(self.narration_volume, self.sfx_volume, self.music_volume)
    }

    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            voice: VoiceOptions::new()
                .with_voice(self.server.voice_id.as_str())
                .with_language(self.server.language.as_str()),
            levels: self.mix_levels(),
            scene_pause: Duration::from_millis(self.scene_pause_ms),
            captions: self.captions,
            auto_ambient: true,
        }
    }
}
