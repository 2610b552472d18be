//! Ambient mixing: looping sound effect and music layers under narration.
//!
//! Both layers are toggled together and live independently of the narration
//! channel. Fetches run as background tasks and report back through a channel
//! owned by the caller, so the mixer never blocks on the network.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use story_client::{Story, StoryError};

use super::clip::AudioHandle;
use super::sink::{AmbientCategory, AudioSink, Channel};
use crate::tts::AudioSourceResolver;

const DEFAULT_NARRATION_VOLUME: f32 = 1.0;
const DEFAULT_SFX_VOLUME: f32 = 0.3;
const DEFAULT_MUSIC_VOLUME: f32 = 0.2;

/// Channel volumes. Music never exceeds sound effects, which never exceed
/// narration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MixLevels {
    narration: f32,
    sound_effects: f32,
    music: f32,
}

impl Default for MixLevels {
    fn default() -> Self {
        Self::new(DEFAULT_NARRATION_VOLUME, DEFAULT_SFX_VOLUME, DEFAULT_MUSIC_VOLUME)
    }
}

impl MixLevels {
    /// Clamp each level to `0.0..=1.0`, then cap it at the level above it.
    pub fn new(narration: f32, sound_effects: f32, music: f32) -> Self {
        let narration = clamp_volume(narration);
        let sound_effects = clamp_volume(sound_effects).min(narration);
        let music = clamp_volume(music).min(sound_effects);
        Self {
            narration,
            sound_effects,
            music,
        }
    }

    pub fn narration(&self) -> f32 {
        self.narration
    }

    pub fn ambient(&self, category: AmbientCategory) -> f32 {
        match category {
            AmbientCategory::SoundEffects => self.sound_effects,
            AmbientCategory::Music => self.music,
        }
    }
}

fn clamp_volume(volume: f32) -> f32 {
    if volume.is_nan() { 0.0 } else { volume.clamp(0.0, 1.0) }
}

/// A finished ambient fetch, tagged with the enable it belongs to.
#[derive(Debug)]
pub struct AmbientLoaded {
    pub category: AmbientCategory,
    generation: u64,
    pub result: Result<AudioHandle, StoryError>,
}

pub struct AmbientMixer {
    resolver: Arc<AudioSourceResolver>,
    levels: MixLevels,
    enabled: bool,
    /// Bumped on every enable and disable; results from older generations are stale
    generation: u64,
    playing: Vec<(AmbientCategory, AudioHandle)>,
    fetches: Vec<JoinHandle<()>>,
}

impl AmbientMixer {
    pub fn new(resolver: Arc<AudioSourceResolver>, levels: MixLevels) -> Self {
        Self {
            resolver,
            levels,
            enabled: false,
            generation: 0,
            playing: Vec::new(),
            fetches: Vec::new(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn levels(&self) -> MixLevels {
        self.levels
    }

    /// Layers currently looping.
    pub fn playing(&self) -> Vec<AmbientCategory> {
        self.playing.iter().map(|(category, _)| *category).collect()
    }

    /// Flip the enabled state and return the new one.
    pub fn toggle(
        &mut self,
        story: &Story,
        sink: &mut dyn AudioSink,
        loaded: &mpsc::UnboundedSender<AmbientLoaded>,
    ) -> bool {
        if self.enabled {
            self.disable(sink);
        } else {
            self.enable(story, loaded);
        }
        self.enabled
    }

    /// Start fetching every flagged layer. No-op while already enabled.
    pub fn enable(&mut self, story: &Story, loaded: &mpsc::UnboundedSender<AmbientLoaded>) {
        if self.enabled {
            return;
        }
        self.enabled = true;
        self.generation += 1;

        for category in AmbientCategory::ALL {
            let key = category.artifact_key();
            if !story.has_cached_ambient(key) {
                log::debug!("Story {} has no cached {}", story.id, category.label());
                continue;
            }

            let resolver = Arc::clone(&self.resolver);
            let story_id = story.id.clone();
            let tx = loaded.clone();
            let generation = self.generation;
            self.fetches.push(tokio::spawn(async move {
                let result = resolver.fetch_cached(&story_id, key).await;
                let _ = tx.send(AmbientLoaded {
                    category,
                    generation,
                    result,
                });
            }));
        }
    }

    /// Stop both layers and release their audio. No-op while disabled.
    pub fn disable(&mut self, sink: &mut dyn AudioSink) {
        if !self.enabled {
            return;
        }
        self.enabled = false;
        self.generation += 1;

        for fetch in self.fetches.drain(..) {
            fetch.abort();
        }
        for (category, handle) in self.playing.drain(..) {
            sink.stop(Channel::Ambient(category));
            drop(handle);
        }
    }

    /// Start a fetched layer looping if it belongs to the current enable.
    ///
    /// Returns the layer started, if any. Failed fetches are logged and leave
    /// the other layer alone.
    pub fn on_loaded(
        &mut self,
        loaded: AmbientLoaded,
        sink: &mut dyn AudioSink,
    ) -> Option<AmbientCategory> {
        self.fetches.retain(|fetch| !fetch.is_finished());

        let category = loaded.category;
        if !self.enabled || loaded.generation != self.generation {
            log::debug!("Dropping stale {} loop", category.label());
            return None;
        }

        match loaded.result {
            Ok(handle) => {
                let channel = Channel::Ambient(category);
                sink.start(channel, handle.clip(), self.levels.ambient(category), true);
                self.playing.push((category, handle));
                Some(category)
            }
            Err(e) if e.is_unavailable() => {
                log::debug!("No {} loop: {}", category.label(), e);
                None
            }
            Err(e) => {
                log::warn!("Failed to load {} loop: {}", category.label(), e);
                None
            }
        }
    }
}
