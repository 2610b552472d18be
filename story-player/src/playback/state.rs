//! Sequencer state and the events and snapshots it publishes.

use std::fmt;
use std::time::Duration;

use crate::audio::AmbientCategory;

/// The one place playback status lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    #[default]
    Idle,
    /// Narration for the current scene is being resolved.
    Loading,
    Playing,
    Paused,
    /// Halted by the user; the scene index is kept.
    Stopped,
}

impl PlaybackState {
    /// Whether narration is loading, playing or paused.
    pub fn is_busy(self) -> bool {
        matches!(self, Self::Loading | Self::Playing | Self::Paused)
    }
}

impl fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::Playing => "playing",
            Self::Paused => "paused",
            Self::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

/// Point-in-time view of a session.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PlaybackSnapshot {
    pub state: PlaybackState,
    pub scene: usize,
    /// Caption unit showing, if any
    pub caption: Option<usize>,
    pub ambient_enabled: bool,
    pub captions_enabled: bool,
    /// An auto-play run is in progress
    pub auto_play: bool,
    /// Audio handles not yet released
    pub live_handles: usize,
}

/// Something that happened in a session, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerEvent {
    StateChanged(PlaybackState),
    SceneChanged(usize),
    NarrationStarted { scene: usize, duration: Duration },
    NarrationFinished { scene: usize },
    /// No narration could be resolved; the scene degrades to text.
    AudioUnavailable { scene: usize, reason: String },
    /// `unit` and `text` are `None` when the caption clears.
    CaptionChanged {
        scene: usize,
        unit: Option<usize>,
        text: Option<String>,
    },
    CaptionsToggled(bool),
    AmbientToggled(bool),
    AmbientStarted(AmbientCategory),
    RunStarted { from: usize },
    RunFinished,
    RunCancelled { scene: usize },
}
