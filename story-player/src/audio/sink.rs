//! Output side of the audio channels.
//!
//! The player decides what plays when; an [`AudioSink`] turns those decisions
//! into sound. Implementations must not block.

use std::fmt;

use story_client::ArtifactKey;

use super::clip::AudioClip;

/// Story-wide ambient layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AmbientCategory {
    SoundEffects,
    Music,
}

impl AmbientCategory {
    pub const ALL: [Self; 2] = [Self::SoundEffects, Self::Music];

    /// Cached artifact holding this layer's loop.
    pub fn artifact_key(self) -> ArtifactKey {
        match self {
            Self::SoundEffects => ArtifactKey::SoundEffects,
            Self::Music => ArtifactKey::Music,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::SoundEffects => "sound effects",
            Self::Music => "music",
        }
    }
}

/// An independent playback channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Narration,
    Ambient(AmbientCategory),
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Narration => write!(f, "narration"),
            Self::Ambient(category) => write!(f, "{}", category.label()),
        }
    }
}

/// Plays clips on channels.
pub trait AudioSink: Send {
    /// Begin `clip` on `channel` from the start, replacing whatever it played.
    fn start(&mut self, channel: Channel, clip: &AudioClip, volume: f32, looping: bool);

    fn pause(&mut self, channel: Channel);

    fn resume(&mut self, channel: Channel);

    /// Silence `channel` and forget its clip.
    fn stop(&mut self, channel: Channel);
}

/// Sink that only logs channel commands. Used when no output device is
/// available or sound is muted.
#[derive(Debug, Default)]
pub struct LogSink;

impl AudioSink for LogSink {
    fn start(&mut self, channel: Channel, clip: &AudioClip, volume: f32, looping: bool) {
        log::info!(
            "{} started: {:.1}s at {:.0}% volume{}",
            channel,
            clip.duration().as_secs_f32(),
            volume * 100.0,
            if looping { ", looping" } else { "" }
        );
    }

    fn pause(&mut self, channel: Channel) {
        log::debug!("{} paused", channel);
    }

    fn resume(&mut self, channel: Channel) {
        log::debug!("{} resumed", channel);
    }

    fn stop(&mut self, channel: Channel) {
        log::debug!("{} stopped", channel);
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ambient_artifact_keys() {
        assert_eq!(AmbientCategory::SoundEffects.artifact_key(), ArtifactKey::SoundEffects);
        assert_eq!(AmbientCategory::Music.artifact_key(), ArtifactKey::Music);
    }

    #[test]
    fn test_channel_display() {
        assert_eq!(Channel::Narration.to_string(), "narration");
        assert_eq!(Channel::Ambient(AmbientCategory::Music).to_string(), "music");
    }
}
