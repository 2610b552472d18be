//! Audio channels: fetched clips, playback clocks, the output sinks and the
//! ambient mixer.

mod clip;
mod clock;
mod mixer;
#[cfg(feature = "speaker")]
mod output;
mod sink;

pub use clip::{AudioClip, AudioFormat, AudioHandle, DecodeError, HandleLedger};
pub use clock::PlayClock;
pub use mixer::{AmbientLoaded, AmbientMixer, MixLevels};
#[cfg(feature = "speaker")]
pub use output::{OutputError, RodioSink};
pub use sink::{AmbientCategory, AudioSink, Channel, LogSink};


#[cfg(test)]
pub(crate) use testing::{RecordingSink, SinkCall};
