//! Playback orchestration: the sequencer state machine and what it reports.

mod sequencer;
mod state;

pub use sequencer::{Command, PlaybackSequencer, SequencerSettings};
pub use state::{PlaybackSnapshot, PlaybackState, PlayerEvent};
