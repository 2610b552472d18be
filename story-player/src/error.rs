//! Player error types.

use story_client::StoryError;
use thiserror::Error;

use crate::playback::PlaybackState;

#[derive(Error, Debug)]
pub enum PlayerError {
    /// The story could not be loaded; the session cannot display it.
    #[error("Cannot display story: {0}")]
    Story(#[from] StoryError),

    #[error("{command} is not allowed while {state}")]
    InvalidState {
        command: &'static str,
        state: PlaybackState,
    },

    #[error("Scene {index} is out of range (story has {count} scenes)")]
    SceneOutOfRange { index: usize, count: usize },
}
