//! story-player - narrated story playback with synchronized captions and
//! ambient sound.
//!
//! A [`SessionController`] drives one story: it resolves narration for each
//! scene (cached artifact first, synthesis as fallback), times sentence
//! captions against the narration, layers looping ambient sound underneath,
//! and sequences scenes for auto-play.

pub mod audio;
pub mod captions;
pub mod config;
pub mod error;
pub mod playback;
pub mod session;
pub mod text;
pub mod tts;

pub use config::PlayerConfig;
pub use error::PlayerError;
pub use playback::{PlaybackSnapshot, PlaybackState, PlayerEvent};
pub use session::{Illustration, SessionController, SessionOptions};
