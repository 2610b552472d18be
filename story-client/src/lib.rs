//! Client library for the story service
//!
//! Covers the service boundary the player depends on:
//! - story documents with per-scene artifact flags
//! - cached narration, sound effect and music audio
//! - on-demand narration synthesis
//! - scene illustrations

pub mod backend;
pub mod backends;
pub mod config;
pub mod error;
pub mod model;

pub use backend::{StoryBackend, SynthesisRequest};
pub use backends::{BackendCall, HttpBackend, MockBackend, create_backend};
pub use config::ClientConfig;
pub use error::{Result, StoryError};
pub use model::{ArtifactKey, DEFAULT_LANGUAGE, Scene, Story};
