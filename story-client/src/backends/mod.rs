//! Story backend implementations

mod http;
pub mod mock;

pub use http::HttpBackend;
pub use mock::{BackendCall, MockBackend};

use crate::backend::StoryBackend;
use crate::config::ClientConfig;
use crate::error::Result;

/// Create the backend described by the configuration
pub fn create_backend(config: &ClientConfig) -> Result<Box<dyn StoryBackend>> {
    config.validate()?;
    Ok(Box::new(HttpBackend::new(config)?))
}
