//! Story sessions: the public face of the player.

mod controller;
mod types;

pub use controller::SessionController;
pub use types::{Illustration, ImageFormat, SessionOptions};
