//! Caption synchronization.
//!
//! Scene text is split into sentence units and each unit gets an equal share
//! of the narration duration. Timing approximates the spoken audio rather than
//! aligning to it.

mod cursor;
mod schedule;

pub use cursor::CaptionCursor;
pub use schedule::{CaptionSlot, active_unit, schedule};

/// Split scene text into caption units.
pub fn segment(text: &str) -> Vec<String> {
    crate::text::split_into_sentences(text)
}
