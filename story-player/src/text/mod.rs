//! Text processing for narration: cleaning and sentence splitting.

mod cleaner;
pub mod sentences;

pub use cleaner::clean_text;
pub use sentences::split_into_sentences;
